use serde::Deserialize;
use std::{
    fmt,
    time::{Duration, Instant},
};
use tokio::sync::broadcast;
use tracing::*;

const STATE_CHANNEL_CAPACITY: usize = 16;

/// Error classes reported by speech recognizers
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecognitionErrorKind {
    /// Microphone permission denied
    NotAllowed,
    NoSpeech,
    /// No microphone found
    AudioCapture,
    Network,
    Other(String),
}

impl RecognitionErrorKind {
    pub fn parse(error: &str) -> Self {
        match error.trim() {
            "not-allowed" => Self::NotAllowed,
            "no-speech" => Self::NoSpeech,
            "audio-capture" => Self::AudioCapture,
            "network" => Self::Network,
            other => Self::Other(other.to_owned()),
        }
    }
}

impl fmt::Display for RecognitionErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotAllowed => write!(f, "not-allowed"),
            Self::NoSpeech => write!(f, "no-speech"),
            Self::AudioCapture => write!(f, "audio-capture"),
            Self::Network => write!(f, "network"),
            Self::Other(other) => write!(f, "{}", other),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListeningState {
    Idle,
    Listening,
    Speaking,
    /// Transient, always followed by Idle
    Error(RecognitionErrorKind),
}

/// What the driver has to do with the recognizer after a transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenerAction {
    None,
    StartRecognizer,
    /// Call [`ListeningMachine::restart_due`] once the delay passed
    RestartAfter(Duration),
    StopRecognizer,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ListeningConfig {
    #[serde(default = "default_max_network_retries")]
    pub max_network_retries: u32,
    #[serde(default = "default_network_retry_delay_ms")]
    pub network_retry_delay_ms: u64,
    #[serde(default = "default_restart_delay_ms")]
    pub no_speech_restart_delay_ms: u64,
    #[serde(default = "default_restart_delay_ms")]
    pub end_restart_delay_ms: u64,
    /// Silence longer than this stops listening instead of restarting
    #[serde(default = "default_idle_timeout_ms")]
    pub idle_timeout_ms: u64,
}

fn default_max_network_retries() -> u32 {
    3
}
fn default_network_retry_delay_ms() -> u64 {
    1000
}
fn default_restart_delay_ms() -> u64 {
    100
}
fn default_idle_timeout_ms() -> u64 {
    120_000
}

impl Default for ListeningConfig {
    fn default() -> Self {
        Self {
            max_network_retries: default_max_network_retries(),
            network_retry_delay_ms: default_network_retry_delay_ms(),
            no_speech_restart_delay_ms: default_restart_delay_ms(),
            end_restart_delay_ms: default_restart_delay_ms(),
            idle_timeout_ms: default_idle_timeout_ms(),
        }
    }
}

/// Listening lifecycle: `Idle -> Listening -> (Speaking | Idle)`.
///
/// The machine does no IO. Callers feed it recognizer events with the
/// current time and execute the returned [`ListenerAction`].
pub struct ListeningMachine {
    config: ListeningConfig,
    state: ListeningState,
    /// User wants to keep listening
    intent: bool,
    restart_pending: bool,
    network_retries: u32,
    last_activity: Instant,
    last_error: Option<RecognitionErrorKind>,
    state_sender: broadcast::Sender<ListeningState>,
}

impl ListeningMachine {
    pub fn new(config: ListeningConfig) -> Self {
        let (state_sender, _) = broadcast::channel(STATE_CHANNEL_CAPACITY);
        Self {
            config,
            state: ListeningState::Idle,
            intent: false,
            restart_pending: false,
            network_retries: 0,
            last_activity: Instant::now(),
            last_error: None,
            state_sender,
        }
    }

    pub fn state(&self) -> &ListeningState {
        &self.state
    }

    /// Receives every state change from now on, transient `Error` included
    pub fn subscribe(&self) -> broadcast::Receiver<ListeningState> {
        self.state_sender.subscribe()
    }

    pub fn last_error(&self) -> Option<&RecognitionErrorKind> {
        self.last_error.as_ref()
    }

    pub fn is_listening(&self) -> bool {
        self.state == ListeningState::Listening
    }

    /// Nothing is running and nothing will restart on its own
    pub fn is_standby(&self) -> bool {
        self.state == ListeningState::Idle && !self.intent && !self.restart_pending
    }

    fn set_state(&mut self, state: ListeningState) {
        if self.state == state {
            return;
        }
        debug!("Listening state {:?} -> {:?}", self.state, state);
        self.state = state.clone();
        // no subscribers is fine
        _ = self.state_sender.send(state);
    }

    pub fn start(&mut self, now: Instant) -> ListenerAction {
        match self.state {
            ListeningState::Listening => ListenerAction::None,
            ListeningState::Speaking => {
                // resumes once speech ends
                self.intent = true;
                ListenerAction::None
            }
            ListeningState::Idle | ListeningState::Error(_) => {
                info!("Starting to listen");
                self.intent = true;
                self.restart_pending = false;
                self.network_retries = 0;
                self.last_activity = now;
                self.set_state(ListeningState::Listening);
                ListenerAction::StartRecognizer
            }
        }
    }

    pub fn stop(&mut self) -> ListenerAction {
        self.intent = false;
        self.restart_pending = false;
        match self.state {
            ListeningState::Listening => {
                info!("Stopping listening");
                self.set_state(ListeningState::Idle);
                ListenerAction::StopRecognizer
            }
            // recognizer is already stopped while speaking
            _ => ListenerAction::None,
        }
    }

    /// Speech was admitted past the debounce gate
    pub fn on_speech_admitted(&mut self, now: Instant) {
        self.last_activity = now;
        self.network_retries = 0;
    }

    pub fn on_error(&mut self, kind: RecognitionErrorKind, now: Instant) -> ListenerAction {
        if self.state != ListeningState::Listening {
            debug!("Ignoring recognizer error {} in state {:?}", kind, self.state);
            return ListenerAction::None;
        }
        match kind {
            RecognitionErrorKind::NoSpeech => {
                let silence = now.saturating_duration_since(self.last_activity);
                if silence >= Duration::from_millis(self.config.idle_timeout_ms) {
                    info!("No speech for {:?}, going idle", silence);
                    self.fail(kind)
                } else {
                    debug!("No speech detected, continuing");
                    self.schedule_restart(self.config.no_speech_restart_delay_ms)
                }
            }
            RecognitionErrorKind::Network
                if self.network_retries < self.config.max_network_retries =>
            {
                self.network_retries += 1;
                warn!(
                    "Recognizer network error, retry {} of {}",
                    self.network_retries, self.config.max_network_retries
                );
                self.schedule_restart(self.config.network_retry_delay_ms)
            }
            kind => {
                error!("Recognizer failed with {}", kind);
                self.fail(kind)
            }
        }
    }

    /// The recognizer ended its session on its own
    pub fn on_end(&mut self) -> ListenerAction {
        if self.intent && self.state == ListeningState::Listening && !self.restart_pending {
            debug!("Recognizer ended, restarting");
            self.schedule_restart(self.config.end_restart_delay_ms)
        } else {
            ListenerAction::None
        }
    }

    /// Called when a scheduled restart delay passed
    pub fn restart_due(&mut self) -> ListenerAction {
        if !self.restart_pending {
            return ListenerAction::None;
        }
        self.restart_pending = false;
        if self.intent && self.state == ListeningState::Listening {
            ListenerAction::StartRecognizer
        } else {
            ListenerAction::None
        }
    }

    pub fn begin_speaking(&mut self) -> ListenerAction {
        if self.state != ListeningState::Listening {
            return ListenerAction::None;
        }
        self.restart_pending = false;
        self.set_state(ListeningState::Speaking);
        ListenerAction::StopRecognizer
    }

    pub fn on_speech_finished(&mut self, now: Instant) -> ListenerAction {
        if self.state != ListeningState::Speaking {
            return ListenerAction::None;
        }
        self.set_state(ListeningState::Idle);
        if self.intent {
            self.last_activity = now;
            self.set_state(ListeningState::Listening);
            ListenerAction::StartRecognizer
        } else {
            ListenerAction::None
        }
    }

    fn schedule_restart(&mut self, delay_ms: u64) -> ListenerAction {
        self.restart_pending = true;
        ListenerAction::RestartAfter(Duration::from_millis(delay_ms))
    }

    fn fail(&mut self, kind: RecognitionErrorKind) -> ListenerAction {
        self.intent = false;
        self.restart_pending = false;
        self.last_error = Some(kind.clone());
        self.set_state(ListeningState::Error(kind));
        self.set_state(ListeningState::Idle);
        ListenerAction::StopRecognizer
    }
}
