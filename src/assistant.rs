use crate::interpreter::{Interpretation, VoiceEvent, VoiceInterpreter};
use crate::listening::{
    ListenerAction, ListeningConfig, ListeningMachine, ListeningState, RecognitionErrorKind,
};
use crate::recognition::RecognitionResult;
use crate::recognizer::{Recognizer, RecognizerEvent};
use crate::speech::Speaker;
use std::time::Instant;
use tokio::{
    select,
    sync::{broadcast, mpsc},
};
use tracing::*;

/// What a matched command does besides being published
struct Reaction {
    response: Option<String>,
    stop_listening: bool,
}

/// Drives a recognizer through the listening lifecycle and turns what it
/// hears into [`VoiceEvent`]s.
pub struct VoiceAssistant<R, S> {
    recognizer: R,
    speaker: S,
    interpreter: VoiceInterpreter,
    machine: ListeningMachine,
    event_sender: mpsc::Sender<VoiceEvent>,
    restart_deadline: Option<tokio::time::Instant>,
}

impl<R: Recognizer, S: Speaker> VoiceAssistant<R, S> {
    pub fn new(
        recognizer: R,
        speaker: S,
        interpreter: VoiceInterpreter,
        listening_config: ListeningConfig,
        event_sender: mpsc::Sender<VoiceEvent>,
    ) -> Self {
        Self {
            recognizer,
            speaker,
            interpreter,
            machine: ListeningMachine::new(listening_config),
            event_sender,
            restart_deadline: None,
        }
    }

    pub fn state(&self) -> &ListeningState {
        self.machine.state()
    }

    pub fn last_error(&self) -> Option<&RecognitionErrorKind> {
        self.machine.last_error()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ListeningState> {
        self.machine.subscribe()
    }

    /// Listens until standby, the source closes or `events` is dropped
    pub async fn run(&mut self, mut events: mpsc::Receiver<RecognizerEvent>) {
        let action = self.machine.start(Instant::now());
        self.execute(action).await;

        while !self.machine.is_standby() {
            let restart_pending = self.restart_deadline.is_some();
            let deadline = self
                .restart_deadline
                .unwrap_or_else(tokio::time::Instant::now);
            select! {
                event = events.recv() => {
                    match event {
                        Some(RecognizerEvent::Result(result)) => self.handle_result(result).await,
                        Some(RecognizerEvent::Error(error)) => {
                            let kind = RecognitionErrorKind::parse(&error);
                            let action = self.machine.on_error(kind, Instant::now());
                            self.execute(action).await;
                        }
                        Some(RecognizerEvent::End) => {
                            let action = self.machine.on_end();
                            self.execute(action).await;
                        }
                        Some(RecognizerEvent::Closed) | None => {
                            info!("Recognizer input closed");
                            let action = self.machine.stop();
                            self.execute(action).await;
                            break;
                        }
                    }
                }
                _ = tokio::time::sleep_until(deadline), if restart_pending => {
                    self.restart_deadline = None;
                    let action = self.machine.restart_due();
                    self.execute(action).await;
                }
            }
        }
        info!("Voice assistant in standby");
    }

    async fn execute(&mut self, action: ListenerAction) {
        match action {
            ListenerAction::None => {}
            ListenerAction::StartRecognizer => {
                self.restart_deadline = None;
                if let Err(err) = self.recognizer.start().await {
                    error!("Failed to start recognizer: {}", err);
                    let action = self
                        .machine
                        .on_error(RecognitionErrorKind::Other(err.to_string()), Instant::now());
                    // the recognizer never ran, there is nothing to stop
                    debug!("Skipping {:?} after failed start", action);
                }
            }
            ListenerAction::RestartAfter(delay) => {
                self.restart_deadline = Some(tokio::time::Instant::now() + delay);
            }
            ListenerAction::StopRecognizer => {
                self.restart_deadline = None;
                if let Err(err) = self.recognizer.stop().await {
                    warn!("Failed to stop recognizer: {}", err);
                }
            }
        }
    }

    async fn handle_result(&mut self, result: RecognitionResult) {
        if !self.machine.is_listening() {
            debug!("Dropping recognition result while {:?}", self.machine.state());
            return;
        }
        let now = Instant::now();
        let (event, reaction) = match self.interpreter.interpret(&result, now) {
            Interpretation::Ignored(reason) => {
                debug!("Ignoring recognition result: {:?}", reason);
                return;
            }
            Interpretation::GeneralInput(event) => (event, None),
            Interpretation::Command { command, event } => (
                event,
                Some(Reaction {
                    response: command.response.clone(),
                    stop_listening: command.stop_listening,
                }),
            ),
        };
        self.machine.on_speech_admitted(now);
        self.publish(event).await;
        if let Some(reaction) = reaction {
            self.react(reaction).await;
        }
    }

    async fn publish(&self, event: VoiceEvent) {
        if self.event_sender.send(event).await.is_err() {
            warn!("Voice event receiver dropped");
        }
    }

    async fn react(&mut self, reaction: Reaction) {
        let Some(response) = reaction.response else {
            if reaction.stop_listening {
                let action = self.machine.stop();
                self.execute(action).await;
            }
            return;
        };

        let action = self.machine.begin_speaking();
        self.execute(action).await;
        if reaction.stop_listening {
            let action = self.machine.stop();
            self.execute(action).await;
        }
        if let Err(err) = self.speaker.speak(&response).await {
            error!("Failed to speak response: {}", err);
        }
        let action = self.machine.on_speech_finished(Instant::now());
        self.execute(action).await;
    }
}
