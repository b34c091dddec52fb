use std::time::{Duration, Instant};

pub const DEFAULT_DEBOUNCE_WINDOW: Duration = Duration::from_millis(3000);

/// Drops a final transcript that repeats the previous one within `window`.
///
/// Continuous recognizers tend to emit the same final result more than once
/// per utterance.
#[derive(Debug, Clone)]
pub struct DebounceGate {
    window: Duration,
    last: Option<(String, Instant)>,
}

impl DebounceGate {
    pub fn new(window: Duration) -> Self {
        Self { window, last: None }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Returns false for duplicates. Admitted transcripts restart the window,
    /// suppressed ones don't.
    pub fn admit(&mut self, transcript: &str, now: Instant) -> bool {
        if let Some((last_transcript, last_time)) = &self.last {
            if last_transcript == transcript
                && now.saturating_duration_since(*last_time) < self.window
            {
                return false;
            }
        }
        self.last = Some((transcript.to_owned(), now));
        true
    }

    pub fn reset(&mut self) {
        self.last = None;
    }
}

impl Default for DebounceGate {
    fn default() -> Self {
        Self::new(DEFAULT_DEBOUNCE_WINDOW)
    }
}
