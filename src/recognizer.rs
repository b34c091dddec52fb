use crate::error::PhoenixResult;
use crate::recognition::RecognitionResult;
use async_trait::async_trait;
use std::io::BufRead;
use std::thread;
use tokio::sync::mpsc;
use tracing::*;

/// Output of a speech recognizer
#[derive(Debug, Clone, PartialEq)]
pub enum RecognizerEvent {
    Result(RecognitionResult),
    /// Recognizer error name such as `no-speech` or `network`
    Error(String),
    /// Recognition session ended on its own
    End,
    /// Source is exhausted, nothing more will arrive
    Closed,
}

/// Control side of a speech recognizer.
///
/// Events are delivered separately over a channel. `start` may be called
/// while the recognizer is already running and has to tolerate that.
#[async_trait]
pub trait Recognizer: Send {
    async fn start(&mut self) -> PhoenixResult<()>;
    async fn stop(&mut self) -> PhoenixResult<()>;
}

/// Parses one line of text input.
///
/// Plain text is a final transcript, `{...}` is a JSON recognition result
/// and `!name` simulates a recognizer event (`!end` or an error name).
pub fn parse_line(line: &str) -> Option<RecognizerEvent> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    if let Some(signal) = line.strip_prefix('!') {
        return match signal.trim() {
            "end" => Some(RecognizerEvent::End),
            error => Some(RecognizerEvent::Error(error.to_owned())),
        };
    }
    if line.starts_with('{') {
        return match serde_json::from_str::<RecognitionResult>(line) {
            Ok(result) => Some(RecognizerEvent::Result(result)),
            Err(err) => {
                warn!("Failed to parse recognition result {:?}: {}", line, err);
                None
            }
        };
    }
    Some(RecognizerEvent::Result(RecognitionResult::from_text(line)))
}

/// Treats lines of text as already recognized speech
pub struct LineRecognizer {
    running: bool,
}

impl LineRecognizer {
    /// Reads `reader` on its own thread.
    ///
    /// A blocked read never holds up runtime shutdown, the thread is left
    /// behind when the process exits.
    pub fn spawn<R>(reader: R) -> (Self, mpsc::Receiver<RecognizerEvent>)
    where
        R: BufRead + Send + 'static,
    {
        let (sender, receiver) = mpsc::channel(10);
        thread::spawn(move || {
            for line in reader.lines() {
                match line {
                    Ok(line) => {
                        if let Some(event) = parse_line(&line) {
                            if sender.blocking_send(event).is_err() {
                                return;
                            }
                        }
                    }
                    Err(err) => {
                        error!("Failed to read input: {}", err);
                        break;
                    }
                }
            }
            _ = sender.blocking_send(RecognizerEvent::Closed);
        });
        (Self { running: false }, receiver)
    }

    pub fn is_running(&self) -> bool {
        self.running
    }
}

#[async_trait]
impl Recognizer for LineRecognizer {
    async fn start(&mut self) -> PhoenixResult<()> {
        if !self.running {
            info!("Listening on text input");
        }
        self.running = true;
        Ok(())
    }

    async fn stop(&mut self) -> PhoenixResult<()> {
        self.running = false;
        Ok(())
    }
}
