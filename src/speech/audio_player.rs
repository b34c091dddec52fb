use super::Playable;
use crate::error::{PhoenixError, PhoenixResult};
use std::{
    sync::mpsc::{channel, Receiver, Sender},
    thread,
    time::Duration,
};
use tokio::sync::oneshot;
use tracing::*;

enum AudioPlayerCommand {
    /// Reply is sent once the sound finished playing
    Play(Box<dyn Playable>, oneshot::Sender<PhoenixResult<()>>),
    Terminate,
}

fn audio_player_loop(receiver: &Receiver<AudioPlayerCommand>) -> PhoenixResult<()> {
    let (_output_stream, output_stream_handle) = rodio::OutputStream::try_default()
        .map_err(|_| PhoenixError::FailedToCreateAudioOutputStream)?;
    let sink = rodio::Sink::try_new(&output_stream_handle)
        .map_err(|_| PhoenixError::FailedToCreateAudioSink)?;
    while let Ok(command) = receiver.recv() {
        match command {
            AudioPlayerCommand::Play(sound, done) => {
                let result = rodio::Decoder::new(sound)
                    .map_err(|_| PhoenixError::FailedToDecodeAudioFile)
                    .map(|source| {
                        sink.append(source);
                        sink.sleep_until_end();
                    });
                // caller may have given up waiting
                _ = done.send(result);
            }
            AudioPlayerCommand::Terminate => {
                warn!("Audio player loop terminated");
                break;
            }
        }
    }
    Ok(())
}

/// Answers the next request with `error` so its caller doesn't hang.
/// Returns false once the player is terminated or dropped.
fn fail_next_request(receiver: &Receiver<AudioPlayerCommand>, error: PhoenixError) -> bool {
    match receiver.recv() {
        Ok(AudioPlayerCommand::Play(_, done)) => {
            _ = done.send(Err(error));
            true
        }
        Ok(AudioPlayerCommand::Terminate) | Err(_) => false,
    }
}

/// Plays audio on a dedicated thread, rodio output isn't Send
pub struct AudioPlayer {
    sender: Sender<AudioPlayerCommand>,
}

impl AudioPlayer {
    pub fn new() -> Self {
        let (sender, receiver) = channel();
        thread::spawn(move || loop {
            match audio_player_loop(&receiver) {
                Ok(()) => break,
                Err(e) => {
                    error!("Audio player loop failed with {}", e);
                    if !fail_next_request(&receiver, e) {
                        break;
                    }
                    thread::sleep(Duration::from_secs(1));
                }
            }
        });
        Self { sender }
    }

    pub async fn play(&self, sound: Box<dyn Playable>) -> PhoenixResult<()> {
        let (done_sender, done_receiver) = oneshot::channel();
        self.sender
            .send(AudioPlayerCommand::Play(sound, done_sender))
            .map_err(|_| PhoenixError::AudioPlayerGone)?;
        done_receiver
            .await
            .map_err(|_| PhoenixError::AudioPlayerGone)?
    }
}

impl Default for AudioPlayer {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for AudioPlayer {
    fn drop(&mut self) {
        _ = self.sender.send(AudioPlayerCommand::Terminate);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn failed_output_answers_pending_request() {
        let (sender, receiver) = channel();
        let (done_sender, mut done_receiver) = oneshot::channel();
        sender
            .send(AudioPlayerCommand::Play(
                Box::new(Cursor::new(vec![])),
                done_sender,
            ))
            .unwrap();
        assert!(fail_next_request(
            &receiver,
            PhoenixError::FailedToCreateAudioOutputStream
        ));
        assert!(matches!(
            done_receiver.try_recv(),
            Ok(Err(PhoenixError::FailedToCreateAudioOutputStream))
        ));
    }

    #[test]
    fn failed_output_stops_on_terminate_or_drop() {
        let (sender, receiver) = channel();
        sender.send(AudioPlayerCommand::Terminate).unwrap();
        assert!(!fail_next_request(
            &receiver,
            PhoenixError::FailedToCreateAudioSink
        ));
        drop(sender);
        assert!(!fail_next_request(
            &receiver,
            PhoenixError::FailedToCreateAudioSink
        ));
    }
}
