use super::Playable;
use crate::error::{PhoenixError, PhoenixResult};
use std::io::{Seek, SeekFrom};
use tracing::*;

/// Stand in player for builds without the `audio` feature.
///
/// Playing always fails so that callers fall back to another voice.
#[derive(Default)]
pub struct AudioPlayer {}

impl AudioPlayer {
    pub fn new() -> Self {
        AudioPlayer {}
    }

    pub async fn play(&self, mut sound: Box<dyn Playable>) -> PhoenixResult<()> {
        let length = sound.seek(SeekFrom::End(0))?;
        warn!("Audio output disabled, can't play {} bytes of audio", length);
        Err(PhoenixError::AudioOutputDisabled)
    }
}
