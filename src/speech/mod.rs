// Handle compiling without alsa for cross compilation

mod audio_cache;
mod backend_tts_client;
mod local_synthesizer;
mod speech_service;

#[cfg(feature = "audio")]
mod audio_player;
#[cfg(feature = "audio")]
use audio_player::AudioPlayer;

#[cfg(not(feature = "audio"))]
mod fake_audio_player;
#[cfg(not(feature = "audio"))]
use fake_audio_player::AudioPlayer;

pub use backend_tts_client::{BackendTtsClient, TtsRequest, TtsVoice};
pub use local_synthesizer::LocalSynthesizer;
pub use speech_service::SpeechService;

use crate::error::PhoenixResult;
use async_trait::async_trait;
use std::{fs::File, io::Cursor};

pub trait Playable: std::io::Read + std::io::Seek + Send + Sync {}

impl Playable for Cursor<Vec<u8>> {}
impl Playable for File {}

/// Anything that can voice a response
#[async_trait]
pub trait Speaker: Send + Sync {
    /// Resolves once the text was spoken
    async fn speak(&self, text: &str) -> PhoenixResult<()>;
}
