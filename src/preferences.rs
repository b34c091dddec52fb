use crate::configuration::{FallbackVoice, TtsConfig};
use crate::error::PhoenixResult;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::*;

/// Voice settings the user changed at runtime
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoicePreferences {
    pub voice: String,
    pub speed: f32,
    #[serde(default)]
    pub fallback: FallbackVoice,
    /// Microphone sensitivity 1 to 5
    #[serde(default = "default_sensitivity")]
    pub sensitivity: u8,
}

fn default_sensitivity() -> u8 {
    3
}

impl VoicePreferences {
    pub fn from_tts_config(config: &TtsConfig) -> Self {
        Self {
            voice: config.voice.clone(),
            speed: config.speed,
            fallback: config.fallback.clone(),
            sensitivity: default_sensitivity(),
        }
    }

    /// Falls back to `defaults` when the file is missing or unreadable
    pub fn load_or(path: &Path, defaults: VoicePreferences) -> VoicePreferences {
        if !path.exists() {
            return defaults;
        }
        match Self::load(path) {
            Ok(preferences) => {
                info!("Voice preferences loaded from {:?}", path);
                preferences
            }
            Err(err) => {
                warn!("Failed to load voice preferences {:?}: {}", path, err);
                defaults
            }
        }
    }

    pub fn load(path: &Path) -> PhoenixResult<VoicePreferences> {
        let text = fs::read_to_string(path)?;
        Ok(serde_yaml::from_str(&text)?)
    }

    pub fn save(&self, path: &Path) -> PhoenixResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_yaml::to_string(&self)?)?;
        info!("Voice preferences saved to {:?}", path);
        Ok(())
    }

    /// Input gain for the sensitivity slider
    pub fn gain(&self) -> f32 {
        self.sensitivity.clamp(1, 5) as f32 * 0.5
    }

    pub fn apply_to(&self, config: &mut TtsConfig) {
        config.voice = self.voice.clone();
        config.speed = self.speed;
        config.fallback = self.fallback.clone();
    }
}
