use crate::commands::{CommandEntry, CommandTable};
use crate::debounce::DEFAULT_DEBOUNCE_WINDOW;
use crate::error::PhoenixResult;
use crate::listening::ListeningConfig;
use crate::session::Session;
use config::Config;
use serde::{Deserialize, Serialize};
use std::{path::PathBuf, time::Duration};
use tracing::*;

/// Use default config if no path is provided
pub fn get_configuration(config: &Option<PathBuf>) -> Result<AppConfig, anyhow::Error> {
    let settings = if let Some(config) = config {
        info!("Using configuration from {:?}", config);
        Config::builder()
            .add_source(config::File::with_name(
                config
                    .to_str()
                    .ok_or_else(|| anyhow::anyhow!("Failed to convert path"))?,
            ))
            .add_source(environment())
            .build()?
    } else {
        info!("Using dev configuration");
        Config::builder()
            .add_source(config::File::with_name("config/settings"))
            .add_source(config::File::with_name("config/dev_settings").required(false))
            .add_source(environment())
            .build()?
    };

    Ok(settings.try_deserialize()?)
}

/// `APP_BACKEND__TOKEN` sets `backend.token`
fn environment() -> config::Environment {
    config::Environment::with_prefix("APP")
        .prefix_separator("_")
        .separator("__")
}

#[derive(Deserialize, Debug, Clone)]
pub struct AppConfig {
    pub backend: BackendConfig,
    #[serde(default)]
    pub recognition: RecognitionConfig,
    #[serde(default)]
    pub commands: CommandsConfig,
    #[serde(default)]
    pub listening: ListeningConfig,
    pub tts: TtsConfig,
    pub preferences_path: Option<PathBuf>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct BackendConfig {
    pub api_base_url: String,
    pub token: Option<String>,
}

impl BackendConfig {
    pub fn session(&self) -> Session {
        Session::new(&self.api_base_url, self.token.clone())
    }
}

#[derive(Deserialize, Debug, Clone)]
pub struct RecognitionConfig {
    /// Alternatives per result that are matched against commands
    pub max_alternatives: usize,
}

impl Default for RecognitionConfig {
    fn default() -> Self {
        Self {
            max_alternatives: 5,
        }
    }
}

#[derive(Deserialize, Debug, Clone)]
pub struct CommandsConfig {
    #[serde(default = "default_fuzzy_match")]
    pub fuzzy_match: bool,
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
    /// Replaces the builtin command table when set
    #[serde(default)]
    pub table: Option<Vec<CommandEntry>>,
}

fn default_fuzzy_match() -> bool {
    true
}

fn default_debounce_ms() -> u64 {
    DEFAULT_DEBOUNCE_WINDOW.as_millis() as u64
}

impl Default for CommandsConfig {
    fn default() -> Self {
        Self {
            fuzzy_match: default_fuzzy_match(),
            debounce_ms: default_debounce_ms(),
            table: None,
        }
    }
}

impl CommandsConfig {
    pub fn command_table(&self) -> PhoenixResult<CommandTable> {
        match &self.table {
            Some(entries) => CommandTable::new(entries.clone()),
            None => Ok(CommandTable::builtin()),
        }
    }

    pub fn debounce_window(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

#[derive(Deserialize, Debug, Clone)]
pub struct TtsConfig {
    /// Synthesize through the backend, local synthesizer is only a fallback
    #[serde(default = "default_use_backend")]
    pub use_backend: bool,
    pub voice: String,
    pub speed: f32,
    pub cache_dir_path: Option<String>,
    #[serde(default)]
    pub fallback: FallbackVoice,
}

fn default_use_backend() -> bool {
    true
}

/// Settings of the local synthesizer
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct FallbackVoice {
    #[serde(default = "default_fallback_program")]
    pub program: String,
    pub voice: String,
    pub rate: f32,
    pub pitch: f32,
    pub volume: f32,
}

fn default_fallback_program() -> String {
    String::from("espeak")
}

impl Default for FallbackVoice {
    fn default() -> Self {
        Self {
            program: default_fallback_program(),
            voice: String::from("en-us"),
            rate: 1.0,
            pitch: 1.0,
            volume: 1.0,
        }
    }
}
