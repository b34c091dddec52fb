use crate::configuration::FallbackVoice;
use crate::error::{PhoenixError, PhoenixResult};
use tokio::process::Command;

const DEFAULT_WORDS_PER_MINUTE: f32 = 175.0;
const DEFAULT_PITCH: f32 = 50.0;
const DEFAULT_AMPLITUDE: f32 = 100.0;

/// Speaks through a local espeak compatible program
#[derive(Debug, Clone)]
pub struct LocalSynthesizer {
    settings: FallbackVoice,
}

impl LocalSynthesizer {
    pub fn new(settings: FallbackVoice) -> Self {
        Self { settings }
    }

    fn arguments(&self, text: &str) -> Vec<String> {
        let words_per_minute = (DEFAULT_WORDS_PER_MINUTE * self.settings.rate).clamp(80.0, 450.0);
        let pitch = (DEFAULT_PITCH * self.settings.pitch).clamp(0.0, 99.0);
        let amplitude = (DEFAULT_AMPLITUDE * self.settings.volume).clamp(0.0, 200.0);
        vec![
            String::from("-v"),
            self.settings.voice.clone(),
            String::from("-s"),
            format!("{}", words_per_minute.round() as u32),
            String::from("-p"),
            format!("{}", pitch.round() as u32),
            String::from("-a"),
            format!("{}", amplitude.round() as u32),
            String::from("--"),
            text.to_owned(),
        ]
    }

    pub async fn say(&self, text: &str) -> PhoenixResult<()> {
        let status = Command::new(&self.settings.program)
            .args(self.arguments(text))
            .kill_on_drop(true)
            .status()
            .await?;
        if !status.success() {
            return Err(PhoenixError::LocalSynthesizerFailed(status));
        }
        Ok(())
    }
}
