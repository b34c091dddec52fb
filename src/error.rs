use std::result::Result;
use thiserror::Error;

pub type PhoenixResult<T> = Result<T, PhoenixError>;

#[derive(Error, Debug)]
pub enum PhoenixError {
    #[error("Command {0:?} registered more than once")]
    DuplicateCommand(String),
    #[error("Command name can't be empty")]
    EmptyCommandName,
    #[error("IO error")]
    IoError(#[from] std::io::Error),
    #[error("Yaml serde error")]
    YamlError(#[from] serde_yaml::Error),
    #[error("Json serde error")]
    JsonError(#[from] serde_json::Error),
    #[error("Http request error")]
    HttpError(#[from] reqwest::Error),
    #[error("TTS backend returned status {0}")]
    TtsBackendStatus(reqwest::StatusCode),
    #[error("TTS backend is disabled")]
    TtsBackendDisabled,
    #[error("Audio cache dir error")]
    AudioCacheDirError,
    #[error("Failed to decode audio file")]
    FailedToDecodeAudioFile,
    #[error("Failed to create audio output stream")]
    FailedToCreateAudioOutputStream,
    #[error("Failed to create audio sink")]
    FailedToCreateAudioSink,
    #[error("Built without audio output")]
    AudioOutputDisabled,
    #[error("Audio player is not running")]
    AudioPlayerGone,
    #[error("Local synthesizer exited with {0}")]
    LocalSynthesizerFailed(std::process::ExitStatus),
    #[error("Recognizer error: {0}")]
    RecognizerError(String),
}
