use crate::error::{PhoenixError, PhoenixResult};
use crate::session::Session;
use bytes::Bytes;
use serde::{Deserialize, Serialize};

pub const MIN_SPEED: f32 = 0.5;
pub const MAX_SPEED: f32 = 2.0;

pub fn clamp_speed(speed: f32) -> f32 {
    if speed.is_nan() {
        return 1.0;
    }
    speed.clamp(MIN_SPEED, MAX_SPEED)
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct TtsRequest {
    /// The text that will get converted into speech.
    pub text: String,
    /// Backend voice name, nova, alloy, echo, fable, onyx or shimmer
    pub voice: String,
    /// Playback speed between 0.5 and 2.0
    pub speed: f32,
}

impl TtsRequest {
    pub fn new(text: &str, voice: &str, speed: f32) -> Self {
        Self {
            text: text.to_owned(),
            voice: voice.to_owned(),
            speed: clamp_speed(speed),
        }
    }
}

/// Voice as listed by the backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TtsVoice {
    pub name: String,
    pub description: Option<String>,
}

// the backend has returned both plain names and objects
#[derive(Deserialize)]
#[serde(untagged)]
enum RawVoice {
    Name(String),
    Detailed {
        #[serde(alias = "id", alias = "voice_id")]
        name: String,
        #[serde(default)]
        description: Option<String>,
    },
}

impl From<RawVoice> for TtsVoice {
    fn from(raw: RawVoice) -> Self {
        match raw {
            RawVoice::Name(name) => TtsVoice {
                name,
                description: None,
            },
            RawVoice::Detailed { name, description } => TtsVoice { name, description },
        }
    }
}

#[derive(Deserialize)]
struct RawVoices {
    #[serde(default)]
    voices: Vec<RawVoice>,
}

pub fn parse_voices(json: &[u8]) -> PhoenixResult<Vec<TtsVoice>> {
    let raw: RawVoices = serde_json::from_slice(json)?;
    Ok(raw.voices.into_iter().map(TtsVoice::from).collect())
}

/// Client for the `/tts` endpoints of the Phoenix backend
#[derive(Debug, Clone)]
pub struct BackendTtsClient {
    client: reqwest::Client,
    session: Session,
}

impl BackendTtsClient {
    pub fn new(session: Session) -> Self {
        BackendTtsClient {
            client: reqwest::Client::new(),
            session,
        }
    }

    fn authorized(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self.session.bearer() {
            Some(bearer) => request.header(reqwest::header::AUTHORIZATION, bearer),
            None => request,
        }
    }

    pub async fn generate(&self, request: &TtsRequest) -> PhoenixResult<Bytes> {
        let resp = self
            .authorized(self.client.post(self.session.endpoint("tts/generate")))
            .header("Content-Type", "application/json")
            .json(request)
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(PhoenixError::TtsBackendStatus(resp.status()));
        }
        Ok(resp.bytes().await?)
    }

    pub async fn voices(&self) -> PhoenixResult<Vec<TtsVoice>> {
        let resp = self
            .authorized(self.client.get(self.session.endpoint("tts/voices")))
            .header("accept", "application/json")
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(PhoenixError::TtsBackendStatus(resp.status()));
        }
        let body = resp.bytes().await?;
        parse_voices(&body)
    }
}
