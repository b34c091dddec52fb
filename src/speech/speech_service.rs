use super::audio_cache::AudioCache;
use super::backend_tts_client::{BackendTtsClient, TtsRequest};
use super::local_synthesizer::LocalSynthesizer;
use super::{AudioPlayer, Playable, Speaker};
use crate::configuration::TtsConfig;
use crate::error::{PhoenixError, PhoenixResult};
use crate::session::Session;
use async_trait::async_trait;
use sha2::{Digest, Sha256};
use std::io::Cursor;
use tracing::*;

// Used to invalidate old cache
const BACKEND_FORMAT_VERSION: u32 = 1;

fn hash_backend_tts(request: &TtsRequest) -> String {
    let mut hasher = Sha256::new();
    hasher.update(&request.text);
    hasher.update(&request.voice);
    hasher.update(request.speed.to_be_bytes());
    hasher.update(BACKEND_FORMAT_VERSION.to_be_bytes());
    let hashed = hasher.finalize();
    format!("{}-{:x}", request.voice, hashed)
}

/// Speaks through the backend TTS and falls back to the local synthesizer
pub struct SpeechService {
    backend_client: BackendTtsClient,
    backend_enabled: bool,
    audio_cache: Option<AudioCache>,
    player: AudioPlayer,
    local_synthesizer: LocalSynthesizer,
    voice: String,
    speed: f32,
}

impl SpeechService {
    pub fn new(session: Session, config: &TtsConfig) -> PhoenixResult<SpeechService> {
        let audio_cache = match &config.cache_dir_path {
            Some(path) => Some(AudioCache::new(path)?),
            None => None,
        };

        Ok(SpeechService {
            backend_client: BackendTtsClient::new(session),
            backend_enabled: config.use_backend,
            audio_cache,
            player: AudioPlayer::new(),
            local_synthesizer: LocalSynthesizer::new(config.fallback.clone()),
            voice: config.voice.clone(),
            speed: config.speed,
        })
    }

    pub fn backend_enabled(&self) -> bool {
        self.backend_enabled
    }

    /// Disables backend synthesis when the voice list can't be fetched
    pub async fn probe_backend(&mut self) -> bool {
        if !self.backend_enabled {
            return false;
        }
        info!("Testing backend TTS connection");
        match self.backend_client.voices().await {
            Ok(voices) => {
                let names: Vec<&str> = voices.iter().map(|voice| voice.name.as_str()).collect();
                info!("Backend TTS available with voices {:?}", names);
            }
            Err(err) => {
                warn!("Backend TTS unavailable, using local fallback: {}", err);
                self.backend_enabled = false;
            }
        }
        self.backend_enabled
    }

    async fn say_with_backend(&self, text: &str) -> PhoenixResult<()> {
        if !self.backend_enabled {
            return Err(PhoenixError::TtsBackendDisabled);
        }
        let request = TtsRequest::new(text, &self.voice, self.speed);

        let sound: Box<dyn Playable> = if let Some(ref audio_cache) = self.audio_cache {
            let file_key = hash_backend_tts(&request);
            if let Some(file) = audio_cache.get(&file_key) {
                info!("Using cached value with key {}", file_key);
                file
            } else {
                info!("Writing new file with key {}", file_key);
                let data = self.backend_client.generate(&request).await?;
                audio_cache.set(&file_key, &data)?;
                Box::new(Cursor::new(data.to_vec()))
            }
        } else {
            let data = self.backend_client.generate(&request).await?;
            Box::new(Cursor::new(data.to_vec()))
        };
        self.player.play(sound).await?;
        info!("Backend TTS complete");
        Ok(())
    }

    async fn say_locally(&self, text: &str) {
        info!("Falling back to local TTS");
        match self.local_synthesizer.say(text).await {
            Ok(()) => info!("Local TTS complete"),
            Err(err) => error!("Local TTS failed: {}", err),
        }
    }

    pub async fn say(&self, text: &str) -> PhoenixResult<()> {
        let text = text.trim();
        if text.is_empty() {
            warn!("Empty text, skipping speech");
            return Ok(());
        }
        info!("Speaking: {:?}", text);
        if self.backend_enabled {
            match self.say_with_backend(text).await {
                Ok(()) => return Ok(()),
                Err(err) => error!("Backend TTS failed: {}", err),
            }
        }
        self.say_locally(text).await;
        Ok(())
    }
}

#[async_trait]
impl Speaker for SpeechService {
    async fn speak(&self, text: &str) -> PhoenixResult<()> {
        self.say(text).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::configuration::FallbackVoice;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    fn config(use_backend: bool) -> TtsConfig {
        TtsConfig {
            use_backend,
            voice: "nova".to_owned(),
            speed: 1.0,
            cache_dir_path: None,
            fallback: FallbackVoice {
                program: "phoenix-definitely-missing-synthesizer".to_owned(),
                ..FallbackVoice::default()
            },
        }
    }

    #[test]
    fn cache_key_depends_on_voice_and_speed() {
        let base = hash_backend_tts(&TtsRequest::new("hello", "nova", 1.0));
        assert!(base.starts_with("nova-"));
        assert_eq!(base, hash_backend_tts(&TtsRequest::new("hello", "nova", 1.0)));
        assert_ne!(base, hash_backend_tts(&TtsRequest::new("hello", "nova", 1.5)));
        assert_ne!(base, hash_backend_tts(&TtsRequest::new("hello", "alloy", 1.0)));
    }

    #[tokio::test]
    async fn local_failure_does_not_fail_speech() {
        let session = Session::new("http://127.0.0.1:9/api", None);
        let service = SpeechService::new(session, &config(false)).unwrap();
        assert!(!service.backend_enabled());
        service.say("hello").await.unwrap();
        service.say("   ").await.unwrap();
    }

    /// Answers one request with `body` and returns the raw request
    async fn serve_once(body: &'static [u8]) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap();
        let server = tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let mut request = vec![];
            let mut buffer = [0; 1024];
            while !request_complete(&request) {
                let read = stream.read(&mut buffer).await.unwrap();
                if read == 0 {
                    break;
                }
                request.extend_from_slice(&buffer[..read]);
            }
            let header = format!(
                "HTTP/1.1 200 OK\r\ncontent-type: audio/mpeg\r\ncontent-length: {}\r\nconnection: close\r\n\r\n",
                body.len()
            );
            stream.write_all(header.as_bytes()).await.unwrap();
            stream.write_all(body).await.unwrap();
            stream.shutdown().await.unwrap();
            String::from_utf8_lossy(&request).to_lowercase()
        });
        (format!("http://{}/api", address), server)
    }

    fn request_complete(request: &[u8]) -> bool {
        let text = String::from_utf8_lossy(request).to_lowercase();
        let Some(header_end) = text.find("\r\n\r\n") else {
            return false;
        };
        let content_length = text[..header_end]
            .lines()
            .find_map(|line| line.strip_prefix("content-length:"))
            .and_then(|value| value.trim().parse::<usize>().ok())
            .unwrap_or(0);
        request.len() >= header_end + 4 + content_length
    }

    #[cfg(all(unix, not(feature = "audio")))]
    #[tokio::test]
    async fn backend_audio_without_output_is_spoken_locally() {
        use std::fs;
        use std::os::unix::fs::PermissionsExt;
        use tempdir::TempDir;

        let (api_base_url, server) = serve_once(b"ID3\x04").await;

        // records the text argument, which comes last
        let dir = TempDir::new("phoenix_speech").unwrap();
        let spoken = dir.path().join("spoken");
        let synthesizer = dir.path().join("synthesizer.sh");
        fs::write(
            &synthesizer,
            format!(
                "#!/bin/sh\nfor last; do :; done\necho \"$last\" > '{}'\n",
                spoken.display()
            ),
        )
        .unwrap();
        fs::set_permissions(&synthesizer, fs::Permissions::from_mode(0o755)).unwrap();

        let mut tts = config(true);
        tts.fallback.program = synthesizer.to_string_lossy().to_string();
        let session = Session::new(&api_base_url, Some("secret-token".to_owned()));
        let service = SpeechService::new(session, &tts).unwrap();

        service.say("Going to standby mode.").await.unwrap();

        let request = server.await.unwrap();
        assert!(request.starts_with("post /api/tts/generate "));
        assert!(request.contains("authorization: bearer secret-token"));
        assert!(request.contains(r#""voice":"nova""#));
        assert_eq!(
            fs::read_to_string(&spoken).unwrap().trim(),
            "Going to standby mode."
        );
    }

    #[tokio::test]
    async fn unreachable_backend_is_disabled_by_probe() {
        let session = Session::new("http://127.0.0.1:9/api", None);
        let mut service = SpeechService::new(session, &config(true)).unwrap();
        assert!(service.backend_enabled());
        assert!(!service.probe_backend().await);
        assert!(!service.backend_enabled());
    }
}
