use super::Playable;
use crate::error::{PhoenixError, PhoenixResult};
use std::fs::{self, File};
use std::io::prelude::*;
use std::path::{Path, PathBuf};
use tracing::*;

/// Synthesized speech stored on disk by request hash
pub(crate) struct AudioCache {
    cache_dir_path: PathBuf,
}

impl AudioCache {
    pub(crate) fn new(cache_dir_path: impl AsRef<Path>) -> PhoenixResult<AudioCache> {
        let path = cache_dir_path.as_ref();
        fs::create_dir_all(path)?;
        if !path.is_dir() {
            return Err(PhoenixError::AudioCacheDirError);
        }
        Ok(AudioCache {
            cache_dir_path: path.to_owned(),
        })
    }

    fn file_path(&self, key: &str) -> PathBuf {
        self.cache_dir_path.join(format!("{}.mp3", key))
    }

    /// Empty files count as missing
    pub(crate) fn get(&self, key: &str) -> Option<Box<dyn Playable>> {
        let file = File::open(self.file_path(key)).ok()?;
        match file.metadata() {
            Ok(metadata) if metadata.len() > 0 => Some(Box::new(file)),
            _ => {
                warn!("Ignoring empty cache entry {}", key);
                None
            }
        }
    }

    /// Entries are written to a temporary file first so readers never see
    /// partial audio. Empty audio isn't stored.
    pub(crate) fn set(&self, key: &str, contents: &[u8]) -> PhoenixResult<()> {
        if contents.is_empty() {
            warn!("Not caching empty audio for {}", key);
            return Ok(());
        }
        let file_path = self.file_path(key);
        let partial_path = file_path.with_extension("mp3.partial");
        let mut file = File::create(&partial_path)?;
        file.write_all(contents)?;
        file.flush()?;
        fs::rename(&partial_path, &file_path)?;
        Ok(())
    }
}
