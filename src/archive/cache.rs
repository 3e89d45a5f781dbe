use crate::archive::error::ArchiveError;
use crate::archive::response::LocationWeatherResponse;
use bincode::config::{Configuration, Fixint, LittleEndian};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::io;
use std::path::{Path, PathBuf};
use tokio::{fs, task};

const CACHE_FILE_PREFIX: &str = "archive-";
const CACHE_FILE_EXTENSION: &str = "bin";
const BINCODE_CONFIG: Configuration<LittleEndian, Fixint> =
    bincode::config::standard().with_fixed_int_encoding();

#[derive(Debug, Serialize, Deserialize)]
struct CacheEntry {
    signature: String,
    responses: Vec<LocationWeatherResponse>,
}

/// On-disk cache of decoded archive responses, keyed by request signature.
///
/// Entries never expire: historical archive data for a fixed date range does not change,
/// so a repeated run with identical parameters is answered from disk.
#[derive(Debug, Clone)]
pub struct ResponseCache {
    dir: PathBuf,
}

impl ResponseCache {
    pub fn new(dir: &Path) -> Self {
        Self {
            dir: dir.to_path_buf(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, signature: &str) -> PathBuf {
        let hash = blake3::hash(signature.as_bytes());
        self.dir.join(format!(
            "{CACHE_FILE_PREFIX}{}.{CACHE_FILE_EXTENSION}",
            hash.to_hex()
        ))
    }

    /// Returns the cached responses for `signature`, or `None` on a miss.
    pub async fn get(
        &self,
        signature: &str,
    ) -> Result<Option<Vec<LocationWeatherResponse>>, ArchiveError> {
        let path = self.path_for(signature);
        let bytes = match fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(ArchiveError::CacheRead(path, e)),
        };

        let decode_path = path.clone();
        let entry = task::spawn_blocking(move || {
            bincode::serde::decode_from_slice::<CacheEntry, _>(&bytes, BINCODE_CONFIG)
                .map(|(entry, _)| entry)
                .map_err(|e| ArchiveError::CacheDecode(decode_path, Box::new(e)))
        })
        .await??;

        if entry.signature != signature {
            warn!(
                "Cache file {} belongs to a different request, ignoring it",
                path.display()
            );
            return Ok(None);
        }
        info!("Cache hit for archive request at {}", path.display());
        Ok(Some(entry.responses))
    }

    /// Stores `responses` under `signature`, creating the cache directory if needed.
    pub async fn put(
        &self,
        signature: &str,
        responses: &[LocationWeatherResponse],
    ) -> Result<(), ArchiveError> {
        fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| ArchiveError::CacheDirCreation(self.dir.clone(), e))?;

        let entry = CacheEntry {
            signature: signature.to_string(),
            responses: responses.to_vec(),
        };
        let bytes = task::spawn_blocking(move || {
            bincode::serde::encode_to_vec(entry, BINCODE_CONFIG)
                .map_err(|e| ArchiveError::CacheEncode(Box::new(e)))
        })
        .await??;

        let path = self.path_for(signature);
        fs::write(&path, &bytes)
            .await
            .map_err(|e| ArchiveError::CacheWrite(path.clone(), e))?;
        info!(
            "Cached {} archive responses ({} bytes) to {}",
            responses.len(),
            bytes.len(),
            path.display()
        );
        Ok(())
    }

    /// Deletes every cached archive response in the cache directory.
    pub async fn clear(&self) -> Result<usize, ArchiveError> {
        let mut entries = match fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(ArchiveError::CacheRead(self.dir.clone(), e)),
        };

        let mut removed = 0;
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| ArchiveError::CacheRead(self.dir.clone(), e))?
        {
            let path = entry.path();
            let is_cache_file = path
                .file_name()
                .and_then(|name| name.to_str())
                .is_some_and(|name| {
                    name.starts_with(CACHE_FILE_PREFIX)
                        && name.ends_with(&format!(".{CACHE_FILE_EXTENSION}"))
                });
            if is_cache_file {
                fs::remove_file(&path)
                    .await
                    .map_err(|e| ArchiveError::CacheDeletion(path.clone(), e))?;
                removed += 1;
            }
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(value: f64) -> LocationWeatherResponse {
        LocationWeatherResponse {
            latitude: 1.0,
            longitude: 2.0,
            utc_offset_seconds: 0,
            start: 0,
            end: 86_400,
            interval: 86_400,
            series: vec![vec![Some(value)], vec![None]],
        }
    }

    #[tokio::test]
    async fn put_then_get_returns_same_responses() -> Result<(), ArchiveError> {
        let dir = tempfile::tempdir().unwrap();
        let cache = ResponseCache::new(&dir.path().join("nested"));
        assert_eq!(cache.get("sig-a").await?, None);

        cache.put("sig-a", &[response(1.5)]).await?;
        assert_eq!(cache.get("sig-a").await?, Some(vec![response(1.5)]));
        assert_eq!(cache.get("sig-b").await?, None);
        Ok(())
    }

    #[tokio::test]
    async fn clear_removes_only_cache_files() -> Result<(), ArchiveError> {
        let dir = tempfile::tempdir().unwrap();
        let cache = ResponseCache::new(dir.path());
        cache.put("sig-a", &[response(1.0)]).await?;
        cache.put("sig-b", &[response(2.0)]).await?;
        std::fs::write(dir.path().join("keep.txt"), b"x").unwrap();

        assert_eq!(cache.clear().await?, 2);
        assert_eq!(cache.get("sig-a").await?, None);
        assert!(dir.path().join("keep.txt").exists());
        Ok(())
    }

    #[tokio::test]
    async fn clear_on_missing_dir_is_a_no_op() -> Result<(), ArchiveError> {
        let dir = tempfile::tempdir().unwrap();
        let cache = ResponseCache::new(&dir.path().join("absent"));
        assert_eq!(cache.clear().await?, 0);
        Ok(())
    }
}
