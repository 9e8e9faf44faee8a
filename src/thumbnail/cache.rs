//! Thumbnail cache: lookup, single-flight generation and atomic persistence
//!
//! `resolve` never fails. Whatever goes wrong (unsafe name, unreadable
//! source, undecodable image, unwritable cache) is logged and answered with
//! the path of the source image itself, so the caller always has something
//! to render.
//!
//! Failures are not remembered. A key that failed stays absent and the next
//! resolution retries it from scratch.

use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Instant;

use tokio::sync::Mutex as AsyncMutex;
use tracing::{debug, info, warn};

use super::generator::{JpegThumbnailer, ThumbnailGenerator};
use super::key::CacheKey;
use super::ThumbnailSpec;
use crate::config::Config;
use crate::errors::{GenerationError, ResolveError};

type InFlight = Arc<Mutex<HashMap<CacheKey, FlightEntry>>>;

/// Per-key lock plus the number of callers currently holding a guard for it
#[derive(Default)]
struct FlightEntry {
    lock: Arc<AsyncMutex<()>>,
    members: usize,
}

#[derive(Clone)]
pub struct ThumbnailCache {
    source_dir: PathBuf,
    cache_dir: PathBuf,
    spec: ThumbnailSpec,
    generator: Arc<dyn ThumbnailGenerator>,
    in_flight: InFlight,
}

impl std::fmt::Debug for ThumbnailCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ThumbnailCache")
            .field("source_dir", &self.source_dir)
            .field("cache_dir", &self.cache_dir)
            .field("spec", &self.spec)
            .finish_non_exhaustive()
    }
}

impl ThumbnailCache {
    pub fn new(source_dir: PathBuf, cache_dir: PathBuf, spec: ThumbnailSpec) -> Self {
        Self::with_generator(source_dir, cache_dir, spec, Arc::new(JpegThumbnailer))
    }

    pub fn with_generator(
        source_dir: PathBuf,
        cache_dir: PathBuf,
        spec: ThumbnailSpec,
        generator: Arc<dyn ThumbnailGenerator>,
    ) -> Self {
        Self {
            source_dir,
            cache_dir,
            spec,
            generator,
            in_flight: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.storage.gallery_dir.clone(),
            config.storage.cache_dir.clone(),
            config.thumbnail_spec(),
        )
    }

    pub async fn ensure_cache_dir(&self) -> Result<(), std::io::Error> {
        tokio::fs::create_dir_all(&self.cache_dir).await
    }

    pub fn source_dir(&self) -> &Path {
        &self.source_dir
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    pub fn spec(&self) -> &ThumbnailSpec {
        &self.spec
    }

    /// Location of a source image, used as the fallback
    pub fn source_path(&self, filename: &str) -> PathBuf {
        self.source_dir.join(filename)
    }

    /// Resolve with the configured thumbnail size
    pub async fn resolve(&self, filename: &str) -> PathBuf {
        let spec = self.spec;
        self.resolve_with(filename, &spec).await
    }

    /// Path of the thumbnail for `filename` at `spec`, generating it on first
    /// use. Falls back to the source path on any failure.
    pub async fn resolve_with(&self, filename: &str, spec: &ThumbnailSpec) -> PathBuf {
        match self.try_resolve(filename, spec).await {
            Ok(path) => path,
            Err(e) => {
                warn!(
                    filename = %filename,
                    reason = e.kind(),
                    "Could not create thumbnail, serving original: {}",
                    e
                );
                self.source_path(filename)
            }
        }
    }

    async fn try_resolve(
        &self,
        filename: &str,
        spec: &ThumbnailSpec,
    ) -> Result<PathBuf, ResolveError> {
        let key = CacheKey::new(spec.max_width, spec.max_height, filename)?;
        let target = self.cache_dir.join(key.artifact_name());

        if artifact_exists(&target).await {
            debug!("Thumbnail cache hit: {}", key);
            return Ok(target);
        }

        let flight = self.join_flight(key);
        let permit = flight.lock.clone().lock_owned().await;

        // another caller may have finished while we waited
        if artifact_exists(&target).await {
            debug!("Thumbnail produced by concurrent request: {}", flight.key);
            return Ok(target);
        }

        let job = GenerationJob {
            source: self.source_path(filename),
            cache_dir: self.cache_dir.clone(),
            target: target.clone(),
            spec: *spec,
            generator: Arc::clone(&self.generator),
        };

        // Detached from this future: a dropped request does not cancel the
        // work, and the key stays locked until the artifact is on disk.
        tokio::task::spawn_blocking(move || {
            let started = Instant::now();
            let result = job.run();
            if result.is_ok() {
                info!(
                    "Generated thumbnail {} in {}ms",
                    flight.key,
                    started.elapsed().as_millis()
                );
            }
            drop(permit);
            drop(flight);
            result
        })
        .await
        .map_err(|e| GenerationError::TaskFailed(e.to_string()))??;

        Ok(target)
    }

    fn join_flight(&self, key: CacheKey) -> FlightGuard {
        let mut in_flight = self
            .in_flight
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let entry = in_flight.entry(key.clone()).or_default();
        entry.members += 1;
        let lock = Arc::clone(&entry.lock);
        FlightGuard {
            key,
            lock,
            in_flight: Arc::clone(&self.in_flight),
        }
    }

    #[cfg(test)]
    fn in_flight_len(&self) -> usize {
        self.in_flight
            .lock()
            .map(|map| map.len())
            .unwrap_or_default()
    }
}

/// Membership in the single-flight group for one key. Joining and leaving
/// both happen under the map lock, so the last member to leave always
/// removes the key.
struct FlightGuard {
    key: CacheKey,
    lock: Arc<AsyncMutex<()>>,
    in_flight: InFlight,
}

impl Drop for FlightGuard {
    fn drop(&mut self) {
        let mut in_flight = self
            .in_flight
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let last = match in_flight.get_mut(&self.key) {
            Some(entry) => {
                entry.members = entry.members.saturating_sub(1);
                entry.members == 0
            }
            None => false,
        };
        if last {
            in_flight.remove(&self.key);
        }
    }
}

struct GenerationJob {
    source: PathBuf,
    cache_dir: PathBuf,
    target: PathBuf,
    spec: ThumbnailSpec,
    generator: Arc<dyn ThumbnailGenerator>,
}

impl GenerationJob {
    fn run(self) -> Result<(), ResolveError> {
        let bytes = std::fs::read(&self.source).map_err(|source| {
            ResolveError::SourceUnreadable {
                path: self.source.clone(),
                source,
            }
        })?;
        let encoded = self.generator.generate(&bytes, &self.spec)?;
        persist_atomically(&self.cache_dir, &self.target, &encoded)
    }
}

async fn artifact_exists(path: &Path) -> bool {
    tokio::fs::metadata(path)
        .await
        .map(|metadata| metadata.is_file())
        .unwrap_or(false)
}

/// Write to a temp file in the cache directory and rename it into place, so
/// readers only ever see a missing or a complete artifact.
fn persist_atomically(cache_dir: &Path, target: &Path, bytes: &[u8]) -> Result<(), ResolveError> {
    let persist_failed = |source: std::io::Error| ResolveError::PersistFailed {
        path: target.to_path_buf(),
        source,
    };

    let mut file = tempfile::Builder::new()
        .prefix(".thumb-")
        .suffix(".tmp")
        .tempfile_in(cache_dir)
        .map_err(persist_failed)?;
    file.write_all(bytes).map_err(persist_failed)?;
    file.as_file().sync_all().map_err(persist_failed)?;
    file.persist(target).map_err(|e| persist_failed(e.error))?;
    Ok(())
}
