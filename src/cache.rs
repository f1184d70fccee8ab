//! Caching of parsed availability data.
//!
//! Parsing a full `HD.dat` takes a while, so the resulting mapping can be
//! snapshotted to disk and reused. The parse step only sees the
//! [`CacheProvider`] trait, so callers decide where (or whether) the
//! mapping is kept.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::record::CallSignAvailability;

/// Somewhere a parsed mapping can be loaded from and stored to.
pub trait CacheProvider {
    /// Load a cached mapping. `Ok(None)` means there is nothing usable.
    fn load(&self) -> Result<Option<CallSignAvailability>>;

    /// Store a freshly parsed mapping.
    fn store(&self, availability: &CallSignAvailability) -> Result<()>;
}

/// Return the cached mapping if there is one, otherwise run `compute` and
/// offer its result to the cache.
///
/// A cache that fails to load is treated as empty and a cache that fails to
/// store is only logged; errors from `compute` are returned as-is.
pub fn load_or_parse<C, F>(cache: &C, compute: F) -> Result<CallSignAvailability>
where
    C: CacheProvider + ?Sized,
    F: FnOnce() -> Result<CallSignAvailability>,
{
    match cache.load() {
        Ok(Some(availability)) => {
            info!("Loaded {} call signs from cache", availability.len());
            return Ok(availability);
        }
        Ok(None) => debug!("No usable cache, parsing source"),
        Err(e) => warn!("Ignoring unreadable cache: {:#}", e),
    }

    let availability = compute()?;
    match cache.store(&availability) {
        Ok(()) => info!("Cached {} call signs", availability.len()),
        Err(e) => warn!("Failed to write cache: {:#}", e),
    }
    Ok(availability)
}

/// Path, size and modification time of the source file a snapshot was
/// built from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceFingerprint {
    pub path: PathBuf,
    pub len: u64,
    pub modified: Option<DateTime<Utc>>,
}

impl SourceFingerprint {
    /// Fingerprint a file on disk.
    pub fn of(path: &Path) -> Result<Self> {
        let metadata = std::fs::metadata(path)
            .with_context(|| format!("Failed to stat source file: {}", path.display()))?;
        Ok(Self {
            path: path.to_path_buf(),
            len: metadata.len(),
            modified: metadata.modified().ok().map(DateTime::<Utc>::from),
        })
    }
}

/// On-disk snapshot format.
#[derive(Debug, Serialize, Deserialize)]
struct Snapshot {
    cached_at: DateTime<Utc>,
    source: SourceFingerprint,
    entries: CallSignAvailability,
}

/// JSON snapshot tied to the source file it was parsed from.
///
/// The snapshot is ignored when it was built from a different source path,
/// or when the source file's size or modification time no longer match. If
/// the source file is gone the snapshot is still used.
#[derive(Debug, Clone)]
pub struct JsonFileCache {
    path: PathBuf,
    source: PathBuf,
}

impl JsonFileCache {
    pub fn new(path: impl Into<PathBuf>, source: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            source: source.into(),
        }
    }

    /// Path of the snapshot file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CacheProvider for JsonFileCache {
    fn load(&self) -> Result<Option<CallSignAvailability>> {
        if !self.path.exists() {
            return Ok(None);
        }

        let contents = std::fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read cache file: {}", self.path.display()))?;
        let snapshot: Snapshot = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse cache file: {}", self.path.display()))?;

        match SourceFingerprint::of(&self.source) {
            Ok(current) if current != snapshot.source => {
                info!(
                    "Cache {} is stale, built from {} but source is {}",
                    self.path.display(),
                    snapshot.source.path.display(),
                    self.source.display()
                );
                Ok(None)
            }
            Ok(_) => {
                debug!("Using cache written at {}", snapshot.cached_at);
                Ok(Some(snapshot.entries))
            }
            Err(e) => {
                debug!("Using cache without source check: {:#}", e);
                Ok(Some(snapshot.entries))
            }
        }
    }

    fn store(&self, availability: &CallSignAvailability) -> Result<()> {
        let snapshot = Snapshot {
            cached_at: Utc::now(),
            source: SourceFingerprint::of(&self.source)?,
            entries: availability.clone(),
        };

        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create cache directory: {}", parent.display())
            })?;
        }

        let contents = serde_json::to_string(&snapshot)?;
        std::fs::write(&self.path, contents)
            .with_context(|| format!("Failed to write cache file: {}", self.path.display()))?;
        Ok(())
    }
}

/// Cache that never holds anything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCache;

impl CacheProvider for NoCache {
    fn load(&self) -> Result<Option<CallSignAvailability>> {
        Ok(None)
    }

    fn store(&self, _availability: &CallSignAvailability) -> Result<()> {
        Ok(())
    }
}

/// Wrapper that skips loading but still stores, forcing a reparse that
/// refreshes the inner cache.
#[derive(Debug, Clone)]
pub struct Refresh<C>(pub C);

impl<C: CacheProvider> CacheProvider for Refresh<C> {
    fn load(&self) -> Result<Option<CallSignAvailability>> {
        Ok(None)
    }

    fn store(&self, availability: &CallSignAvailability) -> Result<()> {
        self.0.store(availability)
    }
}
