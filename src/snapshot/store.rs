//! Snapshot caching
//!
//! A [`SnapshotStore`] is an opaque key-value medium for whole worlds.
//! [`load_or_generate`] tries the cache first and falls back to generation;
//! store failures are logged and never reach the caller.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::config::WorldConfig;
use crate::error::{PersistError, Result};
use crate::generation::generate_world;
use crate::terrain::BrightnessSampler;

use super::WorldSnapshot;

/// Storage backend for generated worlds
pub trait SnapshotStore {
    /// Load the snapshot stored under `key`
    ///
    /// `Ok(None)` means nothing is stored. A stored but invalid snapshot is
    /// `Err(PersistError::Corrupt)`.
    fn load(&self, key: &str) -> std::result::Result<Option<WorldSnapshot>, PersistError>;

    /// Store `snapshot` under `key`, replacing any previous value
    fn save(&self, key: &str, snapshot: &WorldSnapshot) -> std::result::Result<(), PersistError>;
}

/// One `<key>.json` file per world under a directory
///
/// Files are written to a temporary name and renamed into place, so a reader
/// never sees half a snapshot.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    /// Create a store rooted at `dir`; the directory is created on first save
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    #[inline]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }

    /// Delete the file for `key` if it exists
    pub fn remove(&self, key: &str) -> io::Result<()> {
        match fs::remove_file(self.path_for(key)) {
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            other => other,
        }
    }
}

impl SnapshotStore for JsonFileStore {
    fn load(&self, key: &str) -> std::result::Result<Option<WorldSnapshot>, PersistError> {
        let text = match fs::read_to_string(self.path_for(key)) {
            Ok(text) => text,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };
        Ok(Some(WorldSnapshot::from_json(&text)?))
    }

    fn save(&self, key: &str, snapshot: &WorldSnapshot) -> std::result::Result<(), PersistError> {
        fs::create_dir_all(&self.dir)?;
        let json = snapshot.to_json()?;

        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }
}

/// In-memory store holding encoded snapshots
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store raw text under `key`, bypassing encoding
    pub fn insert_raw(&self, key: &str, text: impl Into<String>) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.insert(key.to_string(), text.into());
        }
    }

    /// Raw text stored under `key`
    pub fn raw(&self, key: &str) -> Option<String> {
        self.entries.lock().ok()?.get(key).cloned()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|entries| entries.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl SnapshotStore for MemoryStore {
    fn load(&self, key: &str) -> std::result::Result<Option<WorldSnapshot>, PersistError> {
        match self.raw(key) {
            Some(text) => Ok(Some(WorldSnapshot::from_json(&text)?)),
            None => Ok(None),
        }
    }

    fn save(&self, key: &str, snapshot: &WorldSnapshot) -> std::result::Result<(), PersistError> {
        let json = snapshot.to_json()?;
        self.insert_raw(key, json);
        Ok(())
    }
}

/// Storage key for a world generated from `config`
///
/// Image-sampled worlds are keyed by the reference fingerprint, so different
/// pictures never share an entry. `None` when the reference has no
/// fingerprint and the world must not be cached.
pub fn snapshot_key(
    config: &WorldConfig,
    reference: Option<&dyn BrightnessSampler>,
) -> Option<String> {
    match reference {
        None => Some(format!("{}-procedural", config.cache_key())),
        Some(sampler) => {
            let fingerprint = sampler.fingerprint()?;
            Some(format!("{}-image-{:016x}", config.cache_key(), fingerprint))
        }
    }
}

/// Where the world returned by [`load_or_generate`] came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheOutcome {
    /// Loaded from the store
    Hit,
    /// Generated; `reason` says why the store could not serve it
    Regenerated { reason: String },
}

/// Load a cached world or generate (and cache) a fresh one
///
/// # Errors
///
/// Only generation errors are returned. Store failures on either side are
/// logged at warn level.
///
/// # Example
///
/// ```
/// use geodesic_conquest::*;
///
/// let config = WorldConfigBuilder::new().resolution(2).unwrap().build().unwrap();
/// let store = MemoryStore::new();
///
/// let (first, outcome) = load_or_generate(&config, &store, None).unwrap();
/// assert!(matches!(outcome, CacheOutcome::Regenerated { .. }));
///
/// let (second, outcome) = load_or_generate(&config, &store, None).unwrap();
/// assert_eq!(outcome, CacheOutcome::Hit);
/// assert_eq!(first, second);
/// ```
pub fn load_or_generate(
    config: &WorldConfig,
    store: &dyn SnapshotStore,
    reference: Option<&dyn BrightnessSampler>,
) -> Result<(WorldSnapshot, CacheOutcome)> {
    let key = match snapshot_key(config, reference) {
        Some(key) => key,
        None => {
            log::debug!("reference has no fingerprint, generating without the cache");
            let snapshot = generate_world(config, reference)?;
            let reason = "reference cannot be cached".to_string();
            return Ok((snapshot, CacheOutcome::Regenerated { reason }));
        }
    };

    let reason = match store.load(&key) {
        Ok(Some(snapshot)) => {
            log::debug!("loaded cached world `{}` ({} cells)", key, snapshot.len());
            return Ok((snapshot, CacheOutcome::Hit));
        }
        Ok(None) => "not cached".to_string(),
        Err(PersistError::Corrupt(err)) => {
            log::warn!("cached world `{}` is corrupt, regenerating: {}", key, err);
            format!("corrupt: {}", err)
        }
        Err(err) => {
            log::warn!("failed to load cached world `{}`: {}", key, err);
            format!("load failed: {}", err)
        }
    };

    let snapshot = generate_world(config, reference)?;

    if let Err(err) = store.save(&key, &snapshot) {
        log::warn!("failed to cache world `{}`: {}", key, err);
    }

    Ok((snapshot, CacheOutcome::Regenerated { reason }))
}
