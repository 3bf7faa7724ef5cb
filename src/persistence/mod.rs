//! Progress stores
//!
//! The simulation only touches persistence at session boundaries. Stores:
//! - [`MemoryStore`]: in-process, for tests and headless runs
//! - [`JsonFileStore`]: JSON file written via tmp + rename (native)
//! - [`LocalStorageStore`]: browser LocalStorage (wasm32)

use crate::progress::SavedProgress;

/// Why progress could not be loaded or saved
#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    #[error("storage I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed progress data: {0}")]
    Format(#[from] serde_json::Error),
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

/// Backing store for meta progress
pub trait ProgressStore {
    /// Load saved progress; a store with nothing saved yields the default
    fn load_progress(&self) -> Result<SavedProgress, PersistenceError>;
    fn save_progress(&mut self, progress: &SavedProgress) -> Result<(), PersistenceError>;
}

/// Load progress, falling back to a fresh profile on any error
pub fn load_or_default(store: &dyn ProgressStore) -> SavedProgress {
    match store.load_progress() {
        Ok(progress) => progress,
        Err(e) => {
            log::warn!("Could not load progress, starting fresh: {}", e);
            SavedProgress::default()
        }
    }
}

/// Save progress, logging (not propagating) failures
pub fn save_or_warn(store: &mut dyn ProgressStore, progress: &SavedProgress) -> bool {
    match store.save_progress(progress) {
        Ok(()) => true,
        Err(e) => {
            log::warn!("Could not save progress: {}", e);
            false
        }
    }
}

/// Keeps the serialized JSON in memory
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    json: Option<String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from raw JSON (possibly malformed)
    pub fn with_json(json: impl Into<String>) -> Self {
        Self {
            json: Some(json.into()),
        }
    }

    pub fn json(&self) -> Option<&str> {
        self.json.as_deref()
    }
}

impl ProgressStore for MemoryStore {
    fn load_progress(&self) -> Result<SavedProgress, PersistenceError> {
        match &self.json {
            Some(json) => Ok(serde_json::from_str(json)?),
            None => Ok(SavedProgress::default()),
        }
    }

    fn save_progress(&mut self, progress: &SavedProgress) -> Result<(), PersistenceError> {
        self.json = Some(serde_json::to_string(progress)?);
        Ok(())
    }
}

#[cfg(not(target_arch = "wasm32"))]
pub use file::JsonFileStore;

#[cfg(not(target_arch = "wasm32"))]
mod file {
    use std::fs;
    use std::io::ErrorKind;
    use std::path::{Path, PathBuf};

    use super::{PersistenceError, ProgressStore};
    use crate::progress::SavedProgress;

    /// Progress kept in a JSON file
    #[derive(Debug, Clone)]
    pub struct JsonFileStore {
        path: PathBuf,
    }

    impl JsonFileStore {
        pub fn new(path: impl Into<PathBuf>) -> Self {
            Self { path: path.into() }
        }

        pub fn path(&self) -> &Path {
            &self.path
        }
    }

    impl ProgressStore for JsonFileStore {
        fn load_progress(&self) -> Result<SavedProgress, PersistenceError> {
            match fs::read_to_string(&self.path) {
                Ok(json) => Ok(serde_json::from_str(&json)?),
                Err(e) if e.kind() == ErrorKind::NotFound => Ok(SavedProgress::default()),
                Err(e) => Err(e.into()),
            }
        }

        fn save_progress(&mut self, progress: &SavedProgress) -> Result<(), PersistenceError> {
            let json = serde_json::to_string_pretty(progress)?;
            if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
                fs::create_dir_all(dir)?;
            }
            // Write the new copy next to the old one, then swap
            let tmp = self.path.with_extension("json.tmp");
            fs::write(&tmp, json)?;
            fs::rename(&tmp, &self.path)?;
            log::info!("Progress saved to {}", self.path.display());
            Ok(())
        }
    }
}

#[cfg(target_arch = "wasm32")]
pub use local::LocalStorageStore;

#[cfg(target_arch = "wasm32")]
mod local {
    use super::{PersistenceError, ProgressStore};
    use crate::progress::SavedProgress;

    /// Progress kept under one LocalStorage key
    #[derive(Debug, Clone)]
    pub struct LocalStorageStore {
        key: String,
    }

    impl Default for LocalStorageStore {
        fn default() -> Self {
            Self::new("horde_survivor_progress")
        }
    }

    impl LocalStorageStore {
        pub fn new(key: impl Into<String>) -> Self {
            Self { key: key.into() }
        }

        fn storage() -> Result<web_sys::Storage, PersistenceError> {
            web_sys::window()
                .and_then(|w| w.local_storage().ok())
                .flatten()
                .ok_or_else(|| PersistenceError::Unavailable("LocalStorage".into()))
        }
    }

    impl ProgressStore for LocalStorageStore {
        fn load_progress(&self) -> Result<SavedProgress, PersistenceError> {
            let storage = Self::storage()?;
            match storage.get_item(&self.key) {
                Ok(Some(json)) => Ok(serde_json::from_str(&json)?),
                Ok(None) => Ok(SavedProgress::default()),
                Err(_) => Err(PersistenceError::Unavailable("LocalStorage read".into())),
            }
        }

        fn save_progress(&mut self, progress: &SavedProgress) -> Result<(), PersistenceError> {
            let json = serde_json::to_string(progress)?;
            Self::storage()?
                .set_item(&self.key, &json)
                .map_err(|_| PersistenceError::Unavailable("LocalStorage write".into()))?;
            log::info!("Progress saved ({} currency)", progress.currency);
            Ok(())
        }
    }
}
