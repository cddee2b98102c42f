//! Local preference storage
//!
//! `StorageBackend` is a string key/value store; `FileStorage` keeps the
//! whole map in one JSON file under the per-user configuration directory,
//! rewriting it on every change. Structured values go through
//! [`save_json_backend`] / [`load_json_backend`] so the trait stays object
//! safe.

use serde::{Serialize, de::DeserializeOwned};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use thiserror::Error;

/// Key of the persisted interface language
pub const LANGUAGE_KEY: &str = "language";
/// Key of the last visited page fragment
pub const ROUTE_KEY: &str = "route";

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(String),

    #[error("JSON error: {0}")]
    Json(String),

    #[error("Platform storage error: {0}")]
    Platform(String),
}

pub type StorageResult<T> = Result<T, StorageError>;

pub trait StorageBackend: Send + Sync {
    fn set_string(&self, key: &str, value: &str) -> StorageResult<()>;

    /// `Ok(None)` when the key is missing
    fn get_string(&self, key: &str) -> StorageResult<Option<String>>;

    fn remove(&self, key: &str) -> StorageResult<()>;
}

pub fn save_json_backend<T: Serialize>(
    backend: &dyn StorageBackend,
    key: &str,
    value: &T,
) -> StorageResult<()> {
    let s = serde_json::to_string(value).map_err(|e| StorageError::Json(e.to_string()))?;
    backend.set_string(key, &s)
}

pub fn load_json_backend<T: DeserializeOwned>(
    backend: &dyn StorageBackend,
    key: &str,
) -> StorageResult<Option<T>> {
    match backend.get_string(key)? {
        Some(s) => serde_json::from_str::<T>(&s)
            .map(Some)
            .map_err(|e| StorageError::Json(e.to_string())),
        None => Ok(None),
    }
}

/// JSON file holding a map of key -> string value
pub struct FileStorage {
    path: PathBuf,
    inner: Mutex<HashMap<String, String>>,
}

impl FileStorage {
    /// - On Windows: %APPDATA%/TravelGuideViewer/storage.json
    /// - Else: $HOME/.config/travel-guide-viewer/storage.json
    fn default_storage_path() -> PathBuf {
        if cfg!(windows)
            && let Ok(appdata) = std::env::var("APPDATA")
        {
            return Path::new(&appdata)
                .join("TravelGuideViewer")
                .join("storage.json");
        }

        if let Ok(home) = std::env::var("HOME") {
            return Path::new(&home)
                .join(".config")
                .join("travel-guide-viewer")
                .join("storage.json");
        }

        Path::new(".").join("travel-guide-viewer-storage.json")
    }

    pub fn new_with_path(path: Option<PathBuf>) -> StorageResult<Self> {
        let path = path.unwrap_or_else(Self::default_storage_path);

        if let Some(parent) = path.parent()
            && let Err(e) = fs::create_dir_all(parent)
        {
            return Err(StorageError::Io(format!(
                "Failed to create storage parent directory: {e}"
            )));
        }

        let mut map = HashMap::new();
        if path.exists() {
            let s = fs::read_to_string(&path)
                .map_err(|e| StorageError::Io(format!("Failed to read storage file: {e}")))?;
            if !s.trim().is_empty() {
                map = serde_json::from_str::<HashMap<String, String>>(&s)
                    .map_err(|e| StorageError::Json(format!("Failed to parse storage JSON: {e}")))?;
            }
        }

        tracing::debug!("Using storage file {}", path.display());
        Ok(FileStorage {
            path,
            inner: Mutex::new(map),
        })
    }

    fn lock(&self) -> StorageResult<std::sync::MutexGuard<'_, HashMap<String, String>>> {
        self.inner
            .lock()
            .map_err(|e| StorageError::Platform(format!("mutex poisoned: {e:?}")))
    }

    fn flush_locked(&self, locked: &HashMap<String, String>) -> StorageResult<()> {
        let s = serde_json::to_string_pretty(locked).map_err(|e| StorageError::Json(e.to_string()))?;
        fs::write(&self.path, s).map_err(|e| StorageError::Io(format!("write failed: {e}")))
    }
}

impl StorageBackend for FileStorage {
    fn set_string(&self, key: &str, value: &str) -> StorageResult<()> {
        let mut guard = self.lock()?;
        guard.insert(key.to_string(), value.to_string());
        self.flush_locked(&guard)
    }

    fn get_string(&self, key: &str) -> StorageResult<Option<String>> {
        Ok(self.lock()?.get(key).cloned())
    }

    fn remove(&self, key: &str) -> StorageResult<()> {
        let mut guard = self.lock()?;
        if guard.remove(key).is_some() {
            self.flush_locked(&guard)?;
        }
        Ok(())
    }
}

pub fn default_storage_backend() -> StorageResult<Box<dyn StorageBackend>> {
    Ok(Box::new(FileStorage::new_with_path(None)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use travel_guide_lib::Language;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("travel-guide-viewer-test-{}", std::process::id()))
            .join(format!("{name}.json"))
    }

    #[test]
    fn test_values_survive_reopen() {
        let path = temp_path("reopen");
        let _ = fs::remove_file(&path);

        let storage = FileStorage::new_with_path(Some(path.clone())).unwrap();
        save_json_backend(&storage, LANGUAGE_KEY, &Language::En).unwrap();
        storage.set_string(ROUTE_KEY, "country/3").unwrap();
        drop(storage);

        let reopened = FileStorage::new_with_path(Some(path.clone())).unwrap();
        let language: Option<Language> = load_json_backend(&reopened, LANGUAGE_KEY).unwrap();
        assert_eq!(language, Some(Language::En));
        assert_eq!(
            reopened.get_string(ROUTE_KEY).unwrap().as_deref(),
            Some("country/3")
        );

        reopened.remove(ROUTE_KEY).unwrap();
        assert_eq!(reopened.get_string(ROUTE_KEY).unwrap(), None);
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_corrupt_file_is_an_error() {
        let path = temp_path("corrupt");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "{ not json").unwrap();

        let result = FileStorage::new_with_path(Some(path.clone()));
        assert!(matches!(result, Err(StorageError::Json(_))));
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_bad_json_value() {
        let path = temp_path("bad-value");
        let _ = fs::remove_file(&path);
        let storage = FileStorage::new_with_path(Some(path.clone())).unwrap();
        storage.set_string(LANGUAGE_KEY, "\"de\"").unwrap();

        let language: StorageResult<Option<Language>> = load_json_backend(&storage, LANGUAGE_KEY);
        assert!(language.is_err());
        let _ = fs::remove_file(&path);
    }
}
