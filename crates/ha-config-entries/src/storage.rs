//! Versioned JSON persistence under `<config>/.storage/`

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs;
use tracing::debug;

/// Storage errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unsupported version for {key}: expected {expected}, found {found}")]
    VersionMismatch {
        key: String,
        expected: u32,
        found: u32,
    },
}

pub type StorageResult<T> = Result<T, StorageError>;

/// On-disk envelope
///
/// ```json
/// {
///   "version": 1,
///   "minor_version": 5,
///   "key": "core.config_entries",
///   "data": { ... }
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageFile<T> {
    pub version: u32,
    pub minor_version: u32,
    pub key: String,
    pub data: T,
}

impl<T> StorageFile<T> {
    pub fn new(key: impl Into<String>, data: T, version: u32, minor_version: u32) -> Self {
        Self {
            version,
            minor_version,
            key: key.into(),
            data,
        }
    }
}

/// Handle on the `.storage/` directory of a config directory
#[derive(Debug, Clone)]
pub struct Storage {
    storage_dir: PathBuf,
}

impl Storage {
    pub fn new(config_dir: impl AsRef<Path>) -> Self {
        Self {
            storage_dir: config_dir.as_ref().join(".storage"),
        }
    }

    pub fn storage_dir(&self) -> &Path {
        &self.storage_dir
    }

    pub fn file_path(&self, key: &str) -> PathBuf {
        self.storage_dir.join(key)
    }

    /// Load `key`, or `None` when it was never saved.
    ///
    /// Files written by a newer major version are refused.
    pub async fn load<T>(&self, key: &str, version: u32) -> StorageResult<Option<StorageFile<T>>>
    where
        T: DeserializeOwned,
    {
        let path = self.file_path(key);
        if !path.exists() {
            debug!("Storage file not found: {}", key);
            return Ok(None);
        }

        let content = fs::read_to_string(&path).await?;
        let file: StorageFile<T> = serde_json::from_str(&content)?;
        if file.version > version {
            return Err(StorageError::VersionMismatch {
                key: key.to_string(),
                expected: version,
                found: file.version,
            });
        }

        debug!(
            "Loaded storage file: {} (v{}.{})",
            key, file.version, file.minor_version
        );
        Ok(Some(file))
    }

    /// Write `file` atomically (temp file, then rename)
    pub async fn save<T>(&self, file: &StorageFile<T>) -> StorageResult<()>
    where
        T: Serialize,
    {
        fs::create_dir_all(&self.storage_dir).await?;

        let path = self.file_path(&file.key);
        let temp_path = self.file_path(&format!("{}.tmp", file.key));

        fs::write(&temp_path, serde_json::to_string_pretty(file)?).await?;
        fs::rename(&temp_path, &path).await?;

        debug!(
            "Saved storage file: {} (v{}.{})",
            file.key, file.version, file.minor_version
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Schedule {
        name: String,
        period: u32,
    }

    #[tokio::test]
    async fn test_save_then_load() {
        let temp_dir = TempDir::new().unwrap();
        let storage = Storage::new(temp_dir.path());
        let schedule = Schedule {
            name: "paper".to_string(),
            period: 2,
        };

        storage
            .save(&StorageFile::new("test.schedule", schedule.clone(), 1, 2))
            .await
            .unwrap();
        assert!(storage.file_path("test.schedule").exists());
        assert!(!storage.file_path("test.schedule.tmp").exists());

        let loaded: StorageFile<Schedule> =
            storage.load("test.schedule", 1).await.unwrap().unwrap();
        assert_eq!(loaded.data, schedule);
        assert_eq!(loaded.minor_version, 2);
    }

    #[tokio::test]
    async fn test_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        let storage = Storage::new(temp_dir.path());
        let loaded: Option<StorageFile<Schedule>> = storage.load("nothing", 1).await.unwrap();
        assert!(loaded.is_none());
    }

    #[tokio::test]
    async fn test_newer_major_version_refused() {
        let temp_dir = TempDir::new().unwrap();
        let storage = Storage::new(temp_dir.path());
        let schedule = Schedule {
            name: "glass".to_string(),
            period: 1,
        };
        storage
            .save(&StorageFile::new("test.schedule", schedule, 2, 1))
            .await
            .unwrap();

        let result: StorageResult<Option<StorageFile<Schedule>>> =
            storage.load("test.schedule", 1).await;
        assert!(matches!(
            result,
            Err(StorageError::VersionMismatch {
                expected: 1,
                found: 2,
                ..
            })
        ));
    }
}
