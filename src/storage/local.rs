//! Local filesystem cursor storage.
//!
//! Persists the cursor as a small JSON file. Writes go to a temp file
//! first and are moved into place with a rename, so a crash mid-write
//! never leaves a truncated cursor behind.

use std::path::PathBuf;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;

use crate::error::{AppError, Result};
use crate::storage::{Cursor, CursorStore};

/// File-backed cursor store.
#[derive(Debug, Clone)]
pub struct FileCursorStore {
    path: PathBuf,
}

impl FileCursorStore {
    /// Create a store persisting to the given file path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the cursor file.
    pub fn path(&self) -> &std::path::Path {
        &self.path
    }

    /// Write bytes atomically (write to temp, then rename).
    async fn write_bytes(&self, bytes: &[u8]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let tmp = self.path.with_extension("tmp");
        let mut file = tokio::fs::File::create(&tmp).await?;
        file.write_all(bytes).await?;
        file.flush().await?;
        drop(file);

        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }

    /// Read bytes, returning None if the file doesn't exist.
    async fn read_bytes(&self) -> Result<Option<Vec<u8>>> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AppError::Io(e)),
        }
    }
}

#[async_trait]
impl CursorStore for FileCursorStore {
    async fn load(&self) -> Result<Option<Cursor>> {
        match self.read_bytes().await? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    async fn save(&self, cursor: &Cursor) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(cursor)?;
        self.write_bytes(&bytes).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Utc};
    use tempfile::TempDir;

    fn sample_cursor() -> Cursor {
        let ts = NaiveDate::from_ymd_opt(2022, 7, 31)
            .unwrap()
            .and_hms_opt(19, 30, 0)
            .unwrap()
            .and_utc();
        Cursor::new(ts)
    }

    #[tokio::test]
    async fn save_and_load_roundtrip() {
        let tmp = TempDir::new().unwrap();
        let store = FileCursorStore::new(tmp.path().join("cursor.json"));

        let cursor = sample_cursor();
        store.save(&cursor).await.unwrap();

        let loaded = store.load().await.unwrap().unwrap();
        assert_eq!(loaded.last_emitted, cursor.last_emitted);
    }

    #[tokio::test]
    async fn load_missing_file_is_none() {
        let tmp = TempDir::new().unwrap();
        let store = FileCursorStore::new(tmp.path().join("cursor.json"));

        assert!(store.load().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn save_creates_parent_directories() {
        let tmp = TempDir::new().unwrap();
        let store = FileCursorStore::new(tmp.path().join("state/kp/cursor.json"));

        store.save(&sample_cursor()).await.unwrap();
        assert!(store.load().await.unwrap().is_some());
    }

    #[tokio::test]
    async fn save_overwrites_previous_cursor() {
        let tmp = TempDir::new().unwrap();
        let store = FileCursorStore::new(tmp.path().join("cursor.json"));

        store.save(&sample_cursor()).await.unwrap();

        let later = Cursor::new(sample_cursor().last_emitted + chrono::Duration::hours(3));
        store.save(&later).await.unwrap();

        let loaded = store.load().await.unwrap().unwrap();
        assert_eq!(loaded.last_emitted, later.last_emitted);
        assert!(loaded.last_emitted > sample_cursor().last_emitted);
    }

    #[tokio::test]
    async fn corrupt_file_is_an_error() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("cursor.json");
        std::fs::write(&path, b"not json").unwrap();

        let store = FileCursorStore::new(&path);
        assert!(store.load().await.is_err());
    }

    #[test]
    fn cursor_updated_at_is_set() {
        let before = Utc::now();
        let cursor = sample_cursor();
        assert!(cursor.updated_at >= before);
    }
}
