//! Local check-in history.
//!
//! The log is a single JSON array rewritten in full on every append. Appends
//! from one process are serialized; several processes writing the same file
//! are not supported.

use crate::{checkin::CheckInRecord, context};
use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
    sync::Arc,
};
use tokio::sync::Mutex;
use tracing::info;

#[derive(Debug, thiserror::Error)]
pub enum HistoryError {
    #[error("failed to access history file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("history file {path} is not valid JSON: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to serialize history: {0}")]
    Serialize(#[source] serde_json::Error),
}

/// Append-only store of check-in records backed by a JSON file.
#[derive(Debug, Clone)]
pub struct HistoryStore {
    path: PathBuf,
    write_lock: Arc<Mutex<()>>,
}

impl HistoryStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the whole log. A missing file is an empty log.
    pub async fn load(&self) -> Result<Vec<CheckInRecord>, HistoryError> {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => {
                return Err(HistoryError::Io {
                    path: self.path.clone(),
                    source,
                });
            }
        };
        serde_json::from_str(&raw).map_err(|source| HistoryError::Parse {
            path: self.path.clone(),
            source,
        })
    }

    /// Appends one record and rewrites the file.
    pub async fn append(&self, record: &CheckInRecord) -> Result<(), HistoryError> {
        let _guard = self.write_lock.lock().await;

        let mut history = self.load().await?;
        history.push(record.clone());
        let serialized = serde_json::to_string_pretty(&history).map_err(HistoryError::Serialize)?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|source| HistoryError::Io {
                    path: parent.to_path_buf(),
                    source,
                })?;
        }
        tokio::fs::write(&self.path, serialized)
            .await
            .map_err(|source| HistoryError::Io {
                path: self.path.clone(),
                source,
            })?;

        info!(date = %record.date, mood = %record.mood, entries = history.len(), "Saved check-in entry");
        Ok(())
    }

    /// Context sentence for the most recent check-in.
    pub async fn context_summary(&self) -> Result<String, HistoryError> {
        Ok(context::summarize(&self.load().await?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn record(mood: &str, objectives: &str) -> CheckInRecord {
        CheckInRecord::new(mood, objectives, format!("felt {}", mood))
    }

    #[tokio::test]
    async fn missing_file_loads_empty() {
        let dir = tempdir().unwrap();
        let store = HistoryStore::new(dir.path().join("wellness_log.json"));

        assert!(store.load().await.unwrap().is_empty());
        assert_eq!(
            store.context_summary().await.unwrap(),
            context::FIRST_CHECK_IN
        );
    }

    #[tokio::test]
    async fn appends_round_trip_in_order() {
        let dir = tempdir().unwrap();
        let store = HistoryStore::new(dir.path().join("wellness_log.json"));
        let records = vec![
            record("tired", "rest, read"),
            record("focused", "ship the report"),
            record("anxious", ""),
        ];

        for r in &records {
            store.append(r).await.unwrap();
        }

        assert_eq!(store.load().await.unwrap(), records);
    }

    #[tokio::test]
    async fn creates_missing_parent_directory() {
        let dir = tempdir().unwrap();
        let store = HistoryStore::new(dir.path().join("nested/logs/wellness_log.json"));

        store.append(&record("ok", "walk")).await.unwrap();

        assert_eq!(store.load().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn file_is_a_plain_json_array() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("wellness_log.json");
        let store = HistoryStore::new(&path);
        store.append(&record("calm", "stretch")).await.unwrap();

        let raw: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        let entry = &raw.as_array().unwrap()[0];
        assert_eq!(entry["mood"], "calm");
        assert_eq!(entry["objectives"], serde_json::json!(["stretch"]));
        assert_eq!(entry["summary"], "felt calm");
        assert!(entry["date"].is_string());
    }

    #[tokio::test]
    async fn malformed_file_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("wellness_log.json");
        std::fs::write(&path, "{not json").unwrap();
        let store = HistoryStore::new(&path);

        assert!(matches!(
            store.load().await,
            Err(HistoryError::Parse { .. })
        ));
        assert!(store.append(&record("ok", "")).await.is_err());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "{not json");
    }

    #[tokio::test]
    async fn concurrent_appends_in_one_process_are_not_lost() {
        let dir = tempdir().unwrap();
        let store = HistoryStore::new(dir.path().join("wellness_log.json"));

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let store = store.clone();
                tokio::spawn(async move { store.append(&record(&format!("mood {}", i), "")).await })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(store.load().await.unwrap().len(), 8);
    }
}
