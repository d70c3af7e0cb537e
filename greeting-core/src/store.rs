//! Durable record stores for generated greetings.
//!
//! Provides the [`GreetingStore`] trait and a filesystem-backed
//! [`JsonlStore`] that appends one JSON document per line.

use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use uuid::Uuid;

/// File the JSONL store appends to.
pub const JSONL_FILE: &str = "greetings.jsonl";

/// Errors that can occur during store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// An I/O error occurred during persistence.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// A serialization or deserialization error occurred.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    /// HTTP layer failed (connection, timeout, etc.).
    #[error("Store request failed: {0}")]
    Http(#[from] reqwest::Error),
    /// The remote store rejected the insert (auth, schema, ...).
    #[error("Store rejected insert with {status}: {body}")]
    Rejected {
        /// HTTP status code.
        status: u16,
        /// Response body, for diagnostics.
        body: String,
    },
    /// The store connection parameters are invalid.
    #[error("Invalid store configuration: {0}")]
    Config(String),
}

/// One persisted greeting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GreetingRecord {
    /// Recipient name.
    pub name: String,
    /// Effective relation label.
    pub relation: String,
    /// Greeting text.
    pub message: String,
}

/// Append-only greeting store.
#[async_trait]
pub trait GreetingStore: Send + Sync {
    /// Store name, for logs.
    fn name(&self) -> &'static str;

    /// Insert one record.
    async fn insert(&self, record: &GreetingRecord) -> Result<(), StoreError>;
}

#[derive(Debug, Serialize, Deserialize)]
struct JsonlLine {
    id: Uuid,
    created_at: u64,
    #[serde(flatten)]
    record: GreetingRecord,
}

/// Filesystem store writing `greetings.jsonl` in a data directory.
#[derive(Debug)]
pub struct JsonlStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonlStore {
    /// Create a store in `data_dir`. The directory is created if it doesn't
    /// exist.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] if the directory cannot be created.
    pub fn with_data_dir(data_dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let data_dir = data_dir.into();
        std::fs::create_dir_all(&data_dir)?;
        Ok(Self {
            path: data_dir.join(JSONL_FILE),
            write_lock: Mutex::new(()),
        })
    }

    /// Path of the JSONL file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read every record back, skipping lines that fail to parse.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] if the file exists but cannot be read.
    pub async fn load_all(&self) -> Result<Vec<GreetingRecord>, StoreError> {
        let contents = match tokio::fs::read_to_string(&self.path).await {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        Ok(contents
            .lines()
            .filter(|line| !line.trim().is_empty())
            .filter_map(|line| match serde_json::from_str::<JsonlLine>(line) {
                Ok(parsed) => Some(parsed.record),
                Err(e) => {
                    tracing::warn!("Skipping unreadable greeting record: {e}");
                    None
                }
            })
            .collect())
    }
}

#[async_trait]
impl GreetingStore for JsonlStore {
    fn name(&self) -> &'static str {
        "jsonl"
    }

    async fn insert(&self, record: &GreetingRecord) -> Result<(), StoreError> {
        let line = JsonlLine {
            id: Uuid::new_v4(),
            created_at: current_timestamp_ms(),
            record: record.clone(),
        };
        let mut json = serde_json::to_string(&line)?;
        json.push('\n');

        let _guard = self.write_lock.lock().await;
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(json.as_bytes()).await?;
        file.flush().await?;
        Ok(())
    }
}

/// Get the current Unix timestamp in milliseconds.
fn current_timestamp_ms() -> u64 {
    SystemTime::now().duration_since(UNIX_EPOCH).map_or(0, |d| {
        // Timestamp will not exceed u64 max for millennia
        #[allow(clippy::cast_possible_truncation)]
        {
            d.as_millis() as u64
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(name: &str) -> GreetingRecord {
        GreetingRecord {
            name: name.to_string(),
            relation: "Family".to_string(),
            message: format!("Merry Christmas, {name}!"),
        }
    }

    #[tokio::test]
    async fn test_insert_and_load() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = JsonlStore::with_data_dir(dir.path()).expect("store");

        store.insert(&record("Ana")).await.expect("insert");
        store.insert(&record("Ben")).await.expect("insert");

        let records = store.load_all().await.expect("load");
        assert_eq!(records, vec![record("Ana"), record("Ben")]);
    }

    #[tokio::test]
    async fn test_load_missing_file_is_empty() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = JsonlStore::with_data_dir(dir.path().join("nested")).expect("store");
        assert!(store.load_all().await.expect("load").is_empty());
    }

    #[tokio::test]
    async fn test_lines_carry_id_and_timestamp() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = JsonlStore::with_data_dir(dir.path()).expect("store");
        store.insert(&record("Ana")).await.expect("insert");

        let raw = std::fs::read_to_string(store.path()).expect("read");
        let value: serde_json::Value = serde_json::from_str(raw.trim()).expect("json");
        assert!(value.get("id").is_some());
        assert!(value.get("created_at").is_some());
        assert_eq!(value["relation"], "Family");
    }

    #[tokio::test]
    async fn test_corrupt_lines_are_skipped() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = JsonlStore::with_data_dir(dir.path()).expect("store");
        store.insert(&record("Ana")).await.expect("insert");
        std::fs::OpenOptions::new()
            .append(true)
            .open(store.path())
            .and_then(|mut f| std::io::Write::write_all(&mut f, b"{not json\n"))
            .expect("append garbage");

        let records = store.load_all().await.expect("load");
        assert_eq!(records.len(), 1);
    }
}
