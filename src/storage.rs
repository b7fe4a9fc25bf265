use crate::error::Result;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::debug;

/// Append-only sink for accepted records. The pipeline writes one record at
/// a time and never reads back mid-run; `items` exists for post-run export.
#[async_trait]
pub trait Dataset: Send + Sync {
    async fn push(&self, record: Value) -> Result<()>;
    async fn items(&self) -> Result<Vec<Value>>;
}

/// Audit sink for named artifacts: the input snapshot, raw page bodies that
/// failed JSON parsing, and the exported CSV.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn set_value(&self, key: &str, value: &Value) -> Result<()>;
    async fn set_text(&self, key: &str, text: &str) -> Result<()>;
}

/// In-memory dataset for tests and dry runs.
pub struct InMemoryDataset {
    items: Arc<Mutex<Vec<Value>>>,
}

impl InMemoryDataset {
    pub fn new() -> Self {
        Self {
            items: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl Default for InMemoryDataset {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Dataset for InMemoryDataset {
    async fn push(&self, record: Value) -> Result<()> {
        let mut items = self.items.lock().unwrap();
        items.push(record);
        Ok(())
    }

    async fn items(&self) -> Result<Vec<Value>> {
        let items = self.items.lock().unwrap();
        Ok(items.clone())
    }
}

/// What an in-memory store holds for a key, preserving whether it arrived
/// as JSON or raw text.
#[derive(Debug, Clone, PartialEq)]
pub enum StoredValue {
    Json(Value),
    Text(String),
}

/// In-memory key-value store for tests and dry runs.
pub struct InMemoryKeyValueStore {
    values: Arc<Mutex<HashMap<String, StoredValue>>>,
}

impl InMemoryKeyValueStore {
    pub fn new() -> Self {
        Self {
            values: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Test-side accessor; the pipeline itself never reads the store.
    pub fn get(&self, key: &str) -> Option<StoredValue> {
        let values = self.values.lock().unwrap();
        values.get(key).cloned()
    }
}

impl Default for InMemoryKeyValueStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl KeyValueStore for InMemoryKeyValueStore {
    async fn set_value(&self, key: &str, value: &Value) -> Result<()> {
        let mut values = self.values.lock().unwrap();
        values.insert(key.to_string(), StoredValue::Json(value.clone()));
        Ok(())
    }

    async fn set_text(&self, key: &str, text: &str) -> Result<()> {
        let mut values = self.values.lock().unwrap();
        values.insert(key.to_string(), StoredValue::Text(text.to_string()));
        Ok(())
    }
}

/// Filesystem dataset: one JSON object per line in `dataset.jsonl`.
/// Construction starts a fresh dataset; a file left by a previous run is
/// removed.
pub struct FsDataset {
    path: PathBuf,
}

impl FsDataset {
    pub fn new(dir: &Path) -> Result<Self> {
        fs::create_dir_all(dir)?;
        let path = dir.join("dataset.jsonl");
        if path.exists() {
            fs::remove_file(&path)?;
        }
        Ok(Self { path })
    }
}

#[async_trait]
impl Dataset for FsDataset {
    async fn push(&self, record: Value) -> Result<()> {
        let mut line = serde_json::to_string(&record)?;
        line.push('\n');
        let mut file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(line.as_bytes())?;
        Ok(())
    }

    async fn items(&self) -> Result<Vec<Value>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let content = fs::read_to_string(&self.path)?;
        let mut items = Vec::new();
        for line in content.lines() {
            if line.trim().is_empty() {
                continue;
            }
            items.push(serde_json::from_str(line)?);
        }
        Ok(items)
    }
}

/// Filesystem key-value store: one file per key. JSON values get a `.json`
/// suffix; text values use the key verbatim, so `RESULT.csv` lands as-is.
pub struct FsKeyValueStore {
    dir: PathBuf,
}

impl FsKeyValueStore {
    pub fn new(dir: &Path) -> Result<Self> {
        fs::create_dir_all(dir)?;
        Ok(Self {
            dir: dir.to_path_buf(),
        })
    }
}

#[async_trait]
impl KeyValueStore for FsKeyValueStore {
    async fn set_value(&self, key: &str, value: &Value) -> Result<()> {
        let path = self.dir.join(format!("{key}.json"));
        fs::write(&path, serde_json::to_string_pretty(value)?)?;
        debug!("Stored {} at {}", key, path.display());
        Ok(())
    }

    async fn set_text(&self, key: &str, text: &str) -> Result<()> {
        let path = self.dir.join(key);
        fs::write(&path, text)?;
        debug!("Stored {} at {}", key, path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    #[tokio::test]
    async fn in_memory_dataset_preserves_order() {
        let dataset = InMemoryDataset::new();
        dataset.push(json!({"id": 1})).await.unwrap();
        dataset.push(json!({"id": 2})).await.unwrap();
        let items = dataset.items().await.unwrap();
        assert_eq!(items, vec![json!({"id": 1}), json!({"id": 2})]);
    }

    #[tokio::test]
    async fn in_memory_store_keeps_json_and_text_apart() {
        let store = InMemoryKeyValueStore::new();
        store.set_value("INPUT", &json!({"city": "Bandung"})).await.unwrap();
        store.set_text("PAGE_1_TEXT", "<html>").await.unwrap();

        assert_eq!(
            store.get("INPUT"),
            Some(StoredValue::Json(json!({"city": "Bandung"})))
        );
        assert_eq!(
            store.get("PAGE_1_TEXT"),
            Some(StoredValue::Text("<html>".to_string()))
        );
        assert!(store.get("RESULT.csv").is_none());
    }

    #[tokio::test]
    async fn fs_dataset_appends_jsonl_and_reads_back() {
        let dir = tempdir().unwrap();
        let dataset = FsDataset::new(dir.path()).unwrap();
        dataset.push(json!({"id": "a"})).await.unwrap();
        dataset.push(json!({"id": "b", "price": null})).await.unwrap();

        let raw = fs::read_to_string(dir.path().join("dataset.jsonl")).unwrap();
        assert_eq!(raw.lines().count(), 2);

        let items = dataset.items().await.unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[1], json!({"id": "b", "price": null}));
    }

    #[tokio::test]
    async fn fs_dataset_starts_fresh_each_construction() {
        let dir = tempdir().unwrap();
        let dataset = FsDataset::new(dir.path()).unwrap();
        dataset.push(json!({"id": "stale"})).await.unwrap();
        drop(dataset);

        let dataset = FsDataset::new(dir.path()).unwrap();
        assert!(dataset.items().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn fs_dataset_empty_before_first_push() {
        let dir = tempdir().unwrap();
        let dataset = FsDataset::new(dir.path()).unwrap();
        assert!(dataset.items().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn fs_store_writes_expected_file_names() {
        let dir = tempdir().unwrap();
        let store = FsKeyValueStore::new(dir.path()).unwrap();
        store.set_value("INPUT", &json!({"activity": "yoga"})).await.unwrap();
        store.set_text("RESULT.csv", "id,activity\n1,yoga").await.unwrap();
        store.set_text("PAGE_3_TEXT", "<html>not json</html>").await.unwrap();

        let input = fs::read_to_string(dir.path().join("INPUT.json")).unwrap();
        assert!(input.contains("\"activity\""));
        let csv = fs::read_to_string(dir.path().join("RESULT.csv")).unwrap();
        assert!(csv.starts_with("id,activity"));
        let page = fs::read_to_string(dir.path().join("PAGE_3_TEXT")).unwrap();
        assert_eq!(page, "<html>not json</html>");
    }
}
