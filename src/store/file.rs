//! File system backend: one pretty-printed JSON file per date.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use serde_json::Value;
use tokio::fs;
use tracing::debug;

use super::{parse_or_raw, DateKey, DocumentReader, DocumentStore, Export, DOCUMENT_EXTENSION};
use crate::error::StoreError;
use crate::metrics::{self, StoreOperation};

/// Suffix of in-flight writes. Never ends in [`DOCUMENT_EXTENSION`], so
/// listings skip it.
const TEMP_SUFFIX: &str = ".tmp";

/// Disambiguates temp files of concurrent saves within this process.
static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Documents stored as `<dir>/<YYYY-MM-DD>.json`.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Open the store rooted at `dir`, creating the directory if absent.
    pub async fn open(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).await?;
        debug!(dir = %dir.display(), "Opened file store");
        Ok(Self { dir })
    }

    /// The directory documents live in.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the document for `key`, rejecting anything that is not an
    /// exact `YYYY-MM-DD` string.
    pub fn resolve(&self, key: &str) -> Result<PathBuf, StoreError> {
        let key = DateKey::parse(key)?;
        Ok(self.path_for(&key))
    }

    /// Path of the document for an already validated key.
    pub fn path_for(&self, key: &DateKey) -> PathBuf {
        self.dir.join(key.file_name())
    }

    /// Fresh temporary sibling for a save of `key`.
    fn temp_path_for(&self, key: &DateKey) -> PathBuf {
        let n = TEMP_COUNTER.fetch_add(1, Ordering::Relaxed);
        self.dir.join(format!(
            "{}.{}-{}{}",
            key.file_name(),
            std::process::id(),
            n,
            TEMP_SUFFIX
        ))
    }

    async fn read_json(&self, key: &DateKey) -> Result<Value, StoreError> {
        let raw = fs::read(self.path_for(key))
            .await
            .map_err(|e| not_found_or_io(e, key))?;
        serde_json::from_slice(&raw).map_err(|source| StoreError::Corrupt {
            key: key.to_string(),
            source,
        })
    }

    /// Write to a temporary sibling, then rename over the final path.
    async fn write_atomic(&self, key: &DateKey, document: &Value) -> Result<(), StoreError> {
        let bytes = serde_json::to_vec_pretty(document).map_err(StoreError::Serialize)?;
        let tmp = self.temp_path_for(key);
        fs::write(&tmp, &bytes).await?;
        if let Err(e) = fs::rename(&tmp, self.path_for(key)).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(StoreError::Io(e));
        }
        debug!(key = %key, bytes = bytes.len(), "Saved document");
        Ok(())
    }

    async fn open_reader(&self, key: &DateKey) -> Result<DocumentReader, StoreError> {
        let file = fs::File::open(self.path_for(key))
            .await
            .map_err(|e| not_found_or_io(e, key))?;
        Ok(Box::pin(file) as DocumentReader)
    }

    async fn keys(&self) -> Result<Vec<String>, StoreError> {
        let mut entries = fs::read_dir(&self.dir).await?;
        let mut keys = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name();
            let name = name.to_string_lossy();
            if let Some(stem) = name.strip_suffix(DOCUMENT_EXTENSION) {
                keys.push(stem.to_string());
            }
        }
        Ok(keys)
    }

    async fn collect_all(&self) -> Result<Export, StoreError> {
        let mut all = Export::new();
        for key in self.keys().await? {
            let raw = fs::read(self.dir.join(format!("{key}{DOCUMENT_EXTENSION}"))).await?;
            let value = parse_or_raw(&String::from_utf8_lossy(&raw));
            all.insert(key, value);
        }
        Ok(all)
    }
}

fn not_found_or_io(err: std::io::Error, key: &DateKey) -> StoreError {
    if err.kind() == std::io::ErrorKind::NotFound {
        StoreError::NotFound {
            key: key.to_string(),
        }
    } else {
        StoreError::Io(err)
    }
}

/// Count a failure before handing it back.
fn observe<T>(operation: StoreOperation, result: Result<T, StoreError>) -> Result<T, StoreError> {
    if let Err(e) = &result {
        metrics::inc_store_errors(operation, e.kind());
    }
    result
}

#[async_trait]
impl DocumentStore for FileStore {
    async fn get(&self, key: &DateKey) -> Result<Value, StoreError> {
        let _timer = metrics::timer_store_op(StoreOperation::Get);
        let result = self.read_json(key).await;
        if result.is_ok() {
            metrics::inc_documents_read();
        }
        observe(StoreOperation::Get, result)
    }

    async fn save(&self, key: &DateKey, document: &Value) -> Result<(), StoreError> {
        let _timer = metrics::timer_store_op(StoreOperation::Save);
        let result = self.write_atomic(key, document).await;
        if result.is_ok() {
            metrics::inc_documents_saved();
        }
        observe(StoreOperation::Save, result)
    }

    async fn list_keys(&self) -> Result<Vec<String>, StoreError> {
        let _timer = metrics::timer_store_op(StoreOperation::ListKeys);
        observe(StoreOperation::ListKeys, self.keys().await)
    }

    async fn export_one(&self, key: &DateKey) -> Result<DocumentReader, StoreError> {
        let _timer = metrics::timer_store_op(StoreOperation::ExportOne);
        let result = self.open_reader(key).await;
        if result.is_ok() {
            metrics::add_documents_exported(1);
        }
        observe(StoreOperation::ExportOne, result)
    }

    async fn export_all(&self) -> Result<Export, StoreError> {
        let _timer = metrics::timer_store_op(StoreOperation::ExportAll);
        let result = self.collect_all().await;
        if let Ok(all) = &result {
            metrics::add_documents_exported(all.len() as u64);
            debug!(documents = all.len(), "Exported all documents");
        }
        observe(StoreOperation::ExportAll, result)
    }
}
