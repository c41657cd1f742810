//! Date-keyed document storage.
//!
//! A document is an arbitrary JSON value stored under exactly one
//! [`DateKey`]. The [`DocumentStore`] trait is the only surface the HTTP
//! layer sees, so the file backend in [`file`] can be swapped for another
//! implementation without touching the handlers.

pub mod file;
pub mod key;
pub mod mock;

use std::pin::Pin;

use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio::io::AsyncRead;

use crate::error::StoreError;

pub use file::FileStore;
pub use key::DateKey;
pub use mock::{MockConfig, MockStore};

/// Extension of every stored document.
pub const DOCUMENT_EXTENSION: &str = ".json";

/// Raw bytes of a stored document, streamed without re-serialization.
pub type DocumentReader = Pin<Box<dyn AsyncRead + Send>>;

/// Every stored document keyed by date. Corrupt documents carry their raw
/// text as a JSON string.
pub type Export = Map<String, Value>;

/// Persistence for one JSON document per date.
///
/// No operation locks across calls. Two saves to the same key race and the
/// later one wins.
#[async_trait]
pub trait DocumentStore: Send + Sync + std::fmt::Debug {
    /// Read and parse the document stored under `key`.
    async fn get(&self, key: &DateKey) -> Result<Value, StoreError>;

    /// Replace the document stored under `key`. Readers observe either the
    /// previous document or the new one, never a partial write.
    async fn save(&self, key: &DateKey, document: &Value) -> Result<(), StoreError>;

    /// Keys of every stored document, in backend enumeration order.
    async fn list_keys(&self) -> Result<Vec<String>, StoreError>;

    /// Open the stored bytes of `key` for download.
    async fn export_one(&self, key: &DateKey) -> Result<DocumentReader, StoreError>;

    /// Collect every stored document into one object.
    async fn export_all(&self) -> Result<Export, StoreError>;
}

/// Parse `raw` as JSON, falling back to the text itself so one corrupt
/// document never aborts a full export.
pub(crate) fn parse_or_raw(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}
