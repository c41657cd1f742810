//! In-memory document store for unit testing.
//!
//! Holds raw bytes per key so tests can plant corrupt documents, and can be
//! configured to fail individual operations to exercise error paths.

use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use serde_json::Value;

use super::{parse_or_raw, DateKey, DocumentReader, DocumentStore, Export};
use crate::error::StoreError;

/// Configuration for mock store behavior.
#[derive(Debug, Clone, Default)]
pub struct MockConfig {
    /// Whether reads (get, export) fail with an IO error.
    pub fail_reads: bool,
    /// Whether saves fail with an IO error.
    pub fail_saves: bool,
    /// Whether key listing fails with an IO error.
    pub fail_list: bool,
    /// Simulated latency in milliseconds.
    pub latency_ms: u64,
}

/// Mock document store for testing.
#[derive(Debug, Clone, Default)]
pub struct MockStore {
    /// Mock configuration.
    config: MockConfig,
    /// Raw document bytes by key, in insertion order.
    documents: Arc<Mutex<Vec<(String, Vec<u8>)>>>,
}

impl MockStore {
    /// Create a new mock store with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mock store with custom configuration.
    pub fn with_config(config: MockConfig) -> Self {
        Self {
            config,
            documents: Arc::default(),
        }
    }

    /// Plant raw bytes under `key`, bypassing validation.
    pub fn insert_raw(&self, key: &str, raw: impl Into<Vec<u8>>) {
        let raw = raw.into();
        let mut docs = self.lock();
        match docs.iter_mut().find(|(k, _)| k == key) {
            Some((_, existing)) => *existing = raw,
            None => docs.push((key.to_string(), raw)),
        }
    }

    /// Number of stored documents.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Clear all mock data.
    pub fn clear(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> MutexGuard<'_, Vec<(String, Vec<u8>)>> {
        self.documents.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn raw(&self, key: &DateKey) -> Option<Vec<u8>> {
        self.lock()
            .iter()
            .find(|(k, _)| k == key.as_str())
            .map(|(_, raw)| raw.clone())
    }

    async fn simulate_latency(&self) {
        if self.config.latency_ms > 0 {
            tokio::time::sleep(std::time::Duration::from_millis(self.config.latency_ms)).await;
        }
    }

    fn check(fail: bool, what: &str) -> Result<(), StoreError> {
        if fail {
            return Err(StoreError::Io(std::io::Error::other(format!(
                "Mock {what} failure"
            ))));
        }
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for MockStore {
    async fn get(&self, key: &DateKey) -> Result<Value, StoreError> {
        self.simulate_latency().await;
        Self::check(self.config.fail_reads, "read")?;

        let raw = self.raw(key).ok_or_else(|| StoreError::NotFound {
            key: key.to_string(),
        })?;
        serde_json::from_slice(&raw).map_err(|source| StoreError::Corrupt {
            key: key.to_string(),
            source,
        })
    }

    async fn save(&self, key: &DateKey, document: &Value) -> Result<(), StoreError> {
        self.simulate_latency().await;
        Self::check(self.config.fail_saves, "save")?;

        let raw = serde_json::to_vec_pretty(document).map_err(StoreError::Serialize)?;
        self.insert_raw(key.as_str(), raw);
        Ok(())
    }

    async fn list_keys(&self) -> Result<Vec<String>, StoreError> {
        self.simulate_latency().await;
        Self::check(self.config.fail_list, "list")?;

        Ok(self.lock().iter().map(|(k, _)| k.clone()).collect())
    }

    async fn export_one(&self, key: &DateKey) -> Result<DocumentReader, StoreError> {
        self.simulate_latency().await;
        Self::check(self.config.fail_reads, "read")?;

        let raw = self.raw(key).ok_or_else(|| StoreError::NotFound {
            key: key.to_string(),
        })?;
        Ok(Box::pin(std::io::Cursor::new(raw)) as DocumentReader)
    }

    async fn export_all(&self) -> Result<Export, StoreError> {
        self.simulate_latency().await;
        Self::check(self.config.fail_list || self.config.fail_reads, "export")?;

        Ok(self
            .lock()
            .iter()
            .map(|(k, raw)| (k.clone(), parse_or_raw(&String::from_utf8_lossy(raw))))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn mock_round_trips_and_lists_in_order() {
        let store = MockStore::new();
        let a = DateKey::parse("2024-03-02").unwrap();
        let b = DateKey::parse("2024-03-01").unwrap();

        store.save(&a, &json!({"a": 1})).await.unwrap();
        store.save(&b, &json!({"b": 2})).await.unwrap();
        store.save(&a, &json!({"a": 3})).await.unwrap();

        assert_eq!(store.get(&a).await.unwrap(), json!({"a": 3}));
        assert_eq!(store.list_keys().await.unwrap(), vec!["2024-03-02", "2024-03-01"]);
        assert_eq!(store.len(), 2);

        store.clear();
        assert!(store.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn mock_latency_delays_every_operation() {
        let store = MockStore::with_config(MockConfig {
            latency_ms: 250,
            ..Default::default()
        });
        let key = DateKey::parse("2024-03-01").unwrap();

        let start = tokio::time::Instant::now();
        store.save(&key, &json!({"a": 1})).await.unwrap();
        assert!(start.elapsed() >= std::time::Duration::from_millis(250));

        let start = tokio::time::Instant::now();
        assert_eq!(store.get(&key).await.unwrap(), json!({"a": 1}));
        assert!(start.elapsed() >= std::time::Duration::from_millis(250));
    }

    #[tokio::test]
    async fn mock_failures_are_io_errors() {
        let store = MockStore::with_config(MockConfig {
            fail_list: true,
            fail_saves: true,
            ..Default::default()
        });
        let key = DateKey::parse("2024-03-01").unwrap();

        assert!(matches!(store.list_keys().await, Err(StoreError::Io(_))));
        assert!(matches!(store.save(&key, &json!(1)).await, Err(StoreError::Io(_))));
        assert!(matches!(store.export_all().await, Err(StoreError::Io(_))));
    }
}
