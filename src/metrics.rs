//! Prometheus metrics for store operations.
//!
//! This module provides metrics for:
//! - Store operation latency, labelled by operation
//! - Documents saved, read and exported
//! - Store failures, labelled by operation and error kind

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, describe_counter, describe_histogram, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};
use strum::{AsRefStr, Display};
use tracing::debug;

use crate::error::ErrorKind;

// === Metric Name Constants ===

/// Store operation latency metric name.
pub const METRIC_STORE_OP_LATENCY: &str = "store_operation_latency_ms";
/// Documents saved counter metric name.
pub const METRIC_DOCUMENTS_SAVED: &str = "documents_saved_total";
/// Documents read counter metric name.
pub const METRIC_DOCUMENTS_READ: &str = "documents_read_total";
/// Documents exported counter metric name.
pub const METRIC_DOCUMENTS_EXPORTED: &str = "documents_exported_total";
/// Store errors counter metric name.
pub const METRIC_STORE_ERRORS: &str = "store_errors_total";

/// Store operations, used as the `operation` label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum StoreOperation {
    /// Read one document.
    Get,
    /// Replace one document.
    Save,
    /// Enumerate keys.
    ListKeys,
    /// Stream one document.
    ExportOne,
    /// Collect every document.
    ExportAll,
}

/// Initialize all metric descriptions.
/// Call this once at startup to register metrics with descriptions.
pub fn init_metrics() {
    describe_histogram!(
        METRIC_STORE_OP_LATENCY,
        "Store operation latency in milliseconds"
    );

    describe_counter!(METRIC_DOCUMENTS_SAVED, "Total number of documents saved");
    describe_counter!(METRIC_DOCUMENTS_READ, "Total number of documents read");
    describe_counter!(
        METRIC_DOCUMENTS_EXPORTED,
        "Total number of documents included in exports"
    );
    describe_counter!(METRIC_STORE_ERRORS, "Total number of failed store operations");

    debug!("Metrics initialized");
}

/// Install the Prometheus recorder with a scrape listener on `addr`.
pub fn install_prometheus(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()
}

/// Increment documents saved counter.
pub fn inc_documents_saved() {
    counter!(METRIC_DOCUMENTS_SAVED).increment(1);
}

/// Increment documents read counter.
pub fn inc_documents_read() {
    counter!(METRIC_DOCUMENTS_READ).increment(1);
}

/// Add to the documents exported counter.
pub fn add_documents_exported(count: u64) {
    counter!(METRIC_DOCUMENTS_EXPORTED).increment(count);
}

/// Increment the store error counter.
pub fn inc_store_errors(operation: StoreOperation, kind: ErrorKind) {
    counter!(
        METRIC_STORE_ERRORS,
        "operation" => operation.as_ref().to_string(),
        "kind" => kind.to_string()
    )
    .increment(1);
}

/// RAII guard for timing operations.
/// Automatically records latency when dropped.
pub struct LatencyTimer {
    start: Instant,
    operation: StoreOperation,
}

impl LatencyTimer {
    /// Create a new latency timer for the given operation.
    pub fn new(operation: StoreOperation) -> Self {
        Self {
            start: Instant::now(),
            operation,
        }
    }

    /// Get elapsed time in milliseconds (without recording).
    pub fn elapsed_ms(&self) -> f64 {
        self.start.elapsed().as_secs_f64() * 1000.0
    }
}

impl Drop for LatencyTimer {
    fn drop(&mut self) {
        histogram!(
            METRIC_STORE_OP_LATENCY,
            "operation" => self.operation.as_ref().to_string()
        )
        .record(self.elapsed_ms());
    }
}

/// Create a latency timer for a store operation.
pub fn timer_store_op(operation: StoreOperation) -> LatencyTimer {
    LatencyTimer::new(operation)
}
