//! Per-day JSON document store served over HTTP.
//!
//! Clients save and fetch one arbitrary JSON document per calendar date,
//! list the dates that have documents, and download documents as files.
//! Each document lives in its own file:
//!
//! ```text
//! data/
//! ├── 2024-03-01.json
//! └── 2024-03-02.json
//! ```
//!
//! # Modules
//!
//! - [`config`]: Configuration loading from environment
//! - [`error`]: Unified error types
//! - [`store`]: Date keys and the document store backends
//! - [`api`]: HTTP routes and handlers
//! - [`metrics`]: Prometheus metrics
//! - [`utils`]: Utility functions

pub mod api;
pub mod config;
pub mod error;
pub mod metrics;
pub mod store;
pub mod utils;

pub use config::Config;
pub use error::{AppError, Result};
