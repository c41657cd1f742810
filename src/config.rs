//! Application configuration loaded from environment variables.

use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Name of the document directory under the install root.
pub const DATA_DIR_NAME: &str = "data";
/// Name of the static asset directory under the install root.
pub const PUBLIC_DIR_NAME: &str = "public";

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    // === Server Configuration ===
    /// HTTP server port.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Optional port for the Prometheus scrape endpoint.
    #[serde(default)]
    pub metrics_port: Option<u16>,

    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub rust_log: String,

    // === Layout ===
    /// Install root holding `data/` and `public/`. Fixed to the executable's
    /// directory; never read from the environment.
    #[serde(skip, default = "install_root")]
    pub root: PathBuf,
}

fn default_port() -> u16 {
    3000
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Directory containing the running executable, falling back to the
/// working directory when it cannot be determined.
fn install_root() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
        .unwrap_or_else(|| PathBuf::from("."))
}

impl Config {
    /// Load configuration from environment, reading .env file first.
    pub fn load() -> Result<Self, envy::Error> {
        dotenvy::dotenv().ok();
        envy::from_env()
    }

    /// Build a configuration rooted at `root` with default settings.
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            port: default_port(),
            metrics_port: None,
            rust_log: default_log_level(),
            root: root.into(),
        }
    }

    /// Check if the configuration is valid.
    pub fn validate(&self) -> Result<(), String> {
        if self.port == 0 {
            return Err("PORT must be non-zero".to_string());
        }

        if let Some(metrics_port) = self.metrics_port {
            if metrics_port == 0 {
                return Err("METRICS_PORT must be non-zero".to_string());
            }
            if metrics_port == self.port {
                return Err("METRICS_PORT must differ from PORT".to_string());
            }
        }

        Ok(())
    }

    /// Directory holding one `<date>.json` file per document.
    pub fn data_dir(&self) -> PathBuf {
        self.root.join(DATA_DIR_NAME)
    }

    /// Directory holding the static front end.
    pub fn public_dir(&self) -> PathBuf {
        self.root.join(PUBLIC_DIR_NAME)
    }
}
