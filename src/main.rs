//! Timebox document server entry point.

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tokio::net::TcpListener;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use timebox_store::api::{create_router, AppState};
use timebox_store::config::Config;
use timebox_store::metrics;
use timebox_store::store::{DocumentStore, FileStore};
use timebox_store::utils::shutdown_signal;
use timebox_store::AppError;

/// Per-day JSON document server.
#[derive(Parser, Debug)]
#[command(name = "timebox-server")]
#[command(about = "Save and fetch one JSON document per calendar date over HTTP")]
#[command(version)]
struct Args {
    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,

    /// HTTP server port (overrides PORT).
    #[arg(short, long)]
    port: Option<u16>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP server (default).
    Serve {
        /// HTTP server port (overrides PORT).
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Check configuration validity.
    CheckConfig,

    /// Print every stored date.
    ListDates,

    /// Write every stored document as one JSON object.
    ExportAll {
        /// Output file; stdout when omitted.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse CLI arguments
    let args = Args::parse();

    // Initialize logging
    let filter = if args.verbose {
        EnvFilter::new("timebox_store=debug,tower_http=debug,info")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    // Initialize metrics
    metrics::init_metrics();

    // Handle subcommands
    match args.command {
        Some(Command::Serve { port }) => cmd_serve(port.or(args.port)).await,
        Some(Command::CheckConfig) => cmd_check_config().await,
        Some(Command::ListDates) => Ok(cmd_list_dates().await?),
        Some(Command::ExportAll { output }) => Ok(cmd_export_all(output).await?),
        None => cmd_serve(args.port).await,
    }
}

/// Load and validate configuration.
fn load_config() -> Result<Config, AppError> {
    let config = Config::load().map_err(|e| {
        error!("Failed to load configuration: {}", e);
        e
    })?;

    config.validate().map_err(|e| {
        error!("Invalid configuration: {}", e);
        AppError::InvalidConfig(e)
    })?;

    Ok(config)
}

/// Run the HTTP server.
async fn cmd_serve(port_override: Option<u16>) -> anyhow::Result<()> {
    info!("Loading configuration...");
    let mut config = load_config()?;

    // Override with CLI args if provided
    if let Some(port) = port_override {
        config.port = port;
        config.validate().map_err(AppError::InvalidConfig)?;
    }

    if let Some(metrics_port) = config.metrics_port {
        let addr = SocketAddr::from(([0, 0, 0, 0], metrics_port));
        match metrics::install_prometheus(addr) {
            Ok(()) => info!("Metrics endpoint listening on {}", addr),
            Err(e) => warn!("Failed to install metrics exporter: {}", e),
        }
    }

    let store = FileStore::open(config.data_dir())
        .await
        .with_context(|| format!("creating data directory {}", config.data_dir().display()))?;
    info!("Data directory: {}", store.dir().display());

    let public_dir = config.public_dir();
    if !public_dir.is_dir() {
        warn!("Public directory {} not found; only the API will respond", public_dir.display());
    }

    let router = create_router(AppState::new(store), &public_dir);

    // Start HTTP server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = TcpListener::bind(addr).await?;
    info!("Server listening on port {}", config.port);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

/// Check configuration validity.
async fn cmd_check_config() -> anyhow::Result<()> {
    println!("======================================================================");
    println!("TIMEBOX SERVER - CONFIGURATION CHECK");
    println!("======================================================================");

    print!("Loading configuration... ");
    let config = match Config::load() {
        Ok(c) => {
            println!("OK");
            c
        }
        Err(e) => {
            println!("FAILED");
            println!("  Error: {}", e);
            return Err(anyhow::anyhow!("Configuration load failed"));
        }
    };

    print!("Validating configuration... ");
    match config.validate() {
        Ok(()) => println!("OK"),
        Err(e) => {
            println!("FAILED");
            println!("  Error: {}", e);
            return Err(anyhow::anyhow!("Configuration validation failed"));
        }
    }

    println!("----------------------------------------------------------------------");
    println!("Configuration Summary:");
    println!("  Port: {}", config.port);
    println!("  Log Level: {}", config.rust_log);
    match config.metrics_port {
        Some(port) => println!("  Metrics Port: {}", port),
        None => println!("  Metrics Port: disabled"),
    }
    println!(
        "  Data Directory: {}{}",
        config.data_dir().display(),
        if config.data_dir().is_dir() { "" } else { " (created on start)" }
    );
    println!(
        "  Public Directory: {}{}",
        config.public_dir().display(),
        if config.public_dir().is_dir() { "" } else { " (missing)" }
    );
    println!("======================================================================");
    println!("CONFIGURATION CHECK PASSED");
    println!("======================================================================");

    Ok(())
}

/// Print every stored date.
async fn cmd_list_dates() -> timebox_store::Result<()> {
    let config = load_config()?;
    let store = FileStore::open(config.data_dir()).await?;

    let mut dates = store.list_keys().await?;
    dates.sort();
    for date in &dates {
        println!("{}", date);
    }
    info!("{} stored dates", dates.len());

    Ok(())
}

/// Write the combined export to a file or stdout.
async fn cmd_export_all(output: Option<PathBuf>) -> timebox_store::Result<()> {
    let config = load_config()?;
    let store = FileStore::open(config.data_dir()).await?;

    let all = store.export_all().await?;
    let content = serde_json::to_string_pretty(&all)?;

    match output {
        Some(path) => {
            tokio::fs::write(&path, content).await.map_err(|e| {
                error!("Failed to write {}: {}", path.display(), e);
                e
            })?;
            info!("Exported {} documents to {}", all.len(), path.display());
        }
        None => println!("{}", content),
    }

    Ok(())
}
