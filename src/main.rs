//! Access MCP Server - Main entry point.
//!
//! This server provides MCP (Model Context Protocol) tools for AI assistants
//! to query and inspect Microsoft Access database files over stdio.

use access_mcp_server::config::{Config, Settings};
use access_mcp_server::db::AccessDatabase;
use access_mcp_server::mcp::AccessService;
use access_mcp_server::transport::{StdioTransport, Transport};
use std::fs::{self, OpenOptions};
use std::sync::{Arc, Mutex};
use tracing::{error, info, warn};
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Open the log file, falling back to stderr. Stdout belongs to the transport.
fn log_writer(settings: &Settings) -> (BoxMakeWriter, Option<String>) {
    let path = settings.log_file();
    let opened = fs::create_dir_all(&settings.log_dir).and_then(|_| {
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
    });
    match opened {
        Ok(file) => (BoxMakeWriter::new(Mutex::new(file)), None),
        Err(e) => (
            BoxMakeWriter::new(std::io::stderr),
            Some(format!(
                "Cannot open log file {}: {}; logging to stderr",
                path.display(),
                e
            )),
        ),
    }
}

/// Initialize the tracing subscriber for logging.
fn init_tracing(config: &Config, settings: &Settings) -> Option<String> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    let (writer, warning) = log_writer(settings);

    let subscriber = tracing_subscriber::registry().with(filter);

    if config.json_logs {
        subscriber
            .with(fmt::layer().json().with_writer(writer))
            .init();
    } else {
        subscriber
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_ansi(false)
                    .with_writer(writer),
            )
            .init();
    }

    warning
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Parse configuration from command line and environment
    let config = Config::parse_args();
    let (settings, config_warnings) = config.resolve();

    let log_warning = init_tracing(&config, &settings);
    for warning in config_warnings.iter().chain(log_warning.iter()) {
        warn!("{}", warning);
    }

    info!(
        log_dir = %settings.log_dir.display(),
        debug = settings.debug,
        odbc_driver = %settings.odbc_driver,
        providers = ?settings.providers,
        catalog_fallback = settings.catalog_fallback,
        "Starting Access MCP Server v{}",
        env!("CARGO_PKG_VERSION")
    );

    let database = Arc::new(AccessDatabase::from_settings(&settings));
    let service = AccessService::new(database, settings.debug);

    let transport = StdioTransport::new(service);
    info!(transport = transport.name(), "Using stdio transport");

    if let Err(e) = transport.run().await {
        error!(error = %e, "Server error");
        return Err(e.into());
    }

    info!("Server shutdown complete");
    Ok(())
}
