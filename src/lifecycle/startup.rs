//! Startup orchestration.
//!
//! # Responsibilities
//! - Load and validate configuration
//! - Initialize logging, the audit log and metrics
//! - Connect to the datastore, gating the listener when configured
//! - Bind the listener and serve until shutdown
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Subsystems initialize in order, not concurrently
//! - The audit log is dropped last so buffered lines reach disk

use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use thiserror::Error;
use tokio::net::TcpListener;

use crate::config::{load_config_or_default, ConfigError};
use crate::datastore::{connect_with_retry, DatastoreError, DatastoreHandle, Endpoint, TcpConnector};
use crate::http::HttpServer;
use crate::lifecycle::{signals, Shutdown};
use crate::observability::{audit::AuditLogError, logging, metrics, FileAuditLog};
use crate::routing::RouteTable;

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("logging: {0}")]
    Logging(#[from] tracing_subscriber::util::TryInitError),

    #[error("audit log: {0}")]
    Audit(#[from] AuditLogError),

    #[error("datastore: {0}")]
    Datastore(#[from] DatastoreError),

    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },

    #[error("server: {0}")]
    Serve(#[from] std::io::Error),
}

/// Run the gateway until a termination signal arrives.
///
/// `build_routes` receives the datastore handle so application handlers can
/// check readiness.
pub async fn run<F>(config_path: Option<&Path>, build_routes: F) -> Result<(), StartupError>
where
    F: FnOnce(&DatastoreHandle) -> RouteTable,
{
    let config = load_config_or_default(config_path)?;
    logging::init_logging(&config.observability)?;

    tracing::info!(
        bind_address = %config.listener.bind_address,
        mode = ?config.datastore.mode,
        audit_path = %config.audit.path,
        "Configuration loaded"
    );

    let audit = Arc::new(FileAuditLog::open(Path::new(&config.audit.path))?);

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse::<SocketAddr>() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(e) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                error = %e,
                "Failed to parse metrics address"
            ),
        }
    }

    let datastore = DatastoreHandle::new();
    let endpoint = Endpoint::from_config(&config.datastore)?;
    let connector = TcpConnector::from_config(&config.datastore);

    if config.datastore.wait_for_ready {
        connect_with_retry(&connector, &endpoint, &config.datastore, &datastore).await?;
    } else {
        let handle = datastore.clone();
        let datastore_config = config.datastore.clone();
        tokio::spawn(async move {
            if let Err(e) =
                connect_with_retry(&connector, &endpoint, &datastore_config, &handle).await
            {
                tracing::error!(error = %e, "Datastore never became ready");
            }
        });
    }

    let routes = build_routes(&datastore);
    let listener = TcpListener::bind(&config.listener.bind_address)
        .await
        .map_err(|source| StartupError::Bind {
            address: config.listener.bind_address.clone(),
            source,
        })?;

    let shutdown = Shutdown::new();
    let signal_task = signals::spawn_signal_listener(shutdown.clone());

    let server = HttpServer::new(config, routes, audit.clone());
    server.run(listener, shutdown.subscribe()).await?;

    signal_task.abort();
    drop(audit);
    tracing::info!("Shutdown complete");
    Ok(())
}
