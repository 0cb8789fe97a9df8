//! Connecting to the datastore and publishing readiness.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpStream;
use tokio::sync::watch;

use crate::config::DatastoreConfig;
use crate::datastore::backoff::calculate_backoff;
use crate::datastore::{DatastoreError, Endpoint};
use crate::errors::RawFailure;

/// Establishes the datastore connection. Implemented by the driver adapter;
/// [`TcpConnector`] only proves the endpoint accepts connections.
pub trait DatastoreConnector: Send + Sync {
    fn connect(
        &self,
        endpoint: &Endpoint,
    ) -> impl Future<Output = Result<(), DatastoreError>> + Send;
}

/// Opens a TCP connection to the endpoint under a timeout.
#[derive(Debug, Clone)]
pub struct TcpConnector {
    timeout: Duration,
}

impl TcpConnector {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    pub fn from_config(config: &DatastoreConfig) -> Self {
        Self::new(Duration::from_secs(config.connect_timeout_secs))
    }
}

impl DatastoreConnector for TcpConnector {
    async fn connect(&self, endpoint: &Endpoint) -> Result<(), DatastoreError> {
        let authority = endpoint.authority();
        match tokio::time::timeout(self.timeout, TcpStream::connect(&authority)).await {
            Ok(Ok(_stream)) => Ok(()),
            Ok(Err(source)) => Err(DatastoreError::Connect {
                endpoint: authority,
                source,
            }),
            Err(_) => Err(DatastoreError::Timeout {
                endpoint: authority,
                timeout_secs: self.timeout.as_secs(),
            }),
        }
    }
}

/// Shared view of datastore readiness.
#[derive(Debug, Clone)]
pub struct DatastoreHandle {
    tx: Arc<watch::Sender<bool>>,
}

impl DatastoreHandle {
    /// A handle that is still connecting.
    pub fn new() -> Self {
        let (tx, _) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    pub fn mark_ready(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_ready(&self) -> bool {
        *self.tx.borrow()
    }

    /// `"ready"` or `"connecting"`, as reported by the health route.
    pub fn status(&self) -> &'static str {
        if self.is_ready() {
            "ready"
        } else {
            "connecting"
        }
    }

    /// Fail fast with 503 while the connection is not established.
    pub fn ensure_ready(&self) -> Result<(), RawFailure> {
        if self.is_ready() {
            Ok(())
        } else {
            Err(RawFailure::DatastoreUnavailable)
        }
    }

    /// Resolves once the datastore is ready.
    pub async fn wait_ready(&self) {
        let mut rx = self.tx.subscribe();
        // The sender lives in `self`, so the channel cannot close here.
        let _ = rx.wait_for(|ready| *ready).await;
    }
}

impl Default for DatastoreHandle {
    fn default() -> Self {
        Self::new()
    }
}

/// Connect, retrying with capped exponential backoff up to
/// `connect_attempts` times. Marks `handle` ready on success.
pub async fn connect_with_retry<C: DatastoreConnector>(
    connector: &C,
    endpoint: &Endpoint,
    config: &DatastoreConfig,
    handle: &DatastoreHandle,
) -> Result<(), DatastoreError> {
    let attempts = config.connect_attempts.max(1);
    let mut attempt = 0;

    loop {
        attempt += 1;
        match connector.connect(endpoint).await {
            Ok(()) => {
                tracing::info!(
                    endpoint = %endpoint,
                    mode = ?endpoint.mode,
                    attempt,
                    "Datastore connected"
                );
                handle.mark_ready();
                return Ok(());
            }
            Err(e) if attempt >= attempts => {
                tracing::error!(endpoint = %endpoint, attempt, error = %e, "Datastore connection failed");
                return Err(DatastoreError::Exhausted {
                    attempts: attempt,
                    last: Box::new(e),
                });
            }
            Err(e) => {
                let delay = calculate_backoff(
                    attempt,
                    config.retry_base_delay_ms,
                    config.retry_max_delay_ms,
                );
                tracing::warn!(
                    endpoint = %endpoint,
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    error = %e,
                    "Datastore connection failed, retrying"
                );
                tokio::time::sleep(delay).await;
            }
        }
    }
}
