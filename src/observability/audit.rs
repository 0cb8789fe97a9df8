//! Durable, append-only audit log.
//!
//! One line per processed request (access line) plus one line per sanitized
//! request field. Writes never block the request path: lines are handed to a
//! background worker which appends them to the file and syncs after each
//! drained batch.

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use thiserror::Error;
use tracing_appender::non_blocking::{NonBlocking, NonBlockingBuilder, WorkerGuard};

use crate::http::request::RequestContext;
use crate::security::sanitize::SanitizationEvent;

/// Destination for audit lines. Shared by every request.
pub trait AuditSink: Send + Sync {
    /// Append one line. A trailing newline is added by the sink.
    fn append(&self, line: String);
}

#[derive(Debug, Error)]
#[error("failed to open audit log {path}: {source}")]
pub struct AuditLogError {
    pub path: PathBuf,
    #[source]
    pub source: io::Error,
}

/// File writer that syncs data to disk whenever the worker flushes.
struct SyncedFile(File);

impl Write for SyncedFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.0.flush()?;
        self.0.sync_data()
    }
}

/// Audit sink backed by an append-only file.
pub struct FileAuditLog {
    writer: NonBlocking,
    path: PathBuf,
    // Dropping the guard drains pending lines to disk.
    _guard: WorkerGuard,
}

impl FileAuditLog {
    /// Open (or create) the file at `path` in append mode.
    pub fn open(path: &Path) -> Result<Self, AuditLogError> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|source| AuditLogError {
                path: path.to_path_buf(),
                source,
            })?;

        let (writer, guard) = NonBlockingBuilder::default()
            .lossy(false)
            .thread_name("audit-log")
            .finish(SyncedFile(file));

        tracing::info!(path = %path.display(), "Audit log opened");
        Ok(Self {
            writer,
            path: path.to_path_buf(),
            _guard: guard,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl AuditSink for FileAuditLog {
    fn append(&self, mut line: String) {
        line.push('\n');
        let mut writer = self.writer.clone();
        if let Err(e) = writer.write_all(line.as_bytes()) {
            tracing::error!(error = %e, "Failed to queue audit line");
        }
    }
}

/// In-memory sink, for tests and embedding.
#[derive(Clone, Default)]
pub struct MemoryAuditLog {
    lines: Arc<Mutex<Vec<String>>>,
}

impl MemoryAuditLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every line written so far, in write order.
    pub fn lines(&self) -> Vec<String> {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl AuditSink for MemoryAuditLog {
    fn append(&self, line: String) {
        // A poisoned lock still holds a valid Vec.
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(line);
    }
}

/// Access line: `GET /path 404 0.412 ms - 62`.
pub fn access_line(
    ctx: &RequestContext,
    status: u16,
    elapsed: Duration,
    content_length: Option<u64>,
) -> String {
    let length = content_length
        .map(|l| l.to_string())
        .unwrap_or_else(|| "-".to_string());
    format!(
        "{} {} {} {:.3} ms - {}",
        ctx.method,
        ctx.original_url,
        status,
        elapsed.as_secs_f64() * 1000.0,
        length
    )
}

/// Sanitization line: `SANITIZED body[filter.$gt] request_id=... method=POST url=/x`.
pub fn sanitized_line(ctx: &RequestContext, event: &SanitizationEvent) -> String {
    format!(
        "SANITIZED {}[{}] request_id={} method={} url={}",
        event.location, event.key_path, ctx.request_id, ctx.method, ctx.original_url
    )
}
