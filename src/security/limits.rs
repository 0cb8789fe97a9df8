//! Request body limits.
//!
//! # Responsibilities
//! - Reject bodies whose declared `Content-Length` exceeds the limit
//! - Count streamed (chunked) bodies while buffering and stop at the limit
//!
//! # Design Decisions
//! - Declared lengths are checked before any byte is read
//! - Both paths fail with `RawFailure::PayloadTooLarge` (413)

use axum::body::{Body, Bytes};
use axum::http::{header, HeaderMap};
use futures_util::StreamExt;

use crate::errors::RawFailure;

#[derive(Debug, Clone, Copy)]
pub struct BodyLimit {
    max_bytes: usize,
}

impl BodyLimit {
    pub fn new(max_bytes: usize) -> Self {
        Self { max_bytes }
    }

    pub fn max_bytes(&self) -> usize {
        self.max_bytes
    }

    /// Reject a declared `Content-Length` above the limit.
    pub fn check_declared(&self, headers: &HeaderMap) -> Result<(), RawFailure> {
        let declared = headers
            .get(header::CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<u64>().ok());
        match declared {
            Some(len) if len > self.max_bytes as u64 => Err(self.exceeded()),
            _ => Ok(()),
        }
    }

    /// Buffer `body`, failing as soon as more than the limit has been read.
    pub async fn read(&self, body: Body) -> Result<Bytes, RawFailure> {
        let mut stream = body.into_data_stream();
        let mut buffer: Vec<u8> = Vec::new();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| RawFailure::MalformedBody(e.to_string()))?;
            if buffer.len() + chunk.len() > self.max_bytes {
                return Err(self.exceeded());
            }
            buffer.extend_from_slice(&chunk);
        }
        Ok(Bytes::from(buffer))
    }

    fn exceeded(&self) -> RawFailure {
        RawFailure::PayloadTooLarge {
            limit: self.max_bytes,
        }
    }
}
