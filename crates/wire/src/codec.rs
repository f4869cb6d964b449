// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Newline-framed JSON encoder/decoder.
//!
//! Messages are single-line JSON values terminated by `\n`. Decoding reads
//! values in stream order; an EOF before a complete value maps to
//! [`WireError::ConnectionClosed`].

use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

use crate::request::RequestKind;

/// Errors from encoding, decoding, or moving frames over a stream.
#[derive(Debug, Error)]
pub enum WireError {
    #[error("connection closed")]
    ConnectionClosed,

    #[error("timed out reading from connection")]
    Timeout,

    #[error("invalid metadata for {kind} request: {source}")]
    Metadata {
        kind: RequestKind,
        #[source]
        source: serde_json::Error,
    },

    #[error("malformed frame: {0}")]
    Json(#[from] serde_json::Error),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

/// Encode a value as a newline-terminated JSON frame.
pub fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, WireError> {
    let mut buf = serde_json::to_vec(value)?;
    buf.push(b'\n');
    Ok(buf)
}

/// Decode one frame. Trailing whitespace (the frame terminator) is accepted.
pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, WireError> {
    Ok(serde_json::from_slice(bytes)?)
}

/// Read one frame from the stream, bounded by `timeout`.
pub async fn read_value<R, T>(reader: &mut R, timeout: Duration) -> Result<T, WireError>
where
    R: AsyncBufRead + Unpin,
    T: DeserializeOwned,
{
    let mut line = String::new();
    let read = tokio::time::timeout(timeout, reader.read_line(&mut line))
        .await
        .map_err(|_| WireError::Timeout)??;
    if read == 0 {
        return Err(WireError::ConnectionClosed);
    }
    decode(line.as_bytes())
}

/// Write one frame to the stream and flush it.
pub async fn write_value<W, T>(writer: &mut W, value: &T) -> Result<(), WireError>
where
    W: AsyncWrite + Unpin,
    T: Serialize,
{
    let buf = encode(value)?;
    writer.write_all(&buf).await?;
    writer.flush().await?;
    Ok(())
}

#[cfg(test)]
#[path = "codec_tests.rs"]
mod tests;
