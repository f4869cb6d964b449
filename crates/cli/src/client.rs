// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Thin RPC client: one request per connection, replies decoded in order.

use std::io::{BufRead, BufReader, Write};
use std::os::unix::net::UnixStream;
use std::path::PathBuf;

use bobbit_wire::{Envelope, ErrorFrame, LineFrame, RequestBody};
use chrono::Utc;
use serde::de::DeserializeOwned;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Cannot connect to {path}. Is bobbitd running? ({source})")]
    NotRunning {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The daemon answered with an `{"error": ...}` envelope.
    #[error("{0}")]
    Daemon(String),

    #[error("connection closed before a reply arrived")]
    ConnectionClosed,

    #[error("malformed reply from daemon: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("i/o error talking to daemon: {0}")]
    Io(#[from] std::io::Error),
}

/// A single-request connection to the daemon.
pub struct Client {
    stream: UnixStream,
    reader: BufReader<UnixStream>,
}

impl Client {
    /// Connect to the daemon socket resolved from the environment.
    pub fn connect() -> Result<Self, ClientError> {
        let path = bobbit_core::config::socket_path();
        let stream = UnixStream::connect(&path)
            .map_err(|source| ClientError::NotRunning { path, source })?;
        let reader = BufReader::new(stream.try_clone()?);
        Ok(Self { stream, reader })
    }

    /// Send one request envelope, stamped with the current time.
    pub fn send(&mut self, body: &RequestBody) -> Result<(), ClientError> {
        let envelope = Envelope::from_body(body, Utc::now());
        let frame = serde_json::to_vec(&envelope)?;
        self.stream.write_all(&frame)?;
        self.stream.write_all(b"\n")?;
        self.stream.flush()?;
        Ok(())
    }

    /// Read the single success reply, surfacing a daemon error envelope.
    pub fn read_reply<T: DeserializeOwned>(&mut self) -> Result<T, ClientError> {
        let line = self.read_frame()?.ok_or(ClientError::ConnectionClosed)?;
        decode_frame(&line)
    }

    /// For requests answered by a clean close (EXECUTE, VIBE_CHECK): treat
    /// EOF as success and any frame as the error envelope.
    pub fn expect_clean_close(&mut self) -> Result<(), ClientError> {
        match self.read_frame()? {
            None => Ok(()),
            Some(line) => match serde_json::from_str::<ErrorFrame>(&line) {
                Ok(frame) => Err(ClientError::Daemon(frame.error)),
                Err(e) => Err(ClientError::Decode(e)),
            },
        }
    }

    /// Read the next tail frame; `None` on clean end-of-stream.
    pub fn next_line(&mut self) -> Result<Option<String>, ClientError> {
        match self.read_frame()? {
            None => Ok(None),
            Some(line) => {
                let frame: LineFrame = decode_frame(&line)?;
                Ok(Some(frame.line))
            }
        }
    }

    fn read_frame(&mut self) -> Result<Option<String>, ClientError> {
        let mut line = String::new();
        let read = self.reader.read_line(&mut line)?;
        if read == 0 {
            return Ok(None);
        }
        Ok(Some(line))
    }
}

/// Decode a success frame, recognizing the error envelope first.
fn decode_frame<T: DeserializeOwned>(line: &str) -> Result<T, ClientError> {
    if let Ok(frame) = serde_json::from_str::<ErrorFrame>(line) {
        return Err(ClientError::Daemon(frame.error));
    }
    Ok(serde_json::from_str(line)?)
}
