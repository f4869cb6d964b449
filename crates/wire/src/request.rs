// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Request envelope and per-kind metadata shapes.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::codec::WireError;

type JsonMap = serde_json::Map<String, serde_json::Value>;

/// Kind of a client request.
///
/// Serialized as a bit-flag integer: the values are wire-visible and must
/// not be renumbered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "i32", into = "i32")]
pub enum RequestKind {
    Execute,
    List,
    Wait,
    Status,
    VibeCheck,
    Stop,
    TailLog,
}

impl RequestKind {
    pub const fn bits(self) -> i32 {
        match self {
            RequestKind::Execute => 1,
            RequestKind::List => 2,
            RequestKind::Wait => 4,
            RequestKind::Status => 8,
            RequestKind::VibeCheck => 16,
            RequestKind::Stop => 32,
            RequestKind::TailLog => 64,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            RequestKind::Execute => "execute",
            RequestKind::List => "list",
            RequestKind::Wait => "wait",
            RequestKind::Status => "status",
            RequestKind::VibeCheck => "vibe-check",
            RequestKind::Stop => "stop",
            RequestKind::TailLog => "tail-log",
        }
    }
}

impl std::fmt::Display for RequestKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl TryFrom<i32> for RequestKind {
    type Error = String;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(RequestKind::Execute),
            2 => Ok(RequestKind::List),
            4 => Ok(RequestKind::Wait),
            8 => Ok(RequestKind::Status),
            16 => Ok(RequestKind::VibeCheck),
            32 => Ok(RequestKind::Stop),
            64 => Ok(RequestKind::TailLog),
            other => Err(format!("unknown request kind {other}")),
        }
    }
}

impl From<RequestKind> for i32 {
    fn from(kind: RequestKind) -> i32 {
        kind.bits()
    }
}

/// The one-per-connection request envelope.
///
/// `metadata` is an open object whose shape is determined by `request`;
/// [`Envelope::body`] decodes it into the matching typed variant. The daemon
/// fills a missing `timestamp` with its own clock before dispatch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub request: RequestKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "JsonMap::is_empty")]
    pub metadata: JsonMap,
}

impl Envelope {
    /// Build an envelope from a typed body, stamping `timestamp`.
    pub fn from_body(body: &RequestBody, timestamp: DateTime<Utc>) -> Self {
        let metadata = match body.metadata_value() {
            serde_json::Value::Object(map) => map,
            _ => JsonMap::new(),
        };
        Self { request: body.kind(), timestamp: Some(timestamp), metadata }
    }

    /// Decode `metadata` into the typed shape for this envelope's kind.
    pub fn body(&self) -> Result<RequestBody, WireError> {
        match self.request {
            RequestKind::Execute => Ok(RequestBody::Execute(self.metadata_as()?)),
            RequestKind::List => Ok(RequestBody::List(self.metadata_as()?)),
            RequestKind::Wait => Ok(RequestBody::Wait(self.metadata_as()?)),
            RequestKind::Status => Ok(RequestBody::Status(self.metadata_as()?)),
            RequestKind::VibeCheck => Ok(RequestBody::VibeCheck),
            RequestKind::Stop => Ok(RequestBody::Stop(self.metadata_as()?)),
            RequestKind::TailLog => Ok(RequestBody::TailLog(self.metadata_as()?)),
        }
    }

    fn metadata_as<T: DeserializeOwned>(&self) -> Result<T, WireError> {
        serde_json::from_value(serde_json::Value::Object(self.metadata.clone()))
            .map_err(|source| WireError::Metadata { kind: self.request, source })
    }
}

/// Typed request metadata, keyed by [`RequestKind`].
#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    Execute(JobDetail),
    List(ListQuery),
    Wait(SearchQuery),
    Status(SearchQuery),
    VibeCheck,
    Stop(SearchQuery),
    TailLog(TailQuery),
}

impl RequestBody {
    pub fn kind(&self) -> RequestKind {
        match self {
            RequestBody::Execute(_) => RequestKind::Execute,
            RequestBody::List(_) => RequestKind::List,
            RequestBody::Wait(_) => RequestKind::Wait,
            RequestBody::Status(_) => RequestKind::Status,
            RequestBody::VibeCheck => RequestKind::VibeCheck,
            RequestBody::Stop(_) => RequestKind::Stop,
            RequestBody::TailLog(_) => RequestKind::TailLog,
        }
    }

    fn metadata_value(&self) -> serde_json::Value {
        let result = match self {
            RequestBody::Execute(detail) => serde_json::to_value(detail),
            RequestBody::List(query) => serde_json::to_value(query),
            RequestBody::Wait(query) | RequestBody::Status(query) | RequestBody::Stop(query) => {
                serde_json::to_value(query)
            }
            RequestBody::VibeCheck => Ok(serde_json::Value::Object(JsonMap::new())),
            RequestBody::TailLog(query) => serde_json::to_value(query),
        };
        // The shapes above serialize infallibly; an empty object is the
        // conservative answer if that ever changes.
        result.unwrap_or_else(|_| serde_json::Value::Object(JsonMap::new()))
    }
}

/// EXECUTE metadata: everything needed to create and launch a job.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobDetail {
    /// Caller-supplied id; generated by the daemon when empty.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    #[serde(default)]
    pub job_name: String,
    #[serde(default)]
    pub command: Vec<String>,
    #[serde(default, skip_serializing_if = "JsonMap::is_empty")]
    pub metadata: JsonMap,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// LIST metadata: filter, pagination, and projection switches.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ListQuery {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub search: String,
    #[serde(default)]
    pub active_only: bool,
    #[serde(default)]
    pub finish_only: bool,
    #[serde(default)]
    pub limit: u32,
    #[serde(default)]
    pub page: u32,
    /// Return `{count: N}` instead of the row array.
    #[serde(default)]
    pub number_only: bool,
    #[serde(default, rename = "desc")]
    pub sort_desc: bool,
    /// Include the full command detail in each row.
    #[serde(default)]
    pub request_meta: bool,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata_filter: BTreeMap<String, String>,
}

/// STATUS / WAIT / STOP metadata: a single search key (id or name; the
/// newest row by `created_at` wins on name collision).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub search: String,
}

/// TAIL_LOG metadata.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TailQuery {
    #[serde(default)]
    pub search: String,
    /// Keep streaming while the job is running.
    #[serde(default)]
    pub follow: bool,
}

#[cfg(test)]
#[path = "request_tests.rs"]
mod tests;
