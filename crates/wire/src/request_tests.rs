// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use chrono::{TimeZone, Utc};

use super::*;

#[test]
fn request_kind_uses_bit_flag_integers() {
    let json = serde_json::to_string(&RequestKind::TailLog).unwrap();
    assert_eq!(json, "64");
    let back: RequestKind = serde_json::from_str("16").unwrap();
    assert_eq!(back, RequestKind::VibeCheck);
}

#[test]
fn unknown_request_kind_fails_decode() {
    assert!(serde_json::from_str::<RequestKind>("3").is_err());
    assert!(serde_json::from_str::<RequestKind>("128").is_err());
}

#[test]
fn envelope_decodes_execute_metadata() {
    let raw = r#"{
        "request": 1,
        "timestamp": "2025-06-01T12:00:00Z",
        "metadata": {
            "job_name": "backup",
            "command": ["/bin/sh", "-c", "echo hi"],
            "metadata": {"env": "prod"}
        }
    }"#;
    let envelope: Envelope = serde_json::from_str(raw).unwrap();
    assert_eq!(envelope.request, RequestKind::Execute);

    let RequestBody::Execute(detail) = envelope.body().unwrap() else {
        panic!("expected execute body");
    };
    assert_eq!(detail.job_name, "backup");
    assert_eq!(detail.command, ["/bin/sh", "-c", "echo hi"]);
    assert_eq!(detail.metadata["env"], "prod");
    assert!(detail.id.is_empty());
}

#[test]
fn envelope_without_timestamp_or_metadata() {
    let envelope: Envelope = serde_json::from_str(r#"{"request": 16}"#).unwrap();
    assert_eq!(envelope.timestamp, None);
    assert!(envelope.metadata.is_empty());
    assert_eq!(envelope.body().unwrap(), RequestBody::VibeCheck);
}

#[test]
fn list_metadata_defaults() {
    let envelope: Envelope =
        serde_json::from_str(r#"{"request": 2, "metadata": {"search": "db"}}"#).unwrap();
    let RequestBody::List(query) = envelope.body().unwrap() else {
        panic!("expected list body");
    };
    assert_eq!(query.search, "db");
    assert!(!query.active_only);
    assert!(!query.number_only);
    assert_eq!(query.limit, 0);
    assert!(query.metadata_filter.is_empty());
}

#[test]
fn list_desc_field_uses_wire_name() {
    let envelope: Envelope =
        serde_json::from_str(r#"{"request": 2, "metadata": {"desc": true}}"#).unwrap();
    let RequestBody::List(query) = envelope.body().unwrap() else {
        panic!("expected list body");
    };
    assert!(query.sort_desc);
}

#[test]
fn tail_metadata_requires_follow_default_false() {
    let envelope: Envelope =
        serde_json::from_str(r#"{"request": 64, "metadata": {"search": "noisy"}}"#).unwrap();
    let RequestBody::TailLog(query) = envelope.body().unwrap() else {
        panic!("expected tail body");
    };
    assert_eq!(query.search, "noisy");
    assert!(!query.follow);
}

#[test]
fn mismatched_metadata_shape_is_an_error() {
    // EXECUTE metadata with a command that is not an array
    let envelope: Envelope =
        serde_json::from_str(r#"{"request": 1, "metadata": {"command": "oops"}}"#).unwrap();
    assert!(matches!(
        envelope.body(),
        Err(WireError::Metadata { kind: RequestKind::Execute, .. })
    ));
}

#[test]
fn from_body_round_trips() {
    let timestamp = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();
    let body = RequestBody::Status(SearchQuery { search: "backup".into() });
    let envelope = Envelope::from_body(&body, timestamp);
    assert_eq!(envelope.request, RequestKind::Status);
    assert_eq!(envelope.timestamp, Some(timestamp));
    assert_eq!(envelope.body().unwrap(), body);
}

#[test]
fn envelope_json_round_trips_bit_identically() {
    let raw = r#"{"request":4,"timestamp":"2025-06-01T12:00:00Z","metadata":{"search":"x"}}"#;
    let envelope: Envelope = serde_json::from_str(raw).unwrap();
    let encoded = serde_json::to_string(&envelope).unwrap();
    let reparsed: Envelope = serde_json::from_str(&encoded).unwrap();
    assert_eq!(envelope, reparsed);
}
