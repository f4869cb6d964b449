// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Property tests for envelope serde round-trips.
//!
//! Every request body shape must survive encode → decode unchanged, for
//! arbitrary field contents.

use chrono::{TimeZone, Utc};
use proptest::prelude::*;

use super::*;

fn arb_search() -> impl Strategy<Value = SearchQuery> {
    "[a-z0-9-]{0,16}".prop_map(|search| SearchQuery { search })
}

fn arb_detail() -> impl Strategy<Value = JobDetail> {
    (
        "[a-f0-9]{0,32}",
        "[a-z-]{1,12}",
        proptest::collection::vec("[a-z/ -]{1,8}", 0..4),
        proptest::collection::btree_map("[a-z_]{1,6}", "[a-z0-9]{0,6}", 0..3),
    )
        .prop_map(|(id, job_name, command, meta)| JobDetail {
            id,
            job_name,
            command,
            metadata: meta
                .into_iter()
                .map(|(k, v)| (k, serde_json::Value::String(v)))
                .collect(),
            created_at: None,
            updated_at: None,
        })
}

fn arb_list() -> impl Strategy<Value = ListQuery> {
    (
        "[a-z0-9]{0,8}",
        any::<bool>(),
        any::<bool>(),
        0u32..100,
        0u32..10,
        any::<bool>(),
        any::<bool>(),
        any::<bool>(),
        proptest::collection::btree_map("[a-z_]{1,6}", "[a-z0-9]{1,6}", 0..3),
    )
        .prop_map(
            |(
                search,
                active_only,
                finish_only,
                limit,
                page,
                number_only,
                sort_desc,
                request_meta,
                metadata_filter,
            )| ListQuery {
                search,
                active_only,
                finish_only,
                limit,
                page,
                number_only,
                sort_desc,
                request_meta,
                metadata_filter,
            },
        )
}

fn arb_body() -> impl Strategy<Value = RequestBody> {
    prop_oneof![
        arb_detail().prop_map(RequestBody::Execute),
        arb_list().prop_map(RequestBody::List),
        arb_search().prop_map(RequestBody::Wait),
        arb_search().prop_map(RequestBody::Status),
        Just(RequestBody::VibeCheck),
        arb_search().prop_map(RequestBody::Stop),
        (arb_search(), any::<bool>()).prop_map(|(q, follow)| {
            RequestBody::TailLog(TailQuery { search: q.search, follow })
        }),
    ]
}

proptest! {
    #[test]
    fn envelope_round_trips(body in arb_body()) {
        let timestamp = Utc.with_ymd_and_hms(2025, 1, 2, 3, 4, 5).unwrap();
        let envelope = Envelope::from_body(&body, timestamp);

        let bytes = encode(&envelope).unwrap();
        let decoded: Envelope = decode(&bytes).unwrap();

        prop_assert_eq!(&decoded, &envelope);
        prop_assert_eq!(decoded.body().unwrap(), body);
    }

    #[test]
    fn job_reply_round_trips(
        id in "[a-f0-9]{32}",
        name in "[a-z-]{1,12}",
        exit_code in -1i32..255,
    ) {
        let created = Utc.with_ymd_and_hms(2025, 1, 2, 3, 4, 5).unwrap();
        let reply = JobReply {
            status: bobbit_core::JobStatus::Failed,
            exit_code,
            id,
            job_name: name,
            command: vec!["/bin/true".into()],
            metadata: serde_json::Map::new(),
            created_at: created,
            updated_at: created,
        };

        let bytes = encode(&reply).unwrap();
        let decoded: JobReply = decode(&bytes).unwrap();
        prop_assert_eq!(decoded, reply);
    }
}
