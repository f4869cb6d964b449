// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job id generation.

use sha2::{Digest, Sha256};
use uuid::Uuid;

/// Length of a generated job id in hex characters.
pub const JOB_ID_LEN: usize = 32;

/// Generate a random job identifier: cryptographically random bytes, hashed,
/// truncated to [`JOB_ID_LEN`] hex characters.
///
/// Ids carry no structure beyond uniqueness; collisions are resolved by the
/// store's unique constraint on insert.
pub fn generate_job_id() -> String {
    let mut hasher = Sha256::new();
    hasher.update(Uuid::new_v4().as_bytes());
    hasher
        .finalize()
        .iter()
        .take(JOB_ID_LEN / 2)
        .map(|byte| format!("{byte:02x}"))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_is_32_hex_chars() {
        let id = generate_job_id();
        assert_eq!(id.len(), JOB_ID_LEN);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn ids_are_unique() {
        let a = generate_job_id();
        let b = generate_job_id();
        assert_ne!(a, b);
    }
}
