//! Salted dedupe keys for (recipient, offering) pairs.
//!
//! The ledger must remember who was notified about what without storing
//! recipient addresses. Each pair is keyed by an HMAC-SHA256 over
//! `recipient|offering_identity`, using the deployment salt as key material:
//! deterministic for fixed inputs, not invertible without the salt, and
//! distinct salts produce disjoint key spaces.

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Compute the dedupe key for a (recipient, offering) pair as lowercase hex.
///
/// Pure function; stable across process restarts for a fixed salt.
pub fn dedupe_key(salt: &str, recipient: &str, offering_identity: &str) -> String {
    let mut mac =
        HmacSha256::new_from_slice(salt.as_bytes()).expect("HMAC can take key of any size");
    mac.update(recipient.as_bytes());
    mac.update(b"|");
    mac.update(offering_identity.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_key_is_deterministic() {
        let a = dedupe_key("salt", "a@example.com", "SRBL|2026-02-05");
        let b = dedupe_key("salt", "a@example.com", "SRBL|2026-02-05");
        assert_eq!(a, b);
    }

    #[test]
    fn test_key_is_lowercase_hex_sha256_width() {
        let key = dedupe_key("salt", "a@example.com", "SRBL|2026-02-05");
        assert_eq!(key.len(), 64);
        assert!(key.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn test_each_input_changes_the_key() {
        let base = dedupe_key("salt", "a@example.com", "SRBL|2026-02-05");
        assert_ne!(base, dedupe_key("other-salt", "a@example.com", "SRBL|2026-02-05"));
        assert_ne!(base, dedupe_key("salt", "b@example.com", "SRBL|2026-02-05"));
        assert_ne!(base, dedupe_key("salt", "a@example.com", "SRBL|2026-02-06"));
    }

    proptest! {
        /// Same inputs always hash to the same key.
        #[test]
        fn prop_key_deterministic(salt: String, recipient: String, identity: String) {
            prop_assert_eq!(
                dedupe_key(&salt, &recipient, &identity),
                dedupe_key(&salt, &recipient, &identity)
            );
        }

        /// Different salts keep their key spaces disjoint.
        #[test]
        fn prop_salts_disjoint(salt1: String, salt2: String, recipient: String, identity: String) {
            prop_assume!(salt1 != salt2);
            prop_assert_ne!(
                dedupe_key(&salt1, &recipient, &identity),
                dedupe_key(&salt2, &recipient, &identity)
            );
        }
    }
}
