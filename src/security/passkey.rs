//! Constant-time passkey comparison.

use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

/// Compare a supplied passkey with the configured one.
///
/// Both sides are hashed first, so the comparison always runs over two
/// 32-byte digests: neither the length of the secret nor the position of
/// the first differing byte affects timing.
pub fn passkey_matches(supplied: &str, expected: &str) -> bool {
    let supplied = Sha256::digest(supplied.as_bytes());
    let expected = Sha256::digest(expected.as_bytes());
    supplied.as_slice().ct_eq(expected.as_slice()).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equal_passkeys_match() {
        assert!(passkey_matches("correct horse", "correct horse"));
        assert!(passkey_matches("", ""));
    }

    #[test]
    fn any_difference_fails() {
        assert!(!passkey_matches("correct horsE", "correct horse"));
        assert!(!passkey_matches("Correct horse", "correct horse"));
        assert!(!passkey_matches("correct", "correct horse"));
        assert!(!passkey_matches("correct horse battery", "correct horse"));
        assert!(!passkey_matches("", "correct horse"));
    }
}
