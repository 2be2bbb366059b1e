//! Content fingerprints used for change deduplication.

use sha2::{Digest, Sha256};

/// Lowercase hex SHA-256 of `bytes`.
pub fn content_hash(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_digest() {
        assert_eq!(
            content_hash(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_stable_and_distinct() {
        assert_eq!(content_hash(b"[]"), content_hash(b"[]"));
        assert_ne!(content_hash(b"[]"), content_hash(b"[ ]"));
        assert_eq!(content_hash(b"abc").len(), 64);
    }
}
