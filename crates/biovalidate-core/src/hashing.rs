// biovalidate-core/src/hashing.rs
// ============================================================================
// Module: Content Hashing
// Description: SHA-256 digests over raw bytes, truncated to a short hex prefix.
// Purpose: Identify which ruleset configuration produced a given report.
// Dependencies: sha2
// ============================================================================

//! ## Overview
//! Ruleset identity is a content hash, not a version string alone, so that two
//! configs declaring the same `version` but differing in rule bodies are still
//! distinguishable in a report.

// ============================================================================
// SECTION: Imports
// ============================================================================

use sha2::Digest;
use sha2::Sha256;

// ============================================================================
// SECTION: Hashing
// ============================================================================

/// Number of hex characters retained from the full SHA-256 digest.
pub const DIGEST_PREFIX_LEN: usize = 16;

/// Hashes raw bytes with SHA-256 and returns the first [`DIGEST_PREFIX_LEN`]
/// hex characters of the digest.
#[must_use]
pub fn short_digest(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    let digest = hasher.finalize();
    let full = hex_encode(&digest);
    full[..DIGEST_PREFIX_LEN.min(full.len())].to_string()
}

/// Encodes bytes as a lowercase hex string.
fn hex_encode(bytes: &[u8]) -> String {
    /// Lowercase hex digit lookup table, indexed by nibble value.
    const HEX: &[u8; 16] = b"0123456789abcdef";
    let mut out = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        out.push(HEX[(byte >> 4) as usize] as char);
        out.push(HEX[(byte & 0x0f) as usize] as char);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_digest_is_sixteen_hex_chars() {
        let digest = short_digest(b"hello world");
        assert_eq!(digest.len(), 16);
        assert!(digest.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn short_digest_is_deterministic() {
        assert_eq!(short_digest(b"abc"), short_digest(b"abc"));
        assert_ne!(short_digest(b"abc"), short_digest(b"abd"));
    }
}
