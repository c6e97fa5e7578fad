//! Deterministic fingerprints for solver artifacts.
//!
//! Provides a 256-bit hash value with domain separation and length
//! prefixing, so that equal artifacts produce identical fingerprints
//! across builds and platforms. The solver's determinism guarantee is
//! stated (and tested) in terms of these fingerprints.
//!
//! # Citations
//! - SHA-256: NIST FIPS 180-4 (2015)
//! - Domain separation & length prefixing: Bernstein et al., "How to
//!   hash into elliptic curves" (2009)

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// A 256-bit hash value.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HashValue(pub [u8; 32]);

impl HashValue {
    /// Creates a zero hash (all zeros).
    #[inline]
    pub const fn zero() -> Self {
        Self([0u8; 32])
    }

    /// Creates a hash from a raw byte array.
    #[inline]
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Returns the raw byte array.
    #[inline]
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Computes SHA-256 of `data` with domain separation.
    ///
    /// The digest covers `b"CFD:" || domain || b":v1" || len(data) as
    /// u64 le || data`, so distinct domains can never collide on shared
    /// payloads.
    pub fn hash_with_domain(domain: &[u8], data: &[u8]) -> Self {
        let mut hasher = Sha256::new();

        hasher.update(b"CFD:");
        hasher.update(domain);
        hasher.update(b":v1");
        hasher.update((data.len() as u64).to_le_bytes());
        hasher.update(data);

        Self(hasher.finalize().into())
    }
}

impl std::fmt::Display for HashValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "HashValue({:02x}{:02x}{:02x}{:02x}…)",
            self.0[0], self.0[1], self.0[2], self.0[3]
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Test determinism and domain separation.
    #[test]
    fn domains_separate() {
        let a = HashValue::hash_with_domain(b"SOLUTION", b"payload");
        let b = HashValue::hash_with_domain(b"SOLUTION", b"payload");
        let c = HashValue::hash_with_domain(b"PATH", b"payload");

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_ne!(a, HashValue::zero());
    }

    /// Test length prefixing blocks extension-style collisions between
    /// split payloads.
    #[test]
    fn length_prefixed() {
        let joined = HashValue::hash_with_domain(b"D", b"abcd");
        let shifted = HashValue::hash_with_domain(b"Da", b"bcd");

        assert_ne!(joined, shifted);
    }

    /// Test accessors round-trip the raw bytes.
    #[test]
    fn raw_bytes() {
        let h = HashValue::hash_with_domain(b"D", b"x");
        assert_eq!(HashValue::from_bytes(*h.as_bytes()), h);
    }
}
