//! hasher.rs — content addressing of URLs for the verdict store.
//!
//! The digest is the store's primary key only. It never shows up in a verdict.

use sha2::{Digest, Sha256};
use std::fmt;

/// SHA-256 of the raw URL bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UrlDigest([u8; 32]);

impl UrlDigest {
    /// Lowercase hex, 64 chars. This is the form persisted in the `hash` column.
    pub fn to_hex(&self) -> String {
        let mut out = String::with_capacity(64);
        for b in self.0.iter() {
            use std::fmt::Write as _;
            let _ = write!(&mut out, "{:02x}", b);
        }
        out
    }
}

impl fmt::Display for UrlDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Deterministic digest of `url`. No normalization: `http://a.com` and
/// `http://a.com/` are different keys.
pub fn digest(url: &str) -> UrlDigest {
    let mut hasher = Sha256::new();
    hasher.update(url.as_bytes());
    UrlDigest(hasher.finalize().into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digest_is_stable() {
        let a = digest("https://example.com/docs");
        let b = digest("https://example.com/docs");
        assert_eq!(a, b);
        assert_eq!(a.to_hex().len(), 64);
    }

    #[test]
    fn known_vector_matches_sha256() {
        // sha256("abc")
        assert_eq!(
            digest("abc").to_hex(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn trailing_slash_is_a_different_key() {
        assert_ne!(digest("http://a.com"), digest("http://a.com/"));
    }
}
