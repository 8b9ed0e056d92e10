//! Content-addressed digests used for fingerprints and source/recipe hashing.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::Trace2PassError;

/// A SHA-256 hex digest.
///
/// The inner field is private to guarantee the string is always valid
/// lowercase hex produced by `from_bytes` or validated via `TryFrom<String>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContentDigest(String);

impl ContentDigest {
    /// Compute the SHA-256 digest of the given bytes.
    pub fn from_bytes(data: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(data);
        ContentDigest(hex::encode(hasher.finalize()))
    }

    /// Return the full hex string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Short form (first 12 hex chars), for log lines.
    pub fn short(&self) -> &str {
        &self.0[..12.min(self.0.len())]
    }
}

impl TryFrom<String> for ContentDigest {
    type Error = Trace2PassError;

    fn try_from(s: String) -> std::result::Result<Self, Self::Error> {
        if s.len() != 64 || !s.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(Trace2PassError::InvalidDigest { digest: s });
        }
        Ok(ContentDigest(s.to_ascii_lowercase()))
    }
}

impl std::fmt::Display for ContentDigest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A `Fingerprint` groups the same bug across events: a cryptographic hash
/// over `(source-file:line:function, check-kind, compiler-version,
/// normalized-sorted-flag-list)`. Two events with identical fingerprints are
/// the same bug; two events with different fingerprints may still be the
/// same bug (false split is acceptable, false merge is not).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Fingerprint(ContentDigest);

impl Fingerprint {
    /// Compute a fingerprint from the canonical tuple. `flags` is normalized
    /// (sorted) internally so that flag reordering never changes the
    /// fingerprint.
    pub fn compute(
        file: &str,
        line: u32,
        function: &str,
        check_kind: &str,
        compiler_version: &str,
        flags: &[String],
    ) -> Self {
        let mut sorted_flags = flags.to_vec();
        sorted_flags.sort();

        let mut hasher = Sha256::new();
        hasher.update(file.as_bytes());
        hasher.update(b"\0");
        hasher.update(line.to_le_bytes());
        hasher.update(b"\0");
        hasher.update(function.as_bytes());
        hasher.update(b"\0");
        hasher.update(check_kind.as_bytes());
        hasher.update(b"\0");
        hasher.update(compiler_version.as_bytes());
        hasher.update(b"\0");
        for flag in &sorted_flags {
            hasher.update(flag.as_bytes());
            hasher.update(b",");
        }
        Fingerprint(ContentDigest(hex::encode(hasher.finalize())))
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    pub fn short(&self) -> &str {
        self.0.short()
    }
}

impl TryFrom<String> for Fingerprint {
    type Error = Trace2PassError;

    fn try_from(s: String) -> std::result::Result<Self, Self::Error> {
        Ok(Fingerprint(ContentDigest::try_from(s)?))
    }
}

impl std::fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_digest_from_bytes_is_deterministic() {
        let a = ContentDigest::from_bytes(b"hello");
        let b = ContentDigest::from_bytes(b"hello");
        assert_eq!(a, b);
    }

    #[test]
    fn content_digest_try_from_rejects_bad_hex() {
        assert!(ContentDigest::try_from("not-hex".to_string()).is_err());
        assert!(ContentDigest::try_from("a".repeat(64)).is_ok());
    }

    #[test]
    fn fingerprint_stable_across_flag_order() {
        let flags_a = vec!["-O2".to_string(), "-Wall".to_string()];
        let flags_b = vec!["-Wall".to_string(), "-O2".to_string()];

        let fp_a = Fingerprint::compute(
            "main.c",
            42,
            "main",
            "arithmetic_overflow",
            "17.0.3",
            &flags_a,
        );
        let fp_b = Fingerprint::compute(
            "main.c",
            42,
            "main",
            "arithmetic_overflow",
            "17.0.3",
            &flags_b,
        );

        assert_eq!(fp_a, fp_b);
    }

    #[test]
    fn fingerprint_differs_on_line() {
        let flags = vec!["-O2".to_string()];
        let fp_a = Fingerprint::compute("main.c", 42, "main", "unreachable", "17.0.3", &flags);
        let fp_b = Fingerprint::compute("main.c", 43, "main", "unreachable", "17.0.3", &flags);
        assert_ne!(fp_a, fp_b);
    }
}
