//! Cache key fingerprints

use std::fmt;

use sha2::{Digest, Sha256};

/// Bytes of the SHA-256 digest kept in a key (32 hex characters)
const KEY_BYTES: usize = 16;

/// Deterministic fingerprint of a (source, resolution) pair
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    /// Fingerprint `"{identity}_{resolution}"`
    pub fn new(identity: &str, resolution: u32) -> Self {
        Self::fingerprint(&format!("{}_{}", identity, resolution))
    }

    /// Fingerprint an arbitrary input string
    pub fn fingerprint(input: &str) -> Self {
        let digest = Sha256::digest(input.as_bytes());
        Self(hex::encode(&digest[..KEY_BYTES]))
    }

    /// Parse a key back from its hex form (e.g. a requested file stem)
    pub fn parse(s: &str) -> Option<Self> {
        let valid = s.len() == KEY_BYTES * 2
            && s.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'));
        valid.then(|| Self(s.to_string()))
    }

    /// Parse a `{key}.png` cache file name
    pub fn from_file_name(name: &str) -> Option<Self> {
        name.strip_suffix(".png").and_then(Self::parse)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Name of the cache entry for this key
    pub fn file_name(&self) -> String {
        format!("{}.png", self.0)
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
