//! Fixed-width record names.

use std::fmt;
use std::hash::{Hash, Hasher};

use super::NAME_LEN;

/// A record name stored as exactly 40 bytes.
///
/// Longer names lose their tail; shorter ones are zero-padded. Equality and
/// hashing use the zero-trimmed form, so `"a"` padded with zeros equals `"a"`.
#[derive(Clone, Copy)]
pub struct ByteIdentifier([u8; NAME_LEN]);

impl ByteIdentifier {
    /// Encode a name, truncating to 40 bytes
    pub fn new(name: &str) -> Self {
        let mut bytes = [0u8; NAME_LEN];
        let src = name.as_bytes();
        let len = src.len().min(NAME_LEN);
        bytes[..len].copy_from_slice(&src[..len]);
        Self(bytes)
    }

    /// Wrap raw directory bytes
    pub fn from_bytes(bytes: [u8; NAME_LEN]) -> Self {
        Self(bytes)
    }

    /// Raw 40-byte form, as written to disk
    pub fn as_bytes(&self) -> &[u8; NAME_LEN] {
        &self.0
    }

    /// The name without trailing zero padding
    pub fn trimmed(&self) -> &[u8] {
        let end = self
            .0
            .iter()
            .rposition(|&b| b != 0)
            .map(|pos| pos + 1)
            .unwrap_or(0);
        &self.0[..end]
    }

    /// Whether encoding `name` drops bytes
    pub fn was_truncated(name: &str) -> bool {
        name.len() > NAME_LEN
    }

    /// Lossy UTF-8 rendering of the trimmed name
    pub fn to_string_lossy(&self) -> String {
        String::from_utf8_lossy(self.trimmed()).into_owned()
    }
}

impl PartialEq for ByteIdentifier {
    fn eq(&self, other: &Self) -> bool {
        self.trimmed() == other.trimmed()
    }
}

impl Eq for ByteIdentifier {}

impl Hash for ByteIdentifier {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.trimmed().hash(state);
    }
}

impl From<&str> for ByteIdentifier {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl fmt::Display for ByteIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.to_string_lossy())
    }
}

impl fmt::Debug for ByteIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ByteIdentifier({:?})", self.to_string_lossy())
    }
}
