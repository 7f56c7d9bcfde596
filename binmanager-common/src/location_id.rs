//! # Location Identifier
//!
//! An opaque byte string naming a storage location ("its path" in the
//! engine's vocabulary). Equality and ordering are byte-lexicographic,
//! which is what the balance ordering's `(active_count, id)` tie-break
//! relies on.
//!
//! Backed by `Arc<[u8]>` rather than `Vec<u8>` so that the same id can be
//! cloned cheaply into the ordering's `BTreeSet` keys and into every
//! location record's cross-references without re-allocating the bytes.

use std::fmt;
use std::sync::Arc;

#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LocationId(Arc<[u8]>);

impl LocationId {
    /// Builds a location id from any byte-like input.
    pub fn new<T: AsRef<[u8]>>(data: T) -> Self {
        LocationId(Arc::from(data.as_ref()))
    }

    /// Returns the id's bytes.
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl AsRef<[u8]> for LocationId {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<&str> for LocationId {
    fn from(s: &str) -> Self {
        LocationId::new(s.as_bytes())
    }
}

impl From<String> for LocationId {
    fn from(s: String) -> Self {
        LocationId::new(s.as_bytes())
    }
}

impl From<Vec<u8>> for LocationId {
    fn from(v: Vec<u8>) -> Self {
        LocationId(Arc::from(v))
    }
}

impl fmt::Debug for LocationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LocationId({:?})", String::from_utf8_lossy(&self.0))
    }
}

impl fmt::Display for LocationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", String::from_utf8_lossy(&self.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equal_bytes_are_equal() {
        assert_eq!(LocationId::new(b"alpha"), LocationId::new(b"alpha"));
        assert_ne!(LocationId::new(b"alpha"), LocationId::new(b"beta"));
    }

    #[test]
    fn ordering_is_byte_lexicographic() {
        assert!(LocationId::new(b"a") < LocationId::new(b"b"));
        assert!(LocationId::new(b"10") < LocationId::new(b"2"));
    }

    #[test]
    fn clone_is_cheap_and_shares_bytes() {
        let a = LocationId::new(b"shared");
        let b = a.clone();
        assert_eq!(a.as_bytes(), b.as_bytes());
    }
}
