//! # Snapshot Decode Errors
//!
//! The only recoverable failure category in the engine: a corrupt or
//! mismatched snapshot. Precondition violations on
//! `add_location`/`remove_location` are programmer errors and panic
//! instead of returning a `Result`.

use thiserror::Error;

/// Reasons `BinMappings::decode` can refuse a byte stream.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SnapshotError {
    /// The stream ended before a length-prefixed field could be read in full.
    #[error("truncated snapshot: expected {expected} more bytes, found {found}")]
    Truncated { expected: usize, found: usize },

    /// `BinCount` did not equal the compile-time bin count `B`.
    #[error("bin count mismatch: expected {expected}, found {found}")]
    BinCountMismatch { expected: u32, found: u32 },

    /// A location id's declared length would read past the remaining buffer.
    #[error("location id length {len} exceeds remaining buffer of {remaining} bytes")]
    LocationIdTooLong { len: u32, remaining: usize },

    /// The `HasExpiry` byte was neither 0 nor 1.
    #[error("invalid expiry flag byte: {0}")]
    InvalidExpiryFlag(u8),
}
