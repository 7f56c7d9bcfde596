//! # BinMappings Wire Codec
//!
//! A self-describing byte stream for persisting a snapshot of the bin
//! table. Layout (all integers little-endian):
//!
//! ```text
//! Snapshot      := BinCount(u32) BinRecord{BinCount}
//! BinRecord     := AssignmentCount(u32) Assignment{AssignmentCount}
//! Assignment    := LocationIdLen(u32) LocationIdBytes(LocationIdLen)
//!                  HasExpiry(u8: 0 or 1) [ExpiryTicks(i64)]
//! ```
//!
//! `HasExpiry` means "this assignment carries an expiry", which is exactly
//! the active/tombstoned distinction — an assignment transitions to
//! expired exactly once and is never resurrected, so "has an expiry value"
//! and "is currently expired" are the same predicate from the moment of
//! tombstoning onward. `BinCount` must equal the compile-time bin count or
//! the whole snapshot is rejected — a mismatched `BinCount` cannot be
//! partially salvaged because bin indices are meaningless without it.

use binmanager_common::{SnapshotError, UtcInstant};

use crate::bin_table::BIN_COUNT;
use binmanager_common::LocationId;

/// One decoded assignment: a location id plus its expiry, if tombstoned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssignmentRecord {
    pub location: LocationId,
    pub expiry: Option<UtcInstant>,
}

/// A fully decoded (but not yet linked-into-an-engine) snapshot: one
/// assignment list per bin, in serialized order.
#[derive(Debug, Clone, Default)]
pub struct BinMappings {
    pub bins: Vec<Vec<AssignmentRecord>>,
}

impl BinMappings {
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&(self.bins.len() as u32).to_le_bytes());
        for bin in &self.bins {
            out.extend_from_slice(&(bin.len() as u32).to_le_bytes());
            for assignment in bin {
                let id_bytes = assignment.location.as_bytes();
                out.extend_from_slice(&(id_bytes.len() as u32).to_le_bytes());
                out.extend_from_slice(id_bytes);
                match assignment.expiry {
                    None => out.push(0),
                    Some(expiry) => {
                        out.push(1);
                        out.extend_from_slice(&expiry.ticks().to_le_bytes());
                    }
                }
            }
        }
        out
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, SnapshotError> {
        let mut cursor = Cursor::new(bytes);
        let bin_count = cursor.read_u32()?;
        if bin_count as usize != BIN_COUNT {
            return Err(SnapshotError::BinCountMismatch {
                expected: BIN_COUNT as u32,
                found: bin_count,
            });
        }

        let mut bins = Vec::with_capacity(bin_count as usize);
        for _ in 0..bin_count {
            let assignment_count = cursor.read_u32()?;
            let mut assignments = Vec::with_capacity(assignment_count as usize);
            for _ in 0..assignment_count {
                let id_len = cursor.read_u32()?;
                let id_bytes = cursor.read_bytes(id_len as usize)?;
                let location = LocationId::new(id_bytes);
                let has_expiry = cursor.read_u8()?;
                let expiry = match has_expiry {
                    0 => None,
                    1 => Some(UtcInstant::from_ticks(cursor.read_i64()?)),
                    other => return Err(SnapshotError::InvalidExpiryFlag(other)),
                };
                assignments.push(AssignmentRecord { location, expiry });
            }
            bins.push(assignments);
        }

        Ok(BinMappings { bins })
    }
}

/// Minimal read cursor over a byte slice, producing typed decode errors
/// instead of panicking on truncation.
struct Cursor<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Cursor { bytes, pos: 0 }
    }

    fn read_bytes(&mut self, len: usize) -> Result<&'a [u8], SnapshotError> {
        let remaining = self.bytes.len() - self.pos;
        if len > remaining {
            return Err(SnapshotError::LocationIdTooLong {
                len: len as u32,
                remaining,
            });
        }
        let slice = &self.bytes[self.pos..self.pos + len];
        self.pos += len;
        Ok(slice)
    }

    fn read_u8(&mut self) -> Result<u8, SnapshotError> {
        let slice = self.read_fixed(1)?;
        Ok(slice[0])
    }

    fn read_u32(&mut self) -> Result<u32, SnapshotError> {
        let slice = self.read_fixed(4)?;
        Ok(u32::from_le_bytes(slice.try_into().expect("len checked")))
    }

    fn read_i64(&mut self) -> Result<i64, SnapshotError> {
        let slice = self.read_fixed(8)?;
        Ok(i64::from_le_bytes(slice.try_into().expect("len checked")))
    }

    fn read_fixed(&mut self, len: usize) -> Result<&'a [u8], SnapshotError> {
        if self.pos + len > self.bytes.len() {
            return Err(SnapshotError::Truncated {
                expected: len,
                found: self.bytes.len() - self.pos,
            });
        }
        let slice = &self.bytes[self.pos..self.pos + len];
        self.pos += len;
        Ok(slice)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> BinMappings {
        let mut bins = vec![Vec::new(); BIN_COUNT];
        bins[0].push(AssignmentRecord {
            location: LocationId::new(b"alpha"),
            expiry: None,
        });
        bins[0].push(AssignmentRecord {
            location: LocationId::new(b"beta"),
            expiry: Some(UtcInstant::from_ticks(12345)),
        });
        BinMappings { bins }
    }

    #[test]
    fn round_trips_through_bytes() {
        let mappings = sample();
        let bytes = mappings.encode();
        let decoded = BinMappings::decode(&bytes).unwrap();
        assert_eq!(decoded.bins[0], mappings.bins[0]);
        assert_eq!(decoded.bins.len(), BIN_COUNT);
    }

    #[test]
    fn rejects_wrong_bin_count() {
        let bytes = 1u32.to_le_bytes().to_vec();
        let err = BinMappings::decode(&bytes).unwrap_err();
        assert_eq!(
            err,
            SnapshotError::BinCountMismatch {
                expected: BIN_COUNT as u32,
                found: 1
            }
        );
    }

    #[test]
    fn rejects_truncated_stream() {
        let mappings = sample();
        let mut bytes = mappings.encode();
        bytes.truncate(bytes.len() - 2);
        assert!(BinMappings::decode(&bytes).is_err());
    }

    #[test]
    fn rejects_invalid_expiry_flag() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&(BIN_COUNT as u32).to_le_bytes());
        bytes.extend_from_slice(&1u32.to_le_bytes()); // one assignment in bin 0
        bytes.extend_from_slice(&1u32.to_le_bytes()); // id len 1
        bytes.push(b'x');
        bytes.push(7); // invalid flag
        for _ in 1..BIN_COUNT {
            bytes.extend_from_slice(&0u32.to_le_bytes());
        }
        let err = BinMappings::decode(&bytes).unwrap_err();
        assert_eq!(err, SnapshotError::InvalidExpiryFlag(7));
    }
}
