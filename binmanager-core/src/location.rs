//! # Location Index
//!
//! Maps every known location to its per-location record. Like
//! `hkv-engine`'s shard storage, records live in a dense arena
//! (`Vec<Option<LocationRecord>>` + a free-list) addressed by a stable
//! handle, with a hash map from the public `LocationId` to that handle.
//! `ahash`/`hashbrown` are used for the id -> handle map, the same
//! combination `MemoryEngine` uses for its shard maps.

use std::collections::BTreeMap;

use ahash::RandomState;
use binmanager_common::LocationId;
use hashbrown::HashMap;

use crate::bin_table::Slot;

/// Stable handle into the location arena. Opaque to callers outside this crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LocationHandle(u32);

impl LocationHandle {
    #[cfg(test)]
    pub(crate) fn from_index(index: u32) -> Self {
        LocationHandle(index)
    }
}

/// A reference to one assignment slot owned by this location: which bin it
/// lives in and which slot within that bin's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AssignmentRef {
    pub bin: u32,
    pub slot: Slot,
}

/// Everything the engine tracks about one location.
#[derive(Debug)]
pub struct LocationRecord {
    pub id: LocationId,
    pub active_count: u32,
    pub assignments: Vec<AssignmentRef>,
    /// Hot-path cache: bins with an active assignment for this location,
    /// mapping bin index -> the slot that assignment lives in within that
    /// bin's arena. Kept in a `BTreeMap` so "first bin by index" selection
    /// (used by the dense rebalance strategy) is just `.keys().next()`, and
    /// so expiring an assignment can find its slot without a linear scan.
    pub bins_assigned_to: BTreeMap<u32, Slot>,
}

impl LocationRecord {
    fn new(id: LocationId) -> Self {
        LocationRecord {
            id,
            active_count: 0,
            assignments: Vec::new(),
            bins_assigned_to: BTreeMap::new(),
        }
    }

    /// The set of bin indices this location is actively assigned to, in
    /// ascending order.
    pub fn bins(&self) -> impl Iterator<Item = u32> + '_ {
        self.bins_assigned_to.keys().copied()
    }
}

/// The location arena plus its id -> handle index.
#[derive(Debug, Default)]
pub struct LocationIndex {
    by_id: HashMap<LocationId, LocationHandle, RandomState>,
    records: Vec<Option<LocationRecord>>,
    free: Vec<u32>,
}

impl LocationIndex {
    pub fn new() -> Self {
        LocationIndex {
            by_id: HashMap::with_hasher(RandomState::new()),
            records: Vec::new(),
            free: Vec::new(),
        }
    }

    /// Looks up the handle for an id, if the location is known (active or
    /// holding only tombstones).
    pub fn handle(&self, id: &LocationId) -> Option<LocationHandle> {
        self.by_id.get(id).copied()
    }

    /// Returns the existing handle for `id`, or creates a fresh record.
    pub fn get_or_create(&mut self, id: LocationId) -> LocationHandle {
        if let Some(&handle) = self.by_id.get(&id) {
            return handle;
        }
        let handle = match self.free.pop() {
            Some(index) => {
                self.records[index as usize] = Some(LocationRecord::new(id.clone()));
                LocationHandle(index)
            }
            None => {
                self.records.push(Some(LocationRecord::new(id.clone())));
                LocationHandle((self.records.len() - 1) as u32)
            }
        };
        self.by_id.insert(id, handle);
        handle
    }

    pub fn record(&self, handle: LocationHandle) -> &LocationRecord {
        self.records[handle.0 as usize]
            .as_ref()
            .expect("record: handle points at an empty slot")
    }

    pub fn record_mut(&mut self, handle: LocationHandle) -> &mut LocationRecord {
        self.records[handle.0 as usize]
            .as_mut()
            .expect("record_mut: handle points at an empty slot")
    }

    /// Number of location records currently holding at least one active
    /// assignment.
    pub fn active_len(&self) -> usize {
        self.records
            .iter()
            .flatten()
            .filter(|r| r.active_count > 0)
            .count()
    }

    /// Every handle currently allocated (active or tombstone-only), in
    /// arena order. Used by construction/snapshot-replay paths that need to
    /// walk every known location once.
    pub fn handles(&self) -> impl Iterator<Item = LocationHandle> + '_ {
        self.records
            .iter()
            .enumerate()
            .filter_map(|(i, r)| r.as_ref().map(|_| LocationHandle(i as u32)))
    }

    /// Drops every record with no remaining assignments (all tombstones
    /// past their expiry, already removed by the bin table).
    pub fn purge_dead(&mut self) {
        for (index, slot) in self.records.iter_mut().enumerate() {
            let is_dead = matches!(slot, Some(r) if r.assignments.is_empty() && r.active_count == 0);
            if is_dead {
                let id = slot.take().expect("checked Some above").id;
                self.by_id.remove(&id);
                self.free.push(index as u32);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_or_create_is_idempotent() {
        let mut index = LocationIndex::new();
        let id = LocationId::new(b"alpha");
        let a = index.get_or_create(id.clone());
        let b = index.get_or_create(id.clone());
        assert_eq!(a, b);
        assert_eq!(index.handle(&id), Some(a));
    }

    #[test]
    fn purge_dead_frees_slots_for_reuse() {
        let mut index = LocationIndex::new();
        let id = LocationId::new(b"gone");
        let handle = index.get_or_create(id.clone());
        // Give the record a tombstone so it survives purge until cleared.
        index.record_mut(handle).assignments.push(AssignmentRef { bin: 0, slot: 0 });
        index.purge_dead();
        assert_eq!(index.handle(&id), Some(handle), "still alive: holds a tombstone");

        // Simulate the bin table having dropped that tombstone.
        index.record_mut(handle).assignments.clear();
        index.purge_dead();
        assert_eq!(index.handle(&id), None);

        let other = LocationId::new(b"reused");
        let reused_handle = index.get_or_create(other);
        assert_eq!(reused_handle, handle);
    }
}
