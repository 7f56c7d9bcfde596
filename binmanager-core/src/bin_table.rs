//! # Bin Table
//!
//! Fixed-size array of `B = 2^16` bins. Each bin owns its own small arena of
//! assignments (active + tombstoned), indexed by a slot handle rather than a
//! pointer, mirroring the `ShardInner` node-arena pattern used for LRU
//! bookkeeping elsewhere in this codebase: a dense `Vec<Option<Assignment>>`
//! plus a free-list for recycling slots on churn.

use binmanager_common::UtcInstant;

use crate::location::LocationHandle;

/// Number of bins in the table: `2^16`.
pub const BIN_COUNT: usize = 1 << 16;

/// A single claim that `location` is (or was) responsible for a bin.
///
/// `expiry` is `None` while active; set exactly once, on the transition to
/// a tombstone, and never cleared.
#[derive(Debug, Clone, Copy)]
pub struct Assignment {
    pub location: LocationHandle,
    pub expiry: Option<UtcInstant>,
}

impl Assignment {
    #[inline]
    pub fn is_active(&self) -> bool {
        self.expiry.is_none()
    }
}

/// A slot handle into one bin's assignment arena.
pub type Slot = u32;

/// One bin's assignment storage.
///
/// `active_count` is maintained as an invariant equal to the number of
/// `Some(assignment)` slots with `expiry == None`; every mutator that
/// changes a slot's expiry state must keep it in sync.
#[derive(Debug, Default)]
pub struct Bin {
    slots: Vec<Option<Assignment>>,
    free: Vec<Slot>,
    pub active_count: u32,
}

impl Bin {
    pub fn new() -> Self {
        Bin::default()
    }

    /// Inserts a new active assignment for `location` and returns its slot.
    pub fn insert_active(&mut self, location: LocationHandle) -> Slot {
        let assignment = Assignment {
            location,
            expiry: None,
        };
        let slot = self.free.pop().unwrap_or_else(|| {
            self.slots.push(None);
            (self.slots.len() - 1) as Slot
        });
        self.slots[slot as usize] = Some(assignment);
        self.active_count += 1;
        slot
    }

    /// Inserts an already-tombstoned assignment (used while replaying a
    /// snapshot) and returns its slot. Does not affect `active_count`.
    pub fn insert_tombstoned(&mut self, location: LocationHandle, expiry: UtcInstant) -> Slot {
        let assignment = Assignment {
            location,
            expiry: Some(expiry),
        };
        let slot = self.free.pop().unwrap_or_else(|| {
            self.slots.push(None);
            (self.slots.len() - 1) as Slot
        });
        self.slots[slot as usize] = Some(assignment);
        slot
    }

    /// Transitions an active assignment at `slot` to a tombstone with `expiry`.
    pub fn expire(&mut self, slot: Slot, expiry: UtcInstant) {
        let assignment = self.slots[slot as usize]
            .as_mut()
            .expect("expire: slot is empty");
        debug_assert!(assignment.is_active(), "expire: slot already tombstoned");
        assignment.expiry = Some(expiry);
        self.active_count -= 1;
    }

    /// Returns true if `location` already owns an active assignment in this bin.
    pub fn has_active(&self, location: LocationHandle) -> bool {
        self.slots.iter().flatten().any(|a| a.is_active() && a.location == location)
    }

    /// Iterates over every live slot (active + tombstoned) with its handle.
    pub fn iter(&self) -> impl Iterator<Item = (Slot, &Assignment)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| slot.as_ref().map(|a| (i as Slot, a)))
    }

    /// Returns the active locations in this bin, in slot order (stable until
    /// the next mutation).
    pub fn active_locations(&self) -> impl Iterator<Item = LocationHandle> + '_ {
        self.slots
            .iter()
            .flatten()
            .filter(|a| a.is_active())
            .map(|a| a.location)
    }

    /// Drops every slot whose expiry has passed `now`, invoking `on_drop`
    /// with the location handle of each dropped assignment so the caller
    /// can remove the matching back-reference from the location record.
    pub fn drop_expired(&mut self, now: UtcInstant, mut on_drop: impl FnMut(LocationHandle, Slot)) {
        for (idx, slot) in self.slots.iter_mut().enumerate() {
            let drop_it = matches!(slot, Some(a) if matches!(a.expiry, Some(e) if e <= now));
            if drop_it {
                let assignment = slot.take().expect("checked Some above");
                on_drop(assignment.location, idx as Slot);
                self.free.push(idx as Slot);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn h(n: u32) -> LocationHandle {
        LocationHandle::from_index(n)
    }

    #[test]
    fn insert_and_expire_tracks_active_count() {
        let mut bin = Bin::new();
        let slot = bin.insert_active(h(0));
        assert_eq!(bin.active_count, 1);
        bin.expire(slot, UtcInstant::EPOCH);
        assert_eq!(bin.active_count, 0);
    }

    #[test]
    fn slots_are_recycled() {
        let mut bin = Bin::new();
        let slot_a = bin.insert_active(h(0));
        bin.expire(slot_a, UtcInstant::EPOCH);
        bin.drop_expired(UtcInstant::from_ticks(1), |_, _| {});
        let slot_b = bin.insert_active(h(1));
        assert_eq!(slot_a, slot_b);
    }

    #[test]
    fn has_active_detects_duplicate_location() {
        let mut bin = Bin::new();
        bin.insert_active(h(5));
        assert!(bin.has_active(h(5)));
        assert!(!bin.has_active(h(6)));
    }
}
