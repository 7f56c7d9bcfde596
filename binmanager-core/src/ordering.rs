//! # Balance Ordering
//!
//! An ordered multiset of active locations keyed by `(active_count, id)`,
//! giving `O(log n)` min/max selection and removal. Backed by a
//! `BTreeSet<(u32, LocationId)>` — Rust's standard ordered-map primitive is
//! enough here; there is no need for the indexed-priority-queue fallback the
//! design notes mention for languages without one.
//!
//! Because the sort key (`active_count`) changes under mutation, every
//! update follows the "remove -> mutate -> reinsert" discipline: callers
//! must remove the old `(count, id)` pair before changing a location's
//! count and insert the new one afterward. This module only stores pairs;
//! the active-count bookkeeping itself lives on the `LocationRecord`.

use std::collections::BTreeSet;

use binmanager_common::LocationId;

#[derive(Debug, Default)]
pub struct BalanceOrdering {
    set: BTreeSet<(u32, LocationId)>,
}

impl BalanceOrdering {
    pub fn new() -> Self {
        BalanceOrdering { set: BTreeSet::new() }
    }

    pub fn insert(&mut self, id: LocationId, active_count: u32) {
        self.set.insert((active_count, id));
    }

    pub fn remove(&mut self, id: &LocationId, active_count: u32) {
        self.set.remove(&(active_count, id.clone()));
    }

    /// Removes `id` at `old_count` and reinserts it at `new_count`.
    pub fn rekey(&mut self, id: &LocationId, old_count: u32, new_count: u32) {
        self.remove(id, old_count);
        self.insert(id.clone(), new_count);
    }

    pub fn contains(&self, id: &LocationId, active_count: u32) -> bool {
        self.set.contains(&(active_count, id.clone()))
    }

    pub fn min(&self) -> Option<(u32, &LocationId)> {
        self.set.first().map(|(count, id)| (*count, id))
    }

    pub fn max(&self) -> Option<(u32, &LocationId)> {
        self.set.last().map(|(count, id)| (*count, id))
    }

    pub fn len(&self) -> usize {
        self.set.len()
    }

    pub fn is_empty(&self) -> bool {
        self.set.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn min_and_max_reflect_counts() {
        let mut ordering = BalanceOrdering::new();
        ordering.insert(LocationId::new(b"a"), 3);
        ordering.insert(LocationId::new(b"b"), 1);
        ordering.insert(LocationId::new(b"c"), 2);

        assert_eq!(ordering.min().map(|(c, id)| (c, id.clone())), Some((1, LocationId::new(b"b"))));
        assert_eq!(ordering.max().map(|(c, id)| (c, id.clone())), Some((3, LocationId::new(b"a"))));
    }

    #[test]
    fn ties_break_by_id() {
        let mut ordering = BalanceOrdering::new();
        ordering.insert(LocationId::new(b"z"), 1);
        ordering.insert(LocationId::new(b"a"), 1);

        assert_eq!(ordering.min().map(|(_, id)| id.clone()), Some(LocationId::new(b"a")));
    }

    #[test]
    fn rekey_moves_between_positions() {
        let mut ordering = BalanceOrdering::new();
        let id = LocationId::new(b"x");
        ordering.insert(id.clone(), 0);
        ordering.rekey(&id, 0, 5);
        assert!(!ordering.contains(&id, 0));
        assert!(ordering.contains(&id, 5));
    }
}
