//! Generic per-entity record storage.
//!
//! Orders and products are plain records: create, read, delete and
//! find-by-field. Stock records do NOT go through this store; the stock
//! ledger owns them so it can make check-and-decrement atomic.

pub mod in_memory;

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use storefront_core::{Entity, RecordId};

pub use in_memory::InMemoryRecordStore;

/// Record store abstraction, keyed by the entity's own id.
pub trait RecordStore<V: Entity>: Send + Sync {
    fn get(&self, id: &V::Id) -> Option<V>;
    /// Insert or overwrite the record with `value.id()`.
    fn save(&self, value: V);
    /// All records, in id order.
    fn list(&self) -> Vec<V>;
    /// Apply `change` to the record with `id` in place, atomically with the
    /// lookup. `None` (and no write) if there is no such record.
    fn update(&self, id: &V::Id, change: &mut dyn FnMut(&mut V)) -> Option<V>;
    /// Remove a record, returning it if it existed.
    fn remove(&self, id: &V::Id) -> Option<V>;
    /// Records matching a predicate, in id order.
    fn find_by(&self, predicate: &dyn Fn(&V) -> bool) -> Vec<V>;
}

impl<V, S> RecordStore<V> for Arc<S>
where
    V: Entity,
    S: RecordStore<V> + ?Sized,
{
    fn get(&self, id: &V::Id) -> Option<V> {
        (**self).get(id)
    }

    fn save(&self, value: V) {
        (**self).save(value)
    }

    fn list(&self) -> Vec<V> {
        (**self).list()
    }

    fn update(&self, id: &V::Id, change: &mut dyn FnMut(&mut V)) -> Option<V> {
        (**self).update(id, change)
    }

    fn remove(&self, id: &V::Id) -> Option<V> {
        (**self).remove(id)
    }

    fn find_by(&self, predicate: &dyn Fn(&V) -> bool) -> Vec<V> {
        (**self).find_by(predicate)
    }
}

/// Monotonic allocator for store-assigned numeric ids (starts at 1).
#[derive(Debug)]
pub struct IdSequence {
    next: AtomicU64,
}

impl IdSequence {
    pub fn new() -> Self {
        Self {
            next: AtomicU64::new(1),
        }
    }

    /// Continue after the highest id already in use.
    pub fn starting_after(last: Option<RecordId>) -> Self {
        Self {
            next: AtomicU64::new(last.map(|id| id.value() + 1).unwrap_or(1)),
        }
    }

    pub fn next_id(&self) -> RecordId {
        RecordId::new(self.next.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for IdSequence {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequence_continues_after_existing_ids() {
        let seq = IdSequence::starting_after(Some(RecordId::new(41)));
        assert_eq!(seq.next_id(), RecordId::new(42));
        assert_eq!(seq.next_id(), RecordId::new(43));
    }

    #[test]
    fn empty_sequence_starts_at_one() {
        assert_eq!(IdSequence::new().next_id(), RecordId::new(1));
        assert_eq!(IdSequence::starting_after(None).next_id(), RecordId::new(1));
    }
}
