use std::collections::BTreeMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use storefront_core::Entity;

use super::RecordStore;

/// In-memory record store for tests/dev (and the default backing of the
/// order and product services).
///
/// A poisoned lock is recovered rather than treated as empty: every write
/// is a single map operation, so the map is never left half-updated.
#[derive(Debug)]
pub struct InMemoryRecordStore<V: Entity> {
    inner: RwLock<BTreeMap<V::Id, V>>,
}

impl<V: Entity> InMemoryRecordStore<V> {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(BTreeMap::new()),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, BTreeMap<V::Id, V>> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, BTreeMap<V::Id, V>> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<V: Entity> Default for InMemoryRecordStore<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> RecordStore<V> for InMemoryRecordStore<V>
where
    V: Entity + Clone + Send + Sync + 'static,
    V::Id: Send + Sync,
{
    fn get(&self, id: &V::Id) -> Option<V> {
        self.read().get(id).cloned()
    }

    fn save(&self, value: V) {
        self.write().insert(value.id().clone(), value);
    }

    fn list(&self) -> Vec<V> {
        self.read().values().cloned().collect()
    }

    fn update(&self, id: &V::Id, change: &mut dyn FnMut(&mut V)) -> Option<V> {
        let mut map = self.write();
        let record = map.get_mut(id)?;
        let mut revised = record.clone();
        change(&mut revised);
        *record = revised.clone();
        Some(revised)
    }

    fn remove(&self, id: &V::Id) -> Option<V> {
        self.write().remove(id)
    }

    fn find_by(&self, predicate: &dyn Fn(&V) -> bool) -> Vec<V> {
        self.read().values().filter(|v| predicate(v)).cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use storefront_core::RecordId;

    #[derive(Debug, Clone, PartialEq, Eq)]
    struct Note {
        id: RecordId,
        text: &'static str,
    }

    impl Entity for Note {
        type Id = RecordId;

        fn id(&self) -> &Self::Id {
            &self.id
        }
    }

    fn note(id: u64, text: &'static str) -> Note {
        Note {
            id: RecordId::new(id),
            text,
        }
    }

    #[test]
    fn save_get_remove() {
        let store = InMemoryRecordStore::new();
        store.save(note(1, "a"));
        assert_eq!(store.get(&RecordId::new(1)), Some(note(1, "a")));

        store.save(note(1, "b"));
        assert_eq!(store.get(&RecordId::new(1)).unwrap().text, "b");

        assert_eq!(store.remove(&RecordId::new(1)), Some(note(1, "b")));
        assert_eq!(store.get(&RecordId::new(1)), None);
        assert_eq!(store.remove(&RecordId::new(1)), None);
    }

    #[test]
    fn list_and_find_are_id_ordered() {
        let store = InMemoryRecordStore::new();
        store.save(note(3, "c"));
        store.save(note(1, "a"));
        store.save(note(2, "b"));

        let ids: Vec<u64> = store.list().iter().map(|n| n.id.value()).collect();
        assert_eq!(ids, vec![1, 2, 3]);

        let found = store.find_by(&|n: &Note| n.text != "b");
        assert_eq!(found, vec![note(1, "a"), note(3, "c")]);
    }

    #[test]
    fn update_changes_existing_records_only() {
        let store = InMemoryRecordStore::new();
        store.save(note(1, "a"));

        let updated = store.update(&RecordId::new(1), &mut |n: &mut Note| n.text = "b");
        assert_eq!(updated, Some(note(1, "b")));
        assert_eq!(store.get(&RecordId::new(1)), Some(note(1, "b")));

        assert_eq!(store.update(&RecordId::new(2), &mut |n: &mut Note| n.text = "z"), None);
        assert_eq!(store.get(&RecordId::new(2)), None);
    }

    #[test]
    fn writes_survive_a_poisoned_lock() {
        let store = InMemoryRecordStore::new();
        store.save(note(1, "a"));

        let panicked = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            store.update(&RecordId::new(1), &mut |_: &mut Note| panic!("change failed"));
        }));
        assert!(panicked.is_err());
        assert!(store.inner.is_poisoned());

        store.save(note(2, "b"));
        assert_eq!(store.get(&RecordId::new(1)), Some(note(1, "a")));
        assert_eq!(store.get(&RecordId::new(2)), Some(note(2, "b")));
        assert_eq!(store.list().len(), 2);
        assert_eq!(store.remove(&RecordId::new(2)), Some(note(2, "b")));
    }
}
