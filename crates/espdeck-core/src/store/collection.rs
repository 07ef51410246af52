// ── Ordered reactive entity collection ──
//
// Keeps entities in the order the bridge sent them, with O(1) key lookups
// and push-based change notification via `watch` channels.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::watch;

/// Entities addressable by a stable string key.
pub(crate) trait Keyed {
    fn key(&self) -> &str;
}

impl Keyed for crate::model::Device {
    fn key(&self) -> &str {
        &self.id
    }
}

/// A reactive, ordered collection for a single entity type.
///
/// The snapshot `Vec` is the source of truth; `positions` indexes it by key.
/// Every mutation runs inside `send_modify`, so the index and the snapshot
/// change together under the channel's write lock.
pub(crate) struct EntityCollection<T: Keyed + Send + Sync + 'static> {
    /// Key -> position in the current snapshot.
    positions: DashMap<String, usize>,

    /// Version counter, bumped on every mutation.
    version: watch::Sender<u64>,

    /// Full snapshot in bridge order.
    snapshot: watch::Sender<Arc<Vec<Arc<T>>>>,
}

impl<T: Keyed + Send + Sync + 'static> EntityCollection<T> {
    pub(crate) fn new() -> Self {
        let (version, _) = watch::channel(0u64);
        let (snapshot, _) = watch::channel(Arc::new(Vec::new()));

        Self {
            positions: DashMap::new(),
            version,
            snapshot,
        }
    }

    /// Replace every entity, keeping the given order.
    pub(crate) fn replace_all(&self, entities: Vec<Arc<T>>) {
        // `send_modify` updates unconditionally, even with zero receivers.
        self.snapshot.send_modify(|snap| {
            self.positions.clear();
            for (idx, entity) in entities.iter().enumerate() {
                self.positions.insert(entity.key().to_owned(), idx);
            }
            *snap = Arc::new(entities);
        });
        self.bump_version();
    }

    /// Replace the entity with the same key, in place.
    ///
    /// Returns `false` (and changes nothing) if the key is not present.
    pub(crate) fn replace(&self, entity: Arc<T>) -> bool {
        let replaced = self.snapshot.send_if_modified(|snap| {
            let Some(idx) = self.positions.get(entity.key()).map(|r| *r.value()) else {
                return false;
            };
            let mut next: Vec<Arc<T>> = snap.as_ref().clone();
            match next.get_mut(idx) {
                Some(slot) => *slot = Arc::clone(&entity),
                None => return false,
            }
            *snap = Arc::new(next);
            true
        });
        if replaced {
            self.bump_version();
        }
        replaced
    }

    /// Look up an entity by key.
    pub(crate) fn get(&self, key: &str) -> Option<Arc<T>> {
        // Holding the read borrow keeps `positions` consistent with `snap`.
        let snap = self.snapshot.borrow();
        let idx = *self.positions.get(key)?.value();
        snap.get(idx).cloned()
    }

    /// Get the current snapshot (cheap `Arc` clone).
    pub(crate) fn snapshot(&self) -> Arc<Vec<Arc<T>>> {
        self.snapshot.borrow().clone()
    }

    /// Subscribe to snapshot changes via a `watch::Receiver`.
    pub(crate) fn subscribe(&self) -> watch::Receiver<Arc<Vec<Arc<T>>>> {
        self.snapshot.subscribe()
    }

    pub(crate) fn len(&self) -> usize {
        self.snapshot.borrow().len()
    }

    pub(crate) fn version(&self) -> u64 {
        *self.version.borrow()
    }

    // ── Private helpers ──────────────────────────────────────────────

    fn bump_version(&self) {
        self.version.send_modify(|v| *v += 1);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Item {
        key: String,
        label: &'static str,
    }

    impl Keyed for Item {
        fn key(&self) -> &str {
            &self.key
        }
    }

    fn item(key: &str, label: &'static str) -> Arc<Item> {
        Arc::new(Item {
            key: key.into(),
            label,
        })
    }

    #[test]
    fn replace_all_keeps_order() {
        let col: EntityCollection<Item> = EntityCollection::new();
        col.replace_all(vec![item("b", "x"), item("a", "y"), item("c", "z")]);

        let keys: Vec<_> = col.snapshot().iter().map(|i| i.key.clone()).collect();
        assert_eq!(keys, ["b", "a", "c"]);
        assert_eq!(col.get("a").unwrap().label, "y");
        assert_eq!(col.len(), 3);
    }

    #[test]
    fn replace_all_drops_stale_keys() {
        let col: EntityCollection<Item> = EntityCollection::new();
        col.replace_all(vec![item("a", "x"), item("b", "y")]);
        col.replace_all(vec![item("b", "z")]);

        assert!(col.get("a").is_none());
        assert_eq!(col.get("b").unwrap().label, "z");
    }

    #[test]
    fn replace_swaps_single_entity_in_place() {
        let col: EntityCollection<Item> = EntityCollection::new();
        col.replace_all(vec![item("a", "x"), item("b", "y"), item("c", "z")]);
        let before = col.version();

        assert!(col.replace(item("b", "new")));

        let labels: Vec<_> = col.snapshot().iter().map(|i| i.label).collect();
        assert_eq!(labels, ["x", "new", "z"]);
        assert_eq!(col.version(), before + 1);
    }

    #[test]
    fn replace_ignores_unknown_key() {
        let col: EntityCollection<Item> = EntityCollection::new();
        col.replace_all(vec![item("a", "x")]);
        let before = col.snapshot();
        let version = col.version();

        assert!(!col.replace(item("zzz", "ghost")));

        assert!(Arc::ptr_eq(&before, &col.snapshot()));
        assert_eq!(col.version(), version);
    }

    #[test]
    fn subscribers_see_replacements() {
        let col: EntityCollection<Item> = EntityCollection::new();
        let mut rx = col.subscribe();
        col.replace_all(vec![item("a", "x")]);
        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().len(), 1);

        col.replace(item("a", "y"));
        assert!(rx.has_changed().unwrap());
    }
}
