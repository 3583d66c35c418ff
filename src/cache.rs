use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::inventory::Inventory;
use crate::storage::StorageKey;

/// Loaded inventories by key. Entries are whole snapshots, replaced and never edited in place.
///
/// An entry whose contents differ from its saved baseline is dirty and is kept until a flush
/// saves it.
#[derive(Debug)]
pub struct InventoryCache {
    entries: Mutex<HashMap<StorageKey, Arc<Inventory>>>,
    max_dirty: usize,
}

impl InventoryCache {
    pub fn new(max_dirty: usize) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            max_dirty,
        }
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<StorageKey, Arc<Inventory>>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Stores a freshly loaded inventory, replacing whatever was there.
    pub fn install(&self, key: StorageKey, inventory: Arc<Inventory>) {
        if self.entries().insert(key.clone(), inventory).is_some() {
            tracing::debug!("Replaced cached inventory {}.", key);
        }
    }

    pub fn get(&self, key: &StorageKey) -> Option<Arc<Inventory>> {
        self.entries().get(key).cloned()
    }

    /// Replaces the entry with edited contents. Returns `true` once the number of dirty
    /// entries reaches the configured maximum, the caller should flush then.
    pub fn update(&self, key: StorageKey, inventory: Inventory) -> bool {
        let mut entries = self.entries();
        entries.insert(key, Arc::new(inventory));
        let dirty = entries.values().filter(|inv| inv.has_unsaved_changes()).count();
        dirty >= self.max_dirty
    }

    pub fn dirty_entries(&self) -> Vec<(StorageKey, Arc<Inventory>)> {
        self.entries()
            .iter()
            .filter(|(_, inventory)| inventory.has_unsaved_changes())
            .map(|(key, inventory)| (key.clone(), Arc::clone(inventory)))
            .collect()
    }

    pub fn dirty_count(&self) -> usize {
        self.entries()
            .values()
            .filter(|inventory| inventory.has_unsaved_changes())
            .count()
    }

    /// Records that `saved` was written out. Does nothing if the entry was replaced since
    /// `saved` was taken from it, the newer contents are still unsaved.
    pub fn mark_saved(&self, key: &StorageKey, saved: &Arc<Inventory>) -> bool {
        let mut entries = self.entries();
        match entries.get_mut(key) {
            Some(current) if Arc::ptr_eq(current, saved) => {
                let mut clean = Inventory::clone(saved);
                clean.mark_saved();
                *current = Arc::new(clean);
                true
            }
            _ => false,
        }
    }

    /// Drops a clean entry. Dirty entries stay until they are saved.
    pub fn unload(&self, key: &StorageKey) -> bool {
        let mut entries = self.entries();
        let clean = entries
            .get(key)
            .is_some_and(|inventory| !inventory.has_unsaved_changes());
        if clean {
            entries.remove(key);
        }
        clean
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }
}
