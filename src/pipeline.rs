//! Moving inventories between storage and the cache.
//!
//! Loading: raw bytes → decoded tree → [`Inventory`] → cache → callback, where the last two
//! steps always happen on the primary context. Data that cannot be read never blocks a player,
//! it is logged and replaced with an empty inventory.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use bytes::Bytes;

use crate::cache::InventoryCache;
use crate::config::StorageFormat;
use crate::context::ExecutionContext;
use crate::error::{StorageError, StorageResult};
use crate::inventory::{ChestOwner, Inventory};
use crate::mapper::InventoryMapper;
use crate::provider::EmptyInventoryProvider;
use crate::storage::{InventoryStorage, StorageKey};

pub type LoadCallback = Arc<dyn Fn(Arc<Inventory>) + Send + Sync>;

/// A pending load. Two requests are equal if they load the same key into the same callback,
/// which lets callers drop duplicates.
#[derive(Clone)]
pub struct LoadRequest {
    key: StorageKey,
    callback: LoadCallback,
}

impl LoadRequest {
    pub fn new<F>(key: StorageKey, callback: F) -> Self
    where
        F: Fn(Arc<Inventory>) + Send + Sync + 'static,
    {
        Self::with_callback(key, Arc::new(callback))
    }

    pub fn with_callback(key: StorageKey, callback: LoadCallback) -> Self {
        Self { key, callback }
    }

    pub fn key(&self) -> &StorageKey {
        &self.key
    }

    fn callback_addr(&self) -> *const () {
        Arc::as_ptr(&self.callback) as *const ()
    }
}

impl PartialEq for LoadRequest {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key && self.callback_addr() == other.callback_addr()
    }
}

impl Eq for LoadRequest {}

impl Hash for LoadRequest {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key.hash(state);
        self.callback_addr().hash(state);
    }
}

impl fmt::Debug for LoadRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoadRequest")
            .field("key", &self.key)
            .field("callback", &self.callback_addr())
            .finish()
    }
}

pub struct LoadPipeline {
    cache: Arc<InventoryCache>,
    context: Arc<dyn ExecutionContext>,
    empty: Arc<dyn EmptyInventoryProvider>,
    mapper: InventoryMapper,
    storage: Arc<dyn InventoryStorage>,
}

impl LoadPipeline {
    pub fn new(
        cache: Arc<InventoryCache>,
        context: Arc<dyn ExecutionContext>,
        empty: Arc<dyn EmptyInventoryProvider>,
        mapper: InventoryMapper,
        storage: Arc<dyn InventoryStorage>,
    ) -> Self {
        Self {
            cache,
            context,
            empty,
            mapper,
            storage,
        }
    }

    /// Fetches the stored bytes on a blocking worker, then completes the request like [`submit`](Self::submit).
    /// A failed fetch counts as unreadable data.
    pub async fn load(&self, request: LoadRequest) {
        let storage = Arc::clone(&self.storage);
        let key = request.key().clone();
        let fetched = tokio::task::spawn_blocking(move || storage.fetch_raw(&key))
            .await
            .map_err(StorageError::from)
            .and_then(|result| result);

        match fetched {
            Ok(raw) => self.submit(request, raw),
            Err(err) => {
                tracing::error!("Failed to fetch inventory {}: {}.", request.key(), err);
                let owner = ChestOwner::from_inventory_name(request.key().inventory_name());
                let inventory = self.empty.create_empty(owner, None);
                self.deliver(request, inventory);
            }
        }
    }

    /// Completes `request` with stored bytes, or with a new inventory when nothing is stored.
    /// The inventory is cached and the callback runs on the primary context, inline if that is
    /// the calling thread.
    pub fn submit(&self, request: LoadRequest, raw: Option<Bytes>) {
        let owner = ChestOwner::from_inventory_name(request.key().inventory_name());
        let inventory = match raw {
            None => {
                tracing::debug!("No stored inventory {}, creating an empty one.", request.key());
                self.empty.create_empty(owner, None)
            }
            Some(raw) => {
                let minimum_rows = self.empty.inventory_rows(&owner);
                match self.mapper.decode_bytes(&raw, owner.clone(), minimum_rows) {
                    Ok(inventory) => inventory,
                    Err(err) => {
                        tracing::error!(
                            "Failed to decode inventory {}, replacing it with an empty one: {}.",
                            request.key(),
                            err
                        );
                        self.empty.create_empty(owner, None)
                    }
                }
            }
        };
        self.deliver(request, inventory);
    }

    fn deliver(&self, request: LoadRequest, inventory: Inventory) {
        let cache = Arc::clone(&self.cache);
        let inventory = Arc::new(inventory);
        let task = move || {
            cache.install(request.key.clone(), Arc::clone(&inventory));
            (request.callback)(inventory);
        };

        if self.context.is_on_primary_context() {
            task();
        } else {
            self.context.run_on_primary_context(Box::new(task));
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FlushReport {
    pub saved: usize,
    pub failed: usize,
}

/// Writes dirty cache entries back to storage.
pub struct SavePipeline {
    cache: Arc<InventoryCache>,
    context: Arc<dyn ExecutionContext>,
    mapper: InventoryMapper,
    storage: Arc<dyn InventoryStorage>,
    format: StorageFormat,
}

impl SavePipeline {
    pub fn new(
        cache: Arc<InventoryCache>,
        context: Arc<dyn ExecutionContext>,
        mapper: InventoryMapper,
        storage: Arc<dyn InventoryStorage>,
        format: StorageFormat,
    ) -> Self {
        Self {
            cache,
            context,
            mapper,
            storage,
            format,
        }
    }

    /// Saves every dirty entry. Entries that fail stay dirty for the next flush.
    ///
    /// Saved entries are marked clean on the primary context: inline when flushing from it,
    /// otherwise once the primary context runs the queued task.
    pub async fn flush(&self) -> FlushReport {
        let mut report = FlushReport::default();
        for (key, inventory) in self.cache.dirty_entries() {
            match self.save(&key, &inventory).await {
                Ok(()) => {
                    self.mark_saved(key, inventory);
                    report.saved += 1;
                }
                Err(err) => {
                    tracing::error!("Failed to save inventory {}: {}.", key, err);
                    report.failed += 1;
                }
            }
        }
        if report != FlushReport::default() {
            tracing::info!(
                "Saved {} inventories, {} failed.",
                report.saved,
                report.failed
            );
        }
        report
    }

    async fn save(&self, key: &StorageKey, inventory: &Inventory) -> StorageResult<()> {
        let data = self.mapper.encode_bytes(inventory, self.format)?;
        let storage = Arc::clone(&self.storage);
        let key = key.clone();
        tokio::task::spawn_blocking(move || storage.store_raw(&key, data)).await?
    }

    fn mark_saved(&self, key: StorageKey, inventory: Arc<Inventory>) {
        let cache = Arc::clone(&self.cache);
        let task = move || {
            if !cache.mark_saved(&key, &inventory) {
                tracing::trace!("Inventory {} changed while saving, keeping it dirty.", key);
            }
        };

        if self.context.is_on_primary_context() {
            task();
        } else {
            self.context.run_on_primary_context(Box::new(task));
        }
    }
}
