//! Where raw inventory bytes live.

use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use bytes::Bytes;

use crate::error::{StorageError, StorageResult};

#[derive(Debug)]
struct WorldGroupInner {
    name: String,
}

/// A set of worlds sharing ender chests. Two groups are the same only if they are the same
/// object; a group rebuilt with an equal name is a different group.
#[derive(Debug, Clone)]
pub struct WorldGroup(Arc<WorldGroupInner>);

impl WorldGroup {
    pub fn new(name: impl Into<String>) -> Self {
        Self(Arc::new(WorldGroupInner { name: name.into() }))
    }

    pub fn name(&self) -> &str {
        &self.0.name
    }
}

impl PartialEq for WorldGroup {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for WorldGroup {}

impl Hash for WorldGroup {
    fn hash<H: Hasher>(&self, state: &mut H) {
        Arc::as_ptr(&self.0).hash(state);
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StorageKey {
    inventory_name: String,
    world_group: WorldGroup,
}

impl StorageKey {
    pub fn new(inventory_name: impl Into<String>, world_group: WorldGroup) -> Self {
        Self {
            inventory_name: inventory_name.into(),
            world_group,
        }
    }

    pub fn inventory_name(&self) -> &str {
        &self.inventory_name
    }

    pub fn world_group(&self) -> &WorldGroup {
        &self.world_group
    }
}

impl fmt::Display for StorageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.world_group.name(), self.inventory_name)
    }
}

/// Point lookups of raw inventory bytes. Calls block, run them on a blocking worker.
pub trait InventoryStorage: Send + Sync {
    /// The stored bytes, or `None` if nothing was ever stored under `key`.
    fn fetch_raw(&self, key: &StorageKey) -> StorageResult<Option<Bytes>>;
    fn store_raw(&self, key: &StorageKey, data: Bytes) -> StorageResult<()>;
}

/// One file per inventory at `<root>/<group>/<name>.dat`.
#[derive(Debug, Clone)]
pub struct FileStorage {
    root: PathBuf,
}

impl FileStorage {
    pub const EXTENSION: &'static str = "dat";

    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path_for(&self, key: &StorageKey) -> StorageResult<PathBuf> {
        let group = file_name(key.world_group().name())?;
        let name = file_name(key.inventory_name())?;
        Ok(self
            .root
            .join(group)
            .join(format!("{name}.{}", Self::EXTENSION)))
    }
}

fn file_name(name: &str) -> StorageResult<String> {
    let invalid = name.is_empty()
        || name.starts_with('.')
        || name.contains(['/', '\\', '\0', ':']);
    if invalid {
        Err(StorageError::InvalidName(name.to_owned()))
    } else {
        Ok(name.to_lowercase())
    }
}

impl InventoryStorage for FileStorage {
    fn fetch_raw(&self, key: &StorageKey) -> StorageResult<Option<Bytes>> {
        let path = self.path_for(key)?;
        match std::fs::read(&path) {
            Ok(data) => {
                tracing::trace!("Read {} bytes from {}.", data.len(), path.display());
                Ok(Some(Bytes::from(data)))
            }
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn store_raw(&self, key: &StorageKey, data: Bytes) -> StorageResult<()> {
        let path = self.path_for(key)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        // Readers see either the old file or the new one, never a partial write.
        let partial = path.with_extension("dat.tmp");
        std::fs::write(&partial, &data)?;
        std::fs::rename(&partial, &path)?;
        tracing::trace!("Wrote {} bytes to {}.", data.len(), path.display());
        Ok(())
    }
}

/// Inventories kept in memory, in place of a database table.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    rows: Mutex<HashMap<StorageKey, Bytes>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.rows.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl InventoryStorage for MemoryStorage {
    fn fetch_raw(&self, key: &StorageKey) -> StorageResult<Option<Bytes>> {
        let rows = self.rows.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(rows.get(key).cloned())
    }

    fn store_raw(&self, key: &StorageKey, data: Bytes) -> StorageResult<()> {
        let mut rows = self.rows.lock().unwrap_or_else(PoisonError::into_inner);
        rows.insert(key.clone(), data);
        Ok(())
    }
}
