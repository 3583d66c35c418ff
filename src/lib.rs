//! Ender chest persistence: stored NBT data ⇄ cached inventories, with loads completed on the
//! primary thread.

pub mod bridge;
pub mod cache;
pub mod config;
pub mod context;
pub mod error;
pub mod inventory;
pub mod mapper;
pub mod pipeline;
pub mod provider;
pub mod storage;
pub mod translations;

pub use crate::cache::InventoryCache;
pub use crate::config::{Config, StorageFormat};
pub use crate::context::{ExecutionContext, PrimaryQueue, PrimaryThread};
pub use crate::error::{ConfigError, InventoryError, StorageError};
pub use crate::inventory::{ChestOwner, ChestRestrictions, Inventory, ItemStack};
pub use crate::mapper::InventoryMapper;
pub use crate::pipeline::{LoadPipeline, LoadRequest, SavePipeline};
pub use crate::provider::{ConfiguredEmptyInventories, EmptyInventoryProvider};
pub use crate::storage::{FileStorage, InventoryStorage, MemoryStorage, StorageKey, WorldGroup};
pub use crate::translations::{Translation, Translations};
