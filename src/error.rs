use std::path::PathBuf;

use nbt::NbtError;
use thiserror::Error;

pub type InventoryResult<T> = Result<T, InventoryError>;

#[derive(Error, Debug)]
pub enum InventoryError {
    #[error(transparent)]
    Nbt(#[from] NbtError),
    #[error("inventory text is not valid UTF-8: {0}")]
    Utf8(#[from] std::str::Utf8Error),
    #[error("invalid chest restrictions: {rows} rows with {disabled_slots} disabled slots")]
    InvalidRestrictions { rows: i32, disabled_slots: i32 },
    #[error("item {index} in the inventory list is invalid: {reason}")]
    InvalidItem { index: usize, reason: &'static str },
    #[error("slot {slot} is outside an inventory of {size} slots")]
    SlotOutOfRange { slot: usize, size: usize },
}

pub type StorageResult<T> = Result<T, StorageError>;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("inventory name {0:?} cannot be used as a file name")]
    InvalidName(String),
    #[error("storage task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
    #[error(transparent)]
    Inventory(#[from] InventoryError),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("unable to read config {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("unable to write config {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error(transparent)]
    Parse(#[from] toml::de::Error),
    #[error(transparent)]
    Serialize(#[from] toml::ser::Error),
    #[error("invalid value for {field}: {reason}")]
    Invalid {
        field: &'static str,
        reason: String,
    },
}
