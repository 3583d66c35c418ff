//! Owned NBT trees and the codecs that move them in and out of storage:
//! the gzip-compressed binary format ([`io`]) and a JSON text form ([`json`]),
//! with the legacy Mojangson notation ([`mojangson`]) accepted when reading text.

use thiserror::Error;

pub mod io;
pub mod json;
pub mod mojangson;
pub(crate) mod parse;
pub(crate) mod tag;
pub(crate) mod value;
pub mod visitor;
pub(crate) mod write;

pub use crate::mojangson::MojangsonError;
pub use crate::parse::{from_slice, NbtParseError, MAX_DEPTH};
pub use crate::tag::Tag;
pub use crate::value::{NbtCompound, NbtList, NbtTag};
pub use crate::write::to_vec;

pub type Result<T> = std::result::Result<T, NbtError>;

#[derive(Debug, Error)]
pub enum NbtError {
    #[error("malformed binary NBT: {0}")]
    Parse(#[from] NbtParseError),
    #[error("text is neither JSON ({json}) nor Mojangson ({mojangson})")]
    Text {
        json: serde_json::Error,
        mojangson: MojangsonError,
    },
    #[error("cannot map {found} to an NBT tag, expected {expected}")]
    Type {
        expected: &'static str,
        found: &'static str,
    },
    #[error("list of {expected} cannot hold a {found} tag")]
    HeterogeneousList { expected: Tag, found: Tag },
    #[error("string of {len} bytes does not fit in an NBT string")]
    StringTooLong { len: usize },
    #[error("{value} cannot be written as JSON")]
    NonFiniteNumber { value: f64 },
    #[error("compressed NBT inflates to more than {limit} bytes")]
    TooLarge { limit: u64 },
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
