//! Gzip-compressed NBT streams, the on-disk format of player data files.

use std::io::{Read, Write};

use flate2::{read::GzDecoder, write::GzEncoder, Compression};

use crate::{parse, write, NbtCompound, NbtError, Result};

/// The first two bytes of every gzip stream.
pub const GZIP_MAGIC: [u8; 2] = [0x1F, 0x8B];

/// Upper bound on the inflated size of a document read by [`read_compressed`].
pub const MAX_INFLATED_LEN: u64 = 16 * 1024 * 1024;

/// Whether `bytes` starts like a gzip stream.
pub fn is_compressed(bytes: &[u8]) -> bool {
    bytes.starts_with(&GZIP_MAGIC)
}

/// Reads a compressed NBT document from `reader`.
///
/// The whole stream is inflated before parsing; the reader is dropped (and so closed) on return, error or not.
/// Streams inflating past [`MAX_INFLATED_LEN`] fail with [`NbtError::TooLarge`].
pub fn read_compressed<R: Read>(reader: R) -> Result<NbtCompound> {
    read_compressed_with_limit(reader, MAX_INFLATED_LEN)
}

pub fn read_compressed_with_limit<R: Read>(reader: R, limit: u64) -> Result<NbtCompound> {
    let mut buf = Vec::with_capacity(1024);
    GzDecoder::new(reader)
        .take(limit.saturating_add(1))
        .read_to_end(&mut buf)?;
    if buf.len() as u64 > limit {
        return Err(NbtError::TooLarge { limit });
    }
    Ok(parse::from_slice(&buf)?)
}

/// Writes `root` as a compressed NBT document with an empty root name.
///
/// The gzip trailer is written and `writer` flushed before returning.
pub fn write_compressed<W: Write>(root: &NbtCompound, writer: W) -> Result<()> {
    let bytes = write::to_vec("", root)?;
    let mut encoder = GzEncoder::new(writer, Compression::default());
    encoder.write_all(&bytes)?;
    let mut writer = encoder.finish()?;
    writer.flush()?;
    Ok(())
}

pub fn from_compressed_bytes(bytes: &[u8]) -> Result<NbtCompound> {
    read_compressed(bytes)
}

pub fn to_compressed_bytes(root: &NbtCompound) -> Result<Vec<u8>> {
    let mut bytes = Vec::with_capacity(256);
    write_compressed(root, &mut bytes)?;
    Ok(bytes)
}
