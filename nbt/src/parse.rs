use bytes::Buf;
use thiserror::Error;

use crate::{NbtCompound, NbtList, NbtTag, Tag};

/// Maximum nesting of compounds and lists accepted by the reader.
pub const MAX_DEPTH: usize = 512;

#[derive(Debug, Error)]
pub enum NbtParseError {
    #[error("wrong starting NBT tag {tag}, expected {expected}")]
    WrongStartingTag { tag: Tag, expected: Tag },
    #[error("invalid NBT tag {value} at position {pos}")]
    InvalidTag { value: u8, pos: usize },
    #[error("invalid NBT list type {tag} for a list of {len} elements")]
    InvalidListType { tag: Tag, len: i32 },
    #[error("negative NBT length {len} at position {pos}")]
    NegativeLength { len: i32, pos: usize },
    #[error("sudden end of data at position {pos}, {needed} more bytes expected")]
    SuddenEnd { pos: usize, needed: usize },
    #[error("NBT nested deeper than {MAX_DEPTH} levels")]
    TooDeep,
}

/// Reads an uncompressed NBT document whose root is a named compound. The root name is discarded.
pub fn from_slice(source: &[u8]) -> Result<NbtCompound, NbtParseError> {
    NbtReader::new(source).read_root().map(|(_, root)| root)
}

/// Reader over an uncompressed NBT document.
///
/// The `&[u8]` is consumed through the [`Buf`] trait, so every read moves the slice forward.
/// All reads are bounds checked first, `Buf` would panic on short input.
pub(crate) struct NbtReader<'source> {
    source: &'source [u8],
    full_size: usize,
    depth: usize,
}

impl<'source> NbtReader<'source> {
    pub(crate) fn new(source: &'source [u8]) -> Self {
        Self {
            source,
            full_size: source.len(),
            depth: 0,
        }
    }

    #[inline]
    fn pos(&self) -> usize {
        self.full_size - self.source.remaining()
    }

    #[inline]
    fn need(&self, len: usize) -> Result<(), NbtParseError> {
        let remaining = self.source.remaining();
        if remaining < len {
            Err(NbtParseError::SuddenEnd {
                pos: self.pos(),
                needed: len - remaining,
            })
        } else {
            Ok(())
        }
    }

    fn get_tag(&mut self) -> Result<Tag, NbtParseError> {
        self.need(1)?;
        let pos = self.pos();
        let value = self.source.get_u8();
        Tag::try_from(value).map_err(|_| NbtParseError::InvalidTag { value, pos })
    }

    fn get_len(&mut self) -> Result<usize, NbtParseError> {
        self.need(4)?;
        let pos = self.pos();
        let len = self.source.get_i32();
        usize::try_from(len).map_err(|_| NbtParseError::NegativeLength { len, pos })
    }

    fn get_string(&mut self) -> Result<String, NbtParseError> {
        self.need(2)?;
        let len = self.source.get_u16() as usize;
        self.need(len)?;
        let string = simd_cesu8::decode_lossy(&self.source[..len]).into_owned();
        self.source.advance(len);
        Ok(string)
    }

    pub(crate) fn read_root(mut self) -> Result<(String, NbtCompound), NbtParseError> {
        let tag = self.get_tag()?;
        if tag != Tag::Compound {
            return Err(NbtParseError::WrongStartingTag {
                tag,
                expected: Tag::Compound,
            });
        }
        let name = self.get_string()?;
        let root = self.read_compound()?;
        Ok((name, root))
    }

    fn enter(&mut self) -> Result<(), NbtParseError> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            Err(NbtParseError::TooDeep)
        } else {
            Ok(())
        }
    }

    fn read_compound(&mut self) -> Result<NbtCompound, NbtParseError> {
        self.enter()?;
        let mut compound = NbtCompound::new();
        loop {
            let tag = self.get_tag()?;
            if tag == Tag::End {
                break;
            }
            let name = self.get_string()?;
            if let Some(value) = self.read_payload(tag)? {
                compound.insert(name, value);
            }
        }
        self.depth -= 1;
        Ok(compound)
    }

    /// Reads a list payload. Empty lists carry no usable element type and read as `None`.
    fn read_list(&mut self) -> Result<Option<NbtList>, NbtParseError> {
        let tag = self.get_tag()?;
        let len = self.get_len()?;
        if len == 0 {
            return Ok(None);
        }
        if tag == Tag::End {
            return Err(NbtParseError::InvalidListType {
                tag,
                len: len as i32,
            });
        }

        self.enter()?;
        let mut list = NbtList::of(tag);
        for _ in 0..len {
            if let Some(value) = self.read_payload(tag)? {
                // Every element is read with the list's own tag.
                let _ = list.push(value);
            }
        }
        self.depth -= 1;

        Ok((!list.is_empty()).then_some(list))
    }

    fn read_payload(&mut self, tag: Tag) -> Result<Option<NbtTag>, NbtParseError> {
        let value = match tag {
            Tag::End => {
                return Err(NbtParseError::InvalidTag {
                    value: 0,
                    pos: self.pos(),
                })
            }
            Tag::Byte => {
                self.need(1)?;
                NbtTag::Byte(self.source.get_i8())
            }
            Tag::Short => {
                self.need(2)?;
                NbtTag::Short(self.source.get_i16())
            }
            Tag::Int => {
                self.need(4)?;
                NbtTag::Int(self.source.get_i32())
            }
            Tag::Long => {
                self.need(8)?;
                NbtTag::Long(self.source.get_i64())
            }
            Tag::Float => {
                self.need(4)?;
                NbtTag::Float(self.source.get_f32())
            }
            Tag::Double => {
                self.need(8)?;
                NbtTag::Double(self.source.get_f64())
            }
            Tag::ByteArray => {
                let len = self.get_len()?;
                self.need(len)?;
                let array = self.source[..len].iter().map(|&b| b as i8).collect();
                self.source.advance(len);
                NbtTag::ByteArray(array)
            }
            Tag::String => NbtTag::String(self.get_string()?),
            Tag::List => match self.read_list()? {
                Some(list) => NbtTag::List(list),
                None => return Ok(None),
            },
            Tag::Compound => NbtTag::Compound(self.read_compound()?),
            Tag::IntArray => {
                let len = self.get_len()?;
                self.need(len.saturating_mul(4))?;
                let mut array = Vec::with_capacity(len);
                for _ in 0..len {
                    array.push(self.source.get_i32());
                }
                NbtTag::IntArray(array)
            }
        };
        Ok(Some(value))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    /// `{"": {name: "Bananrama", level: 3b}}` written by hand.
    const HELLO: &[u8] = &[
        0x0A, 0x00, 0x00, // root compound, empty name
        0x08, 0x00, 0x04, b'n', b'a', b'm', b'e', 0x00, 0x09, b'B', b'a', b'n', b'a', b'n', b'r',
        b'a', b'm', b'a', // string
        0x01, 0x00, 0x05, b'l', b'e', b'v', b'e', b'l', 0x03, // byte
        0x00, // end
    ];

    #[test]
    fn reads_hand_written_document() {
        let root = from_slice(HELLO).expect("document should be valid");
        assert_eq!(root.string("name"), Some("Bananrama"));
        assert_eq!(root.get("level"), Some(&NbtTag::Byte(3)));
        assert_eq!(root.len(), 2);
    }

    #[test]
    fn every_truncation_is_an_error() {
        for len in 0..HELLO.len() {
            let err = from_slice(&HELLO[..len]).unwrap_err();
            assert!(
                matches!(err, NbtParseError::SuddenEnd { .. }),
                "truncated at {len}: {err}"
            );
        }
    }

    #[test]
    fn rejects_bad_documents() {
        assert!(matches!(
            from_slice(&[0x08, 0x00, 0x00]),
            Err(NbtParseError::WrongStartingTag { tag: Tag::String, .. })
        ));
        assert!(matches!(
            from_slice(&[0x0A, 0x00, 0x00, 0x0C, 0x00, 0x00]),
            Err(NbtParseError::InvalidTag { value: 12, pos: 3 })
        ));
        // Byte array of length -1.
        assert!(matches!(
            from_slice(&[0x0A, 0x00, 0x00, 0x07, 0x00, 0x00, 0xFF, 0xFF, 0xFF, 0xFF]),
            Err(NbtParseError::NegativeLength { len: -1, .. })
        ));
        // List of two End tags.
        assert!(matches!(
            from_slice(&[0x0A, 0x00, 0x00, 0x09, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x02]),
            Err(NbtParseError::InvalidListType { tag: Tag::End, len: 2 })
        ));
    }

    #[test]
    fn empty_lists_are_dropped() {
        let source = [
            0x0A, 0x00, 0x00, // root
            0x09, 0x00, 0x01, b'l', 0x00, 0x00, 0x00, 0x00, 0x00, // empty list of End
            0x03, 0x00, 0x01, b'i', 0x00, 0x00, 0x00, 0x07, // int
            0x00,
        ];
        let root = from_slice(&source).unwrap();
        assert!(!root.contains_key("l"));
        assert_eq!(root.int("i"), Some(7));
    }

    #[test]
    fn deep_nesting_is_rejected() {
        let mut source = vec![0x0A, 0x00, 0x00];
        for _ in 0..MAX_DEPTH + 1 {
            source.extend_from_slice(&[0x0A, 0x00, 0x00]);
        }
        source.extend(std::iter::repeat(0x00).take(MAX_DEPTH + 2));
        assert!(matches!(from_slice(&source), Err(NbtParseError::TooDeep)));
    }
}
