use bytes::BufMut;

use crate::{NbtCompound, NbtError, NbtList, NbtTag, Tag};

/// Writes `root` as an uncompressed NBT document with the given root name.
///
/// Empty lists are left out of their parent, see [`NbtTag::is_omitted`].
pub fn to_vec(name: &str, root: &NbtCompound) -> Result<Vec<u8>, NbtError> {
    let mut writer = NbtWriter {
        output: Vec::with_capacity(256),
    };
    writer.put_tag(Tag::Compound);
    writer.put_string(name)?;
    writer.put_compound(root)?;
    Ok(writer.output)
}

struct NbtWriter<B: BufMut> {
    output: B,
}

impl<B: BufMut> NbtWriter<B> {
    fn put_tag(&mut self, tag: Tag) {
        self.output.put_u8(tag.into());
    }

    fn put_string(&mut self, string: &str) -> Result<(), NbtError> {
        let encoded = simd_cesu8::mutf8::encode(string);
        let len = u16::try_from(encoded.len())
            .map_err(|_| NbtError::StringTooLong { len: encoded.len() })?;
        self.output.put_u16(len);
        self.output.put_slice(&encoded);
        Ok(())
    }

    fn put_len(&mut self, len: usize) -> Result<(), NbtError> {
        let len = i32::try_from(len).map_err(|_| {
            NbtError::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "array too long for NBT",
            ))
        })?;
        self.output.put_i32(len);
        Ok(())
    }

    fn put_compound(&mut self, compound: &NbtCompound) -> Result<(), NbtError> {
        for (name, value) in compound.iter().filter(|(_, value)| !value.is_omitted()) {
            self.put_tag(value.tag());
            self.put_string(name)?;
            self.put_payload(value)?;
        }
        self.put_tag(Tag::End);
        Ok(())
    }

    fn put_list(&mut self, list: &NbtList) -> Result<(), NbtError> {
        let items: Vec<&NbtTag> = list.iter().filter(|item| !item.is_omitted()).collect();
        self.put_tag(list.element());
        self.put_len(items.len())?;
        for item in items {
            self.put_payload(item)?;
        }
        Ok(())
    }

    fn put_payload(&mut self, value: &NbtTag) -> Result<(), NbtError> {
        match value {
            NbtTag::Byte(v) => self.output.put_i8(*v),
            NbtTag::Short(v) => self.output.put_i16(*v),
            NbtTag::Int(v) => self.output.put_i32(*v),
            NbtTag::Long(v) => self.output.put_i64(*v),
            NbtTag::Float(v) => self.output.put_f32(*v),
            NbtTag::Double(v) => self.output.put_f64(*v),
            NbtTag::ByteArray(v) => {
                self.put_len(v.len())?;
                for &b in v {
                    self.output.put_i8(b);
                }
            }
            NbtTag::String(v) => self.put_string(v)?,
            NbtTag::List(v) => self.put_list(v)?,
            NbtTag::Compound(v) => self.put_compound(v)?,
            NbtTag::IntArray(v) => {
                self.put_len(v.len())?;
                for &i in v {
                    self.output.put_i32(i);
                }
            }
        }
        Ok(())
    }
}
