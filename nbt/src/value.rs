//! Owned NBT tree representation.

use indexmap::IndexMap;

use crate::{NbtError, Tag};

/// A single node of an NBT tree.
#[derive(Debug, Clone, PartialEq)]
pub enum NbtTag {
    Byte(i8),
    Short(i16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    ByteArray(Vec<i8>),
    String(String),
    List(NbtList),
    Compound(NbtCompound),
    IntArray(Vec<i32>),
}

impl NbtTag {
    /// Gets the binary type id of this tag.
    pub fn tag(&self) -> Tag {
        match self {
            NbtTag::Byte(_) => Tag::Byte,
            NbtTag::Short(_) => Tag::Short,
            NbtTag::Int(_) => Tag::Int,
            NbtTag::Long(_) => Tag::Long,
            NbtTag::Float(_) => Tag::Float,
            NbtTag::Double(_) => Tag::Double,
            NbtTag::ByteArray(_) => Tag::ByteArray,
            NbtTag::String(_) => Tag::String,
            NbtTag::List(_) => Tag::List,
            NbtTag::Compound(_) => Tag::Compound,
            NbtTag::IntArray(_) => Tag::IntArray,
        }
    }

    /// Reads any numeric tag as an `i64`, truncating floating point values.
    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            NbtTag::Byte(v) => Some(v.into()),
            NbtTag::Short(v) => Some(v.into()),
            NbtTag::Int(v) => Some(v.into()),
            NbtTag::Long(v) => Some(v),
            NbtTag::Float(v) => Some(v as i64),
            NbtTag::Double(v) => Some(v as i64),
            _ => None,
        }
    }

    /// Reads any numeric tag as an `f64`.
    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            NbtTag::Float(v) => Some(v.into()),
            NbtTag::Double(v) => Some(v),
            _ => self.as_i64().map(|v| v as f64),
        }
    }

    /// Whether this tag is dropped when written: an empty list, or a list that only holds such lists.
    pub fn is_omitted(&self) -> bool {
        match self {
            NbtTag::List(list) => list.iter().all(NbtTag::is_omitted),
            _ => false,
        }
    }
}

macro_rules! from_impl {
    ( $($ty:ty => $variant:ident;)* ) => {
        $(
            impl From<$ty> for NbtTag {
                fn from(value: $ty) -> Self {
                    NbtTag::$variant(value.into())
                }
            }
        )*
    };
}

from_impl! {
    i8 => Byte;
    i16 => Short;
    i32 => Int;
    i64 => Long;
    f32 => Float;
    f64 => Double;
    Vec<i8> => ByteArray;
    String => String;
    &str => String;
    NbtList => List;
    NbtCompound => Compound;
    Vec<i32> => IntArray;
}

impl From<bool> for NbtTag {
    fn from(value: bool) -> Self {
        NbtTag::Byte(value.into())
    }
}

/// A homogeneous list of tags. The element type is fixed by the first element pushed.
#[derive(Debug, Clone, PartialEq)]
pub struct NbtList {
    element: Tag,
    items: Vec<NbtTag>,
}

impl Default for NbtList {
    fn default() -> Self {
        Self::new()
    }
}

impl NbtList {
    /// Makes an empty list whose element type is not known yet.
    pub fn new() -> Self {
        Self {
            element: Tag::End,
            items: Vec::new(),
        }
    }

    /// Makes an empty list that only accepts `element` tags.
    pub fn of(element: Tag) -> Self {
        Self {
            element,
            items: Vec::new(),
        }
    }

    /// Builds a list from `items`, rejecting mixed element types.
    pub fn from_tags(items: impl IntoIterator<Item = NbtTag>) -> Result<Self, NbtError> {
        let mut list = Self::new();
        for item in items {
            list.push(item)?;
        }
        Ok(list)
    }

    pub fn push(&mut self, tag: impl Into<NbtTag>) -> Result<(), NbtError> {
        let tag = tag.into();
        let found = tag.tag();
        if self.element == Tag::End {
            self.element = found;
        } else if self.element != found {
            return Err(NbtError::HeterogeneousList {
                expected: self.element,
                found,
            });
        }
        self.items.push(tag);
        Ok(())
    }

    /// The element type, or [`Tag::End`] if none was fixed yet.
    pub fn element(&self) -> Tag {
        self.element
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&NbtTag> {
        self.items.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, NbtTag> {
        self.items.iter()
    }

    /// Iterates over the compounds in this list. Lists of other types yield nothing.
    pub fn compounds(&self) -> impl Iterator<Item = &NbtCompound> {
        self.items.iter().filter_map(|item| match item {
            NbtTag::Compound(compound) => Some(compound),
            _ => None,
        })
    }
}

impl<'a> IntoIterator for &'a NbtList {
    type Item = &'a NbtTag;
    type IntoIter = std::slice::Iter<'a, NbtTag>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

impl IntoIterator for NbtList {
    type Item = NbtTag;
    type IntoIter = std::vec::IntoIter<NbtTag>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

/// An ordered map of named tags. Inserting an existing name replaces the value in place.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NbtCompound(IndexMap<String, NbtTag>);

macro_rules! number_getter {
    ($name:ident, $ret:ty) => {
        /// Gets a numeric entry, casting whatever number type is stored.
        pub fn $name(&self, key: &str) -> Option<$ret> {
            self.get(key).and_then(NbtTag::as_i64).map(|v| v as $ret)
        }
    };
}

macro_rules! float_getter {
    ($name:ident, $ret:ty) => {
        pub fn $name(&self, key: &str) -> Option<$ret> {
            self.get(key).and_then(NbtTag::as_f64).map(|v| v as $ret)
        }
    };
}

macro_rules! item_getter {
    ($name:ident, $variant:ident, $ret:ty) => {
        pub fn $name(&self, key: &str) -> Option<$ret> {
            match self.get(key) {
                Some(NbtTag::$variant(v)) => Some(v),
                _ => None,
            }
        }
    };
}

impl NbtCompound {
    pub fn new() -> Self {
        Self(IndexMap::new())
    }

    /// Inserts `value` under `key`, returning the replaced value if there was one.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<NbtTag>) -> Option<NbtTag> {
        self.0.insert(key.into(), value.into())
    }

    pub fn get(&self, key: &str) -> Option<&NbtTag> {
        self.0.get(key)
    }

    pub fn remove(&mut self, key: &str) -> Option<NbtTag> {
        self.0.shift_remove(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> indexmap::map::Iter<'_, String, NbtTag> {
        self.0.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    number_getter!(byte, i8);
    number_getter!(short, i16);
    number_getter!(int, i32);
    number_getter!(long, i64);
    float_getter!(float, f32);
    float_getter!(double, f64);
    item_getter!(list, List, &NbtList);
    item_getter!(compound, Compound, &NbtCompound);

    pub fn byte_array(&self, key: &str) -> Option<&[i8]> {
        match self.get(key) {
            Some(NbtTag::ByteArray(v)) => Some(v.as_slice()),
            _ => None,
        }
    }

    pub fn int_array(&self, key: &str) -> Option<&[i32]> {
        match self.get(key) {
            Some(NbtTag::IntArray(v)) => Some(v.as_slice()),
            _ => None,
        }
    }

    pub fn string(&self, key: &str) -> Option<&str> {
        match self.get(key) {
            Some(NbtTag::String(v)) => Some(v.as_str()),
            _ => None,
        }
    }

    /// Booleans are stored as bytes, any non-zero value is `true`.
    pub fn boolean(&self, key: &str) -> Option<bool> {
        self.byte(key).map(|v| v != 0)
    }
}

impl<K> FromIterator<(K, NbtTag)> for NbtCompound
where
    K: Into<String>,
{
    fn from_iter<T: IntoIterator<Item = (K, NbtTag)>>(iter: T) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

impl<'a> IntoIterator for &'a NbtCompound {
    type Item = (&'a String, &'a NbtTag);
    type IntoIter = indexmap::map::Iter<'a, String, NbtTag>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl IntoIterator for NbtCompound {
    type Item = (String, NbtTag);
    type IntoIter = indexmap::map::IntoIter<String, NbtTag>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}
