use std::fmt::{Debug, Display};

use num_enum::{IntoPrimitive, TryFromPrimitive};

/// Binary type id of an NBT tag. Long arrays (id 12) are not part of the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, TryFromPrimitive, IntoPrimitive)]
#[repr(u8)]
pub enum Tag {
    End = 0,
    Byte = 1,
    Short = 2,
    Int = 3,
    Long = 4,
    Float = 5,
    Double = 6,
    ByteArray = 7,
    String = 8,
    List = 9,
    Compound = 10,
    IntArray = 11,
}

impl Tag {
    #[inline]
    pub fn to_u8(self) -> u8 {
        self.into()
    }
}

impl Display for Tag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        <Tag as Debug>::fmt(self, f)
    }
}
