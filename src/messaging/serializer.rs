use std::io::{Cursor, Read, Write};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SerializationError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Buffer overflow")]
    BufferOverflow,
    #[error("Invalid length prefix {0}")]
    InvalidLength(i32),
    #[error("Unknown message tag {0}")]
    UnknownTag(u8),
    #[error("{0} trailing bytes after message")]
    TrailingBytes(usize),
}

pub struct Serializer {
    buffer: Vec<u8>,
}

impl Serializer {
    pub fn new() -> Self {
        Serializer { buffer: Vec::new() }
    }

    pub fn write<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), SerializationError> {
        value.serialize(self)
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buffer
    }
}

impl Default for Serializer {
    fn default() -> Self {
        Self::new()
    }
}

// Upper bound on what a collection reserves before its items are decoded.
const MAX_PREALLOCATED_ITEMS: usize = 1024;

pub struct Deserializer<'a> {
    data: Cursor<&'a [u8]>,
}

impl<'a> Deserializer<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Deserializer { data: Cursor::new(data) }
    }

    pub fn read<T: Deserialize>(&mut self) -> Result<T, SerializationError> {
        T::deserialize(self)
    }

    pub fn has_more(&self) -> bool {
        self.remaining() > 0
    }

    pub fn remaining(&self) -> usize {
        let len = self.data.get_ref().len() as u64;
        len.saturating_sub(self.data.position()) as usize
    }

    /// Fails if anything is left unread.
    pub fn finish(self) -> Result<(), SerializationError> {
        match self.remaining() {
            0 => Ok(()),
            n => Err(SerializationError::TrailingBytes(n)),
        }
    }

    // Length prefixes are i32 on the wire; reject negatives and anything the
    // buffer cannot possibly hold before allocating.
    fn read_len(&mut self, min_item_size: usize) -> Result<usize, SerializationError> {
        let raw = i32::deserialize(self)?;
        if raw < 0 {
            return Err(SerializationError::InvalidLength(raw));
        }
        let len = raw as usize;
        if len.saturating_mul(min_item_size) > self.remaining() {
            return Err(SerializationError::BufferOverflow);
        }
        Ok(len)
    }
}

pub trait Serialize {
    fn serialize(&self, serializer: &mut Serializer) -> Result<(), SerializationError>;
}

pub trait Deserialize: Sized {
    /// Fewest bytes one encoded value can occupy.
    const MIN_ENCODED_SIZE: usize = 1;

    fn deserialize(deserializer: &mut Deserializer) -> Result<Self, SerializationError>;
}

macro_rules! impl_serialize_primitive {
    ($t:ty, $writer:ident, $reader:ident) => {
        impl Serialize for $t {
            fn serialize(&self, serializer: &mut Serializer) -> Result<(), SerializationError> {
                serializer.buffer.$writer::<LittleEndian>(*self)?;
                Ok(())
            }
        }

        impl Deserialize for $t {
            const MIN_ENCODED_SIZE: usize = std::mem::size_of::<$t>();

            fn deserialize(deserializer: &mut Deserializer) -> Result<Self, SerializationError> {
                Ok(deserializer.data.$reader::<LittleEndian>()?)
            }
        }
    };
}

impl_serialize_primitive!(i32, write_i32, read_i32);
impl_serialize_primitive!(u32, write_u32, read_u32);
impl_serialize_primitive!(i64, write_i64, read_i64);
impl_serialize_primitive!(u64, write_u64, read_u64);
impl_serialize_primitive!(f32, write_f32, read_f32);
impl_serialize_primitive!(f64, write_f64, read_f64);

impl Serialize for u8 {
    fn serialize(&self, serializer: &mut Serializer) -> Result<(), SerializationError> {
        serializer.buffer.write_u8(*self)?;
        Ok(())
    }
}

impl Deserialize for u8 {
    fn deserialize(deserializer: &mut Deserializer) -> Result<Self, SerializationError> {
        Ok(deserializer.data.read_u8()?)
    }
}

impl Serialize for bool {
    fn serialize(&self, serializer: &mut Serializer) -> Result<(), SerializationError> {
        serializer.buffer.write_u8(*self as u8)?;
        Ok(())
    }
}

impl Deserialize for bool {
    fn deserialize(deserializer: &mut Deserializer) -> Result<Self, SerializationError> {
        Ok(deserializer.data.read_u8()? != 0)
    }
}

impl Serialize for str {
    fn serialize(&self, serializer: &mut Serializer) -> Result<(), SerializationError> {
        let len = i32::try_from(self.len()).map_err(|_| SerializationError::BufferOverflow)?;
        len.serialize(serializer)?;
        serializer.buffer.write_all(self.as_bytes())?;
        Ok(())
    }
}

impl Serialize for String {
    fn serialize(&self, serializer: &mut Serializer) -> Result<(), SerializationError> {
        self.as_str().serialize(serializer)
    }
}

impl Deserialize for String {
    const MIN_ENCODED_SIZE: usize = 4;

    fn deserialize(deserializer: &mut Deserializer) -> Result<Self, SerializationError> {
        let length = deserializer.read_len(1)?;
        let mut buffer = vec![0u8; length];
        deserializer.data.read_exact(&mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }
}

impl<T: Serialize> Serialize for Vec<T> {
    fn serialize(&self, serializer: &mut Serializer) -> Result<(), SerializationError> {
        let len = i32::try_from(self.len()).map_err(|_| SerializationError::BufferOverflow)?;
        len.serialize(serializer)?;
        for item in self {
            item.serialize(serializer)?;
        }
        Ok(())
    }
}

impl<T: Deserialize> Deserialize for Vec<T> {
    const MIN_ENCODED_SIZE: usize = 4;

    fn deserialize(deserializer: &mut Deserializer) -> Result<Self, SerializationError> {
        let length = deserializer.read_len(T::MIN_ENCODED_SIZE.max(1))?;
        let mut items = Vec::with_capacity(length.min(MAX_PREALLOCATED_ITEMS));
        for _ in 0..length {
            items.push(T::deserialize(deserializer)?);
        }
        Ok(items)
    }
}
