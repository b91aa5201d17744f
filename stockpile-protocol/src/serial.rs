//! Byte level encoding traits and their primitive implementations.
//!
//! Multi-byte integers are big endian.

use std::io::{Read, Write};

use crate::errors::{ReadError, WriteError};

/// A value that can be encoded.
pub trait WriteTo {
    /// Writes `self` to `writer`.
    fn write(&self, writer: &mut impl Write) -> Result<(), WriteError>;
}

/// A value that can be decoded without outside context.
pub trait ReadFrom: Sized {
    /// Reads a value from `data`.
    fn read(data: &mut impl Read) -> Result<Self, ReadError>;
}

impl WriteTo for u8 {
    fn write(&self, writer: &mut impl Write) -> Result<(), WriteError> {
        writer.write_all(&[*self])?;
        Ok(())
    }
}

impl ReadFrom for u8 {
    fn read(data: &mut impl Read) -> Result<Self, ReadError> {
        let mut buf = [0; 1];
        data.read_exact(&mut buf)?;
        Ok(buf[0])
    }
}

impl WriteTo for u64 {
    fn write(&self, writer: &mut impl Write) -> Result<(), WriteError> {
        writer.write_all(&self.to_be_bytes())?;
        Ok(())
    }
}

impl ReadFrom for u64 {
    fn read(data: &mut impl Read) -> Result<Self, ReadError> {
        let mut buf = [0; size_of::<Self>()];
        data.read_exact(&mut buf)?;
        Ok(Self::from_be_bytes(buf))
    }
}

impl WriteTo for bool {
    fn write(&self, writer: &mut impl Write) -> Result<(), WriteError> {
        u8::from(*self).write(writer)
    }
}

impl ReadFrom for bool {
    fn read(data: &mut impl Read) -> Result<Self, ReadError> {
        match u8::read(data)? {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(ReadError::InvalidBool(other)),
        }
    }
}
