use std::io::{Read, Write};

use crate::{
    errors::{ReadError, WriteError},
    serial::{ReadFrom, WriteTo},
};

/// An unsigned LEB128 integer, seven bits per byte, low group first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VarUint(pub u32);

impl VarUint {
    const MAX_SIZE: usize = 5;

    /// The exact number of bytes [`WriteTo::write`] produces.
    #[must_use]
    pub const fn written_size(self) -> usize {
        let bits = 32 - self.0.leading_zeros() as usize;
        if bits == 0 { 1 } else { bits.div_ceil(7) }
    }

    /// Encodes a length or index, failing if it exceeds `u32`.
    pub fn write_usize(
        value: usize,
        what: &'static str,
        writer: &mut impl Write,
    ) -> Result<(), WriteError> {
        let value = u32::try_from(value).map_err(|_| WriteError::TooLarge { what, value })?;
        Self(value).write(writer)
    }

    /// Decodes a length or index.
    pub fn read_usize(data: &mut impl Read) -> Result<usize, ReadError> {
        let value = Self::read(data)?.0;
        usize::try_from(value).map_err(|_| ReadError::TooLarge("VarUint"))
    }
}

impl WriteTo for VarUint {
    fn write(&self, writer: &mut impl Write) -> Result<(), WriteError> {
        let mut val = self.0;
        loop {
            let mut byte = (val & 0x7F) as u8;
            val >>= 7;
            if val != 0 {
                byte |= 0x80;
            }
            byte.write(writer)?;
            if val == 0 {
                return Ok(());
            }
        }
    }
}

impl ReadFrom for VarUint {
    fn read(data: &mut impl Read) -> Result<Self, ReadError> {
        let mut val = 0u32;
        for i in 0..Self::MAX_SIZE {
            let byte = u8::read(data)?;
            let group = u32::from(byte & 0x7F);
            // The fifth byte only has room for the top four bits.
            if i == Self::MAX_SIZE - 1 && group > 0x0F {
                return Err(ReadError::TooLarge("VarUint"));
            }
            val |= group << (i * 7);
            if byte & 0x80 == 0 {
                return Ok(Self(val));
            }
        }
        Err(ReadError::TooLarge("VarUint"))
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    fn encode(value: u32) -> Vec<u8> {
        let mut buf = Vec::new();
        VarUint(value).write(&mut buf).unwrap();
        buf
    }

    #[test]
    fn test_known_encodings() {
        assert_eq!(encode(0), [0x00]);
        assert_eq!(encode(127), [0x7F]);
        assert_eq!(encode(128), [0x80, 0x01]);
        assert_eq!(encode(300), [0xAC, 0x02]);
        assert_eq!(encode(u32::MAX), [0xFF, 0xFF, 0xFF, 0xFF, 0x0F]);
    }

    #[test]
    fn test_written_size() {
        for value in [0, 1, 127, 128, 16_383, 16_384, u32::MAX] {
            assert_eq!(VarUint(value).written_size(), encode(value).len());
        }
    }

    #[test]
    fn test_rejects_overlong() {
        let mut data = Cursor::new([0xFF, 0xFF, 0xFF, 0xFF, 0x1F]);
        assert!(matches!(
            VarUint::read(&mut data),
            Err(ReadError::TooLarge(_))
        ));
        let mut data = Cursor::new([0x80, 0x80, 0x80, 0x80, 0x80, 0x01]);
        assert!(matches!(
            VarUint::read(&mut data),
            Err(ReadError::TooLarge(_))
        ));
    }

    #[test]
    fn test_reads_what_it_writes() {
        let mut data = Cursor::new(encode(300));
        assert_eq!(VarUint::read(&mut data).unwrap(), VarUint(300));
    }
}
