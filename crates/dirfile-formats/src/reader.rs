//! Bounds-checked byte reader
//!
//! All container parsing goes through [`ByteReader`]. A read that would run
//! past the end of the buffer fails with [`ReadError::OutOfRange`] and leaves
//! the cursor where it was.

use crate::fourcc::FourCC;
use binrw::BinRead;
use std::io::Cursor;
use thiserror::Error;

/// Maximum number of bytes in a Director variable-length integer
const MAX_VARINT_BYTES: usize = 5;

/// Byte order of fixed-width integers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endianness {
    /// Most significant byte first (`RIFX`)
    Big,
    /// Least significant byte first (`XFIR`)
    Little,
}

impl From<Endianness> for binrw::Endian {
    fn from(value: Endianness) -> Self {
        match value {
            Endianness::Big => Self::Big,
            Endianness::Little => Self::Little,
        }
    }
}

/// Errors raised by [`ByteReader`]
#[derive(Debug, Error)]
pub enum ReadError {
    /// A read or seek went past the end of the buffer
    #[error("read of {requested} bytes at offset {offset} exceeds buffer ({remaining} bytes remaining)")]
    OutOfRange {
        /// Cursor position when the read was attempted
        offset: usize,
        /// Bytes requested (for seeks, the target position)
        requested: usize,
        /// Bytes left between the cursor and the end of the buffer
        remaining: usize,
    },

    /// Variable-length integer longer than five bytes
    #[error("variable-length integer at offset {0} is too long")]
    InvalidVarInt(usize),

    /// Fixed-layout record failed to decode
    #[error("record at offset {offset} failed to decode: {source}")]
    Record {
        /// Offset of the record
        offset: usize,
        /// Underlying binrw error
        source: binrw::Error,
    },
}

/// Result type for reader operations
pub type ReadResult<T> = Result<T, ReadError>;

/// Cursor over an immutable byte slice
#[derive(Debug, Clone)]
pub struct ByteReader<'a> {
    data: &'a [u8],
    pos: usize,
    endian: Endianness,
}

impl<'a> ByteReader<'a> {
    /// Create a reader positioned at the start of `data`
    pub const fn new(data: &'a [u8], endian: Endianness) -> Self {
        Self {
            data,
            pos: 0,
            endian,
        }
    }

    /// Current byte order
    pub const fn endianness(&self) -> Endianness {
        self.endian
    }

    /// Switch the byte order used by subsequent reads
    pub fn set_endianness(&mut self, endian: Endianness) {
        self.endian = endian;
    }

    /// Current cursor position
    pub const fn position(&self) -> usize {
        self.pos
    }

    /// Total buffer length
    pub const fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the underlying buffer is empty
    pub const fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Bytes left after the cursor
    pub const fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.pos)
    }

    /// Whether the cursor reached the end of the buffer
    pub const fn is_at_end(&self) -> bool {
        self.pos >= self.data.len()
    }

    /// The whole underlying buffer
    pub const fn data(&self) -> &'a [u8] {
        self.data
    }

    fn out_of_range(&self, requested: usize) -> ReadError {
        ReadError::OutOfRange {
            offset: self.pos,
            requested,
            remaining: self.remaining(),
        }
    }

    fn take<const N: usize>(&mut self) -> ReadResult<[u8; N]> {
        let bytes = self.read_bytes(N)?;
        let mut out = [0u8; N];
        out.copy_from_slice(bytes);
        Ok(out)
    }

    /// Move the cursor to an absolute position (the end is a valid target)
    pub fn seek(&mut self, pos: usize) -> ReadResult<()> {
        if pos > self.data.len() {
            return Err(self.out_of_range(pos));
        }
        self.pos = pos;
        Ok(())
    }

    /// Advance the cursor by `count` bytes
    pub fn skip(&mut self, count: usize) -> ReadResult<()> {
        if count > self.remaining() {
            return Err(self.out_of_range(count));
        }
        self.pos += count;
        Ok(())
    }

    /// Borrow the next `count` bytes without copying
    pub fn read_bytes(&mut self, count: usize) -> ReadResult<&'a [u8]> {
        if count > self.remaining() {
            return Err(self.out_of_range(count));
        }
        let bytes = &self.data[self.pos..self.pos + count];
        self.pos += count;
        Ok(bytes)
    }

    /// Read an unsigned byte
    pub fn read_u8(&mut self) -> ReadResult<u8> {
        Ok(self.take::<1>()?[0])
    }

    /// Read a signed byte
    pub fn read_i8(&mut self) -> ReadResult<i8> {
        Ok(self.read_u8()? as i8)
    }

    /// Read a `u16` in the current byte order
    pub fn read_u16(&mut self) -> ReadResult<u16> {
        let bytes = self.take::<2>()?;
        Ok(match self.endian {
            Endianness::Big => u16::from_be_bytes(bytes),
            Endianness::Little => u16::from_le_bytes(bytes),
        })
    }

    /// Read an `i16` in the current byte order
    pub fn read_i16(&mut self) -> ReadResult<i16> {
        Ok(self.read_u16()? as i16)
    }

    /// Read a `u32` in the current byte order
    pub fn read_u32(&mut self) -> ReadResult<u32> {
        let bytes = self.take::<4>()?;
        Ok(match self.endian {
            Endianness::Big => u32::from_be_bytes(bytes),
            Endianness::Little => u32::from_le_bytes(bytes),
        })
    }

    /// Read an `i32` in the current byte order
    pub fn read_i32(&mut self) -> ReadResult<i32> {
        Ok(self.read_u32()? as i32)
    }

    /// Read a big-endian `u16` regardless of the current byte order
    pub fn read_u16_be(&mut self) -> ReadResult<u16> {
        Ok(u16::from_be_bytes(self.take::<2>()?))
    }

    /// Read a big-endian `u32` regardless of the current byte order
    pub fn read_u32_be(&mut self) -> ReadResult<u32> {
        Ok(u32::from_be_bytes(self.take::<4>()?))
    }

    /// Read a tag stored as a `u32` in the current byte order
    pub fn read_fourcc(&mut self) -> ReadResult<FourCC> {
        self.read_u32().map(FourCC)
    }

    /// Read a Director variable-length integer
    ///
    /// Seven bits per byte, most significant group first, high bit set on
    /// every byte except the last.
    pub fn read_varint(&mut self) -> ReadResult<u32> {
        let start = self.pos;
        let mut value: u32 = 0;
        for i in 0..MAX_VARINT_BYTES {
            let Some(&byte) = self.data.get(start + i) else {
                return Err(self.out_of_range(i + 1));
            };
            value = (value << 7) | u32::from(byte & 0x7F);
            if byte & 0x80 == 0 {
                self.pos = start + i + 1;
                return Ok(value);
            }
        }
        Err(ReadError::InvalidVarInt(start))
    }

    /// Read a string prefixed by a one-byte length
    pub fn read_pascal_string(&mut self) -> ReadResult<String> {
        let start = self.pos;
        let len = self.read_u8()? as usize;
        match self.read_bytes(len) {
            Ok(bytes) => Ok(String::from_utf8_lossy(bytes).into_owned()),
            Err(e) => {
                self.pos = start;
                Err(e)
            }
        }
    }

    /// Read a NUL-terminated string, consuming the terminator
    pub fn read_cstring(&mut self) -> ReadResult<String> {
        let rest = &self.data[self.pos.min(self.data.len())..];
        let Some(len) = rest.iter().position(|&b| b == 0) else {
            return Err(self.out_of_range(rest.len() + 1));
        };
        let text = String::from_utf8_lossy(&rest[..len]).into_owned();
        self.pos += len + 1;
        Ok(text)
    }

    /// Decode a fixed-layout binrw record occupying exactly `size` bytes
    ///
    /// The record is decoded in the current byte order; bytes of the slot
    /// beyond what the record consumes are skipped.
    pub fn read_record<T>(&mut self, size: usize) -> ReadResult<T>
    where
        T: for<'b> BinRead<Args<'b> = ()>,
    {
        let offset = self.pos;
        let slot = self.read_bytes(size)?;
        let mut cursor = Cursor::new(slot);
        T::read_options(&mut cursor, self.endian.into(), ()).map_err(|source| {
            self.pos = offset;
            ReadError::Record { offset, source }
        })
    }
}
