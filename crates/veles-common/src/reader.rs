//! Endian-aware binary reader over byte slices.
//!
//! This module provides [`EndianReader`], a cursor-like type that reads
//! primitives in either byte order from a borrowed buffer without copying.
//! Many readers can share one backing buffer, each with its own position.

use byteorder::{BigEndian, ByteOrder, LittleEndian};
use zerocopy::FromBytes;

use crate::{Error, Result};

/// Byte order used for multi-byte reads and writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Endian {
    /// Least significant byte first.
    #[default]
    Little,
    /// Most significant byte first.
    Big,
}

/// Number of padding bytes needed to bring `position` up to a multiple of `alignment`.
#[inline]
pub const fn padding_for(position: usize, alignment: usize) -> usize {
    match position % alignment {
        0 => 0,
        rem => alignment - rem,
    }
}

/// A binary reader over a byte slice with a selectable byte order.
///
/// # Example
///
/// ```
/// use veles_common::{Endian, EndianReader};
///
/// let data = [0x00, 0x00, 0x00, 0x11, 0x22, 0x00, 0x00, 0x00];
/// let mut reader = EndianReader::with_endian(&data, Endian::Big);
///
/// assert_eq!(reader.read_u32().unwrap(), 0x11);
/// reader.set_endian(Endian::Little);
/// assert_eq!(reader.read_u32().unwrap(), 0x22);
/// assert!(reader.is_empty());
/// ```
#[derive(Debug, Clone)]
pub struct EndianReader<'a> {
    data: &'a [u8],
    position: usize,
    endian: Endian,
}

macro_rules! read_primitive {
    ($(#[$doc:meta])* $name:ident, $ty:ty, $size:expr, $read:ident) => {
        $(#[$doc])*
        #[inline]
        pub fn $name(&mut self) -> Result<$ty> {
            let bytes = self.read_bytes($size)?;
            Ok(match self.endian {
                Endian::Little => LittleEndian::$read(bytes),
                Endian::Big => BigEndian::$read(bytes),
            })
        }
    };
}

impl<'a> EndianReader<'a> {
    /// Create a new little-endian reader from a byte slice.
    #[inline]
    pub const fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            position: 0,
            endian: Endian::Little,
        }
    }

    /// Create a new little-endian reader starting at a specific position.
    #[inline]
    pub const fn new_at(data: &'a [u8], position: usize) -> Self {
        Self {
            data,
            position,
            endian: Endian::Little,
        }
    }

    /// Create a new reader with an explicit byte order.
    #[inline]
    pub const fn with_endian(data: &'a [u8], endian: Endian) -> Self {
        Self {
            data,
            position: 0,
            endian,
        }
    }

    /// Current byte order.
    #[inline]
    pub const fn endian(&self) -> Endian {
        self.endian
    }

    /// Switch the byte order for subsequent reads.
    #[inline]
    pub fn set_endian(&mut self, endian: Endian) {
        self.endian = endian;
    }

    /// Get the current position in the buffer.
    #[inline]
    pub const fn position(&self) -> usize {
        self.position
    }

    /// Get the total length of the underlying buffer.
    #[inline]
    pub const fn len(&self) -> usize {
        self.data.len()
    }

    /// Get the number of bytes remaining to read.
    #[inline]
    pub const fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.position)
    }

    /// Check if there are no more bytes to read.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.position >= self.data.len()
    }

    /// Seek to an absolute position.
    #[inline]
    pub fn seek(&mut self, position: usize) {
        self.position = position;
    }

    /// Advance the position by a number of bytes.
    #[inline]
    pub fn advance(&mut self, count: usize) {
        self.position = self.position.saturating_add(count);
    }

    /// Skip forward to the next multiple of `alignment`.
    #[inline]
    pub fn align(&mut self, alignment: usize) {
        self.advance(padding_for(self.position, alignment));
    }

    /// Get the remaining bytes as a slice.
    #[inline]
    pub fn remaining_bytes(&self) -> &'a [u8] {
        &self.data[self.position.min(self.data.len())..]
    }

    /// Peek at bytes without advancing the position.
    #[inline]
    pub fn peek_bytes(&self, count: usize) -> Result<&'a [u8]> {
        self.peek_bytes_at(self.position, count)
    }

    /// Borrow `count` bytes at an absolute offset, leaving the cursor untouched.
    pub fn peek_bytes_at(&self, offset: usize, count: usize) -> Result<&'a [u8]> {
        offset
            .checked_add(count)
            .and_then(|end| self.data.get(offset..end))
            .ok_or(Error::UnexpectedEof {
                needed: count,
                available: self.data.len().saturating_sub(offset),
                position: offset,
            })
    }

    /// Read bytes and advance the position.
    #[inline]
    pub fn read_bytes(&mut self, count: usize) -> Result<&'a [u8]> {
        let bytes = self.peek_bytes(count)?;
        self.position += count;
        Ok(bytes)
    }

    /// Read a fixed-size byte array.
    #[inline]
    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.read_bytes(N)?);
        Ok(out)
    }

    /// Read a single byte.
    #[inline]
    pub fn read_u8(&mut self) -> Result<u8> {
        self.read_bytes(1).map(|b| b[0])
    }

    /// Read a signed byte.
    #[inline]
    pub fn read_i8(&mut self) -> Result<i8> {
        self.read_u8().map(|b| b as i8)
    }

    /// Read a boolean (non-zero = true).
    #[inline]
    pub fn read_bool(&mut self) -> Result<bool> {
        self.read_u8().map(|b| b != 0)
    }

    read_primitive!(
        /// Read a u16 in the current byte order.
        read_u16, u16, 2, read_u16
    );
    read_primitive!(
        /// Read an i16 in the current byte order.
        read_i16, i16, 2, read_i16
    );
    read_primitive!(
        /// Read a u32 in the current byte order.
        read_u32, u32, 4, read_u32
    );
    read_primitive!(
        /// Read an i32 in the current byte order.
        read_i32, i32, 4, read_i32
    );
    read_primitive!(
        /// Read a u64 in the current byte order.
        read_u64, u64, 8, read_u64
    );
    read_primitive!(
        /// Read an i64 in the current byte order.
        read_i64, i64, 8, read_i64
    );
    read_primitive!(
        /// Read an f32 in the current byte order.
        read_f32, f32, 4, read_f32
    );
    read_primitive!(
        /// Read an f64 in the current byte order.
        read_f64, f64, 8, read_f64
    );

    /// Read a null-terminated UTF-8 string.
    pub fn read_cstring(&mut self) -> Result<&'a str> {
        let start = self.position;
        let remaining = self.remaining_bytes();

        let null_pos =
            memchr::memchr(0, remaining).ok_or(Error::MissingNullTerminator(start))?;

        let string_bytes = &remaining[..null_pos];
        self.position = start + null_pos + 1; // Skip the null terminator

        std::str::from_utf8(string_bytes).map_err(Error::Utf8)
    }

    /// Read an i32 length-prefixed string followed by padding to 4 bytes.
    pub fn read_aligned_string(&mut self) -> Result<String> {
        let position = self.position;
        let length = self.read_i32()?;
        if length < 0 {
            return Err(Error::InvalidLength {
                length: length as i64,
                position,
            });
        }

        let bytes = self.read_bytes(length as usize)?;
        let value = String::from_utf8_lossy(bytes).into_owned();
        self.align(4);
        Ok(value)
    }

    /// Read a struct using zerocopy.
    ///
    /// The struct must implement `FromBytes` from the zerocopy crate. Byte
    /// order is whatever the struct's field types encode.
    #[inline]
    pub fn read_struct<T: FromBytes>(&mut self) -> Result<T> {
        let size = std::mem::size_of::<T>();
        let position = self.position;
        let bytes = self.read_bytes(size)?;
        T::read_from_bytes(bytes).map_err(|_| Error::UnexpectedEof {
            needed: size,
            available: bytes.len(),
            position,
        })
    }
}
