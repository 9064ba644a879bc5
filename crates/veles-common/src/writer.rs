//! Endian-aware binary writer over seekable streams.

use std::io::{Seek, SeekFrom, Write};

use byteorder::{BigEndian, LittleEndian, WriteBytesExt};

use crate::reader::padding_for;
use crate::{Endian, Result};

/// A binary writer with a selectable byte order.
///
/// Wraps any `Write + Seek` sink; alignment is computed from the sink's
/// absolute stream position.
#[derive(Debug)]
pub struct EndianWriter<W> {
    inner: W,
    endian: Endian,
}

macro_rules! write_primitive {
    ($(#[$doc:meta])* $name:ident, $ty:ty, $write:ident) => {
        $(#[$doc])*
        #[inline]
        pub fn $name(&mut self, value: $ty) -> Result<()> {
            match self.endian {
                Endian::Little => self.inner.$write::<LittleEndian>(value)?,
                Endian::Big => self.inner.$write::<BigEndian>(value)?,
            }
            Ok(())
        }
    };
}

impl<W: Write + Seek> EndianWriter<W> {
    /// Create a little-endian writer.
    pub fn new(inner: W) -> Self {
        Self {
            inner,
            endian: Endian::Little,
        }
    }

    /// Create a writer with an explicit byte order.
    pub fn with_endian(inner: W, endian: Endian) -> Self {
        Self { inner, endian }
    }

    /// Current byte order.
    pub fn endian(&self) -> Endian {
        self.endian
    }

    /// Switch the byte order for subsequent writes.
    pub fn set_endian(&mut self, endian: Endian) {
        self.endian = endian;
    }

    /// Current absolute stream position.
    pub fn position(&mut self) -> Result<u64> {
        Ok(self.inner.stream_position()?)
    }

    /// Seek the underlying stream.
    pub fn seek(&mut self, pos: SeekFrom) -> Result<u64> {
        Ok(self.inner.seek(pos)?)
    }

    /// Borrow the underlying sink.
    pub fn get_ref(&self) -> &W {
        &self.inner
    }

    /// Mutably borrow the underlying sink.
    pub fn get_mut(&mut self) -> &mut W {
        &mut self.inner
    }

    /// Unwrap the writer, returning the sink.
    pub fn into_inner(self) -> W {
        self.inner
    }

    /// Write raw bytes.
    #[inline]
    pub fn write_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        self.inner.write_all(bytes)?;
        Ok(())
    }

    /// Write a single byte.
    #[inline]
    pub fn write_u8(&mut self, value: u8) -> Result<()> {
        self.inner.write_u8(value)?;
        Ok(())
    }

    /// Write a signed byte.
    #[inline]
    pub fn write_i8(&mut self, value: i8) -> Result<()> {
        self.inner.write_i8(value)?;
        Ok(())
    }

    /// Write a boolean as one byte.
    #[inline]
    pub fn write_bool(&mut self, value: bool) -> Result<()> {
        self.write_u8(value as u8)
    }

    write_primitive!(
        /// Write a u16 in the current byte order.
        write_u16, u16, write_u16
    );
    write_primitive!(
        /// Write an i16 in the current byte order.
        write_i16, i16, write_i16
    );
    write_primitive!(
        /// Write a u32 in the current byte order.
        write_u32, u32, write_u32
    );
    write_primitive!(
        /// Write an i32 in the current byte order.
        write_i32, i32, write_i32
    );
    write_primitive!(
        /// Write a u64 in the current byte order.
        write_u64, u64, write_u64
    );
    write_primitive!(
        /// Write an i64 in the current byte order.
        write_i64, i64, write_i64
    );
    write_primitive!(
        /// Write an f32 in the current byte order.
        write_f32, f32, write_f32
    );
    write_primitive!(
        /// Write an f64 in the current byte order.
        write_f64, f64, write_f64
    );

    /// Write a null-terminated string.
    pub fn write_cstring(&mut self, value: &str) -> Result<()> {
        self.write_bytes(value.as_bytes())?;
        self.write_u8(0)
    }

    /// Write an i32 length prefix, the string bytes, then pad to 4 bytes.
    pub fn write_aligned_string(&mut self, value: &str) -> Result<()> {
        self.write_i32(value.len() as i32)?;
        self.write_bytes(value.as_bytes())?;
        self.align(4)
    }

    /// Write zero bytes up to the next multiple of `alignment`.
    pub fn align(&mut self, alignment: usize) -> Result<()> {
        let position = self.position()? as usize;
        let padding = padding_for(position, alignment);
        if padding > 0 {
            self.write_bytes(&[0u8; 16][..padding])?;
        }
        Ok(())
    }
}
