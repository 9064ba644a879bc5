//! Serialized file header.

use veles_common::{Endian, EndianReader};
use zerocopy::byteorder::{BigEndian, U32};
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

use crate::{Error, FormatVersion, Result};

/// Byte offset of the big-endian total file size field.
pub const FILE_SIZE_OFFSET: u64 = 4;

/// The fixed 16-byte prefix every assets file starts with. Always big-endian.
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout)]
#[repr(C)]
pub struct HeaderPrefix {
    /// Size of the metadata block following the header.
    pub metadata_size: U32<BigEndian>,
    /// Total file size in bytes.
    pub file_size: U32<BigEndian>,
    /// Format revision.
    pub format: U32<BigEndian>,
    /// Offset of the object data region.
    pub data_offset: U32<BigEndian>,
}

/// Parsed assets file header.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct AssetsHeader {
    pub metadata_size: u32,
    pub file_size: u32,
    pub format: FormatVersion,
    pub data_offset: u32,
    /// Byte order of the header tail (version string and platform).
    pub endian: Endian,
    /// Unity version string, e.g. `2019.4.16f1`.
    pub version: String,
    /// Target platform identifier.
    pub platform: i32,
}

impl AssetsHeader {
    /// Read the header from the start of `reader`.
    ///
    /// Leaves the reader positioned after the platform field and switched to
    /// little-endian, which every format uses for the body.
    pub fn read(reader: &mut EndianReader<'_>) -> Result<Self> {
        reader.set_endian(Endian::Big);

        let prefix: HeaderPrefix = reader.read_struct()?;
        let format = FormatVersion(prefix.format.get());
        if !format.is_supported() {
            return Err(Error::UnsupportedFormat(format.get()));
        }

        if format.has_endian_probe() && reader.read_u32()? == 0 {
            reader.set_endian(Endian::Little);
        }
        let endian = reader.endian();

        let version = reader.read_cstring()?.to_owned();
        let platform = reader.read_i32()?;

        reader.set_endian(Endian::Little);

        Ok(Self {
            metadata_size: prefix.metadata_size.get(),
            file_size: prefix.file_size.get(),
            format,
            data_offset: prefix.data_offset.get(),
            endian,
            version,
            platform,
        })
    }
}
