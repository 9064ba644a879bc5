//! Object table entries.

use veles_common::EndianReader;

use crate::AssetsFile;

/// Location and identity of one object inside an assets file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct AssetInfo {
    /// Identifier, unique within the file.
    pub path_id: i64,
    /// Offset relative to the header's data offset.
    pub data_offset: u32,
    pub size: u32,
    /// Index into the type metadata class list (format 16+), or the raw
    /// type ID for older formats.
    pub type_id: i32,
    pub class_id: i32,
    /// Only stored before format 16.
    pub is_destroyed: bool,
    /// Only stored in formats 15 and 16.
    pub stripped: Option<u8>,
}

impl AssetInfo {
    /// Byte range of the payload within the data region.
    #[inline]
    pub fn data_range(&self) -> std::ops::Range<usize> {
        let start = self.data_offset as usize;
        start..start + self.size as usize
    }
}

/// Borrowed view of one object, tied to the file that owns its bytes.
#[derive(Debug, Clone, Copy)]
pub struct AssetHandle<'a> {
    file: &'a AssetsFile,
    info: &'a AssetInfo,
}

impl<'a> AssetHandle<'a> {
    pub(crate) fn new(file: &'a AssetsFile, info: &'a AssetInfo) -> Self {
        Self { file, info }
    }

    /// The owning file.
    #[inline]
    pub fn file(&self) -> &'a AssetsFile {
        self.file
    }

    /// Table entry for this object.
    #[inline]
    pub fn info(&self) -> &'a AssetInfo {
        self.info
    }

    #[inline]
    pub fn path_id(&self) -> i64 {
        self.info.path_id
    }

    #[inline]
    pub fn class_id(&self) -> i32 {
        self.info.class_id
    }

    /// Payload bytes as stored in the file.
    pub fn data(&self) -> &'a [u8] {
        self.file.object_bytes(self.info)
    }

    /// Payload bytes as they will be saved: the staged replacement if any,
    /// otherwise the stored bytes.
    pub fn current_data(&self) -> &'a [u8] {
        self.file
            .replacement(self.info.path_id)
            .unwrap_or_else(|| self.data())
    }

    /// Stored bytes from the start of this object to the end of the file.
    ///
    /// Used to detect schemas that read past the declared object size.
    pub fn data_to_end(&self) -> &'a [u8] {
        self.file.bytes_from_object(self.info)
    }

    /// Little-endian reader over the stored payload.
    pub fn reader(&self) -> EndianReader<'a> {
        EndianReader::new(self.data())
    }
}
