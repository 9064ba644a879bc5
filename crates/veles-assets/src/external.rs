//! Script type and external reference tables.

use veles_common::{EndianReader, Guid};

use crate::{FormatVersion, Result};

/// Maps a script table slot to the MonoScript object defining it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ScriptType {
    /// Index of the file holding the script (0 = this file).
    pub index: i32,
    /// Path ID of the script object in that file.
    pub path_id: i64,
}

/// Dependency on another serialized file.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct AssetReference {
    /// Editor asset path, usually empty in built players.
    pub asset_path: String,
    pub guid: Guid,
    /// Reference kind (0 = serialized file, 2/3 = meta/cached asset).
    pub ref_type: i32,
    /// Path of the referenced file, e.g. `library/unity default resources`.
    pub file_path: String,
}

impl AssetReference {
    /// Read one external reference record.
    pub fn read(format: FormatVersion, reader: &mut EndianReader<'_>) -> Result<Self> {
        let asset_path = if format.has_externals() {
            reader.read_cstring()?.to_owned()
        } else {
            String::new()
        };

        let (guid, ref_type) = if format.has_external_guid() {
            let guid = Guid::from_bytes(reader.read_array()?);
            (guid, reader.read_i32()?)
        } else {
            (Guid::EMPTY, 0)
        };

        let file_path = reader.read_cstring()?.to_owned();

        Ok(Self {
            asset_path,
            guid,
            ref_type,
            file_path,
        })
    }
}
