//! Unity serialized assets file reader and rewriter.
//!
//! A serialized assets file (`level0`, `sharedassets0.assets`, `*.assets`)
//! holds a header, a declared type table, an object table and a data region
//! of raw object payloads. This crate parses everything up to the data
//! region eagerly and hands out borrowed views of the payloads.
//!
//! # Quick Start
//!
//! ```no_run
//! use veles_assets::AssetsFile;
//!
//! let file = AssetsFile::open("sharedassets0.assets")?;
//! println!("Unity {} (format {})", file.version(), file.format());
//!
//! for object in file.objects_of_class(114) {
//!     println!("MonoBehaviour {}: {} bytes", object.path_id(), object.data().len());
//! }
//!
//! if let Some(tree) = file.type_metadata().type_tree(114) {
//!     println!("{}", tree.dump());
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! # Supported formats
//!
//! Format revisions up to 21 are read and written. Revision 22 moved the
//! header to 64-bit sizes and is rejected with [`Error::UnsupportedFormat`].
//!
//! # Rewriting
//!
//! Payload changes are staged with [`AssetsFile::replace_asset`] and applied
//! by [`AssetsFile::save`], which copies the metadata verbatim, lays the
//! objects out again in table order and patches every offset and size.

use std::hash::BuildHasherDefault;

use rustc_hash::FxHasher;
use veles_common::EndianReader;

mod error;
mod external;
mod file;
mod format;
mod header;
mod object;
mod strings;
mod type_metadata;
mod type_tree;

#[cfg(test)]
mod fixtures;

pub use error::{Error, Result};
pub use external::{AssetReference, ScriptType};
pub use file::AssetsFile;
pub use format::{FormatVersion, MAX_SUPPORTED_FORMAT};
pub use header::{AssetsHeader, HeaderPrefix, FILE_SIZE_OFFSET};
pub use object::{AssetHandle, AssetInfo};
pub use strings::{common_string, COMMON_STRINGS};
pub use type_metadata::{ClassInfo, TypeHash, TypeMetaData};
pub use type_tree::{TypeTreeIter, TypeTreeNode, ALIGN_BYTES_FLAG};

pub(crate) type FxHashMap<K, V> = hashbrown::HashMap<K, V, BuildHasherDefault<FxHasher>>;

/// Read an i32 table count, rejecting negative values.
pub(crate) fn read_count(reader: &mut EndianReader<'_>, table: &'static str) -> Result<usize> {
    let position = reader.position();
    let count = reader.read_i32()?;
    usize::try_from(count).map_err(|_| Error::InvalidCount {
        table,
        count,
        position,
    })
}
