//! Veles - Unity serialized assets library.
//!
//! This crate provides a unified interface to the Veles crates for reading,
//! inspecting and rewriting Unity serialized assets files.
//!
//! # Crates
//!
//! - [`veles_common`] - Endian-aware binary reader and writer, Unity GUIDs
//! - [`veles_assets`] - Assets file header, type metadata, object table and rewriting
//! - [`veles_serialize`] - Schema-driven decoding and encoding of object payloads
//!
//! # Example
//!
//! ```no_run
//! use veles::prelude::*;
//!
//! let file = AssetsFile::open("resources.assets")?;
//! for object in file.objects().take(10) {
//!     println!("{:>8} class {:>4} {} bytes", object.path_id(), object.class_id(), object.data().len());
//! }
//! # Ok::<(), veles::Error>(())
//! ```

mod error;

pub use veles_assets as assets;
pub use veles_common as common;
pub use veles_serialize as serialize;

pub use error::{Error, Result};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use veles_assets::{
        AssetHandle, AssetInfo, AssetsFile, FormatVersion, TypeMetaData, TypeTreeNode,
    };
    pub use veles_common::{Endian, EndianReader, EndianWriter, Guid};
    pub use veles_serialize::{
        deserialize, deserialize_asset, deserialize_object, serialize, FieldDef, FieldKind, Object,
        PrimitiveKind, Schema, UnityObject, Value,
    };
}

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
