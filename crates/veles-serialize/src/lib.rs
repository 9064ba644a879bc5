//! Schema-driven binary (de)serialization of Unity object payloads.
//!
//! Unity stores a script object as its serialized fields laid end to end,
//! base type first, with narrow scalars padded to 4 bytes. This crate walks a
//! static [`Schema`] to decode such a payload into a dynamic [`Object`] and
//! to encode one back. Typed structs plug in through [`UnityObject`].
//!
//! # Example
//!
//! ```no_run
//! use veles_assets::AssetsFile;
//! use veles_serialize::{
//!     deserialize_object, serialize, FieldDef, FieldKind, PrimitiveKind, Schema,
//! };
//!
//! static SPAWNER: Schema = Schema::new(
//!     "Spawner",
//!     &[
//!         FieldDef::new("m_Enabled", FieldKind::Primitive(PrimitiveKind::Bool)),
//!         FieldDef::new("m_Prefab", FieldKind::String),
//!         FieldDef::new("m_Count", FieldKind::Primitive(PrimitiveKind::I32)),
//!     ],
//! );
//!
//! let mut file = AssetsFile::open("level0")?;
//! let handle = file.asset(42)?;
//! let mut spawner = deserialize_object(&SPAWNER, &handle)?;
//!
//! spawner.set("m_Count", 10i32);
//! let bytes = serialize(&spawner)?;
//! file.replace_asset(42, bytes);
//! file.save("level0.patched")?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod de;
mod error;
pub mod schema;
pub mod ser;
mod value;

pub use de::{
    deserialize, deserialize_asset, deserialize_exact, deserialize_from, deserialize_object,
    from_bytes, MAX_ARRAY_LEN,
};
pub use error::{Error, Result};
pub use schema::{FieldDef, FieldKind, PrimitiveKind, Schema};
pub use ser::{serialize, serialize_into, to_bytes};
pub use value::{Object, Primitive, Value};

/// A Rust type with a fixed serialized layout.
///
/// Implementations convert between the typed struct and the dynamic
/// [`Object`] the engine reads and writes.
pub trait UnityObject: Sized {
    /// Layout of the type, including its bases.
    fn schema() -> &'static Schema;

    /// Build the value from a decoded object.
    fn from_object(object: Object) -> Result<Self>;

    /// Describe the value as an object of [`schema`](Self::schema).
    fn to_object(&self) -> Object;
}

#[cfg(test)]
mod tests {
    use std::io::{Cursor, SeekFrom};

    use veles_assets::AssetsFile;
    use veles_common::{Endian, EndianWriter};

    use super::*;

    static SPAWNER: Schema = Schema::new(
        "Spawner",
        &[
            FieldDef::new("m_Enabled", FieldKind::Primitive(PrimitiveKind::Bool)),
            FieldDef::new("m_Prefab", FieldKind::String),
            FieldDef::new("m_Count", FieldKind::Primitive(PrimitiveKind::I32)),
        ],
    );

    #[derive(Debug, PartialEq)]
    struct Spawner {
        enabled: bool,
        prefab: String,
        count: i32,
    }

    fn mismatch(field: &'static str, expected: &str, value: &Value) -> Error {
        Error::FieldMismatch {
            type_name: SPAWNER.name,
            field,
            expected: expected.to_string(),
            found: value.kind_name(),
        }
    }

    impl UnityObject for Spawner {
        fn schema() -> &'static Schema {
            &SPAWNER
        }

        fn from_object(object: Object) -> Result<Self> {
            let enabled = object.require("m_Enabled")?;
            let prefab = object.require("m_Prefab")?;
            let count = object.require("m_Count")?;

            Ok(Self {
                enabled: enabled
                    .as_primitive()
                    .and_then(|p| p.as_bool())
                    .ok_or_else(|| mismatch("m_Enabled", "bool", enabled))?,
                prefab: prefab
                    .as_str()
                    .ok_or_else(|| mismatch("m_Prefab", "string", prefab))?
                    .to_owned(),
                count: count
                    .as_primitive()
                    .and_then(|p| p.as_i32())
                    .ok_or_else(|| mismatch("m_Count", "int", count))?,
            })
        }

        fn to_object(&self) -> Object {
            Object::new(&SPAWNER)
                .with("m_Enabled", self.enabled)
                .with("m_Prefab", self.prefab.as_str())
                .with("m_Count", self.count)
        }
    }

    /// Minimal format 9 file holding one object of class 114.
    fn single_object_file(path_id: i32, payload: &[u8]) -> Vec<u8> {
        let mut w = EndianWriter::with_endian(Cursor::new(Vec::new()), Endian::Big);
        w.write_bytes(&[0; 8]).unwrap();
        w.write_u32(9).unwrap();
        w.write_u32(0).unwrap();
        w.write_u32(0).unwrap();
        w.write_cstring("5.0.0f4").unwrap();
        w.set_endian(Endian::Little);
        w.write_i32(5).unwrap();

        // no type trees, short object IDs, one object
        w.write_i32(0).unwrap();
        w.write_i32(0).unwrap();
        w.write_i32(1).unwrap();
        w.write_i32(path_id).unwrap();
        w.write_u32(0).unwrap();
        w.write_u32(payload.len() as u32).unwrap();
        w.write_i32(114).unwrap();
        w.write_u16(114).unwrap();
        w.write_u16(0).unwrap();
        // no external references
        w.write_i32(0).unwrap();

        w.align(16).unwrap();
        let data_offset = w.position().unwrap() as u32;
        w.write_bytes(payload).unwrap();
        w.write_bytes(&[0; 4]).unwrap();
        let file_size = w.position().unwrap() as u32;

        w.set_endian(Endian::Big);
        w.seek(SeekFrom::Start(4)).unwrap();
        w.write_u32(file_size).unwrap();
        w.seek(SeekFrom::Start(12)).unwrap();
        w.write_u32(data_offset).unwrap();
        w.into_inner().into_inner()
    }

    fn spawner() -> Spawner {
        Spawner {
            enabled: true,
            prefab: "Bat".to_string(),
            count: 12,
        }
    }

    #[test]
    fn test_typed_roundtrip() {
        let bytes = to_bytes(&spawner()).unwrap();
        assert_eq!(bytes.len(), 4 + 4 + 4 + 4);
        assert_eq!(from_bytes::<Spawner>(&bytes).unwrap(), spawner());
    }

    #[test]
    fn test_deserialize_asset_from_file() {
        let payload = to_bytes(&spawner()).unwrap();
        let file = AssetsFile::from_bytes(single_object_file(77, &payload)).unwrap();
        let handle = file.asset(77).unwrap();

        assert_eq!(handle.class_id(), 114);
        assert_eq!(deserialize_asset::<Spawner>(&handle).unwrap(), spawner());
    }

    #[test]
    fn test_deserialize_asset_size_drift() {
        // One extra int the schema does not know about.
        let mut payload = to_bytes(&spawner()).unwrap();
        payload.extend_from_slice(&5i32.to_le_bytes());
        let file = AssetsFile::from_bytes(single_object_file(1, &payload)).unwrap();

        assert!(matches!(
            deserialize_asset::<Spawner>(&file.asset(1).unwrap()),
            Err(Error::SizeMismatch { type_name: "Spawner", expected: 20, consumed: 16 })
        ));
    }

    #[test]
    fn test_replace_with_serialized_object() {
        let payload = to_bytes(&spawner()).unwrap();
        let mut file = AssetsFile::from_bytes(single_object_file(3, &payload)).unwrap();

        let mut object = deserialize_object(&SPAWNER, &file.asset(3).unwrap()).unwrap();
        object.set("m_Prefab", "Skeleton Archer");
        file.replace_asset(3, serialize(&object).unwrap());

        let rewritten = AssetsFile::from_bytes(file.to_bytes().unwrap()).unwrap();
        let patched = deserialize_asset::<Spawner>(&rewritten.asset(3).unwrap()).unwrap();
        assert_eq!(patched.prefab, "Skeleton Archer");
        assert_eq!(patched.count, 12);
    }
}
