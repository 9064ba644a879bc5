//! Schema-driven serialization, the mirror of [`crate::de`].

use std::io::{Cursor, Seek, Write};
use std::ptr;

use veles_common::EndianWriter;

use crate::de::MAX_ARRAY_LEN;
use crate::schema::{FieldDef, FieldKind, PrimitiveKind, Schema};
use crate::value::{Object, Primitive, Value};
use crate::{Error, Result, UnityObject};

/// Encode an object into a fresh buffer.
pub fn serialize(object: &Object) -> Result<Vec<u8>> {
    let mut writer = EndianWriter::new(Cursor::new(Vec::new()));
    serialize_into(object, &mut writer)?;
    Ok(writer.into_inner().into_inner())
}

/// Encode an object at the writer's position.
///
/// Alignment is relative to the start of the underlying stream.
pub fn serialize_into<W: Write + Seek>(object: &Object, writer: &mut EndianWriter<W>) -> Result<()> {
    let schema = object.schema();
    if !schema.serializable {
        return Err(Error::NotSerializable(schema.name));
    }

    for declaring in schema.lineage() {
        for field in declaring.fields {
            let value = object.get(field.name).ok_or(Error::MissingField {
                type_name: declaring.name,
                field: field.name,
            })?;
            write_field(declaring, field, value, writer)?;
        }
    }

    Ok(())
}

/// Encode a typed object into a fresh buffer.
pub fn to_bytes<T: UnityObject>(value: &T) -> Result<Vec<u8>> {
    serialize(&value.to_object())
}

fn write_field<W: Write + Seek>(
    schema: &'static Schema,
    field: &'static FieldDef,
    value: &Value,
    writer: &mut EndianWriter<W>,
) -> Result<()> {
    let mismatch = || Error::FieldMismatch {
        type_name: schema.name,
        field: field.name,
        expected: field.kind.to_string(),
        found: value.kind_name(),
    };

    match (field.kind, value) {
        (FieldKind::Primitive(kind), Value::Primitive(p)) if p.kind() == kind => {
            write_primitive(*p, writer)?;
        }
        (FieldKind::String, Value::String(s)) => writer.write_aligned_string(s)?,
        (FieldKind::PrimitiveArray(PrimitiveKind::U8), Value::Bytes(bytes)) => {
            write_array_len(schema, field, bytes.len(), i32::MAX as usize, writer)?;
            writer.write_bytes(bytes)?;
        }
        (FieldKind::PrimitiveArray(kind), Value::Array(items)) if kind != PrimitiveKind::U8 => {
            if items.iter().any(|p| p.kind() != kind) {
                return Err(mismatch());
            }
            write_array_len(schema, field, items.len(), MAX_ARRAY_LEN, writer)?;
            for item in items {
                write_primitive(*item, writer)?;
            }
        }
        (FieldKind::StringArray, Value::Strings(items)) => {
            write_array_len(schema, field, items.len(), MAX_ARRAY_LEN, writer)?;
            for item in items {
                writer.write_aligned_string(item)?;
            }
        }
        // Nested objects must use the declared schema exactly; a derived
        // object would write fields the reader never consumes.
        (FieldKind::Object(nested), Value::Object(object)) if ptr::eq(object.schema(), nested) => {
            serialize_into(object, writer)?;
        }
        (FieldKind::ObjectArray(nested), Value::Objects(items)) => {
            if items.iter().any(|o| !ptr::eq(o.schema(), nested)) {
                return Err(mismatch());
            }
            write_array_len(schema, field, items.len(), MAX_ARRAY_LEN, writer)?;
            for item in items {
                serialize_into(item, writer)?;
            }
        }
        (FieldKind::Unsupported(kind), _) => {
            return Err(Error::UnsupportedField {
                type_name: schema.name,
                field: field.name,
                kind,
            })
        }
        _ => return Err(mismatch()),
    }

    if field.aligns_after() {
        writer.align(4)?;
    }

    Ok(())
}

fn write_primitive<W: Write + Seek>(value: Primitive, writer: &mut EndianWriter<W>) -> Result<()> {
    match value {
        Primitive::Bool(v) => writer.write_bool(v)?,
        Primitive::I8(v) => writer.write_i8(v)?,
        Primitive::U8(v) => writer.write_u8(v)?,
        Primitive::I16(v) => writer.write_i16(v)?,
        Primitive::U16(v) => writer.write_u16(v)?,
        Primitive::I32(v) => writer.write_i32(v)?,
        Primitive::U32(v) => writer.write_u32(v)?,
        Primitive::I64(v) => writer.write_i64(v)?,
        Primitive::U64(v) => writer.write_u64(v)?,
        Primitive::F32(v) => writer.write_f32(v)?,
        Primitive::F64(v) => writer.write_f64(v)?,
    }
    Ok(())
}

fn write_array_len<W: Write + Seek>(
    schema: &'static Schema,
    field: &'static FieldDef,
    len: usize,
    max: usize,
    writer: &mut EndianWriter<W>,
) -> Result<()> {
    if len > max {
        return Err(Error::ArrayTooLarge {
            type_name: schema.name,
            field: field.name,
            count: len,
            position: writer.position()? as usize,
            max,
        });
    }
    writer.write_i32(len as i32)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::de::tests::{enemy_bytes, BEHAVIOUR, ENEMY, VECTOR3};
    use crate::deserialize;

    fn vector(x: f32, y: f32, z: f32) -> Object {
        Object::new(&VECTOR3).with("x", x).with("y", y).with("z", z)
    }

    #[test]
    fn test_serialize_mirrors_deserialize() {
        let bytes = enemy_bytes();
        let enemy = deserialize(&ENEMY, &bytes).unwrap();
        assert_eq!(serialize(&enemy).unwrap(), bytes);
    }

    #[test]
    fn test_field_order_follows_schema() {
        // Built in scrambled order; output follows base-then-derived layout.
        let enemy = Object::new(&ENEMY)
            .with("m_Seed", 0xDEAD_BEEF_0000_0001u64)
            .with("m_Path", vec![vector(0.5, 0.0, -0.5), vector(4.0, 5.0, 6.0)])
            .with("m_Tags", vec!["melee".to_string(), "boss".to_string()])
            .with("m_Scores", Value::Array(vec![Primitive::I16(10), Primitive::I16(-20), Primitive::I16(30)]))
            .with("m_Blob", vec![9u8, 8, 7, 6, 5])
            .with("m_Spawn", vector(1.0, 2.0, 3.0))
            .with("m_Tier", 3u8)
            .with("m_Elite", true)
            .with("m_Health", 150i32)
            .with("m_Name", "Grunt")
            .with("m_Enabled", true);

        assert_eq!(serialize(&enemy).unwrap(), enemy_bytes());
    }

    #[test]
    fn test_narrow_field_padding() {
        let behaviour = Object::new(&BEHAVIOUR).with("m_Enabled", false).with("m_Name", "");
        let bytes = serialize(&behaviour).unwrap();
        assert_eq!(bytes, [0, 0, 0, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn test_missing_field() {
        let behaviour = Object::new(&BEHAVIOUR).with("m_Enabled", true);
        assert!(matches!(
            serialize(&behaviour),
            Err(Error::MissingField { type_name: "Behaviour", field: "m_Name" })
        ));
    }

    #[test]
    fn test_wrong_value_kind() {
        let behaviour = Object::new(&BEHAVIOUR).with("m_Enabled", 1i32).with("m_Name", "x");
        match serialize(&behaviour) {
            Err(Error::FieldMismatch { field, expected, found, .. }) => {
                assert_eq!(field, "m_Enabled");
                assert_eq!(expected, "bool");
                assert_eq!(found, "int");
            }
            other => panic!("unexpected result: {:?}", other),
        }

        let spawn = Object::new(&BEHAVIOUR).with("m_Enabled", true).with("m_Name", "x");
        let mut enemy = deserialize(&ENEMY, &enemy_bytes()).unwrap();
        enemy.set("m_Spawn", spawn);
        assert!(matches!(serialize(&enemy), Err(Error::FieldMismatch { field: "m_Spawn", .. })));
    }

    static SQUAD: Schema = Schema::new(
        "Squad",
        &[
            FieldDef::new("m_Leader", FieldKind::Object(&BEHAVIOUR)),
            FieldDef::new("m_Members", FieldKind::ObjectArray(&BEHAVIOUR)),
        ],
    );

    #[test]
    fn test_nested_object_requires_declared_schema() {
        let behaviour = || Object::new(&BEHAVIOUR).with("m_Enabled", true).with("m_Name", "a");
        let enemy = deserialize(&ENEMY, &enemy_bytes()).unwrap();

        let squad = Object::new(&SQUAD)
            .with("m_Leader", behaviour())
            .with("m_Members", vec![behaviour()]);
        let bytes = serialize(&squad).unwrap();
        assert_eq!(deserialize(&SQUAD, &bytes).unwrap(), squad);

        let derived_leader = squad.clone().with("m_Leader", enemy.clone());
        assert!(matches!(
            serialize(&derived_leader),
            Err(Error::FieldMismatch { field: "m_Leader", .. })
        ));

        let derived_member = squad.with("m_Members", vec![behaviour(), enemy]);
        assert!(matches!(
            serialize(&derived_member),
            Err(Error::FieldMismatch { field: "m_Members", .. })
        ));
    }

    #[test]
    fn test_array_ceiling_on_write() {
        let mut enemy = deserialize(&ENEMY, &enemy_bytes()).unwrap();
        enemy.set("m_Tags", vec![String::new(); MAX_ARRAY_LEN + 1]);
        assert!(matches!(serialize(&enemy), Err(Error::ArrayTooLarge { field: "m_Tags", .. })));
    }
}
