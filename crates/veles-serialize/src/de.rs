//! Schema-driven deserialization.

use tracing::trace;
use veles_assets::AssetHandle;
use veles_common::EndianReader;

use crate::schema::{FieldDef, FieldKind, PrimitiveKind, Schema};
use crate::value::{Object, Primitive, Value};
use crate::{Error, Result, UnityObject};

/// Corruption guard for element-wise array counts.
pub const MAX_ARRAY_LEN: usize = 0x10000;

/// Decode an object from the start of `data`.
///
/// Trailing bytes are left unread; use [`deserialize_exact`] to require the
/// schema to cover a declared size.
pub fn deserialize(schema: &'static Schema, data: &[u8]) -> Result<Object> {
    deserialize_from(schema, &mut EndianReader::new(data))
}

/// Decode an object at the reader's position, advancing past it.
///
/// Alignment is relative to the start of the reader's buffer.
pub fn deserialize_from(schema: &'static Schema, reader: &mut EndianReader<'_>) -> Result<Object> {
    if !schema.serializable {
        return Err(Error::NotSerializable(schema.name));
    }

    let lineage = schema.lineage();
    let capacity = lineage.iter().map(|s| s.fields.len()).sum();
    let mut object = Object::with_capacity(schema, capacity);

    for declaring in lineage {
        for field in declaring.fields {
            let value = read_field(declaring, field, reader)?;
            object.push(field.name, value);
        }
    }

    Ok(object)
}

/// Decode an object and check that exactly `expected_size` bytes were used.
///
/// `data` may extend past the object so that a schema reading too far is
/// reported as a [`Error::SizeMismatch`] rather than a short read.
pub fn deserialize_exact(
    schema: &'static Schema,
    data: &[u8],
    expected_size: usize,
) -> Result<Object> {
    let mut reader = EndianReader::new(data);

    let object = match deserialize_from(schema, &mut reader) {
        Ok(object) => object,
        Err(Error::Common(veles_common::Error::UnexpectedEof {
            needed, position, ..
        })) if position + needed > expected_size => {
            return Err(Error::SizeMismatch {
                type_name: schema.name,
                expected: expected_size,
                consumed: position + needed,
            });
        }
        Err(e) => return Err(e),
    };

    if reader.position() != expected_size {
        return Err(Error::SizeMismatch {
            type_name: schema.name,
            expected: expected_size,
            consumed: reader.position(),
        });
    }

    Ok(object)
}

/// Decode an object stored in an assets file, checked against its size.
pub fn deserialize_object(schema: &'static Schema, handle: &AssetHandle<'_>) -> Result<Object> {
    trace!(path_id = handle.path_id(), type_name = schema.name, "deserializing object");
    deserialize_exact(schema, handle.data_to_end(), handle.info().size as usize)
}

/// Decode a typed object stored in an assets file.
pub fn deserialize_asset<T: UnityObject>(handle: &AssetHandle<'_>) -> Result<T> {
    T::from_object(deserialize_object(T::schema(), handle)?)
}

/// Decode a typed object from the start of `data`.
pub fn from_bytes<T: UnityObject>(data: &[u8]) -> Result<T> {
    T::from_object(deserialize(T::schema(), data)?)
}

fn read_field(schema: &'static Schema, field: &'static FieldDef, reader: &mut EndianReader<'_>) -> Result<Value> {
    let value = match field.kind {
        FieldKind::Primitive(kind) => Value::Primitive(read_primitive(kind, reader)?),
        FieldKind::String => Value::String(reader.read_aligned_string()?),
        FieldKind::PrimitiveArray(PrimitiveKind::U8) => {
            let len = read_array_len(schema, field, reader, usize::MAX)?;
            Value::Bytes(reader.read_bytes(len)?.to_vec())
        }
        FieldKind::PrimitiveArray(kind) => {
            let len = read_array_len(schema, field, reader, MAX_ARRAY_LEN)?;
            let items = (0..len)
                .map(|_| read_primitive(kind, reader))
                .collect::<Result<Vec<_>>>()?;
            Value::Array(items)
        }
        FieldKind::StringArray => {
            let len = read_array_len(schema, field, reader, MAX_ARRAY_LEN)?;
            let items = (0..len)
                .map(|_| reader.read_aligned_string().map_err(Error::from))
                .collect::<Result<Vec<_>>>()?;
            Value::Strings(items)
        }
        FieldKind::Object(nested) => Value::Object(deserialize_from(nested, reader)?),
        FieldKind::ObjectArray(nested) => {
            let len = read_array_len(schema, field, reader, MAX_ARRAY_LEN)?;
            let items = (0..len)
                .map(|_| deserialize_from(nested, reader))
                .collect::<Result<Vec<_>>>()?;
            Value::Objects(items)
        }
        FieldKind::Unsupported(kind) => {
            return Err(Error::UnsupportedField {
                type_name: schema.name,
                field: field.name,
                kind,
            })
        }
    };

    if field.aligns_after() {
        reader.align(4);
    }

    Ok(value)
}

fn read_primitive(kind: PrimitiveKind, reader: &mut EndianReader<'_>) -> Result<Primitive> {
    Ok(match kind {
        PrimitiveKind::Bool => Primitive::Bool(reader.read_bool()?),
        PrimitiveKind::I8 => Primitive::I8(reader.read_i8()?),
        PrimitiveKind::U8 => Primitive::U8(reader.read_u8()?),
        PrimitiveKind::I16 => Primitive::I16(reader.read_i16()?),
        PrimitiveKind::U16 => Primitive::U16(reader.read_u16()?),
        PrimitiveKind::I32 => Primitive::I32(reader.read_i32()?),
        PrimitiveKind::U32 => Primitive::U32(reader.read_u32()?),
        PrimitiveKind::I64 => Primitive::I64(reader.read_i64()?),
        PrimitiveKind::U64 => Primitive::U64(reader.read_u64()?),
        PrimitiveKind::F32 => Primitive::F32(reader.read_f32()?),
        PrimitiveKind::F64 => Primitive::F64(reader.read_f64()?),
    })
}

fn read_array_len(
    schema: &'static Schema,
    field: &'static FieldDef,
    reader: &mut EndianReader<'_>,
    max: usize,
) -> Result<usize> {
    let position = reader.position();
    let count = reader.read_i32()?;
    let len = usize::try_from(count).map_err(|_| Error::InvalidArrayLength {
        type_name: schema.name,
        field: field.name,
        count,
        position,
    })?;

    if len > max {
        return Err(Error::ArrayTooLarge {
            type_name: schema.name,
            field: field.name,
            count: len,
            position,
            max,
        });
    }

    Ok(len)
}
