//! Dynamic object values.
//!
//! [`Object`] is what the deserializer produces and the serializer consumes:
//! a schema reference plus the field values in serialization order.

use std::fmt;

use crate::schema::{PrimitiveKind, Schema};
use crate::{Error, Result};

/// A single scalar value.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize), serde(untagged))]
pub enum Primitive {
    Bool(bool),
    I8(i8),
    U8(u8),
    I16(i16),
    U16(u16),
    I32(i32),
    U32(u32),
    I64(i64),
    U64(u64),
    F32(f32),
    F64(f64),
}

impl Primitive {
    /// Kind tag of this value.
    pub const fn kind(&self) -> PrimitiveKind {
        match self {
            Self::Bool(_) => PrimitiveKind::Bool,
            Self::I8(_) => PrimitiveKind::I8,
            Self::U8(_) => PrimitiveKind::U8,
            Self::I16(_) => PrimitiveKind::I16,
            Self::U16(_) => PrimitiveKind::U16,
            Self::I32(_) => PrimitiveKind::I32,
            Self::U32(_) => PrimitiveKind::U32,
            Self::I64(_) => PrimitiveKind::I64,
            Self::U64(_) => PrimitiveKind::U64,
            Self::F32(_) => PrimitiveKind::F32,
            Self::F64(_) => PrimitiveKind::F64,
        }
    }

    #[inline]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(v) => Some(*v),
            _ => None,
        }
    }

    /// Any integer kind that fits an i32 without loss.
    #[inline]
    pub fn as_i32(&self) -> Option<i32> {
        match *self {
            Self::I8(v) => Some(v as i32),
            Self::U8(v) => Some(v as i32),
            Self::I16(v) => Some(v as i32),
            Self::U16(v) => Some(v as i32),
            Self::I32(v) => Some(v),
            Self::U32(v) => i32::try_from(v).ok(),
            Self::I64(v) => i32::try_from(v).ok(),
            Self::U64(v) => i32::try_from(v).ok(),
            _ => None,
        }
    }

    #[inline]
    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            Self::U64(v) => i64::try_from(v).ok(),
            Self::I64(v) => Some(v),
            Self::U32(v) => Some(v as i64),
            _ => self.as_i32().map(i64::from),
        }
    }

    #[inline]
    pub fn as_u32(&self) -> Option<u32> {
        match *self {
            Self::U32(v) => Some(v),
            _ => self.as_i64().and_then(|v| u32::try_from(v).ok()),
        }
    }

    #[inline]
    pub fn as_u64(&self) -> Option<u64> {
        match *self {
            Self::U64(v) => Some(v),
            _ => self.as_i64().and_then(|v| u64::try_from(v).ok()),
        }
    }

    #[inline]
    pub fn as_f32(&self) -> Option<f32> {
        match self {
            Self::F32(v) => Some(*v),
            _ => None,
        }
    }

    #[inline]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::F32(v) => Some(*v as f64),
            Self::F64(v) => Some(*v),
            _ => None,
        }
    }
}

impl fmt::Display for Primitive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(v) => write!(f, "{}", v),
            Self::I8(v) => write!(f, "{}", v),
            Self::U8(v) => write!(f, "{}", v),
            Self::I16(v) => write!(f, "{}", v),
            Self::U16(v) => write!(f, "{}", v),
            Self::I32(v) => write!(f, "{}", v),
            Self::U32(v) => write!(f, "{}", v),
            Self::I64(v) => write!(f, "{}", v),
            Self::U64(v) => write!(f, "{}", v),
            Self::F32(v) => write!(f, "{}", v),
            Self::F64(v) => write!(f, "{}", v),
        }
    }
}

macro_rules! primitive_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Primitive {
                fn from(value: $ty) -> Self {
                    Self::$variant(value)
                }
            }

            impl From<$ty> for Value {
                fn from(value: $ty) -> Self {
                    Self::Primitive(Primitive::$variant(value))
                }
            }
        )*
    };
}

primitive_from! {
    bool => Bool,
    i8 => I8,
    u8 => U8,
    i16 => I16,
    u16 => U16,
    i32 => I32,
    u32 => U32,
    i64 => I64,
    u64 => U64,
    f32 => F32,
    f64 => F64,
}

/// Value of one field.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize), serde(untagged))]
pub enum Value {
    Primitive(Primitive),
    String(String),
    /// A `UInt8` array.
    Bytes(Vec<u8>),
    /// Any other scalar array.
    Array(Vec<Primitive>),
    Strings(Vec<String>),
    Object(Object),
    Objects(Vec<Object>),
}

impl Value {
    /// Short description of the variant for diagnostics.
    pub fn kind_name(&self) -> String {
        match self {
            Self::Primitive(p) => p.kind().name().to_string(),
            Self::String(_) => "string".to_string(),
            Self::Bytes(_) => "UInt8[]".to_string(),
            Self::Array(items) => match items.first() {
                Some(p) => format!("{}[]", p.kind()),
                None => "[]".to_string(),
            },
            Self::Strings(_) => "string[]".to_string(),
            Self::Object(o) => o.schema().name.to_string(),
            Self::Objects(_) => "object[]".to_string(),
        }
    }

    #[inline]
    pub fn as_primitive(&self) -> Option<Primitive> {
        match self {
            Self::Primitive(p) => Some(*p),
            _ => None,
        }
    }

    #[inline]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    #[inline]
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Self::Bytes(b) => Some(b),
            _ => None,
        }
    }

    #[inline]
    pub fn as_array(&self) -> Option<&[Primitive]> {
        match self {
            Self::Array(items) => Some(items),
            _ => None,
        }
    }

    #[inline]
    pub fn as_strings(&self) -> Option<&[String]> {
        match self {
            Self::Strings(items) => Some(items),
            _ => None,
        }
    }

    #[inline]
    pub fn as_object(&self) -> Option<&Object> {
        match self {
            Self::Object(o) => Some(o),
            _ => None,
        }
    }

    #[inline]
    pub fn as_objects(&self) -> Option<&[Object]> {
        match self {
            Self::Objects(items) => Some(items),
            _ => None,
        }
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::String(value.to_owned())
    }
}

impl From<Vec<u8>> for Value {
    fn from(value: Vec<u8>) -> Self {
        Self::Bytes(value)
    }
}

impl From<Vec<String>> for Value {
    fn from(value: Vec<String>) -> Self {
        Self::Strings(value)
    }
}

impl From<Object> for Value {
    fn from(value: Object) -> Self {
        Self::Object(value)
    }
}

impl From<Vec<Object>> for Value {
    fn from(value: Vec<Object>) -> Self {
        Self::Objects(value)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Primitive(p) => write!(f, "{}", p),
            Self::String(s) => write!(f, "{:?}", s),
            Self::Bytes(b) => write!(f, "UInt8[{}]", b.len()),
            Self::Array(items) => write!(f, "Array[{}]", items.len()),
            Self::Strings(items) => write!(f, "string[{}]", items.len()),
            Self::Object(o) => write!(f, "{}", o.schema().name),
            Self::Objects(items) => write!(f, "Objects[{}]", items.len()),
        }
    }
}

/// Field values of one object, keyed by field name in serialization order.
#[derive(Debug, Clone, PartialEq)]
pub struct Object {
    schema: &'static Schema,
    fields: Vec<(&'static str, Value)>,
}

impl Object {
    /// Empty object of a schema.
    pub fn new(schema: &'static Schema) -> Self {
        Self {
            schema,
            fields: Vec::new(),
        }
    }

    pub(crate) fn with_capacity(schema: &'static Schema, capacity: usize) -> Self {
        Self {
            schema,
            fields: Vec::with_capacity(capacity),
        }
    }

    #[inline]
    pub fn schema(&self) -> &'static Schema {
        self.schema
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Set a field, replacing an existing value of the same name.
    pub fn set(&mut self, name: &'static str, value: impl Into<Value>) {
        let value = value.into();
        match self.fields.iter_mut().find(|(n, _)| *n == name) {
            Some((_, slot)) => *slot = value,
            None => self.fields.push((name, value)),
        }
    }

    /// Builder form of [`set`](Self::set).
    pub fn with(mut self, name: &'static str, value: impl Into<Value>) -> Self {
        self.set(name, value);
        self
    }

    pub(crate) fn push(&mut self, name: &'static str, value: Value) {
        self.fields.push((name, value));
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.iter().find(|(n, _)| *n == name).map(|(_, v)| v)
    }

    /// Like [`get`](Self::get), failing with [`Error::MissingField`].
    pub fn require(&self, name: &'static str) -> Result<&Value> {
        self.get(name).ok_or(Error::MissingField {
            type_name: self.schema.name,
            field: name,
        })
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Value> {
        self.fields.iter_mut().find(|(n, _)| *n == name).map(|(_, v)| v)
    }

    /// Move a value out, leaving the field unset.
    pub fn take(&mut self, name: &str) -> Option<Value> {
        let index = self.fields.iter().position(|(n, _)| *n == name)?;
        Some(self.fields.remove(index).1)
    }

    /// Fields in order.
    pub fn fields(&self) -> impl Iterator<Item = (&'static str, &Value)> + '_ {
        self.fields.iter().map(|(n, v)| (*n, v))
    }

    pub fn get_bool(&self, name: &str) -> Option<bool> {
        self.get(name)?.as_primitive()?.as_bool()
    }

    pub fn get_i32(&self, name: &str) -> Option<i32> {
        self.get(name)?.as_primitive()?.as_i32()
    }

    pub fn get_i64(&self, name: &str) -> Option<i64> {
        self.get(name)?.as_primitive()?.as_i64()
    }

    pub fn get_u32(&self, name: &str) -> Option<u32> {
        self.get(name)?.as_primitive()?.as_u32()
    }

    pub fn get_u64(&self, name: &str) -> Option<u64> {
        self.get(name)?.as_primitive()?.as_u64()
    }

    pub fn get_f32(&self, name: &str) -> Option<f32> {
        self.get(name)?.as_primitive()?.as_f32()
    }

    pub fn get_f64(&self, name: &str) -> Option<f64> {
        self.get(name)?.as_primitive()?.as_f64()
    }

    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.get(name)?.as_str()
    }

    pub fn get_bytes(&self, name: &str) -> Option<&[u8]> {
        self.get(name)?.as_bytes()
    }

    pub fn get_array(&self, name: &str) -> Option<&[Primitive]> {
        self.get(name)?.as_array()
    }

    pub fn get_strings(&self, name: &str) -> Option<&[String]> {
        self.get(name)?.as_strings()
    }

    pub fn get_object(&self, name: &str) -> Option<&Object> {
        self.get(name)?.as_object()
    }

    pub fn get_objects(&self, name: &str) -> Option<&[Object]> {
        self.get(name)?.as_objects()
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for Object {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        use serde::ser::SerializeMap;

        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (name, value) in &self.fields {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}
