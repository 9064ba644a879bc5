//! Ahead-of-time object schemas.
//!
//! A [`Schema`] lists the serialized fields of one object type in declaration
//! order. Derived types point at their base schema; base fields are always
//! walked first.
//!
//! Schemas are plain `static` tables:
//!
//! ```
//! use veles_serialize::{FieldDef, FieldKind, PrimitiveKind, Schema};
//!
//! static VECTOR3: Schema = Schema::new(
//!     "Vector3f",
//!     &[
//!         FieldDef::new("x", FieldKind::Primitive(PrimitiveKind::F32)),
//!         FieldDef::new("y", FieldKind::Primitive(PrimitiveKind::F32)),
//!         FieldDef::new("z", FieldKind::Primitive(PrimitiveKind::F32)),
//!     ],
//! );
//!
//! static SPAWN_POINT: Schema = Schema::new(
//!     "SpawnPoint",
//!     &[
//!         FieldDef::new("m_Position", FieldKind::Object(&VECTOR3)),
//!         FieldDef::new("m_Active", FieldKind::Primitive(PrimitiveKind::Bool)),
//!     ],
//! );
//!
//! assert_eq!(SPAWN_POINT.fields_in_order().count(), 2);
//! ```

use std::fmt;

/// Scalar kinds a field can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum PrimitiveKind {
    Bool,
    I8,
    U8,
    I16,
    U16,
    I32,
    U32,
    I64,
    U64,
    F32,
    F64,
}

impl PrimitiveKind {
    /// Width in bytes on disk.
    pub const fn size(self) -> usize {
        match self {
            Self::Bool | Self::I8 | Self::U8 => 1,
            Self::I16 | Self::U16 => 2,
            Self::I32 | Self::U32 | Self::F32 => 4,
            Self::I64 | Self::U64 | Self::F64 => 8,
        }
    }

    /// Narrow kinds pad the stream to 4 bytes after a scalar field.
    pub const fn needs_align(self) -> bool {
        self.size() < 4
    }

    /// Unity type name of the kind.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::I8 => "SInt8",
            Self::U8 => "UInt8",
            Self::I16 => "SInt16",
            Self::U16 => "UInt16",
            Self::I32 => "int",
            Self::U32 => "unsigned int",
            Self::I64 => "SInt64",
            Self::U64 => "UInt64",
            Self::F32 => "float",
            Self::F64 => "double",
        }
    }
}

impl fmt::Display for PrimitiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Declared kind of one field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldKind {
    /// A single scalar.
    Primitive(PrimitiveKind),
    /// Length-prefixed UTF-8 string.
    String,
    /// Scalars behind a 32-bit count. `U8` arrays are stored as a raw run.
    PrimitiveArray(PrimitiveKind),
    /// Strings behind a 32-bit count.
    StringArray,
    /// Nested object, stored inline.
    Object(&'static Schema),
    /// Nested objects behind a 32-bit count.
    ObjectArray(&'static Schema),
    /// A field type with no binary mapping. Fails on use.
    Unsupported(&'static str),
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Primitive(kind) => write!(f, "{}", kind),
            Self::String => f.write_str("string"),
            Self::PrimitiveArray(kind) => write!(f, "{}[]", kind),
            Self::StringArray => f.write_str("string[]"),
            Self::Object(schema) => f.write_str(schema.name),
            Self::ObjectArray(schema) => write!(f, "{}[]", schema.name),
            Self::Unsupported(name) => f.write_str(name),
        }
    }
}

/// One serialized field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldDef {
    pub name: &'static str,
    pub kind: FieldKind,
    /// Suppress the 4-byte alignment after a 1- or 2-byte scalar.
    pub no_align: bool,
}

impl FieldDef {
    pub const fn new(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            kind,
            no_align: false,
        }
    }

    /// Mark the field as packed against the next one.
    pub const fn no_align(self) -> Self {
        Self {
            no_align: true,
            ..self
        }
    }

    /// Whether the stream is padded to 4 bytes after this field's value.
    ///
    /// Strings align themselves and object fields follow their own fields'
    /// rules, so neither is padded here.
    pub const fn aligns_after(&self) -> bool {
        match self.kind {
            FieldKind::Primitive(kind) => kind.needs_align() && !self.no_align,
            FieldKind::PrimitiveArray(_) => true,
            _ => false,
        }
    }
}

/// Field layout of one object type.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Schema {
    /// Type name used in diagnostics.
    pub name: &'static str,
    /// Types without the marker are rejected before any bytes are read.
    pub serializable: bool,
    pub base: Option<&'static Schema>,
    /// Fields declared by this type, excluding the base's.
    pub fields: &'static [FieldDef],
}

impl Schema {
    /// A serializable type with no base.
    pub const fn new(name: &'static str, fields: &'static [FieldDef]) -> Self {
        Self {
            name,
            serializable: true,
            base: None,
            fields,
        }
    }

    /// Derive from `base`. Its fields are walked before this type's.
    pub const fn with_base(self, base: &'static Schema) -> Self {
        Self {
            base: Some(base),
            ..self
        }
    }

    /// Drop the serializable marker.
    pub const fn not_serializable(self) -> Self {
        Self {
            serializable: false,
            ..self
        }
    }

    /// This schema and its bases, root base first.
    pub fn lineage(&'static self) -> Vec<&'static Schema> {
        let mut chain = Vec::new();
        let mut current = Some(self);
        while let Some(schema) = current {
            chain.push(schema);
            current = schema.base;
        }
        chain.reverse();
        chain
    }

    /// Every field in serialization order: base fields before derived ones.
    pub fn fields_in_order(&'static self) -> impl Iterator<Item = &'static FieldDef> {
        self.lineage().into_iter().flat_map(|schema| schema.fields.iter())
    }

    /// Find a field by name anywhere in the lineage.
    pub fn field(&'static self, name: &str) -> Option<&'static FieldDef> {
        self.fields_in_order().find(|f| f.name == name)
    }

    /// Whether `self` is `other` or derives from it. Schemas are compared by
    /// identity, not by name.
    pub fn is_a(&self, other: &Schema) -> bool {
        let mut current = Some(self);
        while let Some(schema) = current {
            if std::ptr::eq(schema, other) {
                return true;
            }
            current = schema.base;
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    static BASE: Schema = Schema::new(
        "Base",
        &[FieldDef::new("m_Enabled", FieldKind::Primitive(PrimitiveKind::Bool))],
    );

    static MIDDLE: Schema = Schema::new(
        "Middle",
        &[FieldDef::new("m_Name", FieldKind::String)],
    )
    .with_base(&BASE);

    static LEAF: Schema = Schema::new(
        "Leaf",
        &[
            FieldDef::new("m_Count", FieldKind::Primitive(PrimitiveKind::U16)).no_align(),
            FieldDef::new("m_Data", FieldKind::PrimitiveArray(PrimitiveKind::U8)),
        ],
    )
    .with_base(&MIDDLE);

    // Same name as BASE, different table.
    static SHADOW: Schema = Schema::new(
        "Base",
        &[FieldDef::new("m_Enabled", FieldKind::Primitive(PrimitiveKind::Bool))],
    );

    #[test]
    fn test_base_fields_first() {
        let names: Vec<_> = LEAF.fields_in_order().map(|f| f.name).collect();
        assert_eq!(names, ["m_Enabled", "m_Name", "m_Count", "m_Data"]);

        let lineage: Vec<_> = LEAF.lineage().iter().map(|s| s.name).collect();
        assert_eq!(lineage, ["Base", "Middle", "Leaf"]);
    }

    #[test]
    fn test_alignment_rules() {
        assert!(LEAF.field("m_Enabled").unwrap().aligns_after());
        assert!(!LEAF.field("m_Count").unwrap().aligns_after());
        assert!(!LEAF.field("m_Name").unwrap().aligns_after());
        assert!(LEAF.field("m_Data").unwrap().aligns_after());
        assert!(!PrimitiveKind::F32.needs_align());
        assert!(PrimitiveKind::I16.needs_align());
    }

    #[test]
    fn test_lineage_queries() {
        assert!(LEAF.is_a(&BASE));
        assert!(!BASE.is_a(&LEAF));
        assert!(!SHADOW.is_a(&BASE));
        assert!(LEAF.field("missing").is_none());
        assert!(!BASE.not_serializable().serializable);
        assert_eq!(FieldKind::ObjectArray(&BASE).to_string(), "Base[]");
        assert_eq!(FieldKind::PrimitiveArray(PrimitiveKind::U16).to_string(), "UInt16[]");
    }
}
