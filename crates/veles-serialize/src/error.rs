//! Error types for object (de)serialization.

use thiserror::Error;

/// Errors raised while walking a schema.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Common library error, usually a short read.
    #[error("{0}")]
    Common(#[from] veles_common::Error),

    /// Schema lacks the serializable marker.
    #[error("type {0} is not serializable")]
    NotSerializable(&'static str),

    /// Field kind with no binary mapping.
    #[error("{type_name}.{field}: unsupported field type {kind}")]
    UnsupportedField {
        type_name: &'static str,
        field: &'static str,
        kind: &'static str,
    },

    /// Array count above the corruption guard.
    #[error("{type_name}.{field}: array of {count} elements at offset {position} exceeds limit of {max}")]
    ArrayTooLarge {
        type_name: &'static str,
        field: &'static str,
        count: usize,
        position: usize,
        max: usize,
    },

    /// Negative array count.
    #[error("{type_name}.{field}: invalid array length {count} at offset {position}")]
    InvalidArrayLength {
        type_name: &'static str,
        field: &'static str,
        count: i32,
        position: usize,
    },

    /// Decoded byte count differs from the declared object size.
    #[error("{type_name}: consumed {consumed} bytes but object size is {expected}")]
    SizeMismatch {
        type_name: &'static str,
        expected: usize,
        consumed: usize,
    },

    /// Object being serialized lacks a schema field.
    #[error("{type_name}.{field}: missing value")]
    MissingField {
        type_name: &'static str,
        field: &'static str,
    },

    /// Object being serialized holds a value of the wrong kind.
    #[error("{type_name}.{field}: expected {expected}, found {found}")]
    FieldMismatch {
        type_name: &'static str,
        field: &'static str,
        expected: String,
        found: String,
    },
}

/// Result type for (de)serialization.
pub type Result<T> = std::result::Result<T, Error>;
