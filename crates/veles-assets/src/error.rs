//! Error types for serialized assets parsing and rewriting.

use thiserror::Error;

/// Errors that can occur when working with assets files.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Common library error.
    #[error("{0}")]
    Common(#[from] veles_common::Error),

    /// Container format revision this reader cannot lay out.
    #[error("unsupported assets format version: {0} (expected 21 or lower)")]
    UnsupportedFormat(u32),

    /// Object table entry references a type index the metadata does not declare.
    #[error("object {path_id} references type index {type_id} (declared types: {count})")]
    UnknownTypeIndex {
        path_id: i64,
        type_id: i32,
        count: usize,
    },

    /// Object byte range falls outside the data region.
    #[error("object {path_id} range {offset}+{size} exceeds data region of {available} bytes")]
    ObjectOutOfBounds {
        path_id: i64,
        offset: u32,
        size: u32,
        available: usize,
    },

    /// Type tree string offset points past the local string buffer.
    #[error("type tree string offset {offset} out of bounds (string buffer size: {size})")]
    StringOffsetOutOfBounds { offset: u16, size: usize },

    /// Negative count read from a table header.
    #[error("invalid {table} count {count} at offset {position}")]
    InvalidCount {
        table: &'static str,
        count: i32,
        position: usize,
    },

    /// No object with this path ID.
    #[error("object not found: {0}")]
    AssetNotFound(i64),

    /// Refused to overwrite the file backing the open container.
    #[error("refusing to save over the open source file: {0}")]
    SaveOverSource(String),

    /// Rewritten offsets or sizes no longer fit the 32-bit table fields.
    #[error("rewritten file exceeds 32-bit offsets: {0} bytes")]
    FileTooLarge(u64),
}

/// Result type for assets operations.
pub type Result<T> = std::result::Result<T, Error>;
