//! Common utilities for Veles.
//!
//! This crate provides foundational types used across all Veles crates:
//!
//! - [`EndianReader`] - Zero-copy binary reading from byte slices in either byte order
//! - [`EndianWriter`] - Binary writing to seekable streams in either byte order
//! - [`Guid`] - Unity's 16-byte asset GUID

mod error;
mod guid;
mod reader;
mod writer;

pub use error::{Error, Result};
pub use guid::Guid;
pub use reader::{padding_for, Endian, EndianReader};
pub use writer::EndianWriter;

/// Re-export zerocopy traits for convenience
pub use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};
