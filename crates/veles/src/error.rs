//! Unified error type across the Veles crates.

use thiserror::Error;

/// Any error raised by the Veles crates.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Common(#[from] veles_common::Error),

    #[error(transparent)]
    Assets(#[from] veles_assets::Error),

    #[error(transparent)]
    Serialize(#[from] veles_serialize::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type using the unified [`Error`].
pub type Result<T> = std::result::Result<T, Error>;
