//! Decoders for the legacy CD-ROM asset extractor.
//!
//! Currently holds the [`flc`] module: the stateful FLC animation decoder.
//! SI and SMK demuxing are out of scope (SPEC_FULL.md §1) and are not
//! modeled here.

pub mod flc;

pub use flc::{FlcDecoder, FlcStream};

/// Result type for cdx-decoder operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for cdx-decoder operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("cdx-core error: {0}")]
    Core(#[from] cdx_core::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed FLC stream: {0}")]
    MalformedInput(String),

    #[error("unsupported FLC chunk type: {0:#06x}")]
    UnsupportedChunk(u16),
}
