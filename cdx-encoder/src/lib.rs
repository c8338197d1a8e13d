//! Encoders for the legacy CD-ROM asset extractor.
//!
//! Each module here carries decoded bytes out to a standard interchange
//! format: [`bitmap`] (BMP/PNG), [`avi`], [`wav`], [`flc_passthrough`],
//! [`glb`] (glTF 2.0 Binary), [`scene_composer`] (walks a WDB model tree
//! into a [`glb::GLBWriter`]), and [`si_export`] (the SI `file_type`
//! dispatcher tying the others together).

pub mod avi;
pub mod bitmap;
pub mod flc_passthrough;
pub mod glb;
pub mod scene_composer;
pub mod si_export;
pub mod wav;

pub use avi::AviMuxer;
pub use glb::GLBWriter;
pub use scene_composer::{ComposerConfig, SceneComposer};
pub use si_export::{export_si_object, SiExportedFile};

/// Result type for cdx-encoder operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for cdx-encoder operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("cdx-core error: {0}")]
    Core(#[from] cdx_core::Error),

    #[error("cdx-decoder error: {0}")]
    Decoder(#[from] cdx_decoder::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("invariant violation: {0}")]
    InvariantViolation(String),
}
