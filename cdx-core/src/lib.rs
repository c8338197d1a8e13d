//! Core data model for the legacy CD-ROM asset extractor.
//!
//! This crate holds no decoders or encoders of its own. It defines the
//! shapes that the decoder and encoder crates agree on: the SI container's
//! per-object contract (`si`), the WDB scene-graph contract consumed by the
//! GLB composer (`wdb`), and the balanced work-partitioning scheduler shared
//! by any outer batch driver (`scheduler`).

pub mod scheduler;
pub mod si;
pub mod wdb;

pub use scheduler::{balanced_chunks, Weighted};
pub use si::{FileType, Object};
pub use wdb::{
    AnimationNode, Color, Gif, InMemoryWdb, Lod, Mesh, Model, Quat, Roi, RotationKey,
    TranslationKey, Vec2, Vec3, WdbModel,
};

/// Result type for cdx-core operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for cdx-core operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("malformed input: {0}")]
    MalformedInput(String),

    #[error("invariant violation: {0}")]
    InvariantViolation(String),
}
