//! The WDB scene-graph contract consumed by the GLB composer.
//!
//! The WDB container's own byte layout is out of scope (SPEC_FULL.md §4.4):
//! this module only defines the typed shape the composer walks, modeled as
//! owned, acyclic trees per the recursive-structures design note.

use crate::{Error, Result};

pub type Vec3 = [f32; 3];
pub type Vec2 = [f32; 2];
/// Quaternion, stored (x, y, z, w).
pub type Quat = [f32; 4];

/// RGBA colour with byte components, as stored on a [`Mesh`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
    pub alpha: u8,
}

/// An indexed triangle mesh with an optional single texture.
#[derive(Debug, Clone)]
pub struct Mesh {
    pub vertices: Vec<Vec3>,
    pub normals: Vec<Vec3>,
    /// Empty when the mesh has no texture.
    pub uvs: Vec<Vec2>,
    pub indices: Vec<u16>,
    pub color: Color,
    /// Empty when `uvs` is empty.
    pub texture_name: String,
}

impl Mesh {
    /// Checks the invariants from SPEC_FULL.md §3's Mesh row.
    pub fn validate(&self) -> Result<()> {
        if self.vertices.len() != self.normals.len() {
            return Err(Error::InvariantViolation(format!(
                "mesh has {} vertices but {} normals",
                self.vertices.len(),
                self.normals.len()
            )));
        }
        if !self.uvs.is_empty() {
            if self.uvs.len() != self.vertices.len() {
                return Err(Error::InvariantViolation(format!(
                    "mesh has {} vertices but {} uvs",
                    self.vertices.len(),
                    self.uvs.len()
                )));
            }
            if self.texture_name.is_empty() {
                return Err(Error::InvariantViolation(
                    "mesh has uvs but no texture_name".into(),
                ));
            }
        } else if !self.texture_name.is_empty() {
            return Err(Error::InvariantViolation(
                "mesh has a texture_name but no uvs".into(),
            ));
        }
        let vertex_count = self.vertices.len();
        if let Some(&bad) = self
            .indices
            .iter()
            .find(|&&i| i as usize >= vertex_count)
        {
            return Err(Error::InvariantViolation(format!(
                "mesh index {bad} out of range for {vertex_count} vertices"
            )));
        }
        Ok(())
    }
}

/// One level of detail: an ordered, non-empty sequence of meshes.
#[derive(Debug, Clone, Default)]
pub struct Lod {
    pub meshes: Vec<Mesh>,
}

/// A named scene-graph node. Names are not unique; the tree is acyclic.
#[derive(Debug, Clone)]
pub struct Roi {
    pub name: String,
    pub children: Vec<Roi>,
    /// Coarsest to finest.
    pub lods: Vec<Lod>,
}

/// A single translation keyframe.
#[derive(Debug, Clone, Copy)]
pub struct TranslationKey {
    pub time: u32,
    pub value: Vec3,
}

/// A single rotation keyframe.
#[derive(Debug, Clone, Copy)]
pub struct RotationKey {
    pub time: u32,
    pub value: Quat,
}

/// A node of the animation tree, paired with the ROI tree by name at
/// traversal time (never stored as a back-reference, per the
/// recursive-structures design note).
#[derive(Debug, Clone, Default)]
pub struct AnimationNode {
    pub name: String,
    pub children: Vec<AnimationNode>,
    /// Sorted by `time`; first key expected at `time == 0`.
    pub translation_keys: Vec<TranslationKey>,
    /// Sorted by `time`; first key expected at `time == 0`.
    pub rotation_keys: Vec<RotationKey>,
}

/// A decoded texture/image: top-down RGB bytes plus dimensions.
#[derive(Debug, Clone)]
pub struct Gif {
    pub width: u32,
    pub height: u32,
    /// `image.len() == width * height * 3`.
    pub image: Vec<u8>,
    pub title: String,
}

/// One exported model: a scene-graph root paired with its (optional)
/// animation tree.
#[derive(Debug, Clone)]
pub struct Model {
    pub roi: Roi,
    pub animation: Option<AnimationNode>,
}

/// The shape `SceneComposer` needs from a loaded WDB container.
///
/// Implemented by the (out-of-scope) real WDB parser in production, and by
/// small fixture structs in tests.
pub trait WdbModel {
    fn models(&self) -> &[Model];
    fn texture_by_name(&self, name: &str) -> Option<&Gif>;
    fn images(&self) -> &[Gif];
    fn textures(&self) -> &[Gif];
    fn model_textures(&self) -> &[Gif];
}

/// A plain in-memory [`WdbModel`], useful for composing fixture scenes in
/// tests without a real WDB parser.
#[derive(Debug, Clone, Default)]
pub struct InMemoryWdb {
    pub models: Vec<Model>,
    pub images: Vec<Gif>,
    pub textures: Vec<Gif>,
    pub model_textures: Vec<Gif>,
}

impl WdbModel for InMemoryWdb {
    fn models(&self) -> &[Model] {
        &self.models
    }

    fn texture_by_name(&self, name: &str) -> Option<&Gif> {
        self.textures
            .iter()
            .chain(self.model_textures.iter())
            .chain(self.images.iter())
            .find(|gif| gif.title == name)
    }

    fn images(&self) -> &[Gif] {
        &self.images
    }

    fn textures(&self) -> &[Gif] {
        &self.textures
    }

    fn model_textures(&self) -> &[Gif] {
        &self.model_textures
    }
}
