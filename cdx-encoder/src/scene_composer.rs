//! Walks a [`WdbModel`] scene graph into one or more [`GLBWriter`] outputs.
//!
//! Mirrors the original's three export shapes: a single mesh, a single LOD
//! (all its meshes under one parent node), and a whole model (the ROI tree,
//! paired by name with its animation tree, with either every LOD or only the
//! finest one attached per ROI).

use crate::glb::GLBWriter;
use crate::Result;
use cdx_core::{AnimationNode, Lod, Mesh, Model, Roi, WdbModel};

/// Whether a composed model includes every level of detail or only the
/// finest one per ROI.
#[derive(Debug, Clone, Copy)]
pub struct ComposerConfig {
    pub all_lods: bool,
}

/// One exported artifact, named the way the original's directory layout
/// names it (`parts/{name}.glb`, `model.glb`, `all_lods.glb`).
#[derive(Debug, Clone)]
pub struct ExportedAsset {
    pub relative_path: String,
    pub bytes: Vec<u8>,
}

/// Composes GLB scenes from a loaded WDB model tree.
pub struct SceneComposer<'a> {
    wdb: &'a dyn WdbModel,
}

impl<'a> SceneComposer<'a> {
    pub fn new(wdb: &'a dyn WdbModel) -> Self {
        Self { wdb }
    }

    /// A single mesh as its own GLB, with its texture (if any) embedded.
    pub fn mesh_to_glb(&self, mesh: &Mesh, name: &str) -> Result<Vec<u8>> {
        let texture = if !mesh.uvs.is_empty() {
            self.wdb.texture_by_name(&mesh.texture_name)
        } else {
            None
        };
        let mut writer = GLBWriter::new();
        writer.add_mesh(mesh, texture, name, None)?;
        writer.write()
    }

    /// A single LOD's meshes under one named parent node. `None` if the LOD
    /// has no meshes — there is nothing meaningful to export.
    pub fn lod_to_glb(&self, lod: &Lod, lod_name: &str) -> Result<Option<Vec<u8>>> {
        if lod.meshes.is_empty() {
            return Ok(None);
        }
        let mut writer = GLBWriter::new();
        let root = writer.add_parent(lod_name, None)?;
        for (mesh_index, mesh) in lod.meshes.iter().enumerate() {
            let texture = if !mesh.uvs.is_empty() {
                self.wdb.texture_by_name(&mesh.texture_name)
            } else {
                None
            };
            writer.add_mesh(
                mesh,
                texture,
                format!("{lod_name}_M{mesh_index}"),
                Some(root),
            )?;
        }
        Ok(Some(writer.write()?))
    }

    /// The full model: a ROI tree walked pre-order, each ROI paired by name
    /// (case-insensitively) with its animation children, each ROI's first
    /// keyframe at time 0 applied as that node's static transform.
    pub fn model_to_glb(&self, model: &Model, config: ComposerConfig) -> Result<Vec<u8>> {
        let mut writer = GLBWriter::new();
        let root = writer.add_parent(model.roi.name.clone(), None)?;
        self.add_roi(
            &mut writer,
            &model.roi,
            model.animation.as_ref(),
            root,
            config.all_lods,
        )?;
        writer.write()
    }

    fn add_lod(
        &self,
        writer: &mut GLBWriter,
        lod_index: usize,
        lod: &Lod,
        name: &str,
        parent: usize,
    ) -> Result<()> {
        let lod_name = format!("{name}_L{lod_index}");
        let lod_node = writer.add_parent(lod_name.clone(), Some(parent))?;
        for (mesh_index, mesh) in lod.meshes.iter().enumerate() {
            let texture = if !mesh.uvs.is_empty() {
                self.wdb.texture_by_name(&mesh.texture_name)
            } else {
                None
            };
            writer.add_mesh(
                mesh,
                texture,
                format!("{lod_name}_M{mesh_index}"),
                Some(lod_node),
            )?;
        }
        Ok(())
    }

    fn add_roi(
        &self,
        writer: &mut GLBWriter,
        roi: &Roi,
        animation: Option<&AnimationNode>,
        node: usize,
        all_lods: bool,
    ) -> Result<()> {
        if let Some(animation) = animation {
            if let Some(first) = animation.translation_keys.first() {
                if animation.translation_keys.len() > 1 {
                    log::warn!(
                        "found {} translations for {}",
                        animation.translation_keys.len(),
                        roi.name
                    );
                }
                if first.time != 0 {
                    log::warn!("first translation key for {} is not at time 0", roi.name);
                } else {
                    writer.set_translation(node, first.value);
                }
            }
            if let Some(first) = animation.rotation_keys.first() {
                if animation.rotation_keys.len() > 1 {
                    log::warn!(
                        "found {} rotations for {}",
                        animation.rotation_keys.len(),
                        roi.name
                    );
                }
                if first.time != 0 {
                    log::warn!("first rotation key for {} is not at time 0", roi.name);
                } else {
                    writer.set_rotation(node, first.value);
                }
            }
        }

        if all_lods {
            for (lod_index, lod) in roi.lods.iter().enumerate() {
                self.add_lod(writer, lod_index, lod, &roi.name, node)?;
            }
        } else if let Some(finest) = roi.lods.last() {
            self.add_lod(writer, roi.lods.len() - 1, finest, &roi.name, node)?;
        }

        for child in &roi.children {
            let child_node = writer.add_parent(child.name.clone(), Some(node))?;
            let child_animation = animation.and_then(|a| {
                let matches: Vec<&AnimationNode> = a
                    .children
                    .iter()
                    .filter(|x| x.name.eq_ignore_ascii_case(&child.name))
                    .collect();
                if matches.len() > 1 {
                    log::warn!(
                        "found {} animations for {}, using first",
                        matches.len(),
                        child.name
                    );
                }
                matches.into_iter().next()
            });
            self.add_roi(writer, child, child_animation, child_node, all_lods)?;
        }
        Ok(())
    }

    /// Every part of a model, named the way the original's ROI-part export
    /// lays out a directory: each LOD's meshes individually, each LOD as a
    /// whole, recursing into ROI children, plus the composed `model.glb` and
    /// `all_lods.glb`.
    pub fn export_model(&self, model: &Model) -> Result<Vec<ExportedAsset>> {
        let mut assets = Vec::new();
        self.export_roi(model, &model.roi, "", &mut assets)?;

        assets.push(ExportedAsset {
            relative_path: "model.glb".to_string(),
            bytes: self.model_to_glb(model, ComposerConfig { all_lods: false })?,
        });
        assets.push(ExportedAsset {
            relative_path: "all_lods.glb".to_string(),
            bytes: self.model_to_glb(model, ComposerConfig { all_lods: true })?,
        });

        Ok(assets)
    }

    fn export_roi(
        &self,
        model: &Model,
        roi: &Roi,
        prefix: &str,
        assets: &mut Vec<ExportedAsset>,
    ) -> Result<()> {
        let prefix = format!("{prefix}{}", roi.name);
        for (lod_index, lod) in roi.lods.iter().enumerate() {
            let lod_name = format!("{prefix}_L{lod_index}");
            for (mesh_index, mesh) in lod.meshes.iter().enumerate() {
                let mesh_name = format!("{lod_name}_M{mesh_index}");
                let texture = if !mesh.texture_name.is_empty() {
                    self.wdb.texture_by_name(&mesh.texture_name)
                } else {
                    None
                };
                let mut writer = GLBWriter::new();
                writer.add_mesh(mesh, texture, mesh_name.clone(), None)?;
                assets.push(ExportedAsset {
                    relative_path: format!("parts/{mesh_name}.glb"),
                    bytes: writer.write()?,
                });
            }
            if let Some(bytes) = self.lod_to_glb(lod, &lod_name)? {
                assets.push(ExportedAsset {
                    relative_path: format!("parts/{lod_name}.glb"),
                    bytes,
                });
            }
        }
        for child in &roi.children {
            self.export_roi(model, child, &format!("{prefix}_R"), assets)?;
        }
        Ok(())
    }
}
