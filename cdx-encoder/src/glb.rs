//! glTF 2.0 Binary (GLB) writer.
//!
//! Nodes form a tree, but Rust's borrow checker won't allow the original's
//! "hand back a live reference to a child list" trick: every node here is
//! addressed by its index into `nodes`, and `add_node`/`add_parent` take the
//! *parent's* index instead of a mutable reference to its children.
//!
//! `build`/`write` consume `self` by value: once the JSON document and BIN
//! chunk are serialized, the writer has nothing left to add to.

use crate::bitmap::{write_png_rgb_or_rgba, ColorSpace};
use crate::{Error, Result};
use cdx_core::{Gif, Mesh};
use serde::Serialize;

const USHORT: u32 = 5123;
const FLOAT: u32 = 5126;
const ARRAY_BUFFER: u32 = 34962;
const ELEMENT_ARRAY_BUFFER: u32 = 34963;

#[derive(Serialize, Default)]
struct JsonNode {
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    children: Option<Vec<usize>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    mesh: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    translation: Option<[f32; 3]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    rotation: Option<[f32; 4]>,
}

#[derive(Serialize)]
struct BufferView {
    buffer: u32,
    #[serde(rename = "byteOffset")]
    byte_offset: usize,
    #[serde(rename = "byteLength")]
    byte_length: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    target: Option<u32>,
}

#[derive(Serialize)]
struct Accessor {
    #[serde(rename = "bufferView")]
    buffer_view: usize,
    #[serde(rename = "componentType")]
    component_type: u32,
    count: usize,
    #[serde(rename = "type")]
    accessor_type: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    min: Option<Vec<f32>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max: Option<Vec<f32>>,
}

#[derive(Serialize)]
struct Attributes {
    #[serde(rename = "POSITION")]
    position: usize,
    #[serde(rename = "NORMAL")]
    normal: usize,
    #[serde(rename = "TEXCOORD_0", skip_serializing_if = "Option::is_none")]
    texcoord_0: Option<usize>,
}

#[derive(Serialize)]
struct Primitive {
    attributes: Attributes,
    indices: usize,
    material: usize,
}

#[derive(Serialize)]
struct JsonMesh {
    primitives: Vec<Primitive>,
    name: String,
}

#[derive(Serialize)]
struct TextureRef {
    index: usize,
}

#[derive(Serialize, Default)]
struct PbrMetallicRoughness {
    #[serde(rename = "baseColorFactor", skip_serializing_if = "Option::is_none")]
    base_color_factor: Option<[f32; 4]>,
    #[serde(rename = "baseColorTexture", skip_serializing_if = "Option::is_none")]
    base_color_texture: Option<TextureRef>,
}

#[derive(Serialize)]
struct JsonMaterial {
    #[serde(rename = "pbrMetallicRoughness")]
    pbr_metallic_roughness: PbrMetallicRoughness,
}

#[derive(Serialize)]
struct JsonTexture {
    source: usize,
}

#[derive(Serialize)]
struct JsonImage {
    #[serde(rename = "mimeType")]
    mime_type: &'static str,
    #[serde(rename = "bufferView")]
    buffer_view: usize,
}

#[derive(Serialize)]
struct Asset {
    version: &'static str,
}

#[derive(Serialize)]
struct Buffer {
    #[serde(rename = "byteLength")]
    byte_length: usize,
}

#[derive(Serialize)]
struct Scene {
    nodes: Vec<usize>,
}

#[derive(Serialize)]
struct Document {
    asset: Asset,
    buffers: Vec<Buffer>,
    #[serde(rename = "bufferViews")]
    buffer_views: Vec<BufferView>,
    accessors: Vec<Accessor>,
    meshes: Vec<JsonMesh>,
    materials: Vec<JsonMaterial>,
    nodes: Vec<JsonNode>,
    scenes: Vec<Scene>,
    scene: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    images: Vec<JsonImage>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    textures: Vec<JsonTexture>,
}

/// Incrementally assembles a GLB's node tree, meshes, and textures.
pub struct GLBWriter {
    bin_chunk_data: Vec<u8>,
    buffer_views: Vec<BufferView>,
    accessors: Vec<Accessor>,
    json_meshes: Vec<JsonMesh>,
    json_materials: Vec<JsonMaterial>,
    json_textures: Vec<JsonTexture>,
    json_images: Vec<JsonImage>,
    nodes: Vec<JsonNode>,
    pending_textures: Vec<(usize, Gif)>,
}

impl Default for GLBWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl GLBWriter {
    pub fn new() -> Self {
        Self {
            bin_chunk_data: Vec::new(),
            buffer_views: Vec::new(),
            accessors: Vec::new(),
            json_meshes: Vec::new(),
            json_materials: Vec::new(),
            json_textures: Vec::new(),
            json_images: Vec::new(),
            nodes: Vec::new(),
            pending_textures: Vec::new(),
        }
    }

    /// Adds a bare node, attaching it to `parent`'s children list. The very
    /// first node added must have no parent; every node after it must.
    pub fn add_node(&mut self, parent: Option<usize>) -> Result<usize> {
        match parent {
            Some(_) if self.nodes.is_empty() => {
                return Err(Error::InvariantViolation(
                    "parent defined for first node".into(),
                ))
            }
            None if !self.nodes.is_empty() => {
                return Err(Error::InvariantViolation(
                    "no parent defined for further nodes".into(),
                ))
            }
            _ => {}
        }

        let index = self.nodes.len();
        self.nodes.push(JsonNode::default());
        if let Some(parent_index) = parent {
            self.nodes[parent_index]
                .children
                .get_or_insert_with(Vec::new)
                .push(index);
        }
        Ok(index)
    }

    /// Adds a named node that can itself act as a parent for later nodes.
    pub fn add_parent(&mut self, name: impl Into<String>, parent: Option<usize>) -> Result<usize> {
        let index = self.add_node(parent)?;
        self.nodes[index].name = Some(name.into());
        self.nodes[index].children = Some(Vec::new());
        Ok(index)
    }

    fn append_bin_chunk(&mut self, data: &[u8], target: Option<u32>) -> usize {
        let byte_offset = self.bin_chunk_data.len();
        self.bin_chunk_data.extend_from_slice(data);
        let byte_length = self.bin_chunk_data.len() - byte_offset;
        while self.bin_chunk_data.len() % 4 != 0 {
            self.bin_chunk_data.push(0);
        }
        let index = self.buffer_views.len();
        self.buffer_views.push(BufferView {
            buffer: 0,
            byte_offset,
            byte_length,
            target,
        });
        index
    }

    fn push_vec3_accessor(&mut self, values: &[[f32; 3]], target: Option<u32>) -> usize {
        let mut bytes = Vec::with_capacity(values.len() * 12);
        for v in values {
            bytes.extend_from_slice(&v[0].to_le_bytes());
            bytes.extend_from_slice(&v[1].to_le_bytes());
            bytes.extend_from_slice(&v[2].to_le_bytes());
        }
        let buffer_view = self.append_bin_chunk(&bytes, target);
        self.accessors.push(Accessor {
            buffer_view,
            component_type: FLOAT,
            count: values.len(),
            accessor_type: "VEC3",
            min: None,
            max: None,
        });
        self.accessors.len() - 1
    }

    fn push_vec2_accessor(&mut self, values: &[[f32; 2]], target: Option<u32>) -> usize {
        let mut bytes = Vec::with_capacity(values.len() * 8);
        for v in values {
            bytes.extend_from_slice(&v[0].to_le_bytes());
            bytes.extend_from_slice(&v[1].to_le_bytes());
        }
        let buffer_view = self.append_bin_chunk(&bytes, target);
        self.accessors.push(Accessor {
            buffer_view,
            component_type: FLOAT,
            count: values.len(),
            accessor_type: "VEC2",
            min: None,
            max: None,
        });
        self.accessors.len() - 1
    }

    fn push_scalar_u16_accessor(&mut self, values: &[u16], target: Option<u32>) -> usize {
        let mut bytes = Vec::with_capacity(values.len() * 2);
        for v in values {
            bytes.extend_from_slice(&v.to_le_bytes());
        }
        let buffer_view = self.append_bin_chunk(&bytes, target);
        self.accessors.push(Accessor {
            buffer_view,
            component_type: USHORT,
            count: values.len(),
            accessor_type: "SCALAR",
            min: None,
            max: None,
        });
        self.accessors.len() - 1
    }

    /// Adds a mesh node under `parent`, recording its material and (if a
    /// texture is given) queuing it for PNG encoding in [`Self::build`].
    ///
    /// Reproduces the original's alpha bug verbatim: the material's alpha
    /// channel is `1 - mesh.color.alpha`, not `1 - mesh.color.alpha / 255`.
    pub fn add_mesh(
        &mut self,
        mesh: &Mesh,
        texture: Option<&Gif>,
        name: impl Into<String>,
        parent: Option<usize>,
    ) -> Result<usize> {
        mesh.validate()?;

        let mesh_node = self.add_node(parent)?;
        self.nodes[mesh_node].mesh = Some(self.json_meshes.len());

        let vertex_index = self.push_vec3_accessor(&mesh.vertices, Some(ARRAY_BUFFER));
        let mut min = [f32::MAX; 3];
        let mut max = [f32::MIN; 3];
        for v in &mesh.vertices {
            for axis in 0..3 {
                min[axis] = min[axis].min(v[axis]);
                max[axis] = max[axis].max(v[axis]);
            }
        }
        self.accessors[vertex_index].min = Some(min.to_vec());
        self.accessors[vertex_index].max = Some(max.to_vec());

        let normal_index = self.push_vec3_accessor(&mesh.normals, Some(ARRAY_BUFFER));
        let index_index = self.push_scalar_u16_accessor(&mesh.indices, Some(ELEMENT_ARRAY_BUFFER));

        let texcoord_0 = if !mesh.uvs.is_empty() {
            Some(self.push_vec2_accessor(&mesh.uvs, Some(ARRAY_BUFFER)))
        } else {
            None
        };

        let material_index = self.json_materials.len();
        self.json_meshes.push(JsonMesh {
            primitives: vec![Primitive {
                attributes: Attributes {
                    position: vertex_index,
                    normal: normal_index,
                    texcoord_0,
                },
                indices: index_index,
                material: material_index,
            }],
            name: name.into(),
        });
        self.json_materials.push(JsonMaterial {
            pbr_metallic_roughness: PbrMetallicRoughness {
                base_color_factor: Some([
                    mesh.color.red as f32 / 255.0,
                    mesh.color.green as f32 / 255.0,
                    mesh.color.blue as f32 / 255.0,
                    1.0 - mesh.color.alpha as f32,
                ]),
                base_color_texture: None,
            },
        });

        if let Some(texture) = texture {
            let mesh_index = self.json_meshes.len() - 1;
            self.pending_textures.push((mesh_index, texture.clone()));
        }

        Ok(mesh_node)
    }

    fn write_textures(&mut self) -> Result<()> {
        let pending = std::mem::take(&mut self.pending_textures);
        for (mesh_index, texture) in pending {
            let png = write_png_rgb_or_rgba(
                texture.width,
                texture.height,
                &texture.image,
                ColorSpace::Rgb,
            )?;
            let buffer_view = self.append_bin_chunk(&png, None);
            let texture_index = self.json_textures.len();
            self.json_materials[mesh_index].pbr_metallic_roughness = PbrMetallicRoughness {
                base_color_factor: None,
                base_color_texture: Some(TextureRef {
                    index: texture_index,
                }),
            };
            self.json_textures.push(JsonTexture {
                source: self.json_images.len(),
            });
            self.json_images.push(JsonImage {
                mime_type: "image/png",
                buffer_view,
            });
        }
        Ok(())
    }

    /// Sets the `translation` on an already-added node (used when a node's
    /// transform is only known after the node itself was created).
    pub fn set_translation(&mut self, node: usize, value: [f32; 3]) {
        self.nodes[node].translation = Some(value);
    }

    /// Sets the `rotation` on an already-added node.
    pub fn set_rotation(&mut self, node: usize, value: [f32; 4]) {
        self.nodes[node].rotation = Some(value);
    }

    fn extend_gltf_chunk(chunk_type: &[u8; 4], content: &[u8]) -> Vec<u8> {
        let mut out = Vec::with_capacity(8 + content.len());
        out.extend_from_slice(&(content.len() as u32).to_le_bytes());
        out.extend_from_slice(chunk_type);
        out.extend_from_slice(content);
        out
    }

    /// Finalizes textures and serializes the JSON + BIN chunk pair.
    /// Consumes the writer: nothing more can be added afterward.
    pub fn build(mut self) -> Result<Vec<u8>> {
        self.write_textures()?;

        let document = Document {
            asset: Asset { version: "2.0" },
            buffers: vec![Buffer {
                byte_length: self.bin_chunk_data.len(),
            }],
            buffer_views: self.buffer_views,
            accessors: self.accessors,
            meshes: self.json_meshes,
            materials: self.json_materials,
            nodes: self.nodes,
            scenes: vec![Scene { nodes: vec![0] }],
            scene: 0,
            images: self.json_images,
            textures: self.json_textures,
        };

        let mut json_bytes = serde_json::to_vec(&document)?;
        while json_bytes.len() % 4 != 0 {
            json_bytes.push(b' ');
        }

        let mut contents = Self::extend_gltf_chunk(b"JSON", &json_bytes);
        contents.extend(Self::extend_gltf_chunk(b"BIN\0", &self.bin_chunk_data));
        Ok(contents)
    }

    /// Builds and wraps the contents in the 12-byte glTF binary header.
    pub fn write(self) -> Result<Vec<u8>> {
        let contents = self.build()?;
        let mut out = Vec::with_capacity(12 + contents.len());
        out.extend_from_slice(b"glTF");
        out.extend_from_slice(&2u32.to_le_bytes());
        out.extend_from_slice(&(12 + contents.len() as u32).to_le_bytes());
        out.extend_from_slice(&contents);
        Ok(out)
    }
}
