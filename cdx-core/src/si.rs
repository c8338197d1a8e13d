//! The SI interleaved-container contract.
//!
//! The SI parser itself is out of scope (see SPEC_FULL.md §1): it is an
//! external collaborator that hands this crate already-split chunks plus a
//! `FileType` tag. This module only defines the shape of what it hands over,
//! and the pure weighting heuristic ([`si_object_weight`]) that the
//! scheduler uses to balance work across files.

use crate::scheduler::Weighted;

/// Discriminates the four payload kinds an SI object can carry.
///
/// Modeled as a tagged variant (one dispatch arm per kind in `cdx-encoder`'s
/// `si_export` module) rather than dynamic dispatch on a runtime type, per
/// the polymorphism design note.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileType {
    Wav,
    Stl,
    Flc,
    Smk,
}

/// One entry of an SI container, as handed over by the (external) SI parser.
///
/// `chunks` holds the raw per-chunk byte slices in source order; their
/// meaning depends on `file_type` (see `cdx-encoder::si_export`).
#[derive(Debug, Clone)]
pub struct Object {
    pub id: u32,
    pub file_type: FileType,
    pub chunks: Vec<Vec<u8>>,
    /// Declared width, when `file_type` carries image data (`Stl`, `Flc`, `Smk`).
    pub width: u32,
    /// Declared height, when `file_type` carries image data (`Stl`, `Flc`, `Smk`).
    pub height: u32,
    /// Frame count, for `file_type` in `{Flc, Smk}`; unused otherwise.
    pub frame_count: u32,
}

impl Object {
    pub fn new(id: u32, file_type: FileType, chunks: Vec<Vec<u8>>) -> Self {
        Self {
            id,
            file_type,
            chunks,
            width: 0,
            height: 0,
            frame_count: 0,
        }
    }
}

/// Weighting heuristic consumed by [`crate::scheduler::balanced_chunks`].
///
/// Reimplemented verbatim from the original extractor's `File._obj_weight`:
/// SMK and FLC objects are weighted by their decoded pixel volume (video
/// decode is the expensive part), everything else gets a flat weight of 10.
pub fn si_object_weight(obj: &Object) -> u64 {
    match obj.file_type {
        FileType::Flc => {
            (obj.width as u64 * obj.height as u64 * obj.frame_count as u64) / 10_000
        }
        FileType::Smk => {
            (obj.width as u64 * obj.height as u64 * obj.frame_count as u64) / 2_000
        }
        FileType::Wav | FileType::Stl => 10,
    }
}

/// Lets [`crate::scheduler::balanced_chunks`] be driven directly from a list
/// of SI objects, without the caller re-deriving weights by hand.
impl Weighted for Object {
    fn weight(&self) -> u64 {
        si_object_weight(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::balanced_chunks;

    #[test]
    fn flat_weight_for_non_video_objects() {
        let obj = Object::new(0, FileType::Wav, vec![]);
        assert_eq!(si_object_weight(&obj), 10);
    }

    #[test]
    fn flc_weight_scales_with_pixel_volume() {
        let mut obj = Object::new(1, FileType::Flc, vec![]);
        obj.width = 100;
        obj.height = 100;
        obj.frame_count = 10;
        assert_eq!(si_object_weight(&obj), 100 * 100 * 10 / 10_000);
    }

    #[test]
    fn smk_weight_uses_a_different_divisor_than_flc() {
        let mut obj = Object::new(2, FileType::Smk, vec![]);
        obj.width = 100;
        obj.height = 100;
        obj.frame_count = 10;
        assert_eq!(si_object_weight(&obj), 100 * 100 * 10 / 2_000);
    }

    #[test]
    fn objects_can_be_balanced_directly_without_rederiving_weights() {
        let mut heavy_flc = Object::new(0, FileType::Flc, vec![]);
        heavy_flc.width = 640;
        heavy_flc.height = 480;
        heavy_flc.frame_count = 200;

        let mut light_flc = Object::new(1, FileType::Flc, vec![]);
        light_flc.width = 64;
        light_flc.height = 48;
        light_flc.frame_count = 10;

        let wav = Object::new(2, FileType::Wav, vec![]);
        let stl = Object::new(3, FileType::Stl, vec![]);

        let objects = vec![heavy_flc, light_flc, wav, stl];
        let chunks = balanced_chunks(&objects, 2);

        assert_eq!(chunks.len(), 2);
        let mut seen: Vec<usize> = chunks.into_iter().flatten().collect();
        seen.sort_unstable();
        assert_eq!(seen, vec![0, 1, 2, 3]);
    }
}
