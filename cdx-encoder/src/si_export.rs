//! The SI `file_type` dispatcher: turns one SI [`Object`] into the set of
//! standalone files the original extractor wrote for it (one WAV, one BMP,
//! or — for FLC — a spliced `.flc`, a frame-stacked sprite-sheet BMP, and an
//! AVI; SMK is passed through raw since SMK demuxing is out of scope).

use crate::{avi::AviMuxer, bitmap, flc_passthrough, wav, Error, Result};
use cdx_core::si::{FileType, Object};
use cdx_decoder::FlcDecoder;
use std::io::Cursor;

/// One file this SI object expands into, named the way the original's
/// `extract/<si-name>/<id>...` layout names it.
#[derive(Debug, Clone)]
pub struct SiExportedFile {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// Expands one SI object into its exported file(s).
///
/// Returns one entry for `Wav`/`Stl`. Returns up to three for `Flc` (the
/// spliced `.flc`, a sprite-sheet `.bmp`, and an `.avi`) — if the spliced
/// stream fails to decode, only the raw `.flc` is returned and the decode
/// error is logged, matching the original's catch-and-skip behaviour.
/// Returns one raw `.smk` entry for `Smk`.
pub fn export_si_object(obj: &Object) -> Result<Vec<SiExportedFile>> {
    match obj.file_type {
        FileType::Wav => {
            if obj.chunks.len() < 2 {
                return Err(Error::InvalidInput(format!(
                    "object {} (Wav) expected at least 2 chunks but got {}",
                    obj.id,
                    obj.chunks.len()
                )));
            }
            let fmt_chunk = obj.chunks[0].as_slice();
            let data_chunk: Vec<u8> = obj.chunks[1..].concat();
            let bytes = wav::write_wav(fmt_chunk, &data_chunk)?;
            Ok(vec![SiExportedFile {
                file_name: format!("{}.wav", obj.id),
                bytes,
            }])
        }
        FileType::Stl => {
            let [rgb] = require_chunks::<1>(obj)?;
            let bytes = bitmap::write_bmp_rgb(obj.width, obj.height, rgb)?;
            Ok(vec![SiExportedFile {
                file_name: format!("{}.bmp", obj.id),
                bytes,
            }])
        }
        FileType::Flc => export_flc_object(obj),
        FileType::Smk => {
            let [raw] = require_chunks::<1>(obj)?;
            Ok(vec![SiExportedFile {
                file_name: format!("{}.smk", obj.id),
                bytes: raw.to_vec(),
            }])
        }
    }
}

fn export_flc_object(obj: &Object) -> Result<Vec<SiExportedFile>> {
    let flc_bytes = flc_passthrough::splice_flc_chunks(&obj.chunks)?;
    let mut files = vec![SiExportedFile {
        file_name: format!("{}.flc", obj.id),
        bytes: flc_bytes.clone(),
    }];

    match FlcDecoder::decode(Cursor::new(flc_bytes)) {
        Ok(stream) => {
            let sprite_sheet = build_sprite_sheet(stream.width, stream.height, &stream.frames)?;
            files.push(SiExportedFile {
                file_name: format!(
                    "{}_frames{}_fps{}.bmp",
                    obj.id,
                    stream.frames.len(),
                    stream.fps
                ),
                bytes: sprite_sheet,
            });

            let avi = AviMuxer::new(stream.width, stream.height, stream.fps, stream.frames)?
                .mux()?;
            files.push(SiExportedFile {
                file_name: format!("{}.avi", obj.id),
                bytes: avi,
            });
        }
        Err(e) => {
            log::error!("error decoding spliced FLC for object {}: {e}", obj.id);
        }
    }

    Ok(files)
}

/// Stacks decoded frames into one tall top-down BMP, one frame per row band.
fn build_sprite_sheet(width: u32, height: u32, frames: &[Vec<u8>]) -> Result<Vec<u8>> {
    let mut sheet = Vec::with_capacity(frames.len() * width as usize * height as usize * 3);
    for frame in frames {
        sheet.extend_from_slice(frame);
    }
    bitmap::write_bmp_rgb(width, height * frames.len() as u32, &sheet)
}

fn require_chunks<const N: usize>(obj: &Object) -> Result<[&[u8]; N]> {
    if obj.chunks.len() != N {
        return Err(Error::InvalidInput(format!(
            "object {} ({:?}) expected {N} chunk(s) but got {}",
            obj.id,
            obj.file_type,
            obj.chunks.len()
        )));
    }
    Ok(std::array::from_fn(|i| obj.chunks[i].as_slice()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use cdx_core::si::Object;

    #[test]
    fn wav_object_needs_at_least_two_chunks() {
        let obj = Object::new(1, FileType::Wav, vec![vec![0u8; 16]]);
        assert!(export_si_object(&obj).is_err());
    }

    #[test]
    fn wav_object_exports_a_single_riff_file() {
        let obj = Object::new(1, FileType::Wav, vec![vec![0u8; 16], vec![1, 2, 3, 4]]);
        let files = export_si_object(&obj).unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].file_name, "1.wav");
        assert_eq!(&files[0].bytes[0..4], b"RIFF");
    }

    #[test]
    fn wav_object_concatenates_chunks_after_the_first_into_data() {
        let obj = Object::new(
            1,
            FileType::Wav,
            vec![vec![0u8; 16], vec![1, 2], vec![3, 4]],
        );
        let files = export_si_object(&obj).unwrap();
        let data_pos = files[0]
            .bytes
            .windows(4)
            .rposition(|w| w == b"data")
            .unwrap();
        let data_size =
            u32::from_le_bytes(files[0].bytes[data_pos + 4..data_pos + 8].try_into().unwrap());
        assert_eq!(data_size, 4);
        assert_eq!(&files[0].bytes[data_pos + 8..data_pos + 12], &[1, 2, 3, 4]);
    }

    #[test]
    fn stl_object_exports_a_single_bmp() {
        let mut obj = Object::new(2, FileType::Stl, vec![vec![0u8; 2 * 2 * 3]]);
        obj.width = 2;
        obj.height = 2;
        let files = export_si_object(&obj).unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].file_name, "2.bmp");
        assert_eq!(&files[0].bytes[0..2], b"BM");
    }

    #[test]
    fn smk_object_is_passed_through_raw() {
        let obj = Object::new(3, FileType::Smk, vec![vec![9u8, 9, 9]]);
        let files = export_si_object(&obj).unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].file_name, "3.smk");
        assert_eq!(files[0].bytes, vec![9, 9, 9]);
    }

    #[test]
    fn malformed_flc_still_exports_the_raw_flc() {
        let obj = Object::new(4, FileType::Flc, vec![vec![0xAAu8; 128]]); // bad magic
        let files = export_si_object(&obj).unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].file_name, "4.flc");
    }
}
