//! Uncompressed top-down 24bpp AVI muxing (`RIFF`/`AVI `/`hdrl`/`strl`/`movi`).

use crate::{Error, Result};
use byteorder::{LittleEndian, WriteBytesExt};
use std::io::{Seek, SeekFrom, Write};

/// A decoded animation's frames, ready to be muxed into an AVI container.
///
/// `frames` are top-down RGB byte buffers, each `width * height * 3` bytes.
pub struct AviMuxer {
    width: u32,
    height: u32,
    fps: u32,
    frames: Vec<Vec<u8>>,
}

impl AviMuxer {
    pub fn new(width: u32, height: u32, fps: u32, frames: Vec<Vec<u8>>) -> Result<Self> {
        if fps == 0 {
            return Err(Error::InvalidInput("fps must be nonzero".into()));
        }
        let expected = width as usize * height as usize * 3;
        for frame in &frames {
            if frame.len() != expected {
                return Err(Error::InvalidInput(format!(
                    "expected {expected} bytes per frame but got {}",
                    frame.len()
                )));
            }
        }
        Ok(Self {
            width,
            height,
            fps,
            frames,
        })
    }

    /// Writes the RIFF/AVI container, patching the top-level RIFF size once
    /// the full length is known.
    pub fn mux(&self) -> Result<Vec<u8>> {
        let row_bytes = self.width as usize * 3;
        let pad_len = (4 - (row_bytes % 4)) % 4;
        let total_frame_size = (row_bytes + pad_len) as u32;

        let mut out = std::io::Cursor::new(Vec::new());

        out.write_all(b"RIFF")?;
        out.write_u32::<LittleEndian>(0)?; // patched below
        out.write_all(b"AVI ")?;

        out.write_all(b"LIST")?;
        out.write_u32::<LittleEndian>(4 + 64 + 124)?;
        out.write_all(b"hdrl")?;

        out.write_all(b"avih")?;
        out.write_u32::<LittleEndian>(56)?;
        out.write_u32::<LittleEndian>(1_000_000 / self.fps)?;
        out.write_u32::<LittleEndian>(total_frame_size)?;
        out.write_u32::<LittleEndian>(1)?; // padding granularity
        out.write_u32::<LittleEndian>(0)?; // flags
        out.write_u32::<LittleEndian>(self.frames.len() as u32)?;
        out.write_u32::<LittleEndian>(0)?; // initial frames
        out.write_u32::<LittleEndian>(1)?; // number of streams
        out.write_u32::<LittleEndian>(total_frame_size)?;
        out.write_u32::<LittleEndian>(self.width)?;
        out.write_u32::<LittleEndian>(self.height)?;
        out.write_all(&[0u8; 16])?; // reserved

        out.write_all(b"LIST")?;
        out.write_u32::<LittleEndian>(116)?;
        out.write_all(b"strl")?;

        out.write_all(b"strh")?;
        out.write_u32::<LittleEndian>(56)?;
        out.write_all(b"vids")?;
        out.write_all(b"DIB ")?;
        out.write_u32::<LittleEndian>(0)?; // flags
        out.write_u32::<LittleEndian>(0)?; // priority + language
        out.write_u32::<LittleEndian>(0)?; // initial frames
        out.write_u32::<LittleEndian>(1)?; // scale
        out.write_u32::<LittleEndian>(self.fps)?; // rate
        out.write_u32::<LittleEndian>(0)?; // start
        out.write_u32::<LittleEndian>(self.frames.len() as u32)?; // length
        out.write_u32::<LittleEndian>(total_frame_size)?; // suggested buffer size
        out.write_u32::<LittleEndian>(0)?; // quality
        out.write_u32::<LittleEndian>(total_frame_size)?; // sample size
        out.write_u32::<LittleEndian>(0)?; // rcFrame left+top
        out.write_u32::<LittleEndian>(0)?; // rcFrame right+bottom

        out.write_all(b"strf")?;
        out.write_u32::<LittleEndian>(40)?;
        out.write_u32::<LittleEndian>(40)?;
        out.write_i32::<LittleEndian>(self.width as i32)?;
        out.write_i32::<LittleEndian>(-(self.height as i32))?;
        out.write_u16::<LittleEndian>(1)?;
        out.write_u16::<LittleEndian>(24)?;
        out.write_u32::<LittleEndian>(0)?; // no compression
        out.write_u32::<LittleEndian>(total_frame_size)?;
        out.write_u32::<LittleEndian>(0)?;
        out.write_u32::<LittleEndian>(0)?;
        out.write_u32::<LittleEndian>(0)?;
        out.write_u32::<LittleEndian>(0)?;

        out.write_all(b"LIST")?;
        out.write_u32::<LittleEndian>(self.frames.len() as u32 * (total_frame_size + 8) + 4)?;
        out.write_all(b"movi")?;

        let pad = [0u8; 3];
        for frame in &self.frames {
            out.write_all(b"00db")?;
            out.write_u32::<LittleEndian>(total_frame_size)?;
            for row in frame.chunks_exact(row_bytes) {
                for px in row.chunks_exact(3) {
                    out.write_all(&[px[2], px[1], px[0]])?;
                }
                out.write_all(&pad[..pad_len])?;
            }
        }

        let file_size = out.get_ref().len() as u32;
        out.seek(SeekFrom::Start(4))?;
        out.write_u32::<LittleEndian>(file_size - 8)?;

        Ok(out.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_zero_fps() {
        assert!(AviMuxer::new(2, 2, 0, vec![vec![0u8; 12]]).is_err());
    }

    #[test]
    fn rejects_mismatched_frame_size() {
        assert!(AviMuxer::new(2, 2, 15, vec![vec![0u8; 5]]).is_err());
    }

    #[test]
    fn three_frame_clip_has_patched_riff_size_and_movi_list() {
        let frame = vec![1u8, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12]; // 2x2 RGB
        let muxer = AviMuxer::new(2, 2, 10, vec![frame.clone(), frame.clone(), frame]).unwrap();
        let avi = muxer.mux().unwrap();

        assert_eq!(&avi[0..4], b"RIFF");
        let riff_size = u32::from_le_bytes(avi[4..8].try_into().unwrap());
        assert_eq!(riff_size as usize, avi.len() - 8);
        assert_eq!(&avi[8..12], b"AVI ");

        // movi LIST starts after the hdrl LIST (4 + 4+4+4+64+4+4+4+124 ... easier: scan for "movi").
        let movi_pos = avi.windows(4).position(|w| w == b"movi").unwrap();
        assert_eq!(&avi[movi_pos - 4..movi_pos], b"LIST");

        let chunk_count = avi.windows(4).filter(|w| *w == b"00db").count();
        assert_eq!(chunk_count, 3);
    }

    #[test]
    fn row_padding_present_for_odd_width() {
        // width=1 -> row of 3 bytes, needs 1 pad byte per row.
        let muxer = AviMuxer::new(1, 1, 10, vec![vec![9u8, 8, 7]]).unwrap();
        let avi = muxer.mux().unwrap();
        let db_pos = avi.windows(4).position(|w| w == b"00db").unwrap();
        let frame_size = u32::from_le_bytes(avi[db_pos + 4..db_pos + 8].try_into().unwrap());
        assert_eq!(frame_size, 4);
    }
}
