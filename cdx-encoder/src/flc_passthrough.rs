//! Re-splices an SI FLC object's raw chunk stream into a standalone `.flc`
//! file, patching the truncated first-frame chunk SI storage strips.
//!
//! An SI FLC object's chunk list keeps the 128-byte file header verbatim as
//! its first entry, but every frame chunk after that has had its leading
//! 20 bytes (the FRAME_TYPE chunk header plus its frame sub-header) stripped
//! by the SI packer to save space, except where the whole chunk was exactly
//! those 20 bytes (an empty frame) — those collapse to a single zero-length
//! placeholder frame chunk.

use crate::Result;

const EMPTY_FRAME_PLACEHOLDER: [u8; 16] = [
    0x10, 0x00, 0x00, 0x00, 0xFA, 0xF1, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
];

/// Rebuilds a standalone FLC byte stream from an SI object's raw chunks.
///
/// `chunks` is the SI object's `chunks` field verbatim: index 0 is the
/// 128-byte FLC file header, every later entry is one (possibly truncated)
/// frame chunk.
pub fn splice_flc_chunks(chunks: &[Vec<u8>]) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    for (n, chunk) in chunks.iter().enumerate() {
        if n == 0 {
            out.extend_from_slice(chunk);
            continue;
        }
        if chunk.len() == 20 {
            out.extend_from_slice(&EMPTY_FRAME_PLACEHOLDER);
            continue;
        }
        out.extend_from_slice(&chunk[20..]);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_chunk_is_copied_verbatim() {
        let header = vec![0xAAu8; 128];
        let out = splice_flc_chunks(&[header.clone()]).unwrap();
        assert_eq!(out, header);
    }

    #[test]
    fn empty_frame_chunk_becomes_placeholder() {
        let header = vec![0u8; 128];
        let empty_frame = vec![0u8; 20];
        let out = splice_flc_chunks(&[header.clone(), empty_frame]).unwrap();
        assert_eq!(&out[128..], &EMPTY_FRAME_PLACEHOLDER);
    }

    #[test]
    fn non_empty_frame_chunk_has_leading_twenty_bytes_stripped() {
        let header = vec![0u8; 128];
        let mut frame = vec![0xFFu8; 20];
        frame.extend_from_slice(&[1, 2, 3, 4]);
        let out = splice_flc_chunks(&[header, frame]).unwrap();
        assert_eq!(&out[128..], &[1, 2, 3, 4]);
    }
}
