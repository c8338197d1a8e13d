//! RIFF/WAVE muxing for SI audio objects.
//!
//! An SI WAV object's payload is a `fmt ` chunk body followed directly by a
//! `data` chunk body (no sub-chunk framing of its own) — [`write_wav`] adds
//! that framing back and wraps both in a `WAVE`-tagged `RIFF`.

use crate::Result;
use byteorder::{LittleEndian, WriteBytesExt};
use std::io::Write;

/// Wraps a `fmt ` body and a `data` body into a complete `.wav` file.
///
/// Each sub-chunk is padded to an even length (the pad byte itself is not
/// counted in the chunk's declared size), per the RIFF spec.
pub fn write_wav(fmt_chunk: &[u8], data_chunk: &[u8]) -> Result<Vec<u8>> {
    let mut content = Vec::new();
    content.write_all(b"WAVE")?;
    write_sub_chunk(&mut content, b"fmt ", fmt_chunk)?;
    write_sub_chunk(&mut content, b"data", data_chunk)?;

    let mut out = Vec::new();
    write_sub_chunk(&mut out, b"RIFF", &content)?;
    Ok(out)
}

fn write_sub_chunk(out: &mut Vec<u8>, chunk_type: &[u8; 4], content: &[u8]) -> Result<()> {
    out.write_all(chunk_type)?;
    out.write_u32::<LittleEndian>(content.len() as u32)?;
    out.write_all(content)?;
    if content.len() % 2 == 1 {
        out.push(0);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wraps_fmt_and_data_in_riff_wave() {
        let fmt = vec![1u8; 16];
        let data = vec![2u8; 10];
        let wav = write_wav(&fmt, &data).unwrap();

        assert_eq!(&wav[0..4], b"RIFF");
        let riff_size = u32::from_le_bytes(wav[4..8].try_into().unwrap());
        assert_eq!(riff_size as usize, wav.len() - 8);
        assert_eq!(&wav[8..12], b"WAVE");
        assert_eq!(&wav[12..16], b"fmt ");
        let fmt_size = u32::from_le_bytes(wav[16..20].try_into().unwrap());
        assert_eq!(fmt_size, 16);
    }

    #[test]
    fn odd_length_data_chunk_gets_a_pad_byte_not_counted_in_size() {
        let fmt = vec![0u8; 16];
        let data = vec![9u8; 5]; // odd length
        let wav = write_wav(&fmt, &data).unwrap();

        let data_pos = wav.windows(4).rposition(|w| w == b"data").unwrap();
        let data_size = u32::from_le_bytes(wav[data_pos + 4..data_pos + 8].try_into().unwrap());
        assert_eq!(data_size, 5);
        // Declared size excludes the pad byte, but the pad byte is physically present.
        assert_eq!(wav.len(), data_pos + 8 + 5 + 1);
    }

    #[test]
    fn even_length_chunks_get_no_padding() {
        let fmt = vec![0u8; 16];
        let data = vec![9u8; 4];
        let wav = write_wav(&fmt, &data).unwrap();
        let data_pos = wav.windows(4).rposition(|w| w == b"data").unwrap();
        assert_eq!(wav.len(), data_pos + 8 + 4);
    }
}
