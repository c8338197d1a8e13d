//! BMP and PNG encoders.
//!
//! Both take top-down RGB (or RGBA, for PNG) byte buffers and produce
//! bit-exact container bytes — no image crate, no lossy recompression.

use crate::{Error, Result};
use byteorder::{LittleEndian, WriteBytesExt};
use std::io::Write;

/// PNG colour type, matching the IHDR `colour type` byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorSpace {
    Rgb = 2,
    Rgba = 6,
}

impl ColorSpace {
    fn bytes_per_pixel(self) -> usize {
        match self {
            ColorSpace::Rgb => 3,
            ColorSpace::Rgba => 4,
        }
    }
}

/// Emits a 24bpp uncompressed BMP from top-down RGB bytes.
///
/// 14-byte file header + 40-byte BITMAPINFOHEADER, negative height (signals
/// top-down rows), rows BGR-swapped and padded to a 4-byte boundary.
pub fn write_bmp_rgb(width: u32, height: u32, rgb: &[u8]) -> Result<Vec<u8>> {
    if rgb.len() != width as usize * height as usize * 3 {
        return Err(Error::InvalidInput(format!(
            "expected {} bytes of RGB data but got {}",
            width as usize * height as usize * 3,
            rgb.len()
        )));
    }

    let row_bytes = width as usize * 3;
    let pad_len = (4 - (row_bytes % 4)) % 4;
    let padded_row = row_bytes + pad_len;
    let header_size = 54u32;
    let pixel_data_size = padded_row as u32 * height;
    let file_size = header_size + pixel_data_size;

    let mut out = Vec::with_capacity(file_size as usize);
    out.write_all(b"BM")?;
    out.write_u32::<LittleEndian>(file_size)?;
    out.write_u16::<LittleEndian>(0)?;
    out.write_u16::<LittleEndian>(0)?;
    out.write_u32::<LittleEndian>(header_size)?;

    out.write_u32::<LittleEndian>(40)?;
    out.write_i32::<LittleEndian>(width as i32)?;
    out.write_i32::<LittleEndian>(-(height as i32))?;
    out.write_u16::<LittleEndian>(1)?;
    out.write_u16::<LittleEndian>(24)?;
    out.write_u32::<LittleEndian>(0)?;
    out.write_u32::<LittleEndian>(pixel_data_size)?;
    out.write_u32::<LittleEndian>(0)?;
    out.write_u32::<LittleEndian>(0)?;
    out.write_u32::<LittleEndian>(0)?;
    out.write_u32::<LittleEndian>(0)?;

    let pad = [0u8; 3];
    for row in rgb.chunks_exact(row_bytes) {
        for px in row.chunks_exact(3) {
            out.push(px[2]);
            out.push(px[1]);
            out.push(px[0]);
        }
        out.extend_from_slice(&pad[..pad_len]);
    }

    Ok(out)
}

/// Emits a PNG from top-down RGB or RGBA bytes: signature, IHDR, a single
/// IDAT (zlib-deflated filter-0 scanlines), IEND.
pub fn write_png_rgb_or_rgba(
    width: u32,
    height: u32,
    data: &[u8],
    color: ColorSpace,
) -> Result<Vec<u8>> {
    let bpp = color.bytes_per_pixel();
    if data.len() != width as usize * height as usize * bpp {
        return Err(Error::InvalidInput(format!(
            "expected {} bytes but got {}",
            width as usize * height as usize * bpp,
            data.len()
        )));
    }

    let mut out = Vec::new();
    out.extend_from_slice(&[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]);

    let mut ihdr = Vec::with_capacity(13);
    ihdr.write_u32::<byteorder::BigEndian>(width)?;
    ihdr.write_u32::<byteorder::BigEndian>(height)?;
    ihdr.push(8); // bit depth
    ihdr.push(color as u8);
    ihdr.push(0); // compression
    ihdr.push(0); // filter
    ihdr.push(0); // interlace
    write_chunk(&mut out, b"IHDR", &ihdr);

    let stride = width as usize * bpp;
    let mut raw = Vec::with_capacity(height as usize * (1 + stride));
    for row in data.chunks_exact(stride) {
        raw.push(0); // filter type 0: None
        raw.extend_from_slice(row);
    }

    let mut encoder =
        flate2::write::ZlibEncoder::new(Vec::new(), flate2::Compression::default());
    encoder.write_all(&raw)?;
    let compressed = encoder.finish()?;
    write_chunk(&mut out, b"IDAT", &compressed);

    write_chunk(&mut out, b"IEND", &[]);

    Ok(out)
}

fn write_chunk(out: &mut Vec<u8>, chunk_type: &[u8; 4], data: &[u8]) {
    out.extend_from_slice(&(data.len() as u32).to_be_bytes());
    out.extend_from_slice(chunk_type);
    out.extend_from_slice(data);
    out.extend_from_slice(&crc32(chunk_type, data).to_be_bytes());
}

fn crc32(chunk_type: &[u8], data: &[u8]) -> u32 {
    let mut crc = 0xFFFF_FFFFu32;
    for &byte in chunk_type.iter().chain(data.iter()) {
        crc ^= byte as u32;
        for _ in 0..8 {
            crc = if crc & 1 != 0 {
                (crc >> 1) ^ 0xEDB8_8320
            } else {
                crc >> 1
            };
        }
    }
    crc ^ 0xFFFF_FFFF
}
