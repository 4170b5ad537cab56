//! PNG screenshots of the grid and the LED panel.
//!
//! Image data is deflated with `miniz_oxide` and wrapped in the standard
//! PNG chunk layout (IHDR, IDAT, IEND).

use std::path::Path;

use crate::error::{Result, SiLifeError};
use crate::grid::Grid;
use crate::max7219::Max7219Chain;

/// Encode an RGBA pixel buffer as an RGB PNG file.
///
/// `width` and `height` are in pixels. `rgba` contains `width * height * 4` bytes
/// in row-major RGBA order.
pub fn encode_png(width: u32, height: u32, rgba: &[u8]) -> Vec<u8> {
    let w = width as usize;
    // filter byte + RGB per row
    let mut raw = Vec::with_capacity((w * 3 + 1) * height as usize);
    for row in rgba.chunks_exact(w * 4).take(height as usize) {
        raw.push(0); // filter: None
        for px in row.chunks_exact(4) {
            raw.extend_from_slice(&px[..3]);
        }
    }
    finish(width, height, 2, &raw)
}

/// Encode a monochrome image as an 8-bit grayscale PNG.
///
/// `pixels` is a flat row-major array (true = white, false = black).
pub fn encode_png_mono(width: u32, height: u32, pixels: &[bool]) -> Vec<u8> {
    let w = width as usize;
    let mut raw = Vec::with_capacity((w + 1) * height as usize);
    for row in pixels.chunks_exact(w).take(height as usize) {
        raw.push(0);
        raw.extend(row.iter().map(|&on| if on { 255 } else { 0 }));
    }
    finish(width, height, 0, &raw)
}

/// Grid as a grayscale image, each cell drawn as `scale` × `scale` pixels.
pub fn grid_png(grid: &Grid, scale: usize) -> Vec<u8> {
    let scale = scale.max(1);
    let (w, h) = (grid.width() * scale, grid.height() * scale);
    let pixels: Vec<bool> = (0..h)
        .flat_map(|y| (0..w).map(move |x| (y / scale, x / scale)))
        .map(|(r, c)| grid.get(r, c))
        .collect();
    encode_png_mono(w as u32, h as u32, &pixels)
}

/// LED panel framebuffer as an RGB image.
pub fn panel_png(panel: &mut Max7219Chain) -> Vec<u8> {
    panel.render_to_framebuffer();
    encode_png(panel.width() as u32, panel.height() as u32, &panel.framebuffer)
}

pub fn write_png(path: &Path, png: &[u8]) -> Result<()> {
    std::fs::write(path, png).map_err(|e| SiLifeError::io(path, e))
}

fn finish(width: u32, height: u32, color_type: u8, raw: &[u8]) -> Vec<u8> {
    let idat = miniz_oxide::deflate::compress_to_vec_zlib(raw, 6);
    let mut png = Vec::with_capacity(idat.len() + 64);

    // PNG signature
    png.extend_from_slice(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]);

    let mut ihdr = Vec::with_capacity(13);
    ihdr.extend_from_slice(&width.to_be_bytes());
    ihdr.extend_from_slice(&height.to_be_bytes());
    ihdr.push(8); // bit depth
    ihdr.push(color_type);
    ihdr.extend_from_slice(&[0, 0, 0]); // compression, filter, interlace
    write_chunk(&mut png, b"IHDR", &ihdr);
    write_chunk(&mut png, b"IDAT", &idat);
    write_chunk(&mut png, b"IEND", &[]);
    png
}

fn write_chunk(out: &mut Vec<u8>, chunk_type: &[u8; 4], data: &[u8]) {
    out.extend_from_slice(&(data.len() as u32).to_be_bytes());
    out.extend_from_slice(chunk_type);
    out.extend_from_slice(data);
    // CRC over type + data
    let crc = crc32(&chunk_type[..], data);
    out.extend_from_slice(&crc.to_be_bytes());
}

// CRC-32 (PNG/zlib)
fn crc32(chunk_type: &[u8], data: &[u8]) -> u32 {
    let mut crc: u32 = 0xFFFFFFFF;
    for &b in chunk_type.iter().chain(data.iter()) {
        crc ^= b as u32;
        for _ in 0..8 {
            crc = if crc & 1 != 0 { (crc >> 1) ^ 0xEDB88320 } else { crc >> 1 };
        }
    }
    crc ^ 0xFFFFFFFF
}
