//! PNG encoding of canvas pixels.
//!
//! Rendered maps tend to be dominated by a colortable's few hundred entries,
//! so an indexed (colour type 3) image is tried first and the encoder falls
//! back to full RGBA (colour type 6) past 256 distinct colours.

use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::Path;

use tracing::info;
use wx_common::{WxError, WxResult};

use crate::canvas::Canvas;

const SIGNATURE: [u8; 8] = [137, 80, 78, 71, 13, 10, 26, 10];
const MAX_PALETTE_SIZE: usize = 256;

const COLOR_TYPE_INDEXED: u8 = 3;
const COLOR_TYPE_RGBA: u8 = 6;

/// Encode RGBA bytes, picking indexed or truecolor automatically.
pub fn encode_png(pixels: &[u8], width: u32, height: u32) -> WxResult<Vec<u8>> {
    check_len(pixels, width, height)?;
    match build_palette(pixels) {
        Some((palette, indices)) => encode_indexed(&palette, &indices, width, height),
        None => encode_rgba(pixels, width, height),
    }
}

pub fn encode_rgba(pixels: &[u8], width: u32, height: u32) -> WxResult<Vec<u8>> {
    check_len(pixels, width, height)?;
    let mut png = header(width, height, COLOR_TYPE_RGBA);
    let idat = deflate_scanlines(pixels, width as usize * 4)?;
    write_chunk(&mut png, b"IDAT", &idat);
    write_chunk(&mut png, b"IEND", &[]);
    Ok(png)
}

pub fn encode_indexed(palette: &[[u8; 4]], indices: &[u8], width: u32, height: u32) -> WxResult<Vec<u8>> {
    if palette.is_empty() || palette.len() > MAX_PALETTE_SIZE {
        return Err(WxError::Render(format!("Invalid palette size {}", palette.len())));
    }
    if indices.len() != width as usize * height as usize {
        return Err(WxError::Render(format!(
            "{} palette indices for a {}x{} image",
            indices.len(),
            width,
            height
        )));
    }

    let mut png = header(width, height, COLOR_TYPE_INDEXED);
    let plte: Vec<u8> = palette.iter().flat_map(|c| [c[0], c[1], c[2]]).collect();
    write_chunk(&mut png, b"PLTE", &plte);
    if palette.iter().any(|c| c[3] < 255) {
        let trns: Vec<u8> = palette.iter().map(|c| c[3]).collect();
        write_chunk(&mut png, b"tRNS", &trns);
    }
    let idat = deflate_scanlines(indices, width as usize)?;
    write_chunk(&mut png, b"IDAT", &idat);
    write_chunk(&mut png, b"IEND", &[]);
    Ok(png)
}

/// Write the canvas as a PNG file with no border around the image.
pub fn save_png<P: AsRef<Path>>(canvas: &Canvas, path: P) -> WxResult<()> {
    let path = path.as_ref();
    let png = encode_png(canvas.pixels(), canvas.width(), canvas.height())?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .map_err(|e| WxError::Io(format!("Failed to create {:?}: {}", parent, e)))?;
    }
    fs::write(path, &png).map_err(|e| WxError::Io(format!("Failed to write {:?}: {}", path, e)))?;
    info!(path = ?path, bytes = png.len(), "Saved image");
    Ok(())
}

fn check_len(pixels: &[u8], width: u32, height: u32) -> WxResult<()> {
    let expected = width as usize * height as usize * 4;
    if pixels.len() != expected {
        return Err(WxError::Render(format!(
            "{} bytes of pixel data for a {}x{} RGBA image",
            pixels.len(),
            width,
            height
        )));
    }
    Ok(())
}

/// Distinct colours in first-seen order plus one index per pixel, or `None`
/// past 256 colours.
fn build_palette(pixels: &[u8]) -> Option<(Vec<[u8; 4]>, Vec<u8>)> {
    let mut lookup: HashMap<[u8; 4], u8> = HashMap::with_capacity(MAX_PALETTE_SIZE);
    let mut palette = Vec::with_capacity(MAX_PALETTE_SIZE);
    let mut indices = Vec::with_capacity(pixels.len() / 4);

    for px in pixels.chunks_exact(4) {
        let color = [px[0], px[1], px[2], px[3]];
        let index = match lookup.get(&color) {
            Some(&i) => i,
            None => {
                if palette.len() == MAX_PALETTE_SIZE {
                    return None;
                }
                let i = palette.len() as u8;
                palette.push(color);
                lookup.insert(color, i);
                i
            }
        };
        indices.push(index);
    }
    Some((palette, indices))
}

fn header(width: u32, height: u32, color_type: u8) -> Vec<u8> {
    let mut png = SIGNATURE.to_vec();
    let mut ihdr = Vec::with_capacity(13);
    ihdr.extend_from_slice(&width.to_be_bytes());
    ihdr.extend_from_slice(&height.to_be_bytes());
    // bit depth, colour type, compression, filter, interlace
    ihdr.extend_from_slice(&[8, color_type, 0, 0, 0]);
    write_chunk(&mut png, b"IHDR", &ihdr);
    png
}

/// Zlib-compress rows of `stride` bytes, each prefixed with filter type 0.
fn deflate_scanlines(data: &[u8], stride: usize) -> WxResult<Vec<u8>> {
    let rows = if stride == 0 { 0 } else { data.len() / stride };
    let mut raw = Vec::with_capacity(rows * (stride + 1));
    for row in data.chunks_exact(stride.max(1)).take(rows) {
        raw.push(0);
        raw.extend_from_slice(row);
    }
    let mut encoder = flate2::write::ZlibEncoder::new(Vec::new(), flate2::Compression::default());
    let compress_err = |e: std::io::Error| WxError::Render(format!("IDAT compression failed: {}", e));
    encoder.write_all(&raw).map_err(compress_err)?;
    encoder.finish().map_err(compress_err)
}

fn write_chunk(png: &mut Vec<u8>, kind: &[u8; 4], data: &[u8]) {
    png.extend_from_slice(&(data.len() as u32).to_be_bytes());
    let start = png.len();
    png.extend_from_slice(kind);
    png.extend_from_slice(data);
    let crc = crc32fast::hash(&png[start..]);
    png.extend_from_slice(&crc.to_be_bytes());
}
