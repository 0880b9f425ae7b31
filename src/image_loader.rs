//! Preparing exported card images for sheet embedding.
//!
//! The sheet writer consumes images in one of two shapes: JPEG files keep
//! their compressed bytes, since the PDF DCTDecode filter reads them natively
//! and re-encoding a quality-95 export would only lose detail. Anything else
//! (PNG in practice) is decoded into a packed RGB plane, with the alpha plane
//! split off for an SMask when it carries information.

use std::path::Path;

use crate::error::CardError;

/// An exported card, measured and re-packaged for the PDF writer.
#[derive(Debug, Clone)]
pub struct SheetImage {
    pub width: u32,
    pub height: u32,
    pub encoding: Encoding,
}

/// How the pixel data travels into the PDF stream.
#[derive(Debug, Clone)]
pub enum Encoding {
    /// Untouched JPEG bytes for a DCTDecode stream. `grayscale` selects
    /// /DeviceGray over /DeviceRGB.
    Dct { bytes: Vec<u8>, grayscale: bool },
    /// Decoded planes for FlateDecode streams: packed RGB, plus the alpha
    /// plane when any pixel is not fully opaque.
    Raw {
        rgb: Vec<u8>,
        alpha: Option<Vec<u8>>,
    },
}

/// Read one exported card from disk and package it for embedding.
pub fn open_sheet_image(path: &Path) -> Result<SheetImage, CardError> {
    let bytes = std::fs::read(path)
        .map_err(|e| CardError::Image(format!("failed to read image {}: {e}", path.display())))?;
    if bytes.starts_with(&[0xFF, 0xD8]) {
        package_jpeg(path, bytes)
    } else {
        decode_raster(path, &bytes)
    }
}

/// JPEG: measure without decoding; the compressed bytes go into the PDF
/// verbatim.
fn package_jpeg(path: &Path, bytes: Vec<u8>) -> Result<SheetImage, CardError> {
    let (width, height) = image::image_dimensions(path)
        .map_err(|e| CardError::Image(format!("failed to measure {}: {e}", path.display())))?;
    let grayscale = jpeg_is_grayscale(&bytes);
    Ok(SheetImage {
        width,
        height,
        encoding: Encoding::Dct { bytes, grayscale },
    })
}

/// Walk the JPEG marker segments to the start-of-frame header; a single
/// component there means a grayscale scan. Anything unrecognized is treated
/// as RGB.
fn jpeg_is_grayscale(bytes: &[u8]) -> bool {
    let mut at = 2usize; // past SOI
    loop {
        let (Some(&0xFF), Some(&marker)) = (bytes.get(at), bytes.get(at + 1)) else {
            return false;
        };
        if matches!(marker, 0xC0..=0xC3 | 0xC5..=0xC7 | 0xC9..=0xCB | 0xCD..=0xCF) {
            // SOF layout: length(2) precision(1) height(2) width(2) components(1)
            return bytes.get(at + 9) == Some(&1);
        }
        match (bytes.get(at + 2), bytes.get(at + 3)) {
            (Some(&hi), Some(&lo)) => at += 2 + u16::from_be_bytes([hi, lo]) as usize,
            _ => return false,
        }
    }
}

/// Decode a non-JPEG raster fully and split RGB from alpha. A plane of
/// nothing but 255s is dropped so opaque PNGs skip the SMask entirely.
fn decode_raster(path: &Path, bytes: &[u8]) -> Result<SheetImage, CardError> {
    let decoded = image::load_from_memory(bytes)
        .map_err(|e| CardError::Image(format!("failed to decode {}: {e}", path.display())))?
        .to_rgba8();
    let (width, height) = decoded.dimensions();

    let pixels = (width as usize) * (height as usize);
    let mut rgb = Vec::with_capacity(pixels * 3);
    let mut alpha = Vec::with_capacity(pixels);
    for px in decoded.as_raw().chunks_exact(4) {
        rgb.extend_from_slice(&px[..3]);
        alpha.push(px[3]);
    }
    let alpha = alpha.iter().any(|&a| a != 255).then_some(alpha);

    Ok(SheetImage {
        width,
        height,
        encoding: Encoding::Raw { rgb, alpha },
    })
}
