//! # Card Compositor
//!
//! Builds a single card image from a [`CardParams`] snapshot by layering, in
//! fixed order: card background (flat color or background image), card
//! outline, rounded photo frame, outlined title, the user photo, the rounded
//! text frame, and finally the wrapped text blocks.
//!
//! The compositor never aborts a render: a missing background, photo, or
//! font is logged and the corresponding layer is skipped.

pub mod shapes;

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use image::imageops::FilterType;
use image::{DynamicImage, Rgba, RgbaImage, RgbImage};
use log::warn;

use crate::error::CardError;
use crate::font::FontLibrary;
use crate::model::{BackgroundParams, CardParams, PhotoParams, TitleParams};
use crate::text::{self, FontSet};
use shapes::{alpha_from_opacity, draw_rounded_rect, overlay_alpha};

/// JPEG quality used for every card export.
const JPEG_QUALITY: u8 = 95;

/// Render one card. Takes an immutable parameter snapshot and returns a new
/// RGB image of `params.frame_dimensions`.
pub fn render_card(params: &CardParams, fonts: &FontLibrary) -> RgbImage {
    let (card_w, card_h) = params.frame_dimensions;
    let bg = params.card_bg_color;
    let mut canvas = RgbaImage::from_pixel(card_w, card_h, Rgba([bg.r, bg.g, bg.b, 255]));

    let mut background_painted = false;
    if params.background.display {
        background_painted = paint_background(&mut canvas, &params.background);
    }
    if background_painted {
        // Outline only, so the background keeps showing through to the edges.
        draw_rounded_rect(
            &mut canvas,
            (0, 0),
            (card_w, card_h),
            None,
            0,
            params.card_outline_color,
            params.card_outline_width,
            0,
        );
    } else {
        draw_rounded_rect(
            &mut canvas,
            (0, 0),
            (card_w, card_h),
            Some(params.card_bg_color),
            0,
            params.card_outline_color,
            params.card_outline_width,
            100,
        );
    }

    draw_rounded_rect(
        &mut canvas,
        params.photo.frame_position,
        params.photo.frame_dimensions,
        Some(params.photo.frame_bg_color),
        params.photo.corner_radius,
        params.photo.outline_color,
        params.photo.outline_width,
        params.photo.opacity,
    );

    if !params.title.text.is_empty() {
        draw_title(&mut canvas, &params.title, fonts);
    }

    paste_photo(&mut canvas, &params.photo);

    draw_rounded_rect(
        &mut canvas,
        params.text.frame_position,
        params.text.frame_dimensions,
        Some(params.text.frame_bg_color),
        params.text.corner_radius,
        params.text.outline_color,
        params.text.outline_width,
        params.text.opacity,
    );

    match FontSet::resolve(&params.text, fonts) {
        Some(set) => {
            text::render_blocks(&mut canvas, &params.text, &set);
        }
        None => {
            if !params.text.blocks.is_empty() {
                warn!("no usable text fonts, skipping text blocks");
            }
        }
    }

    DynamicImage::ImageRgba8(canvas).to_rgb8()
}

/// Composite the background image under everything. Returns false when the
/// image is missing or unreadable, in which case the flat card background
/// stays in effect.
fn paint_background(canvas: &mut RgbaImage, params: &BackgroundParams) -> bool {
    let Some(path) = params.path.as_deref() else {
        return false;
    };
    let bg = match image::open(path) {
        Ok(img) => img.to_rgba8(),
        Err(e) => {
            warn!("background image {} unreadable, skipping: {e}", path.display());
            return false;
        }
    };

    let (cw, ch) = canvas.dimensions();
    let (mut layer, x, y) = if params.keep_ratio {
        // Letterbox: fit inside the canvas, centered, never upscaled.
        let scale = f64::min(cw as f64 / bg.width() as f64, ch as f64 / bg.height() as f64).min(1.0);
        let nw = ((bg.width() as f64 * scale) as u32).max(1);
        let nh = ((bg.height() as f64 * scale) as u32).max(1);
        let resized = image::imageops::resize(&bg, nw, nh, FilterType::Lanczos3);
        let x = (cw as i32 - nw as i32) / 2;
        let y = (ch as i32 - nh as i32) / 2;
        (resized, x, y)
    } else {
        (image::imageops::resize(&bg, cw, ch, FilterType::Lanczos3), 0, 0)
    };

    if params.opacity < 100 {
        let alpha = alpha_from_opacity(params.opacity) as u16;
        for p in layer.pixels_mut() {
            p.0[3] = ((p.0[3] as u16 * alpha) / 255) as u8;
        }
    }

    overlay_alpha(canvas, &layer, x, y);
    true
}

/// Draw the title, stroked by four offset copies when an outline color is
/// configured. Uses the library's default face at the title size.
fn draw_title(canvas: &mut RgbaImage, title: &TitleParams, fonts: &FontLibrary) {
    let Some(font) = fonts.default_font() else {
        warn!("no default font available, skipping title");
        return;
    };
    let size = title.font_size as f32;
    let (x, y) = title.position;
    if let Some(outline) = title.outline_color {
        for (dx, dy) in [(-1, -1), (1, -1), (-1, 1), (1, 1)] {
            text::draw_text(canvas, &font, size, x + dx, y + dy, outline, &title.text);
        }
    }
    text::draw_text(canvas, &font, size, x, y, title.color, &title.text);
}

/// Scale the photo to fit inside the frame's interior (frame minus outline),
/// center it, and paste it alpha-aware. A missing or unreadable photo is
/// skipped silently apart from a log line.
fn paste_photo(canvas: &mut RgbaImage, params: &PhotoParams) {
    let Some(path) = params.photo_path.as_deref() else {
        return;
    };
    let photo = match image::open(path) {
        Ok(img) => img.to_rgba8(),
        Err(e) => {
            warn!("photo {} unreadable, skipping: {e}", path.display());
            return;
        }
    };

    let inset = params.outline_width;
    let frame_w = params.frame_dimensions.0.saturating_sub(inset * 2);
    let frame_h = params.frame_dimensions.1.saturating_sub(inset * 2);
    if frame_w == 0 || frame_h == 0 || photo.width() == 0 || photo.height() == 0 {
        return;
    }
    let frame_x = params.frame_position.0 + inset as i32;
    let frame_y = params.frame_position.1 + inset as i32;

    let scale = f64::min(
        frame_w as f64 / photo.width() as f64,
        frame_h as f64 / photo.height() as f64,
    );
    let new_w = ((photo.width() as f64 * scale) as u32).max(1);
    let new_h = ((photo.height() as f64 * scale) as u32).max(1);
    let resized = image::imageops::resize(&photo, new_w, new_h, FilterType::Lanczos3);

    let paste_x = frame_x + (frame_w as i32 - new_w as i32) / 2;
    let paste_y = frame_y + (frame_h as i32 - new_h as i32) / 2;
    overlay_alpha(canvas, &resized, paste_x, paste_y);
}

/// Encode a rendered card as a 3-channel JPEG at quality 95.
pub fn export_jpeg(img: &RgbImage, path: &Path) -> Result<(), CardError> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    let mut encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut writer, JPEG_QUALITY);
    encoder
        .encode(img.as_raw(), img.width(), img.height(), image::ColorType::Rgb8)
        .map_err(|e| CardError::Image(format!("JPEG encode failed: {e}")))?;
    Ok(())
}
