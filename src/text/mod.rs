//! # Text Layout
//!
//! Measured greedy line breaking and glyph rasterization for the card's
//! text frame.
//!
//! Blocks render top to bottom: a bold title packs as many body words as fit
//! onto its own line, the rest of the body wraps in the regular face, and
//! the comment wraps in italic. Wrapping is driven purely by measured pixel
//! width — callers never provide line breaks — and a word is never split:
//! one wider than the frame renders as a single overflowing line. Content
//! taller than the frame overflows past its bottom edge; nothing clips.

use image::{Rgba, RgbaImage};
use log::warn;
use rusttype::{point, Font, Scale};
use std::sync::Arc;

use crate::font::FontLibrary;
use crate::model::{Color, TextParams};

/// Fixed gap added under every line.
const LINE_GAP: f32 = 4.0;

/// Inset of the text cursor from the padded frame interior.
const TEXT_INSET: i32 = 5;

/// The three faces of a text frame, with their configured pixel sizes.
pub struct FontSet {
    pub regular: Arc<Font<'static>>,
    pub bold: Arc<Font<'static>>,
    pub italic: Arc<Font<'static>>,
    pub size_regular: f32,
    pub size_bold: f32,
    pub size_italic: f32,
}

impl FontSet {
    /// Resolve the three roles against the library. Each role falls back to
    /// the library default independently; when a role has no face at all the
    /// whole set is unavailable and the caller skips text rendering.
    pub fn resolve(params: &TextParams, library: &FontLibrary) -> Option<Self> {
        let regular = library.resolve(&params.font_regular)?;
        let bold = library.resolve(&params.font_bold)?;
        let italic = library.resolve(&params.font_italic)?;
        Some(Self {
            regular,
            bold,
            italic,
            size_regular: params.size_regular as f32,
            size_bold: params.size_bold as f32,
            size_italic: params.size_italic as f32,
        })
    }

    /// The constant line height for a rendering pass: the tallest
    /// ascent-to-descent extent among the three faces, plus the fixed gap.
    pub fn line_height(&self) -> f32 {
        let extents = [
            glyph_extent(&self.regular, self.size_regular),
            glyph_extent(&self.bold, self.size_bold),
            glyph_extent(&self.italic, self.size_italic),
        ];
        extents.into_iter().fold(0.0_f32, f32::max) + LINE_GAP
    }
}

/// Vertical extent of "Hg" — a capital ascender plus a descender — at the
/// given size, from tight pixel bounds.
fn glyph_extent(font: &Font<'_>, px: f32) -> f32 {
    let scale = Scale::uniform(px);
    let v = font.v_metrics(scale);
    let mut min_y = f32::MAX;
    let mut max_y = f32::MIN;
    for glyph in font.layout("Hg", scale, point(0.0, v.ascent)) {
        if let Some(bb) = glyph.pixel_bounding_box() {
            min_y = min_y.min(bb.min.y as f32);
            max_y = max_y.max(bb.max.y as f32);
        }
    }
    if min_y > max_y {
        px
    } else {
        max_y - min_y
    }
}

/// Rendered pixel width of a string.
pub fn measure_width(font: &Font<'_>, px: f32, text: &str) -> f32 {
    if text.is_empty() {
        return 0.0;
    }
    let scale = Scale::uniform(px);
    let v = font.v_metrics(scale);
    let mut width: f32 = 0.0;
    for glyph in font.layout(text, scale, point(0.0, v.ascent)) {
        if let Some(bb) = glyph.pixel_bounding_box() {
            width = width.max(bb.max.x as f32);
        }
    }
    width
}

/// Rasterize a string with its top edge at `y`, blending glyph coverage onto
/// the canvas.
pub fn draw_text(img: &mut RgbaImage, font: &Font<'_>, px: f32, x: i32, y: i32, color: Color, text: &str) {
    let scale = Scale::uniform(px);
    let v = font.v_metrics(scale);
    let baseline = y as f32 + v.ascent;
    let color = Rgba([color.r, color.g, color.b, 255]);

    for glyph in font.layout(text, scale, point(x as f32, baseline)) {
        let Some(bb) = glyph.pixel_bounding_box() else {
            continue;
        };
        glyph.draw(|gx, gy, coverage| {
            let px = gx as i32 + bb.min.x;
            let py = gy as i32 + bb.min.y;
            if px < 0 || py < 0 {
                return;
            }
            let (px, py) = (px as u32, py as u32);
            if px >= img.width() || py >= img.height() {
                return;
            }
            let a = (coverage * 255.0) as u8;
            if a == 0 {
                return;
            }
            let dst = img.get_pixel_mut(px, py);
            let sa = a as f32 / 255.0;
            let inv = 1.0 - sa;
            dst.0[0] = (color.0[0] as f32 * sa + dst.0[0] as f32 * inv) as u8;
            dst.0[1] = (color.0[1] as f32 * sa + dst.0[1] as f32 * inv) as u8;
            dst.0[2] = (color.0[2] as f32 * sa + dst.0[2] as f32 * inv) as u8;
            dst.0[3] = 255;
        });
    }
}

/// Greedy word wrap against a width-measuring function. Words are never
/// split; a word wider than `max_width` occupies exactly one line of its
/// own.
pub(crate) fn wrap_words<F: Fn(&str) -> f32>(text: &str, max_width: f32, measure: F) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    for word in text.split_whitespace() {
        let candidate = if current.is_empty() {
            word.to_string()
        } else {
            format!("{current} {word}")
        };
        if current.is_empty() || measure(&candidate) <= max_width {
            current = candidate;
        } else {
            lines.push(current);
            current = word.to_string();
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

/// How many leading words fit within `budget` when joined by single spaces.
pub(crate) fn pack_first_line<F: Fn(&str) -> f32>(words: &[&str], budget: f32, measure: F) -> usize {
    let mut line = String::new();
    let mut taken = 0;
    for word in words {
        let candidate = if line.is_empty() {
            (*word).to_string()
        } else {
            format!("{line} {word}")
        };
        if measure(&candidate) <= budget {
            line = candidate;
            taken += 1;
        } else {
            break;
        }
    }
    taken
}

/// Render every text block inside the frame interior. Returns the final
/// cursor position, which callers may compare against the frame bottom —
/// overflowing content has already been drawn past it by then.
pub fn render_blocks(img: &mut RgbaImage, params: &TextParams, fonts: &FontSet) -> i32 {
    let pad = params.padding as i32;
    let x_start = params.frame_position.0 + pad + TEXT_INSET;
    let mut y = params.frame_position.1 + pad + TEXT_INSET;

    let interior_w = params.frame_dimensions.0.saturating_sub(params.padding * 2);
    let max_width = interior_w as f32 - 2.0 * TEXT_INSET as f32;
    if max_width <= 0.0 {
        warn!("text frame interior has no width, skipping text blocks");
        return y;
    }

    let line_height = fonts.line_height().ceil() as i32;
    let section_spacing = (line_height as f32 * 1.5) as i32;
    let color = params.text_color;

    for block in &params.blocks {
        if !block.title.is_empty() {
            let title_width = measure_width(&fonts.bold, fonts.size_bold, &block.title);
            let words: Vec<&str> = block.body.split_whitespace().collect();
            let taken = pack_first_line(&words, max_width - title_width, |s| {
                measure_width(&fonts.regular, fonts.size_regular, s)
            });

            draw_text(img, &fonts.bold, fonts.size_bold, x_start, y, color, &block.title);
            if taken > 0 {
                let first_line = words[..taken].join(" ");
                draw_text(
                    img,
                    &fonts.regular,
                    fonts.size_regular,
                    x_start + title_width.ceil() as i32,
                    y,
                    color,
                    &first_line,
                );
            }
            y += line_height;

            if taken < words.len() {
                let rest = words[taken..].join(" ");
                y = draw_wrapped(img, fonts, Role::Regular, &rest, x_start, y, max_width, line_height, color);
            }
        } else if !block.body.is_empty() {
            y = draw_wrapped(img, fonts, Role::Regular, &block.body, x_start, y, max_width, line_height, color);
        }

        if !block.comment.is_empty() {
            y = draw_wrapped(img, fonts, Role::Italic, &block.comment, x_start, y, max_width, line_height, color);
        }

        y += section_spacing - line_height;
    }

    y
}

enum Role {
    Regular,
    Italic,
}

#[allow(clippy::too_many_arguments)]
fn draw_wrapped(
    img: &mut RgbaImage,
    fonts: &FontSet,
    role: Role,
    text: &str,
    x: i32,
    mut y: i32,
    max_width: f32,
    line_height: i32,
    color: Color,
) -> i32 {
    let (font, px) = match role {
        Role::Regular => (&fonts.regular, fonts.size_regular),
        Role::Italic => (&fonts.italic, fonts.size_italic),
    };
    for line in wrap_words(text, max_width, |s| measure_width(font, px, s)) {
        draw_text(img, font, px, x, y, color, &line);
        y += line_height;
    }
    y
}
