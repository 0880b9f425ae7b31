//! Rounded-rectangle raster primitives and alpha blending.
//!
//! Everything here works on opaque RGBA canvases: sources may carry alpha,
//! but the destination stays fully opaque after every blend.

use image::{Rgba, RgbaImage};

use crate::model::Color;

/// Map a 0–100 opacity to an 8-bit alpha, rounding to nearest.
pub fn alpha_from_opacity(opacity: u8) -> u8 {
    let opacity = opacity.min(100) as u32;
    ((opacity * 255 + 50) / 100) as u8
}

/// Source-over blend of one pixel. The destination is kept opaque.
pub fn blend_pixel(dst: &mut Rgba<u8>, src: Rgba<u8>) {
    let a = src.0[3] as f32 / 255.0;
    if a <= 0.0 {
        return;
    }
    let inv = 1.0 - a;
    dst.0[0] = (src.0[0] as f32 * a + dst.0[0] as f32 * inv) as u8;
    dst.0[1] = (src.0[1] as f32 * a + dst.0[1] as f32 * inv) as u8;
    dst.0[2] = (src.0[2] as f32 * a + dst.0[2] as f32 * inv) as u8;
    dst.0[3] = 255;
}

/// Alpha-composite `over` onto `base` with its top-left corner at (x, y).
/// Pixels falling outside the base are dropped.
pub fn overlay_alpha(base: &mut RgbaImage, over: &RgbaImage, x: i32, y: i32) {
    for oy in 0..over.height() {
        for ox in 0..over.width() {
            let bx = x + ox as i32;
            let by = y + oy as i32;
            if bx < 0 || by < 0 {
                continue;
            }
            let (bx, by) = (bx as u32, by as u32);
            if bx >= base.width() || by >= base.height() {
                continue;
            }
            let p = *over.get_pixel(ox, oy);
            blend_pixel(base.get_pixel_mut(bx, by), p);
        }
    }
}

/// Whether the local pixel (x, y) lies inside a w×h rounded rectangle of
/// corner radius r.
fn rounded_contains(x: i32, y: i32, w: i32, h: i32, r: i32) -> bool {
    if x < 0 || y < 0 || x >= w || y >= h {
        return false;
    }
    if r <= 0 {
        return true;
    }
    if x >= r && x < w - r {
        return true;
    }
    if y >= r && y < h - r {
        return true;
    }
    let (cx, cy) = if x < r {
        if y < r {
            (r - 1, r - 1)
        } else {
            (r - 1, h - r)
        }
    } else if y < r {
        (w - r, r - 1)
    } else {
        (w - r, h - r)
    };
    let dx = x - cx;
    let dy = y - cy;
    dx * dx + dy * dy <= r * r
}

/// Draw a rounded rectangle onto the canvas.
///
/// The fill, when present, is blended at `alpha_from_opacity(opacity)`;
/// `opacity == 0` makes it fully transparent. The outline, when
/// `outline_width > 0`, is always drawn at full strength on top of the fill,
/// as a band of `outline_width` pixels inset from the shape's edge. Fill and
/// outline share the same corner radius, so a fill-only call and a
/// filled+outlined call produce identical interiors.
#[allow(clippy::too_many_arguments)]
pub fn draw_rounded_rect(
    img: &mut RgbaImage,
    position: (i32, i32),
    dimensions: (u32, u32),
    fill: Option<Color>,
    radius: u32,
    outline_color: Color,
    outline_width: u32,
    opacity: u8,
) {
    let (x0, y0) = position;
    let (w, h) = (dimensions.0 as i32, dimensions.1 as i32);
    if w <= 0 || h <= 0 {
        return;
    }
    let r = (radius as i32).min(w / 2).min(h / 2);
    let bw = outline_width as i32;

    let fill_px = fill.map(|c| Rgba([c.r, c.g, c.b, alpha_from_opacity(opacity)]));
    let outline_px = Rgba([outline_color.r, outline_color.g, outline_color.b, 255]);

    // Inner shape bounds delimiting the outline band.
    let inner_r = (r - bw).max(0);

    for ly in 0..h {
        for lx in 0..w {
            if !rounded_contains(lx, ly, w, h, r) {
                continue;
            }
            let px = x0 + lx;
            let py = y0 + ly;
            if px < 0 || py < 0 {
                continue;
            }
            let (px, py) = (px as u32, py as u32);
            if px >= img.width() || py >= img.height() {
                continue;
            }
            if let Some(fill_px) = fill_px {
                blend_pixel(img.get_pixel_mut(px, py), fill_px);
            }
            if bw > 0 && !rounded_contains(lx - bw, ly - bw, w - 2 * bw, h - 2 * bw, inner_r) {
                blend_pixel(img.get_pixel_mut(px, py), outline_px);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn canvas(w: u32, h: u32, color: Color) -> RgbaImage {
        RgbaImage::from_pixel(w, h, Rgba([color.r, color.g, color.b, 255]))
    }

    #[test]
    fn test_alpha_mapping_matches_rounded_scale() {
        for opacity in 0..=100u8 {
            let expected = ((opacity as f64 * 255.0 / 100.0).round()) as u8;
            assert_eq!(alpha_from_opacity(opacity), expected, "opacity {opacity}");
        }
        assert_eq!(alpha_from_opacity(0), 0);
        assert_eq!(alpha_from_opacity(100), 255);
        assert_eq!(alpha_from_opacity(200), 255, "out-of-range opacity clamps");
    }

    #[test]
    fn test_zero_opacity_leaves_interior_but_draws_outline() {
        let bg = Color::rgb(10, 20, 30);
        let mut img = canvas(100, 100, bg);
        draw_rounded_rect(
            &mut img,
            (10, 10),
            (80, 80),
            Some(Color::WHITE),
            0,
            Color::rgb(200, 0, 0),
            4,
            0,
        );
        // Interior untouched by the fully transparent fill.
        assert_eq!(img.get_pixel(50, 50).0, [10, 20, 30, 255]);
        // Outline band fully opaque.
        assert_eq!(img.get_pixel(10, 50).0, [200, 0, 0, 255]);
        assert_eq!(img.get_pixel(50, 13).0, [200, 0, 0, 255]);
    }

    #[test]
    fn test_full_opacity_fill_replaces_interior() {
        let mut img = canvas(60, 60, Color::BLACK);
        draw_rounded_rect(
            &mut img,
            (0, 0),
            (60, 60),
            Some(Color::rgb(1, 2, 3)),
            0,
            Color::BLACK,
            0,
            100,
        );
        assert_eq!(img.get_pixel(30, 30).0, [1, 2, 3, 255]);
    }

    #[test]
    fn test_partial_opacity_blends_over_background() {
        let mut img = canvas(40, 40, Color::BLACK);
        draw_rounded_rect(
            &mut img,
            (0, 0),
            (40, 40),
            Some(Color::WHITE),
            0,
            Color::BLACK,
            0,
            50,
        );
        // 50% white over black: alpha 128/255 of 255.
        let got = img.get_pixel(20, 20).0;
        let expected = (255.0 * (alpha_from_opacity(50) as f32 / 255.0)) as u8;
        assert_eq!(got[0], expected);
        assert_eq!(got[0], got[1]);
        assert_eq!(got[1], got[2]);
    }

    #[test]
    fn test_outline_changes_only_border_band() {
        let bg = Color::rgb(5, 5, 5);
        let fill = Color::rgb(100, 150, 200);
        let mut plain = canvas(120, 90, bg);
        let mut outlined = canvas(120, 90, bg);
        draw_rounded_rect(&mut plain, (10, 10), (100, 70), Some(fill), 12, Color::BLACK, 0, 70);
        draw_rounded_rect(&mut outlined, (10, 10), (100, 70), Some(fill), 12, Color::WHITE, 6, 70);

        let mut border_diffs = 0u32;
        for y in 0..90u32 {
            for x in 0..120u32 {
                let a = plain.get_pixel(x, y);
                let b = outlined.get_pixel(x, y);
                if a != b {
                    border_diffs += 1;
                    // Every differing pixel is the opaque outline color.
                    assert_eq!(b.0, [255, 255, 255, 255], "at ({x}, {y})");
                }
            }
        }
        assert!(border_diffs > 0, "outline must paint something");
        // The interior well inside the band is identical.
        assert_eq!(plain.get_pixel(60, 45), outlined.get_pixel(60, 45));
    }

    #[test]
    fn test_rounded_corners_stay_unpainted() {
        let bg = Color::rgb(9, 9, 9);
        let mut img = canvas(100, 100, bg);
        draw_rounded_rect(
            &mut img,
            (0, 0),
            (100, 100),
            Some(Color::WHITE),
            30,
            Color::BLACK,
            0,
            100,
        );
        // The extreme corner lies outside the rounded shape.
        assert_eq!(img.get_pixel(0, 0).0, [9, 9, 9, 255]);
        assert_eq!(img.get_pixel(99, 99).0, [9, 9, 9, 255]);
        // The face centers are filled.
        assert_eq!(img.get_pixel(50, 0).0, [255, 255, 255, 255]);
        assert_eq!(img.get_pixel(0, 50).0, [255, 255, 255, 255]);
    }

    #[test]
    fn test_offscreen_drawing_is_clipped_not_panicking() {
        let mut img = canvas(30, 30, Color::BLACK);
        draw_rounded_rect(
            &mut img,
            (-20, -20),
            (100, 100),
            Some(Color::WHITE),
            0,
            Color::BLACK,
            0,
            100,
        );
        assert_eq!(img.get_pixel(0, 0).0, [255, 255, 255, 255]);
    }

    #[test]
    fn test_overlay_alpha_respects_source_alpha() {
        let mut base = canvas(10, 10, Color::BLACK);
        let over = RgbaImage::from_pixel(4, 4, Rgba([255, 255, 255, 0]));
        overlay_alpha(&mut base, &over, 2, 2);
        assert_eq!(base.get_pixel(3, 3).0, [0, 0, 0, 255]);

        let over = RgbaImage::from_pixel(4, 4, Rgba([255, 255, 255, 255]));
        overlay_alpha(&mut base, &over, 2, 2);
        assert_eq!(base.get_pixel(3, 3).0, [255, 255, 255, 255]);
    }
}
