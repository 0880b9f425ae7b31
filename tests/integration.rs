//! Integration tests for the carterie pipeline.
//!
//! These tests exercise the full path from parameters to pixels and from an
//! image directory to PDF bytes. They verify:
//! - the compositor layers in the documented order
//! - opacity blending and outline behavior on real renders
//! - JPEG export round-trips through a decoder
//! - the sheet packer fills pages at the predicted capacity
//! - sheet preconditions fail loudly without writing anything
//! - the configuration blob round-trips

use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};

use carterie::compose::shapes::alpha_from_opacity;
use carterie::model::{CardParams, Color, PageSize, SheetSpec, TextBlock};
use carterie::{config, export_jpeg, CardError, FontLibrary};

// ─── Helpers ────────────────────────────────────────────────────

fn scratch_dir(tag: &str) -> PathBuf {
    static COUNTER: AtomicU64 = AtomicU64::new(0);
    let id = COUNTER.fetch_add(1, Ordering::Relaxed);
    let dir = std::env::temp_dir().join(format!("carterie_it_{tag}_{}_{id}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

/// A card whose frames sit outside the canvas, so canvas pixels can be
/// probed layer by layer.
fn bare_card(w: u32, h: u32) -> CardParams {
    let mut params = CardParams::default();
    params.frame_dimensions = (w, h);
    params.card_outline_width = 0;
    params.title.text = String::new();
    params.photo.frame_position = (w as i32 + 10, h as i32 + 10);
    params.text.frame_position = (w as i32 + 10, h as i32 + 10);
    params.text.blocks = Vec::new();
    params
}

fn no_fonts() -> FontLibrary {
    FontLibrary::new(None)
}

fn assert_valid_pdf(bytes: &[u8]) {
    assert!(bytes.len() > 50, "PDF too small to be valid");
    assert!(bytes.starts_with(b"%PDF-1.7"), "Missing PDF header");
    assert!(
        bytes.windows(5).any(|w| w == b"%%EOF"),
        "Missing %%EOF marker"
    );
}

fn count_pages(bytes: &[u8]) -> usize {
    let needle = b"/Type /Page /Parent";
    bytes.windows(needle.len()).filter(|w| w == needle).count()
}

/// Seven 400×300 JPEGs named in shuffled creation order; the packer must
/// sort them by file name.
fn seven_cards_dir() -> PathBuf {
    let dir = scratch_dir("cards");
    for name in ["card_3", "card_1", "card_7", "card_2", "card_6", "card_4", "card_5"] {
        let img = image::RgbImage::from_pixel(400, 300, image::Rgb([90, 120, 150]));
        img.save(dir.join(format!("{name}.jpg"))).unwrap();
    }
    dir
}

/// A 210×140 mm page takes 3×2 photos at 63 mm width, 10 mm margin, 4:3.
fn six_per_page_spec(image_dir: PathBuf) -> SheetSpec {
    SheetSpec {
        image_dir,
        page_size: PageSize::Custom {
            width: 210.0 * carterie::sheet::MM_TO_PT,
            height: 140.0 * carterie::sheet::MM_TO_PT,
        },
        margin_mm: 10.0,
        photo_width_mm: 63.0,
    }
}

// ─── Compositor ─────────────────────────────────────────────────

#[test]
fn test_render_matches_canvas_dimensions() {
    let params = bare_card(1260, 1760);
    let img = carterie::render(&params, &no_fonts());
    assert_eq!(img.dimensions(), (1260, 1760));
}

#[test]
fn test_card_background_and_outline() {
    let mut params = bare_card(200, 300);
    params.card_bg_color = Color::rgb(10, 120, 10);
    params.card_outline_color = Color::BLACK;
    params.card_outline_width = 10;
    let img = carterie::render(&params, &no_fonts());
    assert_eq!(img.get_pixel(100, 150).0, [10, 120, 10]);
    assert_eq!(img.get_pixel(2, 150).0, [0, 0, 0]);
    assert_eq!(img.get_pixel(100, 297).0, [0, 0, 0]);
}

#[test]
fn test_frame_opacity_blends_over_card_background() {
    let mut params = bare_card(300, 300);
    params.card_bg_color = Color::BLACK;
    params.photo.frame_position = (50, 50);
    params.photo.frame_dimensions = (200, 200);
    params.photo.frame_bg_color = Color::rgb(200, 100, 50);
    params.photo.opacity = 50;
    params.photo.corner_radius = 0;
    params.photo.outline_width = 0;
    let img = carterie::render(&params, &no_fonts());

    let a = alpha_from_opacity(50) as f32 / 255.0;
    let expected = [
        (200.0 * a) as u8,
        (100.0 * a) as u8,
        (50.0 * a) as u8,
    ];
    assert_eq!(img.get_pixel(150, 150).0, expected);
}

#[test]
fn test_zero_opacity_frame_keeps_outline_only() {
    let mut params = bare_card(300, 300);
    params.card_bg_color = Color::rgb(20, 30, 40);
    params.photo.frame_position = (50, 50);
    params.photo.frame_dimensions = (200, 200);
    params.photo.frame_bg_color = Color::WHITE;
    params.photo.opacity = 0;
    params.photo.corner_radius = 0;
    params.photo.outline_color = Color::rgb(250, 0, 0);
    params.photo.outline_width = 6;
    let img = carterie::render(&params, &no_fonts());

    // Interior unchanged, border band fully opaque.
    assert_eq!(img.get_pixel(150, 150).0, [20, 30, 40]);
    assert_eq!(img.get_pixel(52, 150).0, [250, 0, 0]);
}

#[test]
fn test_background_image_shows_through_with_outline_on_top() {
    let dir = scratch_dir("bg");
    let bg_path = dir.join("bg.png");
    image::RgbImage::from_pixel(50, 50, image::Rgb([0, 0, 200]))
        .save(&bg_path)
        .unwrap();

    let mut params = bare_card(200, 200);
    params.card_bg_color = Color::rgb(10, 120, 10);
    params.card_outline_color = Color::BLACK;
    params.card_outline_width = 8;
    params.background.path = Some(bg_path);
    params.background.display = true;
    let img = carterie::render(&params, &no_fonts());

    // Stretched background at the center, outline at the edge.
    assert_eq!(img.get_pixel(100, 100).0, [0, 0, 200]);
    assert_eq!(img.get_pixel(2, 100).0, [0, 0, 0]);
}

#[test]
fn test_background_letterbox_keeps_ratio_and_centers() {
    let dir = scratch_dir("bg_ratio");
    let bg_path = dir.join("wide.png");
    image::RgbImage::from_pixel(100, 50, image::Rgb([0, 0, 200]))
        .save(&bg_path)
        .unwrap();

    let mut params = bare_card(200, 200);
    params.card_bg_color = Color::rgb(10, 120, 10);
    params.background.path = Some(bg_path);
    params.background.display = true;
    params.background.keep_ratio = true;
    let img = carterie::render(&params, &no_fonts());

    // Never upscaled: the 100×50 image sits centered at (50, 75).
    assert_eq!(img.get_pixel(100, 100).0, [0, 0, 200]);
    assert_eq!(img.get_pixel(100, 10).0, [10, 120, 10]);
    assert_eq!(img.get_pixel(10, 100).0, [10, 120, 10]);
}

#[test]
fn test_missing_background_falls_back_to_flat_card() {
    let mut params = bare_card(100, 100);
    params.card_bg_color = Color::rgb(10, 120, 10);
    params.background.path = Some(PathBuf::from("/nonexistent/bg.png"));
    params.background.display = true;
    let img = carterie::render(&params, &no_fonts());
    assert_eq!(img.get_pixel(50, 50).0, [10, 120, 10]);
}

#[test]
fn test_photo_pastes_scaled_and_centered_inside_frame() {
    let dir = scratch_dir("photo");
    let photo_path = dir.join("photo.png");
    image::RgbImage::from_pixel(40, 20, image::Rgb([210, 40, 40]))
        .save(&photo_path)
        .unwrap();

    let mut params = bare_card(200, 200);
    params.photo.frame_position = (20, 20);
    params.photo.frame_dimensions = (100, 100);
    params.photo.frame_bg_color = Color::WHITE;
    params.photo.opacity = 100;
    params.photo.corner_radius = 0;
    params.photo.outline_width = 10;
    params.photo.photo_path = Some(photo_path);
    let img = carterie::render(&params, &no_fonts());

    // Interior is 80×80 at (30, 30); the 2:1 photo scales ×2 to 80×40 and
    // centers vertically at (30, 50).
    assert_eq!(img.get_pixel(70, 70).0, [210, 40, 40]);
    // The frame fill shows in the interior slack above the photo.
    assert_eq!(img.get_pixel(70, 35).0, [255, 255, 255]);
}

#[test]
fn test_text_blocks_render_when_a_default_font_exists() {
    let fonts = no_fonts();
    if fonts.default_font().is_none() {
        eprintln!("skipping: no system default font available");
        return;
    }

    let mut with_text = CardParams::default();
    with_text.frame_dimensions = (1260, 1760);
    with_text.title.text = "Nom".to_string();
    with_text.text.blocks = vec![TextBlock {
        title: "Nom".to_string(),
        body: "Une carte de test".to_string(),
        comment: "(rare)".to_string(),
    }];

    let mut without_text = with_text.clone();
    without_text.title.text = String::new();
    without_text.text.blocks = Vec::new();

    let a = carterie::render(&with_text, &fonts);
    let b = carterie::render(&without_text, &fonts);
    assert_eq!(a.dimensions(), (1260, 1760));
    assert_ne!(a.as_raw(), b.as_raw(), "text blocks must change pixels");

    // The first text line sits inside the padded frame interior.
    let frame = &with_text.text;
    let x0 = (frame.frame_position.0 + frame.padding as i32) as u32;
    let y0 = (frame.frame_position.1 + frame.padding as i32) as u32;
    let mut darkened = false;
    'scan: for y in y0..y0 + 120 {
        for x in x0..x0 + 400 {
            if a.get_pixel(x, y) != b.get_pixel(x, y) {
                darkened = true;
                break 'scan;
            }
        }
    }
    assert!(darkened, "the first block must draw within the frame interior");
}

// ─── JPEG export ────────────────────────────────────────────────

#[test]
fn test_jpeg_export_round_trips_through_decoder() {
    let dir = scratch_dir("export");
    let path = dir.join("card.jpg");
    let mut params = bare_card(120, 160);
    params.card_bg_color = Color::rgb(90, 120, 150);
    let img = carterie::render(&params, &no_fonts());
    export_jpeg(&img, &path).unwrap();

    let bytes = std::fs::read(&path).unwrap();
    assert!(bytes.starts_with(&[0xFF, 0xD8]), "must be a JPEG");

    let decoded = image::open(&path).unwrap();
    assert_eq!(decoded.to_rgb8().dimensions(), (120, 160));
}

// ─── Sheet packing ──────────────────────────────────────────────

#[test]
fn test_seven_cards_pack_onto_two_pages() {
    let spec = six_per_page_spec(seven_cards_dir());

    let layout = carterie::sheet::plan(&spec).unwrap();
    assert_eq!((layout.cols, layout.rows, layout.per_page), (3, 2, 6));
    assert_eq!(layout.pages.len(), 2);
    assert_eq!(layout.pages[0].len(), 6);
    assert_eq!(layout.pages[1].len(), 1);

    // Lexicographic order: card_1 first, card_7 alone on page two.
    let first = layout.pages[0][0].path.file_name().unwrap();
    let last = layout.pages[1][0].path.file_name().unwrap();
    assert_eq!(first, "card_1.jpg");
    assert_eq!(last, "card_7.jpg");

    // The straggler starts a fresh page at the top-left cell.
    let margin = 10.0 * carterie::sheet::MM_TO_PT;
    let page_h = 140.0 * carterie::sheet::MM_TO_PT;
    let p = &layout.pages[1][0];
    assert!((p.x - margin).abs() < 1e-9);
    assert!((p.y - (page_h - margin - layout.photo_height)).abs() < 1e-9);

    let pdf = carterie::build_sheet(&spec).unwrap();
    assert_valid_pdf(&pdf);
    assert_eq!(count_pages(&pdf), 2);
}

#[test]
fn test_sheet_on_a4_defaults() {
    let spec = SheetSpec {
        image_dir: seven_cards_dir(),
        ..SheetSpec::default()
    };
    // A4 takes 3×5 photos at the default 63 mm / 10 mm margin: one page.
    let pdf = carterie::build_sheet(&spec).unwrap();
    assert_valid_pdf(&pdf);
    assert_eq!(count_pages(&pdf), 1);
}

#[test]
fn test_empty_directory_is_a_fatal_sheet_error() {
    let spec = SheetSpec {
        image_dir: scratch_dir("empty"),
        ..SheetSpec::default()
    };
    match carterie::build_sheet(&spec) {
        Err(CardError::Sheet(msg)) => assert!(msg.contains("no image"), "got: {msg}"),
        other => panic!("expected a sheet error, got {other:?}"),
    }
}

#[test]
fn test_oversized_photo_is_a_fatal_sheet_error() {
    let spec = SheetSpec {
        image_dir: seven_cards_dir(),
        photo_width_mm: 400.0,
        ..SheetSpec::default()
    };
    assert!(matches!(
        carterie::build_sheet(&spec),
        Err(CardError::Sheet(_))
    ));
}

// ─── Configuration and JSON input ───────────────────────────────

#[test]
fn test_config_round_trip_through_public_api() {
    let dir = scratch_dir("config");
    let path = dir.join("params.json");

    let mut params = CardParams::default();
    params.title.text = "Basilic".to_string();
    params.photo.opacity = 35;
    params.text.blocks = vec![TextBlock {
        title: "Regard".to_string(),
        body: "Pétrifie au premier tour".to_string(),
        comment: "(rare)".to_string(),
    }];

    config::save(&path, &params).unwrap();
    assert_eq!(config::load(&path).unwrap(), params);
}

#[test]
fn test_render_json_accepts_partial_params() {
    let img = carterie::render_json(
        r#"{ "frame_dimensions": [64, 96], "card_bg_color": "teal", "card_outline_width": 0 }"#,
        &no_fonts(),
    )
    .unwrap();
    assert_eq!(img.dimensions(), (64, 96));
    assert_eq!(img.get_pixel(32, 48).0, [0, 128, 128]);
}

#[test]
fn test_render_json_rejects_bad_color_with_hint() {
    let err = carterie::render_json(r#"{ "card_bg_color": "chartreuse-ish" }"#, &no_fonts());
    match err {
        Err(CardError::Parse { hint, .. }) => assert!(!hint.is_empty()),
        other => panic!("expected a parse error, got {:?}", other.map(|_| ())),
    }
}
