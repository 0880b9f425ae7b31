//! # Card Model
//!
//! The input representation for the compositor and the sheet packer. A card
//! is described by a tree of parameter structs — card canvas, title,
//! background, photo frame, text frame — that the GUI (or a JSON file, or a
//! test) fills in and the renderer consumes as an immutable snapshot.
//!
//! Every struct round-trips through serde without loss: the whole tree is
//! the persisted configuration blob.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// All parameters describing one card.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CardParams {
    /// Card canvas size in pixels (width, height).
    pub frame_dimensions: (u32, u32),
    pub card_bg_color: Color,
    pub card_outline_color: Color,
    pub card_outline_width: u32,
    pub title: TitleParams,
    pub background: BackgroundParams,
    pub photo: PhotoParams,
    pub text: TextParams,
}

impl Default for CardParams {
    fn default() -> Self {
        Self {
            frame_dimensions: (1260, 1760),
            card_bg_color: Color::named("green"),
            card_outline_color: Color::BLACK,
            card_outline_width: 10,
            title: TitleParams::default(),
            background: BackgroundParams::default(),
            photo: PhotoParams::default(),
            text: TextParams::default(),
        }
    }
}

/// The card title, drawn near the top edge with an optional stroke effect.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TitleParams {
    pub text: String,
    pub font_size: u32,
    pub color: Color,
    /// Top-left anchor of the title in card pixels.
    pub position: (i32, i32),
    /// When set, the title is stroked by drawing four offset copies in this
    /// color underneath the main pass.
    pub outline_color: Option<Color>,
}

impl Default for TitleParams {
    fn default() -> Self {
        Self {
            text: String::new(),
            font_size: 68,
            color: Color::WHITE,
            position: (30, 10),
            outline_color: Some(Color::BLACK),
        }
    }
}

/// Full-canvas background image settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackgroundParams {
    pub path: Option<PathBuf>,
    /// Whether the background image is composited at all.
    pub display: bool,
    /// Letterbox instead of stretching: fit inside the canvas, centered,
    /// never upscaled.
    pub keep_ratio: bool,
    /// Uniform alpha applied to the background, 0–100.
    pub opacity: u8,
}

impl Default for BackgroundParams {
    fn default() -> Self {
        Self {
            path: None,
            display: false,
            keep_ratio: false,
            opacity: 100,
        }
    }
}

/// The rounded photo frame and the photo pasted inside it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhotoParams {
    pub frame_dimensions: (u32, u32),
    pub frame_position: (i32, i32),
    pub frame_bg_color: Color,
    /// Fill opacity of the frame background, 0–100.
    pub opacity: u8,
    pub corner_radius: u32,
    pub outline_color: Color,
    pub outline_width: u32,
    pub photo_path: Option<PathBuf>,
}

impl Default for PhotoParams {
    fn default() -> Self {
        Self {
            frame_dimensions: (1200, 750),
            frame_position: (30, 100),
            frame_bg_color: Color::hex("#EFD5B2"),
            opacity: 70,
            corner_radius: 40,
            outline_color: Color::BLACK,
            outline_width: 10,
            photo_path: None,
        }
    }
}

/// The rounded text frame and the ordered text blocks rendered inside it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextParams {
    pub frame_dimensions: (u32, u32),
    pub frame_position: (i32, i32),
    /// Font names for the three roles, resolved against the font directory.
    pub font_regular: String,
    pub font_bold: String,
    pub font_italic: String,
    pub size_regular: u32,
    pub size_bold: u32,
    pub size_italic: u32,
    pub text_color: Color,
    pub corner_radius: u32,
    /// Inset between the frame edge and the text on every side.
    pub padding: u32,
    pub frame_bg_color: Color,
    /// Fill opacity of the frame background, 0–100.
    pub opacity: u8,
    pub outline_color: Color,
    pub outline_width: u32,
    /// Rendering order is sequence order, top to bottom.
    pub blocks: Vec<TextBlock>,
}

impl Default for TextParams {
    fn default() -> Self {
        Self {
            frame_dimensions: (1200, 850),
            frame_position: (30, 870),
            font_regular: "Lato-Regular.ttf".to_string(),
            font_bold: "Lato-Black.ttf".to_string(),
            font_italic: "Lato-Italic.ttf".to_string(),
            size_regular: 60,
            size_bold: 60,
            size_italic: 44,
            text_color: Color::BLACK,
            corner_radius: 40,
            padding: 60,
            frame_bg_color: Color::hex("#b4b4b4"),
            opacity: 70,
            outline_color: Color::BLACK,
            outline_width: 10,
            blocks: Vec::new(),
        }
    }
}

/// One unit of title/body/comment text rendered as a group.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextBlock {
    pub title: String,
    pub body: String,
    pub comment: String,
}

/// Page sizes in points for the printable sheet.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub enum PageSize {
    #[default]
    A4,
    Custom {
        width: f64,
        height: f64,
    },
}

impl PageSize {
    /// Returns (width, height) in points.
    pub fn dimensions(&self) -> (f64, f64) {
        match self {
            PageSize::A4 => (595.28, 841.89),
            PageSize::Custom { width, height } => (*width, *height),
        }
    }
}

/// One printable-sheet job: which images, onto what page, at what size.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SheetSpec {
    pub image_dir: PathBuf,
    pub page_size: PageSize,
    pub margin_mm: f64,
    pub photo_width_mm: f64,
}

impl Default for SheetSpec {
    fn default() -> Self {
        Self {
            image_dir: PathBuf::from("generated"),
            page_size: PageSize::A4,
            margin_mm: 10.0,
            photo_width_mm: 63.0,
        }
    }
}

/// An opaque RGB color.
///
/// Serialized as a string: `#rrggbb` on the way out; `#rgb`, `#rrggbb`, or
/// one of the CSS basic color names on the way in. An unrecognized string is
/// a deserialization error — past the parse boundary an invalid color is
/// unrepresentable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

/// The CSS basic color keywords, as accepted by the color parser.
const NAMED_COLORS: &[(&str, Color)] = &[
    ("black", Color::rgb(0, 0, 0)),
    ("silver", Color::rgb(192, 192, 192)),
    ("gray", Color::rgb(128, 128, 128)),
    ("grey", Color::rgb(128, 128, 128)),
    ("white", Color::rgb(255, 255, 255)),
    ("maroon", Color::rgb(128, 0, 0)),
    ("red", Color::rgb(255, 0, 0)),
    ("purple", Color::rgb(128, 0, 128)),
    ("fuchsia", Color::rgb(255, 0, 255)),
    ("magenta", Color::rgb(255, 0, 255)),
    ("green", Color::rgb(0, 128, 0)),
    ("lime", Color::rgb(0, 255, 0)),
    ("olive", Color::rgb(128, 128, 0)),
    ("yellow", Color::rgb(255, 255, 0)),
    ("navy", Color::rgb(0, 0, 128)),
    ("blue", Color::rgb(0, 0, 255)),
    ("teal", Color::rgb(0, 128, 128)),
    ("aqua", Color::rgb(0, 255, 255)),
    ("cyan", Color::rgb(0, 255, 255)),
    ("orange", Color::rgb(255, 165, 0)),
];

impl Color {
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const WHITE: Color = Color::rgb(255, 255, 255);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse a color string: `#rgb`, `#rrggbb`, or a CSS basic color name.
    pub fn parse(s: &str) -> Result<Self, String> {
        let trimmed = s.trim();
        if let Some(hex) = trimmed.strip_prefix('#') {
            return match hex.len() {
                3 => {
                    let r = u8::from_str_radix(&hex[0..1].repeat(2), 16);
                    let g = u8::from_str_radix(&hex[1..2].repeat(2), 16);
                    let b = u8::from_str_radix(&hex[2..3].repeat(2), 16);
                    match (r, g, b) {
                        (Ok(r), Ok(g), Ok(b)) => Ok(Color::rgb(r, g, b)),
                        _ => Err(format!("invalid hex color: {trimmed:?}")),
                    }
                }
                6 => {
                    let r = u8::from_str_radix(&hex[0..2], 16);
                    let g = u8::from_str_radix(&hex[2..4], 16);
                    let b = u8::from_str_radix(&hex[4..6], 16);
                    match (r, g, b) {
                        (Ok(r), Ok(g), Ok(b)) => Ok(Color::rgb(r, g, b)),
                        _ => Err(format!("invalid hex color: {trimmed:?}")),
                    }
                }
                _ => Err(format!("invalid hex color: {trimmed:?}")),
            };
        }
        let lower = trimmed.to_ascii_lowercase();
        NAMED_COLORS
            .iter()
            .find(|(name, _)| *name == lower)
            .map(|(_, c)| *c)
            .ok_or_else(|| format!("unsupported color format: {trimmed:?}"))
    }

    /// Parse a hex color literal, panicking on malformed input. For
    /// compile-time-known constants only.
    pub fn hex(s: &str) -> Self {
        Self::parse(s).unwrap_or_else(|e| panic!("{e}"))
    }

    /// Lookup a CSS basic color name, panicking on unknown names. For
    /// compile-time-known constants only.
    pub fn named(name: &str) -> Self {
        Self::parse(name).unwrap_or_else(|e| panic!("{e}"))
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl Serialize for Color {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Color {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Color::parse(&s).map_err(serde::de::Error::custom)
    }
}
