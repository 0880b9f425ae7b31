//! # Carterie
//!
//! A trading-card compositor and print-sheet generator.
//!
//! A card is described by a flat parameter tree — canvas, background, photo
//! frame, title, text frame — and rendered in one synchronous pass into an
//! RGB image. Exported cards then pack onto printable PDF pages in a fixed
//! grid, one physical width for the whole batch.
//!
//! ## Architecture
//!
//! ```text
//! Input (JSON/API)
//!       ↓
//!   [model]    — CardParams tree: frames, colors, text blocks
//!       ↓
//!   [compose]  — layer background, frames, title, photo, text
//!       ↓
//!  rendered card — JPEG export
//!       ↓
//!   [sheet]    — grid-pack a directory of exports onto pages
//!       ↓
//!   [pdf]      — serialize the sheet to PDF bytes
//! ```
//!
//! Rendering never aborts on a missing asset: fonts fall back to a system
//! default family and an unreadable photo is skipped. Hard failures are
//! reserved for the operations that must not half-happen — parsing
//! parameters, exporting files, and planning a sheet.

pub mod assets;
pub mod compose;
pub mod config;
pub mod error;
pub mod font;
pub mod image_loader;
pub mod model;
pub mod pdf;
pub mod sheet;
pub mod text;

use image::RgbImage;

pub use compose::export_jpeg;
pub use error::CardError;
pub use font::FontLibrary;
pub use model::{CardParams, SheetSpec};

/// Render a card from a parameter snapshot.
///
/// This is the primary entry point. Takes the parameter tree and a font
/// library and returns the composited RGB image at the card's dimensions.
pub fn render(params: &CardParams, fonts: &FontLibrary) -> RgbImage {
    compose::render_card(params, fonts)
}

/// Render a card described as JSON.
pub fn render_json(json: &str, fonts: &FontLibrary) -> Result<RgbImage, CardError> {
    let params: CardParams = serde_json::from_str(json)?;
    Ok(render(&params, fonts))
}

/// Plan and serialize a printable sheet from a directory of exported cards.
///
/// Fails — without writing anything — when the directory holds no images or
/// the photo width doesn't fit the page at the requested margin.
pub fn build_sheet(spec: &SheetSpec) -> Result<Vec<u8>, CardError> {
    let layout = sheet::plan(spec)?;
    pdf::PdfWriter::new().write(&layout)
}
