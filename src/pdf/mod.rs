//! # Sheet PDF Writer
//!
//! Serializes a planned sheet into PDF bytes without an external PDF crate:
//! the only structure needed is pages whose content is a handful of image
//! XObjects, so the object table, xref and trailer are written by hand.
//!
//! ```text
//! %PDF-1.7            <- header
//! 1 0 obj ... endobj  <- objects (catalog, pages, XObjects, content streams)
//! ...
//! xref                <- byte offsets of each object
//! trailer             <- points to the root object
//! %%EOF
//! ```
//!
//! JPEG exports embed as DCTDecode streams exactly as they sit on disk; PNG
//! sources embed as FlateDecode RGB with an SMask when they carry alpha.

use std::fmt::Write as _;
use std::io::Write as _;

use miniz_oxide::deflate::compress_to_vec_zlib;

use crate::error::CardError;
use crate::image_loader::{self, Encoding, SheetImage};
use crate::sheet::{Placement, SheetLayout};

/// Compression level for FlateDecode streams.
const ZLIB_LEVEL: u8 = 6;

pub struct PdfWriter;

/// Indexed PDF object bodies; index 0 stays the conventional free-list head.
struct ObjectTable {
    objects: Vec<Vec<u8>>,
}

impl ObjectTable {
    fn with_reserved(count: usize) -> Self {
        Self {
            objects: vec![Vec::new(); count],
        }
    }

    fn add(&mut self, body: Vec<u8>) -> usize {
        self.objects.push(body);
        self.objects.len() - 1
    }
}

impl Default for PdfWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl PdfWriter {
    pub fn new() -> Self {
        Self
    }

    /// Serialize a planned sheet. The document is assembled fully in memory,
    /// so a failed image load leaves no partial file anywhere.
    pub fn write(&self, layout: &SheetLayout) -> Result<Vec<u8>, CardError> {
        // Ids 1 and 2 are reserved for the Catalog and the Pages root, which
        // are filled in once every page object exists.
        let mut table = ObjectTable::with_reserved(3);
        let mut page_ids: Vec<usize> = Vec::new();
        let mut im_index = 0usize;

        for page in &layout.pages {
            let mut ops = String::new();
            let mut resources = String::new();

            for placement in page {
                let card = image_loader::open_sheet_image(&placement.path)?;
                let id = add_image_xobject(&mut table, &card);
                let (x, y, w, h) = fit_in_cell(placement, card.width, card.height);
                let _ = write!(
                    ops,
                    "q\n{w:.4} 0 0 {h:.4} {x:.2} {y:.2} cm\n/Im{im_index} Do\nQ\n"
                );
                let _ = write!(resources, "/Im{im_index} {id} 0 R ");
                im_index += 1;
            }

            let content = compress_to_vec_zlib(ops.as_bytes(), ZLIB_LEVEL);
            let content_id = table.add(stream_object(
                &format!("<< /Length {} /Filter /FlateDecode >>", content.len()),
                &content,
            ));

            let page_id = table.add(
                format!(
                    "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {:.2} {:.2}] \
                     /Contents {content_id} 0 R /Resources << /XObject << {}>> >> >>",
                    layout.page_size.0,
                    layout.page_size.1,
                    resources,
                )
                .into_bytes(),
            );
            page_ids.push(page_id);
        }

        table.objects[1] = b"<< /Type /Catalog /Pages 2 0 R >>".to_vec();
        let kids = page_ids
            .iter()
            .map(|id| format!("{id} 0 R"))
            .collect::<Vec<_>>()
            .join(" ");
        table.objects[2] =
            format!("<< /Type /Pages /Kids [{kids}] /Count {} >>", page_ids.len()).into_bytes();

        Ok(assemble(&table))
    }
}

/// Aspect-preserving fit of the image inside its cell, centered. The cell
/// already matches the locked batch ratio, so this only absorbs rounding
/// slack and the odd mismatched straggler.
fn fit_in_cell(placement: &Placement, img_w: u32, img_h: u32) -> (f64, f64, f64, f64) {
    if img_w == 0 || img_h == 0 {
        return (placement.x, placement.y, placement.width, placement.height);
    }
    let scale = f64::min(
        placement.width / img_w as f64,
        placement.height / img_h as f64,
    );
    let w = img_w as f64 * scale;
    let h = img_h as f64 * scale;
    let x = placement.x + (placement.width - w) / 2.0;
    let y = placement.y + (placement.height - h) / 2.0;
    (x, y, w, h)
}

/// A complete stream object: dictionary, `stream` keyword, payload,
/// `endstream`.
fn stream_object(dict: &str, payload: &[u8]) -> Vec<u8> {
    let mut body = Vec::with_capacity(dict.len() + payload.len() + 24);
    let _ = write!(body, "{dict}\nstream\n");
    body.extend_from_slice(payload);
    body.extend_from_slice(b"\nendstream");
    body
}

/// Add one image as an XObject, plus a separate SMask object when the source
/// carries an alpha plane. Returns the id to reference from page resources.
fn add_image_xobject(table: &mut ObjectTable, card: &SheetImage) -> usize {
    match &card.encoding {
        Encoding::Dct { bytes, grayscale } => {
            let dict = format!(
                "<< /Type /XObject /Subtype /Image /Width {} /Height {} \
                 /ColorSpace {} /BitsPerComponent 8 /Filter /DCTDecode /Length {} >>",
                card.width,
                card.height,
                if *grayscale { "/DeviceGray" } else { "/DeviceRGB" },
                bytes.len(),
            );
            table.add(stream_object(&dict, bytes))
        }

        Encoding::Raw { rgb, alpha } => {
            let smask_id = alpha.as_ref().map(|plane| {
                let flate = compress_to_vec_zlib(plane, ZLIB_LEVEL);
                let dict = format!(
                    "<< /Type /XObject /Subtype /Image /Width {} /Height {} \
                     /ColorSpace /DeviceGray /BitsPerComponent 8 /Filter /FlateDecode /Length {} >>",
                    card.width,
                    card.height,
                    flate.len(),
                );
                table.add(stream_object(&dict, &flate))
            });

            let flate = compress_to_vec_zlib(rgb, ZLIB_LEVEL);
            let smask_entry = smask_id
                .map(|id| format!(" /SMask {id} 0 R"))
                .unwrap_or_default();
            let dict = format!(
                "<< /Type /XObject /Subtype /Image /Width {} /Height {} \
                 /ColorSpace /DeviceRGB /BitsPerComponent 8 /Filter /FlateDecode /Length {}{} >>",
                card.width,
                card.height,
                flate.len(),
                smask_entry,
            );
            table.add(stream_object(&dict, &flate))
        }
    }
}

/// Lay the objects out behind the header, then write the xref table and the
/// trailer pointing back at it.
fn assemble(table: &ObjectTable) -> Vec<u8> {
    let mut out: Vec<u8> = Vec::new();
    out.extend_from_slice(b"%PDF-1.7\n%\xe2\xe3\xcf\xd3\n");

    let mut offsets = vec![0usize; table.objects.len()];
    for (id, body) in table.objects.iter().enumerate().skip(1) {
        offsets[id] = out.len();
        let _ = write!(out, "{id} 0 obj\n");
        out.extend_from_slice(body);
        out.extend_from_slice(b"\nendobj\n\n");
    }

    let xref_at = out.len();
    let _ = write!(out, "xref\n0 {}\n0000000000 65535 f \n", table.objects.len());
    for offset in &offsets[1..] {
        let _ = write!(out, "{offset:010} 00000 n \n");
    }
    let _ = write!(
        out,
        "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{xref_at}\n%%EOF\n",
        table.objects.len(),
    );
    out
}
