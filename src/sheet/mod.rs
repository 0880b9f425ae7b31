//! # Sheet Packer
//!
//! Places a directory of same-aspect card images onto printable pages.
//!
//! Every photo shares one physical width, the height is locked to the
//! aspect ratio of the first image found, and pages fill row-major, left to
//! right, top to bottom. No bin packing — fixed cells, computed once.
//!
//! Coordinates follow the PDF convention: origin at the bottom-left of the
//! page, y increasing upward, in points.

use std::path::{Path, PathBuf};

use crate::error::CardError;
use crate::model::SheetSpec;

/// Millimeters to PostScript points.
pub const MM_TO_PT: f64 = 72.0 / 25.4;

/// Image extensions accepted as sheet sources.
const SHEET_EXTENSIONS: [&str; 3] = ["jpg", "jpeg", "png"];

/// One image placement on a page, in page coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct Placement {
    pub path: PathBuf,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// A computed sheet layout: the grid plus per-page placements.
#[derive(Debug, Clone)]
pub struct SheetLayout {
    /// Page size in points (width, height).
    pub page_size: (f64, f64),
    pub cols: u32,
    pub rows: u32,
    pub per_page: u32,
    /// Cell size in points.
    pub photo_width: f64,
    pub photo_height: f64,
    pub pages: Vec<Vec<Placement>>,
}

/// The pure grid arithmetic, separated from any filesystem access.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Grid {
    pub cols: u32,
    pub rows: u32,
    pub per_page: u32,
    pub photo_width: f64,
    pub photo_height: f64,
}

/// Compute the page grid for photos of the given width and aspect ratio
/// (width / height). Fails when not even one photo fits the usable area.
pub(crate) fn compute_grid(
    page_size: (f64, f64),
    margin: f64,
    photo_width: f64,
    aspect_ratio: f64,
) -> Result<Grid, CardError> {
    let photo_height = photo_width / aspect_ratio;
    let usable_width = page_size.0 - 2.0 * margin;
    let usable_height = page_size.1 - 2.0 * margin;

    let cols = if usable_width > 0.0 {
        (usable_width / photo_width).floor() as u32
    } else {
        0
    };
    let rows = if usable_height > 0.0 {
        (usable_height / photo_height).floor() as u32
    } else {
        0
    };

    if cols == 0 || rows == 0 {
        return Err(CardError::Sheet(
            "picture too big to be printed on this page at this margin".to_string(),
        ));
    }

    Ok(Grid {
        cols,
        rows,
        per_page: cols * rows,
        photo_width,
        photo_height,
    })
}

/// Position of the Nth cell on a page (0-indexed, row-major from the top),
/// as the bottom-left corner of the cell in page coordinates.
pub(crate) fn cell_position(grid: &Grid, page_size: (f64, f64), margin: f64, index_on_page: u32) -> (f64, f64) {
    let col = index_on_page % grid.cols;
    let row = index_on_page / grid.cols;
    let x = margin + col as f64 * grid.photo_width;
    let y = page_size.1 - margin - grid.photo_height - row as f64 * grid.photo_height;
    (x, y)
}

/// List the sheet source images in a directory, sorted lexicographically by
/// file name — this is the packing order.
pub fn list_images(dir: &Path) -> Result<Vec<PathBuf>, CardError> {
    let entries = std::fs::read_dir(dir)
        .map_err(|e| CardError::Sheet(format!("cannot read image directory {}: {e}", dir.display())))?;
    let mut images: Vec<PathBuf> = entries
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| {
            path.extension()
                .and_then(|e| e.to_str())
                .map(|e| SHEET_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
                .unwrap_or(false)
        })
        .collect();
    images.sort_by_key(|p| p.file_name().map(|n| n.to_os_string()));
    Ok(images)
}

/// Plan a full sheet job: discover the images, lock the aspect ratio to the
/// first one, compute the grid, and assign every image to a page cell.
///
/// Both failure modes are preconditions of the operation — an empty source
/// directory and a photo that doesn't fit the page — and abort before
/// anything is written.
pub fn plan(spec: &SheetSpec) -> Result<SheetLayout, CardError> {
    let images = list_images(&spec.image_dir)?;
    if images.is_empty() {
        return Err(CardError::Sheet(format!(
            "no image found in directory {}",
            spec.image_dir.display()
        )));
    }

    let (first_w, first_h) = image::image_dimensions(&images[0]).map_err(|e| {
        CardError::Image(format!(
            "failed to read dimensions of {}: {e}",
            images[0].display()
        ))
    })?;
    if first_h == 0 {
        return Err(CardError::Image(format!(
            "degenerate image {}",
            images[0].display()
        )));
    }
    let aspect_ratio = first_w as f64 / first_h as f64;

    let page_size = spec.page_size.dimensions();
    let margin = spec.margin_mm * MM_TO_PT;
    let grid = compute_grid(page_size, margin, spec.photo_width_mm * MM_TO_PT, aspect_ratio)?;

    let placements: Vec<Placement> = images
        .into_iter()
        .enumerate()
        .map(|(index, path)| {
            let (x, y) = cell_position(&grid, page_size, margin, (index as u32) % grid.per_page);
            Placement {
                path,
                x,
                y,
                width: grid.photo_width,
                height: grid.photo_height,
            }
        })
        .collect();
    let pages: Vec<Vec<Placement>> = placements
        .chunks(grid.per_page as usize)
        .map(|page| page.to_vec())
        .collect();

    Ok(SheetLayout {
        page_size,
        cols: grid.cols,
        rows: grid.rows,
        per_page: grid.per_page,
        photo_width: grid.photo_width,
        photo_height: grid.photo_height,
        pages,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    // A 210×140 mm page with 10 mm margins and 63 mm wide 4:3 photos packs
    // exactly 3 columns × 2 rows.
    fn six_per_page() -> ((f64, f64), f64, f64, f64) {
        let page = (210.0 * MM_TO_PT, 140.0 * MM_TO_PT);
        let margin = 10.0 * MM_TO_PT;
        let photo_width = 63.0 * MM_TO_PT;
        let aspect = 4.0 / 3.0;
        (page, margin, photo_width, aspect)
    }

    #[test]
    fn test_grid_dimensions() {
        let (page, margin, photo_width, aspect) = six_per_page();
        let grid = compute_grid(page, margin, photo_width, aspect).unwrap();
        assert_eq!((grid.cols, grid.rows, grid.per_page), (3, 2, 6));
        // photo_height = 63 / (4/3) = 47.25 mm
        assert!((grid.photo_height - 47.25 * MM_TO_PT).abs() < 1e-9);
    }

    #[test]
    fn test_grid_on_a4() {
        // A4, 10 mm margin, 63 mm wide 4:3 photos: 3 × 5 = 15 per page.
        let grid = compute_grid(
            crate::model::PageSize::A4.dimensions(),
            10.0 * MM_TO_PT,
            63.0 * MM_TO_PT,
            4.0 / 3.0,
        )
        .unwrap();
        assert_eq!((grid.cols, grid.rows, grid.per_page), (3, 5, 15));
    }

    #[test]
    fn test_oversized_photo_is_a_sheet_error() {
        let err = compute_grid((200.0, 200.0), 10.0, 500.0, 1.0).unwrap_err();
        assert!(matches!(err, CardError::Sheet(_)));

        // Margin alone can also squeeze the photo out.
        let err = compute_grid((200.0, 200.0), 95.0, 20.0, 0.1).unwrap_err();
        assert!(matches!(err, CardError::Sheet(_)));
    }

    #[test]
    fn test_cell_positions_walk_row_major_from_top_left() {
        let (page, margin, photo_width, aspect) = six_per_page();
        let grid = compute_grid(page, margin, photo_width, aspect).unwrap();

        let (x0, y0) = cell_position(&grid, page, margin, 0);
        assert!((x0 - margin).abs() < 1e-9);
        assert!((y0 - (page.1 - margin - grid.photo_height)).abs() < 1e-9);

        // Second column, first row.
        let (x1, _) = cell_position(&grid, page, margin, 1);
        assert!((x1 - (margin + grid.photo_width)).abs() < 1e-9);

        // First column, second row: one cell height lower.
        let (x3, y3) = cell_position(&grid, page, margin, 3);
        assert!((x3 - margin).abs() < 1e-9);
        assert!((y3 - (y0 - grid.photo_height)).abs() < 1e-9);
    }

    #[test]
    fn test_every_index_lands_on_the_predicted_page_row_col() {
        let (page, margin, photo_width, aspect) = six_per_page();
        let grid = compute_grid(page, margin, photo_width, aspect).unwrap();
        let n = 7u32;
        for k in 0..n {
            let page_index = k / grid.per_page;
            let on_page = k % grid.per_page;
            let row = on_page / grid.cols;
            let col = on_page % grid.cols;
            let (x, y) = cell_position(&grid, page, margin, on_page);
            assert!((x - (margin + col as f64 * grid.photo_width)).abs() < 1e-9);
            assert!(
                (y - (page.1 - margin - (row + 1) as f64 * grid.photo_height)).abs() < 1e-9
            );
            // The seventh image opens a second page at its top-left cell.
            if k == 6 {
                assert_eq!(page_index, 1);
                assert_eq!((row, col), (0, 0));
            }
        }
    }
}
