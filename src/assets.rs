//! Discovery of predefined background images.
//!
//! A plain directory listing against a caller-supplied path, so tests can
//! point it at a scratch tree instead of a real asset install.

use log::debug;
use std::path::{Path, PathBuf};

/// Raster extensions recognized as background images.
const BACKGROUND_EXTENSIONS: [&str; 5] = ["png", "jpg", "jpeg", "webp", "bmp"];

/// List the background images offered by a directory, sorted by file name.
/// Unreadable directories yield an empty list.
pub fn scan_backgrounds(dir: &Path) -> Vec<PathBuf> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            debug!("background directory {} unreadable: {e}", dir.display());
            return Vec::new();
        }
    };
    let mut images: Vec<PathBuf> = entries
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| {
            path.extension()
                .and_then(|e| e.to_str())
                .map(|e| BACKGROUND_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
                .unwrap_or(false)
        })
        .collect();
    images.sort_by_key(|p| p.file_name().map(|n| n.to_os_string()));
    images
}
