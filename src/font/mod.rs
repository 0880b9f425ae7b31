//! # Font Management
//!
//! Loading and caching the TrueType/OpenType faces the compositor draws
//! with, and discovering which font files a directory offers.
//!
//! Font resolution is forgiving: a name that doesn't resolve, or a file
//! that doesn't parse, falls back to a system default family.
//! Fonts are a render-time soft failure — the library logs and substitutes,
//! it never errors.

use log::{debug, warn};
use rusttype::Font;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// Font file extensions recognized by the directory scan.
const FONT_EXTENSIONS: [&str; 2] = ["ttf", "otf"];

/// Well-known locations of a neutral sans face, tried in order for the
/// default family. `CARTERIE_DEFAULT_FONT` overrides the list.
const DEFAULT_FONT_CANDIDATES: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/usr/share/fonts/liberation-sans/LiberationSans-Regular.ttf",
    "/usr/share/fonts/liberation/LiberationSans-Regular.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

/// Scan a directory for font files, keyed by file stem for display.
/// Unreadable directories yield an empty map.
pub fn scan_fonts(dir: &Path) -> BTreeMap<String, PathBuf> {
    let mut fonts = BTreeMap::new();
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            debug!("font directory {} unreadable: {e}", dir.display());
            return fonts;
        }
    };
    for entry in entries.flatten() {
        let path = entry.path();
        let is_font = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| FONT_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
            .unwrap_or(false);
        if !is_font {
            continue;
        }
        if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
            fonts.insert(stem.to_string(), path.clone());
        }
    }
    fonts
}

/// Resolves font names to parsed faces, caching by path.
pub struct FontLibrary {
    font_dir: Option<PathBuf>,
    cache: Mutex<HashMap<PathBuf, Arc<Font<'static>>>>,
    fallback: Option<Arc<Font<'static>>>,
}

impl FontLibrary {
    /// Build a library over an optional font directory. The system default
    /// face is located eagerly so later lookups are infallible decisions.
    pub fn new(font_dir: Option<PathBuf>) -> Self {
        Self {
            font_dir,
            cache: Mutex::new(HashMap::new()),
            fallback: find_default_font(),
        }
    }

    /// The default face, when the system offers one.
    pub fn default_font(&self) -> Option<Arc<Font<'static>>> {
        self.fallback.clone()
    }

    /// Resolve a font name — a file stem, a file name, or a path — to a
    /// parsed face, falling back to the default family when the name doesn't
    /// lead to a loadable font.
    pub fn resolve(&self, name: &str) -> Option<Arc<Font<'static>>> {
        if name.is_empty() {
            return self.default_font();
        }
        for candidate in self.candidate_paths(name) {
            if candidate.is_file() {
                if let Some(font) = self.load(&candidate) {
                    return Some(font);
                }
            }
        }
        warn!("font {name:?} not found, using default face");
        self.default_font()
    }

    fn candidate_paths(&self, name: &str) -> Vec<PathBuf> {
        let mut candidates = vec![PathBuf::from(name)];
        if let Some(dir) = &self.font_dir {
            candidates.push(dir.join(name));
            let named = Path::new(name);
            if named.extension().is_none() {
                for ext in FONT_EXTENSIONS {
                    candidates.push(dir.join(format!("{name}.{ext}")));
                }
            }
        }
        candidates
    }

    fn load(&self, path: &Path) -> Option<Arc<Font<'static>>> {
        if let Some(font) = self.cache.lock().unwrap().get(path) {
            return Some(Arc::clone(font));
        }
        let bytes = match std::fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!("failed to read font {}: {e}", path.display());
                return None;
            }
        };
        let font = match Font::try_from_vec(bytes) {
            Some(font) => Arc::new(font),
            None => {
                warn!("failed to parse font {}", path.display());
                return None;
            }
        };
        self.cache
            .lock()
            .unwrap()
            .insert(path.to_path_buf(), Arc::clone(&font));
        Some(font)
    }
}

fn find_default_font() -> Option<Arc<Font<'static>>> {
    let override_path = std::env::var("CARTERIE_DEFAULT_FONT").ok();
    let candidates = override_path
        .iter()
        .map(|s| s.as_str())
        .chain(DEFAULT_FONT_CANDIDATES.iter().copied());

    for candidate in candidates {
        let path = Path::new(candidate);
        if !path.is_file() {
            continue;
        }
        match std::fs::read(path).ok().and_then(Font::try_from_vec) {
            Some(font) => {
                debug!("default font: {}", path.display());
                return Some(Arc::new(font));
            }
            None => warn!("default font candidate {} did not parse", path.display()),
        }
    }
    warn!("no default font found; text rendering will be skipped where no configured font loads");
    None
}
