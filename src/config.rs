//! # Persisted Configuration
//!
//! The whole [`CardParams`] tree persists as one JSON blob. Loading is
//! forgiving: a missing or unreadable blob means "use the built-in
//! defaults", never an error. A blob that parses is used verbatim — no
//! migration, no per-field validation. Saving happens only on an explicit
//! user action.

use log::{debug, warn};
use std::path::Path;

use crate::error::CardError;
use crate::model::CardParams;

/// Load persisted parameters. Returns `None` when the blob is absent or
/// unusable, in which case the caller falls back to `CardParams::default()`.
pub fn load(path: &Path) -> Option<CardParams> {
    let data = match std::fs::read_to_string(path) {
        Ok(data) => data,
        Err(e) => {
            debug!("no persisted parameters at {}: {e}", path.display());
            return None;
        }
    };
    match serde_json::from_str(&data) {
        Ok(params) => Some(params),
        Err(e) => {
            warn!("persisted parameters at {} unreadable, using defaults: {e}", path.display());
            None
        }
    }
}

/// Write the parameters back as pretty JSON, creating parent directories as
/// needed.
pub fn save(path: &Path, params: &CardParams) -> Result<(), CardError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let json = serde_json::to_string_pretty(params)?;
    std::fs::write(path, json)?;
    Ok(())
}
