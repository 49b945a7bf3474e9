//! Sound banks
//!
//! A directory of WAV files, loaded as one `sounds` batch. Each file's stem
//! becomes its sound id.

use std::collections::BTreeMap;
use std::path::Path;

use log::{debug, warn};
use walkdir::WalkDir;

use crate::codec::file_data_uri;
use crate::error::{AuralError, Result};

/// Collect every `.wav` file under `dir` as id -> payload
///
/// When two files share a stem, the first one found (in sorted path order)
/// wins.
pub fn scan_dir(dir: &Path) -> Result<BTreeMap<String, String>> {
    if !dir.is_dir() {
        return Err(AuralError::FileNotFound {
            path: dir.display().to_string(),
        });
    }

    let mut sounds = BTreeMap::new();
    let entries = WalkDir::new(dir)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file());

    for entry in entries {
        let path = entry.path();
        let is_wav = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("wav"));
        if !is_wav {
            continue;
        }

        let Some(id) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };

        if sounds.contains_key(id) {
            warn!("Skipping {}: sound '{}' already loaded", path.display(), id);
            continue;
        }

        debug!("Found sound '{}' at {}", id, path.display());
        sounds.insert(id.to_string(), file_data_uri(path)?);
    }

    Ok(sounds)
}
