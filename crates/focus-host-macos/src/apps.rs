//! Installed application discovery

use focus_api::normalize_app_name;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Folders scanned for `.app` bundles
pub fn application_dirs() -> Vec<PathBuf> {
    let mut dirs = vec![
        PathBuf::from("/Applications"),
        PathBuf::from("/System/Applications"),
        PathBuf::from("/Applications/Utilities"),
    ];
    if let Some(home) = dirs::home_dir() {
        dirs.push(home.join("Applications"));
    }
    dirs
}

/// Names of the `.app` bundles directly inside `dirs`, sorted and
/// de-duplicated. Missing or unreadable folders are skipped.
pub fn scan_applications(dirs: &[PathBuf]) -> Vec<String> {
    let mut names = BTreeSet::new();
    for dir in dirs {
        let Ok(entries) = std::fs::read_dir(dir) else {
            debug!(dir = %dir.display(), "Skipping unreadable application folder");
            continue;
        };
        for entry in entries.flatten() {
            if let Some(name) = bundle_name(&entry.path()) {
                names.insert(name);
            }
        }
    }
    names.into_iter().collect()
}

fn bundle_name(path: &Path) -> Option<String> {
    let ext = path.extension()?.to_str()?;
    if !ext.eq_ignore_ascii_case("app") {
        return None;
    }
    normalize_app_name(path.file_stem()?.to_str()?)
}
