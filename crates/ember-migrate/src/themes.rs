//! Copy bundled themes into the data folder.
//!
//! A theme is a directory with a `theme.json` carrying a `version`. Themes
//! missing from the data folder are copied; themes present with a different
//! version are replaced wholesale. Anything else is left alone so user edits
//! to an up-to-date theme survive.

use serde_json::Value;
use std::fs;
use std::path::Path;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::errors::{MigrateError, Result};

pub const THEME_MANIFEST: &str = "theme.json";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ThemeSummary {
    pub added: Vec<String>,
    pub updated: Vec<String>,
    pub unchanged: Vec<String>,
    /// Themes left alone because their manifest could not be read, or the
    /// destination is not a directory.
    pub skipped: Vec<String>,
}

/// Sync every theme directory under `source` into `dest` (created if missing).
/// Entries are processed in name order.
pub fn migrate_themes(source: &Path, dest: &Path) -> Result<ThemeSummary> {
    fs::create_dir_all(dest).map_err(|e| MigrateError::io(dest, e))?;

    let mut names = Vec::new();
    for entry in fs::read_dir(source).map_err(|e| MigrateError::io(source, e))? {
        let entry = entry.map_err(|e| MigrateError::io(source, e))?;
        let is_dir = entry
            .file_type()
            .map_err(|e| MigrateError::io(entry.path(), e))?
            .is_dir();
        if !is_dir {
            continue;
        }
        names.push(entry.file_name());
    }
    names.sort();

    let mut summary = ThemeSummary::default();
    for dir_name in names {
        let src = source.join(&dir_name);
        let dst = dest.join(&dir_name);
        // lossy only for reporting; paths keep the raw name
        let name = dir_name.to_string_lossy().into_owned();

        if !dst.exists() {
            info!("adding theme {name}");
            copy_dir_all(&src, &dst)?;
            summary.added.push(name);
            continue;
        }
        if !dst.is_dir() {
            warn!("{} exists and is not a directory, leaving it", dst.display());
            summary.skipped.push(name);
            continue;
        }

        let (ours, theirs) = match (theme_version(&src), theme_version(&dst)) {
            (Ok(a), Ok(b)) => (a, b),
            (Err(e), _) | (_, Err(e)) => {
                warn!("skipping theme {name}: {e}");
                summary.skipped.push(name);
                continue;
            }
        };

        if ours == theirs {
            debug!("theme {name} already at version {ours}");
            summary.unchanged.push(name);
        } else {
            info!("updating theme {name} ({theirs} -> {ours})");
            fs::remove_dir_all(&dst).map_err(|e| MigrateError::io(&dst, e))?;
            copy_dir_all(&src, &dst)?;
            summary.updated.push(name);
        }
    }

    Ok(summary)
}

/// `version` from `<dir>/theme.json`; `Null` when the field is absent.
pub fn theme_version(dir: &Path) -> Result<Value> {
    let path = dir.join(THEME_MANIFEST);
    let bytes = fs::read(&path).map_err(|e| MigrateError::io(&path, e))?;
    let json: Value = serde_json::from_slice(&bytes)?;
    Ok(json.get("version").cloned().unwrap_or(Value::Null))
}

/// Recursive copy of `src` into `dst`.
pub fn copy_dir_all(src: &Path, dst: &Path) -> Result<()> {
    for entry in WalkDir::new(src).follow_links(false) {
        let entry = entry?;
        let Ok(rel) = entry.path().strip_prefix(src) else {
            continue;
        };
        let out = dst.join(rel);
        let ft = entry.file_type();
        if ft.is_dir() {
            fs::create_dir_all(&out).map_err(|e| MigrateError::io(&out, e))?;
        } else if ft.is_file() {
            if let Some(parent) = out.parent() {
                fs::create_dir_all(parent).map_err(|e| MigrateError::io(parent, e))?;
            }
            fs::copy(entry.path(), &out).map_err(|e| MigrateError::io(entry.path(), e))?;
        } else {
            debug!("not copying {}", entry.path().display());
        }
    }
    Ok(())
}
