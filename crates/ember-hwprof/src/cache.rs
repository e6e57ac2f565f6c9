use crate::types::GpuSettings;
use anyhow::{Context, Result};
use serde_json as json;
use sha2::{Digest, Sha256};
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

/// Report at `path`, or `None` if it is missing or unreadable.
pub fn load_cached(path: &Path) -> Option<GpuSettings> {
    let buf = fs::read(path).ok()?;
    match json::from_slice::<GpuSettings>(&buf) {
        Ok(r) => Some(r),
        Err(e) => {
            warn!("ignoring corrupt gpu report {}: {e}", path.display());
            None
        }
    }
}

/// Atomic write (tmp file + rename) so readers never see half a report.
pub fn save_report(path: &Path, report: &GpuSettings) -> Result<()> {
    let dir = path
        .parent()
        .with_context(|| format!("no parent dir for {}", path.display()))?;
    fs::create_dir_all(dir).with_context(|| format!("mkd {}", dir.display()))?;
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, json::to_vec_pretty(report)?)
        .with_context(|| format!("write {}", tmp.display()))?;
    fs::rename(&tmp, path).with_context(|| format!("rename to {}", path.display()))?;
    debug!("saved gpu report to {}", path.display());
    Ok(())
}

/// Always returns a report; CPU-only default when nothing is cached.
pub fn load_or_default(path: &Path) -> GpuSettings {
    load_cached(path).unwrap_or_else(|| {
        debug!("no gpu report at {}, assuming cpu", path.display());
        GpuSettings::default()
    })
}

/// Hash of every field that can change which server binary gets picked.
/// `is_initial`/`notify` are UI flags and stay out of it.
pub fn compute_fingerprint(r: &GpuSettings) -> String {
    let mut hasher = Sha256::new();

    hasher.update(r.run_mode.as_str().as_bytes());
    hasher.update([r.vulkan as u8, r.cuda.exist as u8, r.nvidia_driver.exist as u8]);
    for v in [&r.cuda.version, &r.nvidia_driver.version] {
        hasher.update(v.as_deref().unwrap_or("").as_bytes());
        hasher.update([0u8]);
    }

    for g in &r.gpus {
        hasher.update(g.id.as_bytes());
        hasher.update([0u8]);
        hasher.update(g.name.as_bytes());
        hasher.update([0u8]);
        hasher.update(g.vram.as_bytes());
        hasher.update([0u8]);
    }
    // separator so a gpu id cannot shift into the in-use list
    hasher.update([0xffu8]);
    for id in &r.gpus_in_use {
        hasher.update(id.as_bytes());
        hasher.update([0u8]);
    }

    hex::encode(hasher.finalize())
}
