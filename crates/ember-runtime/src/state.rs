//! `runtime.json`: which server variant is active and for which report.

use chrono::Utc;
use ember_hwprof::{compute_fingerprint, GpuSettings};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::errors::{Result, RuntimeError};
use crate::select::{select, Backend, FallbackReason, Selection};
use crate::target::{HostTarget, Platform};

pub const STATE_SCHEMA: u32 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuntimeState {
    pub schema: u32,
    pub platform: Platform,
    pub arch: String,
    pub bin_root: PathBuf,
    pub active_variant: String,
    pub backend: Backend,
    pub executable_path: PathBuf,
    pub cuda_visible_devices: String,
    pub vk_visible_devices: String,
    #[serde(default)]
    pub fallback: Option<FallbackReason>,
    /// Fingerprint of the gpu report the selection was made from.
    pub fingerprint: String,
    pub created_at: String,
    pub updated_at: String,
}

impl RuntimeState {
    pub fn selection(&self) -> Selection {
        Selection {
            executable_path: self.executable_path.clone(),
            variant: self.active_variant.clone(),
            backend: self.backend,
            cuda_visible_devices: self.cuda_visible_devices.clone(),
            vk_visible_devices: self.vk_visible_devices.clone(),
            fallback: self.fallback.clone(),
        }
    }

    fn matches(&self, target: &HostTarget, bin_root: &Path, fingerprint: &str) -> bool {
        self.schema == STATE_SCHEMA
            && self.platform == target.platform
            && self.arch == target.arch.as_str()
            && self.bin_root == bin_root
            && self.fingerprint == fingerprint
    }
}

/// Outcome of [`resolve`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved {
    pub selection: Selection,
    /// True when the active variant or its devices differ from what
    /// `runtime.json` held before (or there was no file).
    pub changed: bool,
}

pub fn runtime_json_path(root: &Path) -> PathBuf {
    root.join("runtime.json")
}

pub fn load_state(root: &Path) -> Option<RuntimeState> {
    let bytes = fs::read(runtime_json_path(root)).ok()?;
    match serde_json::from_slice::<RuntimeState>(&bytes) {
        Ok(s) => Some(s),
        Err(e) => {
            warn!("ignoring unreadable runtime.json in {}: {e}", root.display());
            None
        }
    }
}

pub fn save_state(root: &Path, state: &RuntimeState) -> Result<()> {
    fs::create_dir_all(root)?;
    let path = runtime_json_path(root);
    let tmp = root.join("runtime.json.tmp");
    fs::write(&tmp, serde_json::to_vec_pretty(state)?)?;
    fs::rename(&tmp, &path).map_err(|e| {
        RuntimeError::Msg(format!("failed to move runtime.json into {}: {e}", root.display()))
    })?;
    Ok(())
}

fn warn_if_fallback(selection: &Selection) {
    if let Some(reason) = &selection.fallback {
        warn!(
            variant = %selection.variant,
            "gpu run mode requested but falling back to cpu: {reason}"
        );
    }
}

/// Select the server for `target`, reusing `runtime.json` when it was
/// written for the same host, bin root and report. Otherwise the file is
/// rewritten with the fresh selection (keeping its original `created_at`).
pub fn resolve(
    root: &Path,
    bin_root: &Path,
    target: &HostTarget,
    report: &GpuSettings,
) -> Result<Resolved> {
    let fingerprint = compute_fingerprint(report);
    let previous = load_state(root);

    if let Some(prev) = &previous {
        if prev.matches(target, bin_root, &fingerprint) {
            debug!(variant = %prev.active_variant, "runtime.json is current");
            let selection = prev.selection();
            warn_if_fallback(&selection);
            return Ok(Resolved {
                selection,
                changed: false,
            });
        }
    }

    let selection = select(bin_root, target.platform, &target.arch, report);
    warn_if_fallback(&selection);

    let changed = previous
        .as_ref()
        .map(|p| p.selection() != selection)
        .unwrap_or(true);

    let now = Utc::now().to_rfc3339();
    let state = RuntimeState {
        schema: STATE_SCHEMA,
        platform: target.platform,
        arch: target.arch.to_string(),
        bin_root: bin_root.to_path_buf(),
        active_variant: selection.variant.clone(),
        backend: selection.backend,
        executable_path: selection.executable_path.clone(),
        cuda_visible_devices: selection.cuda_visible_devices.clone(),
        vk_visible_devices: selection.vk_visible_devices.clone(),
        fallback: selection.fallback.clone(),
        fingerprint,
        created_at: previous
            .map(|p| p.created_at)
            .unwrap_or_else(|| now.clone()),
        updated_at: now,
    };
    save_state(root, &state)?;
    info!(
        variant = %state.active_variant,
        devices = %state.cuda_visible_devices,
        changed,
        "recorded active runtime"
    );

    Ok(Resolved { selection, changed })
}
