use dirs::data_dir;
use std::path::PathBuf;

use crate::env::env_path;

/// ~/.local/share/Ember, or $EMBER_HOME when set.
pub fn ember_home() -> PathBuf {
    if let Some(p) = env_path("EMBER_HOME") {
        return p;
    }
    data_dir()
        .unwrap_or_else(|| PathBuf::from("~/.local/share"))
        .join("Ember")
}

pub fn settings_dir() -> PathBuf {
    ember_home().join("settings")
}
/// Capability report written by the hardware probe.
pub fn gpu_report_path() -> PathBuf {
    settings_dir().join("settings.json")
}

pub fn runtimes_dir() -> PathBuf {
    ember_home().join("runtimes")
}
pub fn runtimes_cortex_dir() -> PathBuf {
    runtimes_dir().join("cortex")
}

/// Directory holding one folder per prebuilt server variant
/// (`linux-cpu`, `win-cuda-12-0`, ...). $EMBER_BIN_ROOT wins.
pub fn bin_root() -> PathBuf {
    env_path("EMBER_BIN_ROOT").unwrap_or_else(|| runtimes_cortex_dir().join("bin"))
}

/// Resources shipped with the app (bundled themes live under `themes/`).
/// $EMBER_RESOURCES_DIR, else `resources/` next to the executable.
pub fn resources_dir() -> PathBuf {
    if let Some(p) = env_path("EMBER_RESOURCES_DIR") {
        return p;
    }
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|d| d.join("resources")))
        .unwrap_or_else(|| ember_home().join("resources"))
}

/// Key/value store kept by the desktop shell (`migrated_version`, ...).
pub fn app_store_path() -> PathBuf {
    ember_home().join("config.json")
}
