//! Ember hardware capability crate.
//! Models the GPU report written by the hardware probe and caches it to
//! ~/.local/share/Ember/settings/settings.json.

pub mod cache;
pub mod env;
pub mod paths;
pub mod types;

pub use cache::{compute_fingerprint, load_cached, load_or_default, save_report};
pub use env::{apply_env_overrides, EnvOverrides};
pub use paths::{
    app_store_path, bin_root, ember_home, gpu_report_path, resources_dir, runtimes_cortex_dir,
    runtimes_dir, settings_dir,
};
pub use types::{DriverInfo, GpuDevice, GpuSettings, RunMode};
