//! ember-runtime
//!
//! Chooses the `cortex-cpp` server build for this machine.
//! - [`select`]: pure (platform, arch, gpu report) -> executable + visible devices.
//! - [`LaunchEnv`]: the environment the process launcher injects.
//! - [`resolve`]: select + record the active variant in `runtime.json`.

pub mod errors;
pub mod launch;
pub mod select;
pub mod state;
pub mod target;

pub use errors::{Result, RuntimeError, TargetError};
pub use launch::LaunchEnv;
pub use select::{executable_name, select, variant_folder, Backend, FallbackReason, Selection};
pub use state::{load_state, resolve, save_state, Resolved, RuntimeState};
pub use target::{Arch, HostTarget, Platform};
