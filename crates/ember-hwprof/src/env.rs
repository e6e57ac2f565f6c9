use std::path::PathBuf;

use tracing::debug;

use crate::types::{GpuSettings, RunMode};

/// Non-empty env var as a path.
pub fn env_path(key: &str) -> Option<PathBuf> {
    std::env::var_os(key)
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
}

fn truthy(v: &str) -> bool {
    v == "1" || v.eq_ignore_ascii_case("true")
}

/// Operator overrides applied on top of the probe's report.
///
/// - `EMBER_FORCE_RUN_MODE=cpu|gpu`
/// - `EMBER_DISABLE_VULKAN=1`
/// - `EMBER_DISABLE_CUDA=1`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvOverrides {
    pub run_mode: Option<RunMode>,
    pub disable_vulkan: bool,
    pub disable_cuda: bool,
}

impl EnvOverrides {
    pub fn from_env() -> Self {
        Self::from_lookup(|k| std::env::var(k).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let run_mode = lookup("EMBER_FORCE_RUN_MODE").and_then(|v| match v.parse() {
            Ok(m) => Some(m),
            Err(e) => {
                debug!("ignoring EMBER_FORCE_RUN_MODE: {e}");
                None
            }
        });
        Self {
            run_mode,
            disable_vulkan: lookup("EMBER_DISABLE_VULKAN").is_some_and(|v| truthy(&v)),
            disable_cuda: lookup("EMBER_DISABLE_CUDA").is_some_and(|v| truthy(&v)),
        }
    }

    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    pub fn apply(&self, mut report: GpuSettings) -> GpuSettings {
        if let Some(mode) = self.run_mode {
            report.run_mode = mode;
        }
        if self.disable_vulkan {
            report.vulkan = false;
        }
        if self.disable_cuda {
            report.cuda.exist = false;
        }
        report
    }
}

/// Apply overrides from the process environment.
pub fn apply_env_overrides(report: GpuSettings) -> GpuSettings {
    let o = EnvOverrides::from_env();
    if !o.is_empty() {
        debug!(?o, "applying env overrides to gpu report");
    }
    o.apply(report)
}
