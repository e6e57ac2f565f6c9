use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Where inference should execute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunMode {
    #[default]
    Cpu,
    Gpu,
}

impl RunMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunMode::Cpu => "cpu",
            RunMode::Gpu => "gpu",
        }
    }
}

impl fmt::Display for RunMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RunMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cpu" => Ok(RunMode::Cpu),
            "gpu" => Ok(RunMode::Gpu),
            other => Err(format!("unknown run mode '{other}' (expected cpu or gpu)")),
        }
    }
}

/// Presence + version of a driver or toolkit (CUDA runtime, NVIDIA driver).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DriverInfo {
    #[serde(default)]
    pub exist: bool,
    #[serde(default)]
    pub version: Option<String>,
}

impl DriverInfo {
    pub fn present(version: impl Into<String>) -> Self {
        Self {
            exist: true,
            version: Some(version.into()),
        }
    }

    /// Leading numeric component of the version ("12.2" -> 12).
    pub fn major_version(&self) -> Option<u32> {
        let v = self.version.as_deref()?.trim();
        v.split('.').next()?.trim().parse().ok()
    }
}

/// One GPU as seen by the probe.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GpuDevice {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub vram: String, // byte count, string-encoded by the probe
}

impl GpuDevice {
    pub fn vram_bytes(&self) -> Option<u64> {
        self.vram.trim().parse().ok()
    }
}

/// Capability report produced by the hardware probe.
///
/// Field names follow the probe's `settings.json`. Anything missing from the
/// file falls back to [`GpuSettings::default`], which is a CPU-only report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GpuSettings {
    pub run_mode: RunMode,
    pub vulkan: bool,
    pub cuda: DriverInfo,
    pub nvidia_driver: DriverInfo,
    pub gpus: Vec<GpuDevice>,
    pub gpus_in_use: Vec<String>,
    pub gpu_highest_vram: String,
    pub is_initial: bool,
    pub notify: bool,
}

impl Default for GpuSettings {
    fn default() -> Self {
        Self {
            run_mode: RunMode::Cpu,
            vulkan: false,
            cuda: DriverInfo::default(),
            nvidia_driver: DriverInfo::default(),
            gpus: Vec::new(),
            gpus_in_use: Vec::new(),
            gpu_highest_vram: String::new(),
            is_initial: true,
            notify: true,
        }
    }
}

impl GpuSettings {
    /// Comma-joined ids of the GPUs selected for use ("" when none).
    pub fn visible_devices(&self) -> String {
        self.gpus_in_use.join(",")
    }

    /// CUDA runtime and NVIDIA driver both reported.
    pub fn highest_vram_bytes(&self) -> Option<u64> {
        self.gpu_highest_vram.trim().parse().ok()
    }

    /// Descriptors for the ids in `gpus_in_use`, in selection order.
    /// Ids the probe did not describe are skipped.
    pub fn devices_in_use(&self) -> Vec<&GpuDevice> {
        self.gpus_in_use
            .iter()
            .filter_map(|id| self.gpus.iter().find(|g| &g.id == id))
            .collect()
    }
}
