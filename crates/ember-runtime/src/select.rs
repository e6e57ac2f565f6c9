//! Picks which prebuilt `cortex-cpp` build to launch.
//!
//! Layout under the bin root is one folder per variant:
//! `mac-arm64`, `mac-amd64`, `{win,linux}-cpu`, `{win,linux}-vulkan`,
//! `{win,linux}-cuda-11-7`, `{win,linux}-cuda-12-0`.

use ember_hwprof::{GpuSettings, RunMode};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::target::{Arch, Platform};

pub const SERVER_BASENAME: &str = "cortex-cpp";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Backend {
    Cpu,
    Vulkan,
    #[serde(rename = "cuda-11")]
    Cuda11,
    #[serde(rename = "cuda-12")]
    Cuda12,
}

impl Backend {
    /// Folder suffix after the platform prefix.
    pub fn folder_suffix(&self) -> &'static str {
        match self {
            Backend::Cpu => "cpu",
            Backend::Vulkan => "vulkan",
            Backend::Cuda11 => "cuda-11-7",
            Backend::Cuda12 => "cuda-12-0",
        }
    }

    pub fn is_gpu(&self) -> bool {
        !matches!(self, Backend::Cpu)
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.folder_suffix())
    }
}

/// Why a GPU request ended up on the CPU build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", content = "detail", rename_all = "snake_case")]
pub enum FallbackReason {
    CudaMissing,
    NvidiaDriverMissing,
    UnsupportedCudaVersion(Option<String>),
}

impl fmt::Display for FallbackReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FallbackReason::CudaMissing => f.write_str("gpu requested but CUDA was not found"),
            FallbackReason::NvidiaDriverMissing => {
                f.write_str("gpu requested but no NVIDIA driver was found")
            }
            FallbackReason::UnsupportedCudaVersion(Some(v)) => {
                write!(f, "no server build for CUDA version '{v}'")
            }
            FallbackReason::UnsupportedCudaVersion(None) => {
                f.write_str("CUDA reported without a version")
            }
        }
    }
}

/// Which executable to start and which GPUs it may see.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    pub executable_path: PathBuf,
    pub variant: String,
    pub backend: Backend,
    pub cuda_visible_devices: String,
    pub vk_visible_devices: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback: Option<FallbackReason>,
}

impl Selection {
    pub fn is_fallback(&self) -> bool {
        self.fallback.is_some()
    }
}

/// `cortex-cpp` plus the platform's executable suffix.
pub fn executable_name(platform: Platform) -> String {
    format!("{SERVER_BASENAME}{}", platform.exe_suffix())
}

/// Folder name of a variant. macOS ships CPU builds only, keyed by arch.
pub fn variant_folder(platform: Platform, arch: &Arch, backend: Backend) -> String {
    match platform {
        Platform::MacOs => match arch {
            Arch::Arm64 => "mac-arm64".to_string(),
            _ => "mac-amd64".to_string(),
        },
        _ => format!("{}-{}", platform.folder_prefix(), backend.folder_suffix()),
    }
}

/// Decide the backend for Windows/Linux.
fn choose_backend(report: &GpuSettings) -> (Backend, Option<FallbackReason>) {
    if report.run_mode == RunMode::Cpu {
        return (Backend::Cpu, None);
    }
    if report.vulkan {
        return (Backend::Vulkan, None);
    }
    if !report.cuda.exist {
        return (Backend::Cpu, Some(FallbackReason::CudaMissing));
    }
    if !report.nvidia_driver.exist {
        return (Backend::Cpu, Some(FallbackReason::NvidiaDriverMissing));
    }
    match report.cuda.major_version() {
        Some(11) => (Backend::Cuda11, None),
        Some(12) => (Backend::Cuda12, None),
        _ => (
            Backend::Cpu,
            Some(FallbackReason::UnsupportedCudaVersion(
                report.cuda.version.clone(),
            )),
        ),
    }
}

/// Pick the server build for `platform`/`arch` given the probe's report.
///
/// Never fails: anything that cannot run on a GPU build lands on the
/// platform's CPU build, with [`Selection::fallback`] saying why when a GPU
/// was asked for. Device lists stay empty unless a GPU build is chosen.
pub fn select(bin_root: &Path, platform: Platform, arch: &Arch, report: &GpuSettings) -> Selection {
    let (backend, fallback) = match platform {
        Platform::MacOs => (Backend::Cpu, None),
        Platform::Windows | Platform::Linux => choose_backend(report),
    };

    let devices = if backend.is_gpu() {
        report.visible_devices()
    } else {
        String::new()
    };

    let variant = variant_folder(platform, arch, backend);
    let executable_path = bin_root.join(&variant).join(executable_name(platform));

    Selection {
        executable_path,
        variant,
        backend,
        cuda_visible_devices: devices.clone(),
        vk_visible_devices: devices,
        fallback,
    }
}
