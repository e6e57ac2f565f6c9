//! Host OS/CPU identifiers.
//!
//! The selector never looks at the running process; callers probe the host
//! once through [`HostTarget::current`] (or parse explicit names) and pass
//! the result in.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::TargetError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    MacOs,
    Windows,
    Linux,
}

impl Platform {
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::MacOs => "macos",
            Platform::Windows => "windows",
            Platform::Linux => "linux",
        }
    }

    /// Prefix of the variant folders built for this platform.
    pub fn folder_prefix(&self) -> &'static str {
        match self {
            Platform::MacOs => "mac",
            Platform::Windows => "win",
            Platform::Linux => "linux",
        }
    }

    pub fn exe_suffix(&self) -> &'static str {
        match self {
            Platform::Windows => ".exe",
            _ => "",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Accepts both Node-style (`darwin`, `win32`) and Rust-style (`macos`,
/// `windows`) names.
impl FromStr for Platform {
    type Err = TargetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "darwin" | "macos" | "mac" => Ok(Platform::MacOs),
            "win32" | "windows" | "win" => Ok(Platform::Windows),
            "linux" => Ok(Platform::Linux),
            _ => Err(TargetError::UnsupportedPlatform(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Arch {
    Arm64,
    X64,
    Other(String),
}

impl Arch {
    pub fn as_str(&self) -> &str {
        match self {
            Arch::Arm64 => "arm64",
            Arch::X64 => "x64",
            Arch::Other(s) => s,
        }
    }
}

impl fmt::Display for Arch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Arch {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_ascii_lowercase().as_str() {
            "arm64" | "aarch64" => Arch::Arm64,
            "x64" | "amd64" | "x86_64" => Arch::X64,
            other => Arch::Other(other.to_string()),
        })
    }
}

impl From<&str> for Arch {
    fn from(s: &str) -> Self {
        match s.parse::<Arch>() {
            Ok(a) => a,
            Err(never) => match never {},
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HostTarget {
    pub platform: Platform,
    pub arch: Arch,
}

static HOST: Lazy<Result<HostTarget, TargetError>> =
    Lazy::new(|| HostTarget::parse(std::env::consts::OS, std::env::consts::ARCH));

impl HostTarget {
    pub fn new(platform: Platform, arch: Arch) -> Self {
        Self { platform, arch }
    }

    pub fn parse(os: &str, arch: &str) -> Result<Self, TargetError> {
        Ok(Self {
            platform: os.parse()?,
            arch: Arch::from(arch),
        })
    }

    /// The machine we are running on. Probed once per process.
    pub fn current() -> Result<HostTarget, TargetError> {
        (*HOST).clone()
    }
}

impl fmt::Display for HostTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.platform, self.arch)
    }
}
