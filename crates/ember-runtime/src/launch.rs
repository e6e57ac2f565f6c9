//! Environment handed to the spawned server.

use std::ffi::{OsStr, OsString};
use std::path::Path;
use std::process::Command;

use crate::select::Selection;
use crate::target::Platform;

pub const CUDA_VISIBLE_DEVICES: &str = "CUDA_VISIBLE_DEVICES";
pub const GGML_VULKAN_DEVICE: &str = "GGML_VULKAN_DEVICE";
pub const GGML_VK_VISIBLE_DEVICES: &str = "GGML_VK_VISIBLE_DEVICES";

/// Loader search path variable for a platform.
pub fn lib_path_var(platform: Platform) -> &'static str {
    match platform {
        Platform::Windows => "PATH",
        Platform::Linux => "LD_LIBRARY_PATH",
        Platform::MacOs => "DYLD_LIBRARY_PATH",
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LaunchEnv {
    vars: Vec<(String, OsString)>,
}

impl LaunchEnv {
    /// Build from the current process environment.
    pub fn from_selection(selection: &Selection, platform: Platform) -> Self {
        let inherited = std::env::var_os(lib_path_var(platform));
        Self::with_inherited(selection, platform, inherited)
    }

    /// `CUDA_VISIBLE_DEVICES` is always set (possibly empty) so a value from
    /// the parent shell cannot widen the device set. The Vulkan variables are
    /// only set when there is something to expose. The variant folder is put
    /// first on the loader path because GPU builds ship their runtime libs
    /// next to the executable.
    pub fn with_inherited(
        selection: &Selection,
        platform: Platform,
        inherited_lib_path: Option<OsString>,
    ) -> Self {
        let mut vars = vec![(
            CUDA_VISIBLE_DEVICES.to_string(),
            OsString::from(&selection.cuda_visible_devices),
        )];
        if !selection.vk_visible_devices.is_empty() {
            for key in [GGML_VULKAN_DEVICE, GGML_VK_VISIBLE_DEVICES] {
                vars.push((key.to_string(), OsString::from(&selection.vk_visible_devices)));
            }
        }

        if let Some(dir) = selection.executable_path.parent() {
            vars.push((
                lib_path_var(platform).to_string(),
                prepend_path(dir, inherited_lib_path.as_deref()),
            ));
        }

        Self { vars }
    }

    pub fn vars(&self) -> &[(String, OsString)] {
        &self.vars
    }

    pub fn get(&self, key: &str) -> Option<&OsStr> {
        self.vars
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_os_str())
    }

    pub fn apply(&self, cmd: &mut Command) {
        for (k, v) in &self.vars {
            cmd.env(k, v);
        }
    }

    /// Ready-to-spawn command for the selected server, run from its folder.
    pub fn command<I, S>(&self, selection: &Selection, args: I) -> Command
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let mut cmd = Command::new(&selection.executable_path);
        cmd.args(args);
        if let Some(dir) = selection.executable_path.parent() {
            cmd.current_dir(dir);
        }
        self.apply(&mut cmd);
        cmd
    }
}

fn prepend_path(dir: &Path, inherited: Option<&OsStr>) -> OsString {
    let Some(rest) = inherited.filter(|v| !v.is_empty()) else {
        return dir.as_os_str().to_os_string();
    };
    let mut parts = vec![dir.to_path_buf()];
    parts.extend(std::env::split_paths(rest).filter(|p| p != dir));
    std::env::join_paths(parts).unwrap_or_else(|_| dir.as_os_str().to_os_string())
}
