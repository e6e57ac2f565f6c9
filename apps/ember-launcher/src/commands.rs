use anyhow::{Context, Result};
use ember_hwprof::{apply_env_overrides, load_or_default, GpuSettings};
use ember_migrate::{migrate as run_migration, AppStore};
use ember_runtime::{resolve, Arch, HostTarget, LaunchEnv, Platform, Selection};
use serde::Serialize;
use serde_json::json;
use std::io::Write;
use std::path::Path;
use tracing::warn;

use crate::cli::{MigrateArgs, ReportArgs, SelectArgs};

#[derive(Debug, Serialize)]
struct SelectOutput<'a> {
    platform: Platform,
    arch: String,
    #[serde(flatten)]
    selection: &'a Selection,
    /// `None` on --dry-run
    #[serde(skip_serializing_if = "Option::is_none")]
    changed: Option<bool>,
}

/// Flags win; otherwise the probed host fills in.
fn host_target(args: &SelectArgs) -> Result<HostTarget> {
    let probed = || HostTarget::current().context("cannot pick a server build for this OS");
    let platform = match &args.platform {
        Some(p) => p.parse::<Platform>()?,
        None => probed()?.platform,
    };
    let arch = match &args.arch {
        Some(a) => Arch::from(a.as_str()),
        None => probed()?.arch,
    };
    Ok(HostTarget::new(platform, arch))
}

fn load_report(path: Option<&Path>, raw: bool) -> GpuSettings {
    let report = match path {
        Some(p) => load_or_default(p),
        None => load_or_default(&ember_hwprof::gpu_report_path()),
    };
    if raw {
        report
    } else {
        apply_env_overrides(report)
    }
}

fn selection_for(args: &SelectArgs) -> Result<(HostTarget, Selection, Option<bool>)> {
    let target = host_target(args)?;
    let report = load_report(args.report.as_deref(), false);
    let bin_root = args.bin_root.clone().unwrap_or_else(ember_hwprof::bin_root);

    if args.dry_run {
        let sel = ember_runtime::select(&bin_root, target.platform, &target.arch, &report);
        if let Some(reason) = &sel.fallback {
            warn!("falling back to {}: {reason}", sel.variant);
        }
        return Ok((target, sel, None));
    }

    let runtime_root = args
        .runtime_root
        .clone()
        .unwrap_or_else(ember_hwprof::runtimes_cortex_dir);
    let r = resolve(&runtime_root, &bin_root, &target, &report)
        .with_context(|| format!("recording runtime in {}", runtime_root.display()))?;
    Ok((target, r.selection, Some(r.changed)))
}

pub fn select(args: &SelectArgs, out: &mut impl Write) -> Result<()> {
    let (target, selection, changed) = selection_for(args)?;
    let output = SelectOutput {
        platform: target.platform,
        arch: target.arch.to_string(),
        selection: &selection,
        changed,
    };
    serde_json::to_writer_pretty(&mut *out, &output)?;
    writeln!(out)?;
    Ok(())
}

pub fn env(args: &SelectArgs, out: &mut impl Write) -> Result<()> {
    let (target, selection, _) = selection_for(args)?;
    let env = LaunchEnv::from_selection(&selection, target.platform);
    for (k, v) in env.vars() {
        writeln!(out, "{k}={}", v.to_string_lossy())?;
    }
    Ok(())
}

pub fn migrate(args: &MigrateArgs, out: &mut impl Write) -> Result<()> {
    let version = args
        .app_version
        .clone()
        .unwrap_or_else(|| env!("CARGO_PKG_VERSION").to_string());
    let resources = args.resources.clone().unwrap_or_else(ember_hwprof::resources_dir);
    let data_dir = args.data_dir.clone().unwrap_or_else(ember_hwprof::ember_home);
    let store_path = args.store.clone().unwrap_or_else(ember_hwprof::app_store_path);

    let mut store = AppStore::open(&store_path);
    let report = run_migration(&mut store, &version, &resources, &data_dir)
        .with_context(|| format!("migrating themes from {}", resources.display()))?;

    let themes = report.themes.as_ref().map(|t| {
        json!({
            "added": t.added,
            "updated": t.updated,
            "unchanged": t.unchanged,
            "skipped": t.skipped,
        })
    });
    let summary = json!({
        "app_version": version,
        "previous_version": report.previous_version,
        "version_bumped": report.version_bumped,
        "themes": themes,
    });
    serde_json::to_writer_pretty(&mut *out, &summary)?;
    writeln!(out)?;
    Ok(())
}

pub fn report(args: &ReportArgs, out: &mut impl Write) -> Result<()> {
    let report = load_report(args.report.as_deref(), args.raw);
    serde_json::to_writer_pretty(&mut *out, &report)?;
    writeln!(out)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ember_hwprof::{save_report, DriverInfo, RunMode};
    use serde_json::Value;
    use std::fs;
    use std::path::PathBuf;

    fn select_args(dir: &Path, report: PathBuf, platform: &str, dry_run: bool) -> SelectArgs {
        SelectArgs {
            platform: Some(platform.into()),
            arch: Some("x64".into()),
            report: Some(report),
            bin_root: Some(dir.join("bin")),
            runtime_root: Some(dir.join("runtime")),
            dry_run,
        }
    }

    fn cuda12_report(dir: &Path) -> PathBuf {
        let path = dir.join("settings.json");
        save_report(
            &path,
            &GpuSettings {
                run_mode: RunMode::Gpu,
                cuda: DriverInfo::present("12"),
                nvidia_driver: DriverInfo::present("12"),
                gpus_in_use: vec!["0".into(), "2".into()],
                ..Default::default()
            },
        )
        .unwrap();
        path
    }

    #[test]
    fn select_prints_selection_json() {
        let dir = tempfile::tempdir().unwrap();
        let args = select_args(dir.path(), cuda12_report(dir.path()), "win32", false);
        let mut buf = Vec::new();
        select(&args, &mut buf).unwrap();

        let v: Value = serde_json::from_slice(&buf).unwrap();
        assert_eq!(v["platform"], "windows");
        assert_eq!(v["variant"], "win-cuda-12-0");
        assert_eq!(v["cuda_visible_devices"], "0,2");
        assert_eq!(v["changed"], true);
        assert!(dir.path().join("runtime/runtime.json").exists());
    }

    #[test]
    fn dry_run_leaves_runtime_json_alone() {
        let dir = tempfile::tempdir().unwrap();
        let args = select_args(dir.path(), dir.path().join("missing.json"), "darwin", true);
        let mut buf = Vec::new();
        select(&args, &mut buf).unwrap();

        let v: Value = serde_json::from_slice(&buf).unwrap();
        assert_eq!(v["variant"], "mac-amd64");
        assert!(v.get("changed").is_none());
        assert!(!dir.path().join("runtime").exists());
    }

    #[test]
    fn env_prints_device_vars() {
        let dir = tempfile::tempdir().unwrap();
        let args = select_args(dir.path(), cuda12_report(dir.path()), "linux", true);
        let mut buf = Vec::new();
        env(&args, &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.lines().any(|l| l == "CUDA_VISIBLE_DEVICES=0,2"), "{text}");
        assert!(text.lines().any(|l| l == "GGML_VULKAN_DEVICE=0,2"), "{text}");
    }

    #[test]
    fn missing_flags_fall_back_to_probed_host() {
        let dir = tempfile::tempdir().unwrap();
        let mut args = select_args(dir.path(), dir.path().join("r.json"), "linux", true);
        args.arch = None;
        let target = host_target(&args).unwrap();
        assert_eq!(target.platform, Platform::Linux);
        assert_eq!(target.arch, HostTarget::current().unwrap().arch);

        args.platform = None;
        args.arch = Some("aarch64".into());
        let target = host_target(&args).unwrap();
        assert_eq!(target.platform, HostTarget::current().unwrap().platform);
        assert_eq!(target.arch, Arch::Arm64);
    }

    #[test]
    fn bad_platform_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let args = select_args(dir.path(), dir.path().join("r.json"), "beos", true);
        let mut buf = Vec::new();
        assert!(select(&args, &mut buf).is_err());
    }

    #[test]
    fn migrate_reports_added_themes() {
        let dir = tempfile::tempdir().unwrap();
        let theme = dir.path().join("res/themes/solar");
        fs::create_dir_all(&theme).unwrap();
        fs::write(theme.join("theme.json"), r#"{"version":"1"}"#).unwrap();

        let args = MigrateArgs {
            app_version: Some("0.9.0".into()),
            resources: Some(dir.path().join("res")),
            data_dir: Some(dir.path().join("data")),
            store: Some(dir.path().join("config.json")),
        };
        let mut buf = Vec::new();
        migrate(&args, &mut buf).unwrap();
        let v: Value = serde_json::from_slice(&buf).unwrap();
        assert_eq!(v["version_bumped"], true);
        assert_eq!(v["themes"]["added"][0], "solar");

        let mut buf = Vec::new();
        migrate(&args, &mut buf).unwrap();
        let v: Value = serde_json::from_slice(&buf).unwrap();
        assert_eq!(v["version_bumped"], false);
        assert!(v["themes"].is_null());
    }

    #[test]
    fn report_raw_round_trips_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = cuda12_report(dir.path());
        let args = ReportArgs {
            report: Some(path),
            raw: true,
        };
        let mut buf = Vec::new();
        report(&args, &mut buf).unwrap();
        let got: GpuSettings = serde_json::from_slice(&buf).unwrap();
        assert_eq!(got.run_mode, RunMode::Gpu);
        assert_eq!(got.gpus_in_use, ["0", "2"]);
    }
}
