use ember_hwprof::{load_or_default, save_report, DriverInfo, GpuSettings, RunMode};
use ember_runtime::launch::CUDA_VISIBLE_DEVICES;
use ember_runtime::{load_state, resolve, Arch, HostTarget, LaunchEnv, Platform};
use std::ffi::OsStr;

#[test]
fn probe_report_drives_selection_and_launch_env() {
    let home = tempfile::tempdir().unwrap();
    let report_path = home.path().join("settings").join("settings.json");
    let runtime_root = home.path().join("runtimes").join("cortex");
    let bin_root = runtime_root.join("bin");
    let target = HostTarget::new(Platform::Windows, Arch::X64);

    // nothing probed yet: cpu build
    let report = load_or_default(&report_path);
    let first = resolve(&runtime_root, &bin_root, &target, &report).unwrap();
    assert!(first.changed);
    assert_eq!(
        first.selection.executable_path,
        bin_root.join("win-cpu").join("cortex-cpp.exe")
    );

    // probe finds a CUDA 11 card
    save_report(
        &report_path,
        &GpuSettings {
            run_mode: RunMode::Gpu,
            cuda: DriverInfo::present("11"),
            nvidia_driver: DriverInfo::present("12"),
            gpus_in_use: vec!["0".into()],
            ..Default::default()
        },
    )
    .unwrap();

    let report = load_or_default(&report_path);
    let second = resolve(&runtime_root, &bin_root, &target, &report).unwrap();
    assert!(second.changed);
    assert_eq!(second.selection.variant, "win-cuda-11-7");
    assert_eq!(load_state(&runtime_root).unwrap().active_variant, "win-cuda-11-7");

    let env = LaunchEnv::with_inherited(&second.selection, target.platform, None);
    assert_eq!(env.get(CUDA_VISIBLE_DEVICES), Some(OsStr::new("0")));

    // restart with the same report
    let third = resolve(&runtime_root, &bin_root, &target, &report).unwrap();
    assert!(!third.changed);
    assert_eq!(third.selection, second.selection);
}

#[test]
fn gpu_request_without_driver_is_recorded_as_fallback() {
    let home = tempfile::tempdir().unwrap();
    let report = GpuSettings {
        run_mode: RunMode::Gpu,
        cuda: DriverInfo::present("12"),
        gpus_in_use: vec!["0".into()],
        ..Default::default()
    };
    let target = HostTarget::new(Platform::Linux, Arch::Arm64);
    let r = resolve(home.path(), home.path(), &target, &report).unwrap();
    assert_eq!(r.selection.variant, "linux-cpu");
    assert_eq!(r.selection.cuda_visible_devices, "");
    let state = load_state(home.path()).unwrap();
    assert!(state.fallback.is_some());
}
