//! ember-migrate
//!
//! One-time sync of resources bundled with a new app version into the
//! user's data folder, gated by the `migrated_version` key in the app store.

pub mod errors;
pub mod store;
pub mod themes;

pub use errors::{MigrateError, Result};
pub use store::AppStore;
pub use themes::{copy_dir_all, migrate_themes, theme_version, ThemeSummary};

use std::path::Path;
use tracing::{debug, info};

pub const MIGRATED_VERSION_KEY: &str = "migrated_version";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MigrationReport {
    /// `None` when no theme sync was needed.
    pub themes: Option<ThemeSummary>,
    /// `migrated_version` was moved to the running app version.
    pub version_bumped: bool,
    pub previous_version: Option<String>,
}

impl MigrationReport {
    pub fn ran(&self) -> bool {
        self.themes.is_some()
    }
}

/// Run the migration for `app_version`.
///
/// - stored version differs: sync themes, then record `app_version`
/// - same version but `<data_dir>/themes` is gone: sync themes only
/// - otherwise nothing happens
///
/// The version is written only after the theme sync succeeded, so a failed
/// run is retried on the next start.
pub fn migrate(
    store: &mut AppStore,
    app_version: &str,
    resources_dir: &Path,
    data_dir: &Path,
) -> Result<MigrationReport> {
    let previous = store.get_str(MIGRATED_VERSION_KEY).map(str::to_string);
    let source = resources_dir.join("themes");
    let dest = data_dir.join("themes");

    if previous.as_deref() != Some(app_version) {
        info!(
            "start migration: {} -> {app_version}",
            previous.as_deref().unwrap_or("<none>")
        );
        let themes = migrate_themes(&source, &dest)?;
        store.set(MIGRATED_VERSION_KEY, app_version)?;
        info!("migration to {app_version} done");
        return Ok(MigrationReport {
            themes: Some(themes),
            version_bumped: true,
            previous_version: previous,
        });
    }

    if !dest.exists() {
        info!("themes folder missing, restoring bundled themes");
        let themes = migrate_themes(&source, &dest)?;
        return Ok(MigrationReport {
            themes: Some(themes),
            version_bumped: false,
            previous_version: previous,
        });
    }

    debug!("already migrated to {app_version}");
    Ok(MigrationReport {
        themes: None,
        version_bumped: false,
        previous_version: previous,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;

    struct Fixture {
        _tmp: tempfile::TempDir,
        resources: PathBuf,
        data: PathBuf,
        store_path: PathBuf,
    }

    fn fixture() -> Fixture {
        let tmp = tempfile::tempdir().unwrap();
        let resources = tmp.path().join("resources");
        let data = tmp.path().join("data");
        let theme = resources.join("themes").join("night");
        fs::create_dir_all(&theme).unwrap();
        fs::write(theme.join("theme.json"), r#"{"version":"1.0.0"}"#).unwrap();
        Fixture {
            store_path: tmp.path().join("config.json"),
            resources,
            data,
            _tmp: tmp,
        }
    }

    #[test]
    fn first_run_syncs_and_records_version() {
        let f = fixture();
        let mut store = AppStore::open(&f.store_path);
        let r = migrate(&mut store, "0.5.0", &f.resources, &f.data).unwrap();
        assert!(r.ran());
        assert!(r.version_bumped);
        assert_eq!(r.previous_version, None);
        assert_eq!(r.themes.unwrap().added, ["night"]);
        assert!(f.data.join("themes/night/theme.json").exists());
        assert_eq!(
            AppStore::open(&f.store_path).get_str(MIGRATED_VERSION_KEY),
            Some("0.5.0")
        );
    }

    #[test]
    fn same_version_is_a_no_op() {
        let f = fixture();
        let mut store = AppStore::open(&f.store_path);
        migrate(&mut store, "0.5.0", &f.resources, &f.data).unwrap();
        let r = migrate(&mut store, "0.5.0", &f.resources, &f.data).unwrap();
        assert!(!r.ran());
        assert!(!r.version_bumped);
        assert_eq!(r.previous_version.as_deref(), Some("0.5.0"));
    }

    #[test]
    fn missing_themes_folder_is_restored_without_bump() {
        let f = fixture();
        let mut store = AppStore::open(&f.store_path);
        migrate(&mut store, "0.5.0", &f.resources, &f.data).unwrap();
        fs::remove_dir_all(f.data.join("themes")).unwrap();

        let r = migrate(&mut store, "0.5.0", &f.resources, &f.data).unwrap();
        assert!(r.ran());
        assert!(!r.version_bumped);
        assert!(f.data.join("themes/night").is_dir());
    }

    #[test]
    fn upgrade_updates_changed_theme() {
        let f = fixture();
        let mut store = AppStore::open(&f.store_path);
        migrate(&mut store, "0.5.0", &f.resources, &f.data).unwrap();
        fs::write(
            f.resources.join("themes/night/theme.json"),
            r#"{"version":"1.1.0"}"#,
        )
        .unwrap();

        let r = migrate(&mut store, "0.6.0", &f.resources, &f.data).unwrap();
        assert_eq!(r.previous_version.as_deref(), Some("0.5.0"));
        assert_eq!(r.themes.unwrap().updated, ["night"]);
        assert_eq!(
            theme_version(&f.data.join("themes/night")).unwrap(),
            serde_json::Value::from("1.1.0")
        );
    }

    #[test]
    fn failed_sync_does_not_record_version() {
        let tmp = tempfile::tempdir().unwrap();
        let mut store = AppStore::open(tmp.path().join("config.json"));
        // no resources/themes folder at all
        let err = migrate(&mut store, "1.0.0", &tmp.path().join("missing"), tmp.path());
        assert!(err.is_err());
        assert_eq!(store.get_str(MIGRATED_VERSION_KEY), None);
    }
}
