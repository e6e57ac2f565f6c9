//! Flat JSON key/value file shared with the desktop shell.

use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::errors::{MigrateError, Result};

#[derive(Debug, Clone)]
pub struct AppStore {
    path: PathBuf,
    values: Map<String, Value>,
}

impl AppStore {
    /// Open the store at `path`. A missing or unparsable file reads as empty;
    /// the next [`AppStore::set`] rewrites it.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let values = match fs::read(&path) {
            Ok(bytes) => match serde_json::from_slice::<Value>(&bytes) {
                Ok(Value::Object(m)) => m,
                Ok(_) | Err(_) => {
                    warn!("{} is not a JSON object, starting empty", path.display());
                    Map::new()
                }
            },
            Err(_) => Map::new(),
        };
        Self { path, values }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.values.get(key).and_then(Value::as_str)
    }

    /// Set and persist immediately.
    pub fn set(&mut self, key: &str, value: impl Into<Value>) -> Result<()> {
        self.values.insert(key.to_string(), value.into());
        self.flush()
    }

    fn flush(&self) -> Result<()> {
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir).map_err(|e| MigrateError::io(dir, e))?;
        }
        let tmp = self.path.with_extension("json.tmp");
        let bytes = serde_json::to_vec_pretty(&Value::Object(self.values.clone()))?;
        fs::write(&tmp, bytes).map_err(|e| MigrateError::io(&tmp, e))?;
        fs::rename(&tmp, &self.path).map_err(|e| MigrateError::io(&self.path, e))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_persists_and_keeps_other_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, br#"{"window":{"width":800}}"#).unwrap();

        let mut store = AppStore::open(&path);
        assert_eq!(store.get_str("migrated_version"), None);
        store.set("migrated_version", "0.5.0").unwrap();

        let reopened = AppStore::open(&path);
        assert_eq!(reopened.get_str("migrated_version"), Some("0.5.0"));
        assert_eq!(reopened.get("window").unwrap()["width"], 800);
    }

    #[test]
    fn missing_or_bad_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = AppStore::open(dir.path().join("nope.json"));
        assert!(store.get("anything").is_none());

        let bad = dir.path().join("bad.json");
        fs::write(&bad, b"[1,2,3]").unwrap();
        let mut store = AppStore::open(&bad);
        assert!(store.get("0").is_none());
        store.set("k", "v").unwrap();
        assert_eq!(AppStore::open(&bad).get_str("k"), Some("v"));
    }

    #[test]
    fn non_string_values_are_not_strs() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = AppStore::open(dir.path().join("sub").join("config.json"));
        store.set("n", 3).unwrap();
        assert_eq!(store.get_str("n"), None);
        assert_eq!(store.get("n"), Some(&Value::from(3)));
    }
}
