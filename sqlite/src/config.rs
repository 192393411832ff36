//! Store configuration and location resolution.
//!
//! Defines the YAML-serializable configuration that decides where named
//! stores live on disk and which prefix their tables get.
//!
//! # Example YAML
//!
//! ```yaml
//! directory: /var/lib/myapp
//! default_name: inventory
//! extension: sqlite
//! table_prefix: inv_
//! ```
//!
//! Every field is optional; missing fields take their defaults.

use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::schema::validate_prefix;

/// Where a store keeps its data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreLocation {
    /// A file named `<name>.<extension>` in the configured directory.
    Named(String),
    /// An explicit database file path.
    Path(PathBuf),
    /// A private in-memory database, discarded on close.
    Memory,
}

impl From<&str> for StoreLocation {
    fn from(name: &str) -> Self {
        Self::Named(name.to_string())
    }
}

impl From<String> for StoreLocation {
    fn from(name: String) -> Self {
        Self::Named(name)
    }
}

impl From<PathBuf> for StoreLocation {
    fn from(path: PathBuf) -> Self {
        Self::Path(path)
    }
}

impl From<&Path> for StoreLocation {
    fn from(path: &Path) -> Self {
        Self::Path(path.to_path_buf())
    }
}

/// Store settings.
///
/// # Examples
///
/// ```
/// use shelf_sqlite::{StoreConfig, StoreLocation};
/// use std::path::PathBuf;
///
/// let config = StoreConfig {
///     directory: PathBuf::from("/tmp/data"),
///     ..StoreConfig::default()
/// };
/// assert_eq!(
///     config.resolve(&StoreLocation::from("states")),
///     Some(PathBuf::from("/tmp/data/states.sqlite"))
/// );
/// assert_eq!(config.resolve(&StoreLocation::Memory), None);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Directory holding named stores.
    pub directory: PathBuf,
    /// Name used by [`Store::open_default`](crate::Store::open_default).
    pub default_name: String,
    /// File extension of named stores, without the dot.
    pub extension: String,
    /// Prefix prepended to every collection table name.
    pub table_prefix: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("."),
            default_name: "default".to_string(),
            extension: "sqlite".to_string(),
            table_prefix: "shelf_".to_string(),
        }
    }
}

impl StoreConfig {
    /// Loads configuration from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns [`IoError`](crate::StoreError::IoError) if the file cannot be
    /// read, [`YamlError`](crate::StoreError::YamlError) if parsing fails, or
    /// [`InvalidPrefix`](crate::StoreError::InvalidPrefix) if the table
    /// prefix is unusable.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        let reader = BufReader::new(file);
        let config: Self = serde_yaml::from_reader(reader)?;
        config.validate()?;
        Ok(config)
    }

    /// Saves the configuration as YAML.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let file = std::fs::File::create(path)?;
        let writer = BufWriter::new(file);
        serde_yaml::to_writer(writer, self)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        validate_prefix(&self.table_prefix)
    }

    /// Path of the file backing a named store.
    pub fn path_for(&self, name: &str) -> PathBuf {
        self.directory.join(format!("{name}.{}", self.extension))
    }

    /// Resolves a location to a file path; `None` for in-memory stores.
    pub fn resolve(&self, location: &StoreLocation) -> Option<PathBuf> {
        match location {
            StoreLocation::Named(name) => Some(self.path_for(name)),
            StoreLocation::Path(path) => Some(path.clone()),
            StoreLocation::Memory => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = StoreConfig::default();
        assert_eq!(config.table_prefix, "shelf_");
        assert_eq!(config.path_for("default"), PathBuf::from("./default.sqlite"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let config: StoreConfig = serde_yaml::from_str("table_prefix: app_\n").unwrap();
        assert_eq!(config.table_prefix, "app_");
        assert_eq!(config.default_name, "default");
        assert_eq!(config.extension, "sqlite");
    }

    #[test]
    fn test_load_rejects_bad_prefix() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.yml");
        std::fs::write(&path, "table_prefix: \"drop;--\"\n").unwrap();
        assert!(StoreConfig::load(&path).is_err());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.yml");
        let config = StoreConfig {
            directory: dir.path().to_path_buf(),
            default_name: "inventory".into(),
            extension: "db".into(),
            table_prefix: "inv_".into(),
        };
        config.save(&path).unwrap();
        assert_eq!(StoreConfig::load(&path).unwrap(), config);
    }

    #[test]
    fn test_location_conversions() {
        assert_eq!(StoreLocation::from("a"), StoreLocation::Named("a".into()));
        assert_eq!(
            StoreLocation::from(Path::new("/x/y.db")),
            StoreLocation::Path(PathBuf::from("/x/y.db"))
        );
    }
}
