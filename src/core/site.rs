//! Site discovery and structure
//!
//! A site is any directory holding a `.cupload/` folder with the site config
//! and the record store.

use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::core::store::{SqliteStore, StoreError};

/// Name of the site metadata directory
pub const SITE_DIR: &str = ".cupload";

/// Represents a cupload site
#[derive(Debug)]
pub struct Site {
    /// Root directory of the site (parent of .cupload/)
    root: PathBuf,
}

impl Site {
    /// Find the site root by walking up from the current directory
    pub fn discover() -> Result<Self, SiteError> {
        let current = std::env::current_dir().map_err(|e| SiteError::IoError(e.to_string()))?;
        Self::discover_from(&current)
    }

    /// Find the site root by walking up from the given directory
    pub fn discover_from(start: &Path) -> Result<Self, SiteError> {
        let mut current = start
            .canonicalize()
            .map_err(|e| SiteError::IoError(e.to_string()))?;

        loop {
            if current.join(SITE_DIR).is_dir() {
                return Ok(Self { root: current });
            }

            if !current.pop() {
                return Err(SiteError::NotFound {
                    searched_from: start.to_path_buf(),
                });
            }
        }
    }

    /// Locate a site from an explicit path, or discover one from the current directory
    pub fn locate(explicit: Option<&Path>) -> Result<Self, SiteError> {
        match explicit {
            Some(path) => Self::discover_from(path),
            None => Self::discover(),
        }
    }

    /// Create a new site at the given path
    pub fn init(path: &Path) -> Result<Self, SiteError> {
        let root = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
        if root.join(SITE_DIR).exists() {
            return Err(SiteError::AlreadyExists(root));
        }
        Self::write_structure(root)
    }

    /// Initialize even if .cupload/ exists; the store is kept, the config rewritten
    pub fn init_force(path: &Path) -> Result<Self, SiteError> {
        let root = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
        Self::write_structure(root)
    }

    fn write_structure(root: PathBuf) -> Result<Self, SiteError> {
        let site_dir = root.join(SITE_DIR);
        std::fs::create_dir_all(&site_dir).map_err(|e| SiteError::IoError(e.to_string()))?;

        std::fs::write(site_dir.join("config.yaml"), Self::default_config())
            .map_err(|e| SiteError::IoError(e.to_string()))?;

        let site = Self { root };
        site.open_store()?;
        Ok(site)
    }

    fn default_config() -> &'static str {
        r#"# cupload site configuration

# Character encoding of upload files (any WHATWG label)
# encoding: UTF-8

# Delimiter: comma, semicolon, colon, tab or cfg
# delimiter: comma

# Character used when the delimiter is `cfg`
# csv_delimiter: ","

# Category for rows without a category column
# default_category: 1

# Processing time ceiling for one import run, in seconds
# time_limit_secs: 300

# Course defaults applied to fields a row leaves empty
# defaults:
#   format: weeks
#   numsections: 10
#   visible: 1
"#
    }

    /// Get the site root directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Get the .cupload directory
    pub fn site_dir(&self) -> PathBuf {
        self.root.join(SITE_DIR)
    }

    /// Path of the site config file
    pub fn config_path(&self) -> PathBuf {
        self.site_dir().join("config.yaml")
    }

    /// Path of the record store file
    pub fn store_path(&self) -> PathBuf {
        self.site_dir().join("store.db")
    }

    /// Open the site's record store
    pub fn open_store(&self) -> Result<SqliteStore, SiteError> {
        Ok(SqliteStore::open(&self.store_path())?)
    }
}

/// Errors that can occur during site operations
#[derive(Debug, Error)]
pub enum SiteError {
    #[error("not a cupload site (searched from {searched_from:?}). Run 'cupload init' to create one.")]
    NotFound { searched_from: PathBuf },

    #[error("cupload site already exists at {0:?}")]
    AlreadyExists(PathBuf),

    #[error("IO error: {0}")]
    IoError(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_site_init_creates_structure() {
        let tmp = tempdir().unwrap();
        let site = Site::init(tmp.path()).unwrap();

        assert!(site.site_dir().is_dir());
        assert!(site.config_path().exists());
        assert!(site.store_path().exists());
    }

    #[test]
    fn test_site_init_fails_if_exists() {
        let tmp = tempdir().unwrap();
        Site::init(tmp.path()).unwrap();

        let err = Site::init(tmp.path()).unwrap_err();
        assert!(matches!(err, SiteError::AlreadyExists(_)));
        assert!(Site::init_force(tmp.path()).is_ok());
    }

    #[test]
    fn test_site_discover_walks_up() {
        let tmp = tempdir().unwrap();
        Site::init(tmp.path()).unwrap();

        let subdir = tmp.path().join("uploads/2024");
        std::fs::create_dir_all(&subdir).unwrap();

        let site = Site::discover_from(&subdir).unwrap();
        assert_eq!(
            site.root().canonicalize().unwrap(),
            tmp.path().canonicalize().unwrap()
        );
    }

    #[test]
    fn test_site_discover_fails_without_site_dir() {
        let tmp = tempdir().unwrap();
        let err = Site::locate(Some(tmp.path())).unwrap_err();
        assert!(matches!(err, SiteError::NotFound { .. }));
    }
}
