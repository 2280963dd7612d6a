//! Configuration management with layered hierarchy

use miette::Diagnostic;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::core::field::FieldValue;
use crate::core::site::Site;
use crate::upload::config::{Delimiter, ImportConfig};

/// cupload configuration with layered hierarchy
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Encoding label of upload files
    pub encoding: Option<String>,

    /// Field delimiter of upload files
    pub delimiter: Option<Delimiter>,

    /// Character used when the delimiter is `cfg`
    pub csv_delimiter: Option<String>,

    /// Category for rows that name none
    pub default_category: Option<i64>,

    /// Processing time ceiling for one run, in seconds
    pub time_limit_secs: Option<u64>,

    /// Pre-type numeric and boolean looking cells
    pub infer_types: Option<bool>,

    /// Course field defaults; merged key by key over the built-in ones
    pub defaults: BTreeMap<String, FieldValue>,
}

impl Config {
    /// Load configuration from all sources, merging in priority order
    pub fn load(site: Option<&Site>) -> Self {
        let mut config = Config::default();

        // Global user config (~/.config/cupload/config.yaml)
        if let Some(global_path) = Self::global_config_path() {
            if let Some(global) = Self::read_file(&global_path) {
                config.merge(global);
            }
        }

        // Site config (.cupload/config.yaml)
        if let Some(site) = site {
            if let Some(site_config) = Self::read_file(&site.config_path()) {
                config.merge(site_config);
            }
        }

        config.apply_env(|key| std::env::var(key).ok());
        config
    }

    /// Parse a config file, `None` when it is absent or unreadable
    fn read_file(path: &Path) -> Option<Config> {
        if !path.exists() {
            return None;
        }
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "could not read config file");
                return None;
            }
        };
        match serde_yml::from_str::<Config>(&contents) {
            Ok(config) => Some(config),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "ignoring malformed config file");
                None
            }
        }
    }

    /// Override from `CUPLOAD_ENCODING` and `CUPLOAD_DELIMITER`
    fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(encoding) = var("CUPLOAD_ENCODING") {
            self.encoding = Some(encoding);
        }
        if let Some(delimiter) = var("CUPLOAD_DELIMITER") {
            match delimiter.parse::<Delimiter>() {
                Ok(d) => self.delimiter = Some(d),
                Err(e) => tracing::warn!(value = %delimiter, "ignoring CUPLOAD_DELIMITER: {}", e),
            }
        }
    }

    /// Get the path to the global config file
    fn global_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "cupload")
            .map(|dirs| dirs.config_dir().join("config.yaml"))
    }

    /// Merge another config into this one (other takes precedence)
    pub fn merge(&mut self, other: Config) {
        if other.encoding.is_some() {
            self.encoding = other.encoding;
        }
        if other.delimiter.is_some() {
            self.delimiter = other.delimiter;
        }
        if other.csv_delimiter.is_some() {
            self.csv_delimiter = other.csv_delimiter;
        }
        if other.default_category.is_some() {
            self.default_category = other.default_category;
        }
        if other.time_limit_secs.is_some() {
            self.time_limit_secs = other.time_limit_secs;
        }
        if other.infer_types.is_some() {
            self.infer_types = other.infer_types;
        }
        self.defaults.extend(other.defaults);
    }

    /// Build the settings for an import run
    pub fn import_config(&self) -> Result<ImportConfig, ConfigError> {
        let mut import = ImportConfig::default();

        if let Some(ref encoding) = self.encoding {
            import.encoding = encoding.clone();
        }
        if let Some(delimiter) = self.delimiter {
            import.delimiter = delimiter;
        }
        if let Some(ref csv_delimiter) = self.csv_delimiter {
            import.cfg_delimiter = single_byte(csv_delimiter)?;
        }
        if let Some(category) = self.default_category {
            import.default_category = category;
        }
        if let Some(secs) = self.time_limit_secs {
            import.time_limit = Duration::from_secs(secs);
        }
        if let Some(infer) = self.infer_types {
            import.infer_types = infer;
        }
        for (field, value) in &self.defaults {
            import.defaults.insert(field.clone(), value.clone());
        }

        Ok(import)
    }
}

fn single_byte(value: &str) -> Result<u8, ConfigError> {
    match value.as_bytes() {
        [b] if b.is_ascii() => Ok(*b),
        _ => Err(ConfigError::Invalid {
            key: "csv_delimiter".to_string(),
            message: format!("expected a single ASCII character, got {:?}", value),
        }),
    }
}

/// Errors raised while turning configuration into run settings
#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    #[error("invalid config value for '{key}': {message}")]
    #[diagnostic(code(cupload::config::invalid))]
    Invalid { key: String, message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(yaml: &str) -> Config {
        serde_yml::from_str(yaml).unwrap()
    }

    #[test]
    fn test_site_values_override_global() {
        let mut config = parse("encoding: ISO-8859-1\ndelimiter: semicolon\ndefaults:\n  format: topics\n");
        config.merge(parse("delimiter: tab\ndefaults:\n  numsections: 4\n"));

        assert_eq!(config.encoding.as_deref(), Some("ISO-8859-1"));
        assert_eq!(config.delimiter, Some(Delimiter::Tab));
        assert_eq!(config.defaults.get("format"), Some(&FieldValue::from("topics")));
        assert_eq!(config.defaults.get("numsections"), Some(&FieldValue::Int(4)));
    }

    #[test]
    fn test_env_overrides() {
        let mut config = parse("delimiter: comma\n");
        config.apply_env(|key| match key {
            "CUPLOAD_ENCODING" => Some("windows-1252".to_string()),
            "CUPLOAD_DELIMITER" => Some(";".to_string()),
            _ => None,
        });
        assert_eq!(config.encoding.as_deref(), Some("windows-1252"));
        assert_eq!(config.delimiter, Some(Delimiter::Semicolon));

        config.apply_env(|key| (key == "CUPLOAD_DELIMITER").then(|| "pipe".to_string()));
        assert_eq!(config.delimiter, Some(Delimiter::Semicolon));
    }

    #[test]
    fn test_import_config_from_layers() {
        let config = parse(
            "delimiter: cfg\ncsv_delimiter: \"|\"\ndefault_category: 4\ntime_limit_secs: 20\ndefaults:\n  format: social\n",
        );
        let import = config.import_config().unwrap();

        assert_eq!(import.delimiter_byte(), b'|');
        assert_eq!(import.default_category, 4);
        assert_eq!(import.time_limit, Duration::from_secs(20));
        assert_eq!(import.defaults.get("format"), Some(&FieldValue::from("social")));
        // built-in defaults survive
        assert!(import.defaults.contains_key("numsections"));
    }

    #[test]
    fn test_unknown_keys_are_ignored() {
        let config = parse("default_format: json\nencoding: UTF-16LE\n");
        assert_eq!(config.encoding.as_deref(), Some("UTF-16LE"));
        assert_eq!(config.import_config().unwrap().encoding, "UTF-16LE");
    }

    #[test]
    fn test_bad_cfg_delimiter() {
        let config = parse("csv_delimiter: \"::\"\n");
        assert!(matches!(config.import_config(), Err(ConfigError::Invalid { .. })));
    }
}
