//! Run-level import configuration

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::core::field::FieldValue;
use crate::core::store::DEFAULT_CATEGORY;

/// Default processing time ceiling for one run
pub const DEFAULT_TIME_LIMIT: Duration = Duration::from_secs(300);

/// Field delimiter of an upload file
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Delimiter {
    #[default]
    Comma,
    Semicolon,
    Colon,
    Tab,
    /// The configured site default character
    Cfg,
}

impl Delimiter {
    pub fn as_str(&self) -> &'static str {
        match self {
            Delimiter::Comma => "comma",
            Delimiter::Semicolon => "semicolon",
            Delimiter::Colon => "colon",
            Delimiter::Tab => "tab",
            Delimiter::Cfg => "cfg",
        }
    }

    /// The delimiter byte, using `cfg` for the configured default
    pub fn byte(&self, cfg: u8) -> u8 {
        match self {
            Delimiter::Comma => b',',
            Delimiter::Semicolon => b';',
            Delimiter::Colon => b':',
            Delimiter::Tab => b'\t',
            Delimiter::Cfg => cfg,
        }
    }

    pub fn all() -> [Delimiter; 5] {
        [
            Delimiter::Comma,
            Delimiter::Semicolon,
            Delimiter::Colon,
            Delimiter::Tab,
            Delimiter::Cfg,
        ]
    }
}

impl fmt::Display for Delimiter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Delimiter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "comma" | "," => Ok(Delimiter::Comma),
            "semicolon" | ";" => Ok(Delimiter::Semicolon),
            "colon" | ":" => Ok(Delimiter::Colon),
            "tab" | "\t" => Ok(Delimiter::Tab),
            "cfg" => Ok(Delimiter::Cfg),
            _ => Err(format!(
                "Unsupported delimiter: '{}'. Supported: comma, semicolon, colon, tab, cfg",
                s
            )),
        }
    }
}

/// Built-in course defaults, mirroring a fresh site's course settings
pub fn builtin_defaults() -> BTreeMap<String, FieldValue> {
    let tomorrow = Utc::now().timestamp() + 24 * 3600;
    [
        ("format", FieldValue::from("weeks")),
        ("numsections", FieldValue::Int(10)),
        ("startdate", FieldValue::Int(tomorrow)),
        ("hiddensections", FieldValue::Int(0)),
        ("newsitems", FieldValue::Int(5)),
        ("showgrades", FieldValue::Int(1)),
        ("showreports", FieldValue::Int(0)),
        ("maxbytes", FieldValue::Int(0)),
        ("groupmode", FieldValue::Int(0)),
        ("groupmodeforce", FieldValue::Int(0)),
        ("defaultgroupingid", FieldValue::Int(0)),
        ("visible", FieldValue::Int(1)),
        ("lang", FieldValue::from("")),
        ("summaryformat", FieldValue::Int(1)),
    ]
    .into_iter()
    .map(|(name, value)| (name.to_string(), value))
    .collect()
}

/// Configuration for one import run; immutable while the run executes
#[derive(Debug, Clone, Serialize)]
pub struct ImportConfig {
    /// WHATWG encoding label of the upload file
    pub encoding: String,
    pub delimiter: Delimiter,
    /// Character used for `Delimiter::Cfg`
    pub cfg_delimiter: u8,
    /// Baseline values for course fields
    pub defaults: BTreeMap<String, FieldValue>,
    /// Category for rows that name none
    pub default_category: i64,
    /// Hand integer, float and boolean looking cells to the coercer pre-typed
    pub infer_types: bool,
    /// Processing time ceiling for the whole run
    #[serde(skip)]
    pub time_limit: Duration,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            encoding: "UTF-8".to_string(),
            delimiter: Delimiter::Comma,
            cfg_delimiter: b',',
            defaults: builtin_defaults(),
            default_category: DEFAULT_CATEGORY,
            infer_types: false,
            time_limit: DEFAULT_TIME_LIMIT,
        }
    }
}

impl ImportConfig {
    /// Delimiter byte for the CSV reader
    pub fn delimiter_byte(&self) -> u8 {
        self.delimiter.byte(self.cfg_delimiter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delimiter_parse_and_bytes() {
        assert_eq!("Semicolon".parse::<Delimiter>().unwrap(), Delimiter::Semicolon);
        assert_eq!(";".parse::<Delimiter>().unwrap(), Delimiter::Semicolon);
        assert!("pipe".parse::<Delimiter>().is_err());

        assert_eq!(Delimiter::Tab.byte(b','), b'\t');
        assert_eq!(Delimiter::Cfg.byte(b'|'), b'|');
        for delimiter in Delimiter::all() {
            assert_eq!(delimiter.as_str().parse::<Delimiter>().unwrap(), delimiter);
        }
    }

    #[test]
    fn test_default_config() {
        let config = ImportConfig::default();
        assert_eq!(config.encoding, "UTF-8");
        assert_eq!(config.delimiter_byte(), b',');
        assert_eq!(config.default_category, DEFAULT_CATEGORY);
        assert_eq!(config.defaults.len(), crate::upload::fields::DEFAULT_FIELDS.len());
        for field in crate::upload::fields::DEFAULT_FIELDS {
            assert!(config.defaults.contains_key(field), "missing default {}", field);
        }
    }
}
