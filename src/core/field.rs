//! Typed field values shared by the upload pipeline and the record store

use serde::{Deserialize, Serialize};
use std::fmt;

/// A scalar course field value
///
/// Cells read from a CSV file arrive as `Text`; the other variants appear when
/// a caller hands the coercer pre-typed cells or when defaults come from YAML.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl FieldValue {
    /// Name of the runtime type, used in error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            FieldValue::Bool(_) => "boolean",
            FieldValue::Int(_) => "integer",
            FieldValue::Float(_) => "float",
            FieldValue::Text(_) => "string",
        }
    }

    /// Whether the value counts as empty when overlaying defaults
    ///
    /// Empty means `""`, `"0"`, `0`, `0.0` and `false`.
    pub fn is_empty(&self) -> bool {
        match self {
            FieldValue::Bool(b) => !b,
            FieldValue::Int(i) => *i == 0,
            FieldValue::Float(f) => *f == 0.0,
            FieldValue::Text(s) => s.is_empty() || s == "0",
        }
    }

    /// Integer view of the value, if it has one
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            FieldValue::Bool(b) => Some(i64::from(*b)),
            FieldValue::Int(i) => Some(*i),
            FieldValue::Float(f) if f.is_finite() => Some(f.trunc() as i64),
            FieldValue::Float(_) => None,
            FieldValue::Text(s) => s.trim().parse().ok(),
        }
    }

    /// Text view of the value
    pub fn to_text(&self) -> String {
        self.to_string()
    }

    /// Convert to a JSON value for attribute storage
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            FieldValue::Bool(b) => serde_json::Value::Bool(*b),
            FieldValue::Int(i) => serde_json::Value::from(*i),
            FieldValue::Float(f) => serde_json::Number::from_f64(*f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            FieldValue::Text(s) => serde_json::Value::String(s.clone()),
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Bool(b) => write!(f, "{}", i64::from(*b)),
            FieldValue::Int(i) => write!(f, "{}", i),
            FieldValue::Float(x) => write!(f, "{}", x),
            FieldValue::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::Text(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::Text(s)
    }
}

impl From<i64> for FieldValue {
    fn from(i: i64) -> Self {
        FieldValue::Int(i)
    }
}

impl From<bool> for FieldValue {
    fn from(b: bool) -> Self {
        FieldValue::Bool(b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_values() {
        assert!(FieldValue::from("").is_empty());
        assert!(FieldValue::from("0").is_empty());
        assert!(FieldValue::Int(0).is_empty());
        assert!(FieldValue::Float(0.0).is_empty());
        assert!(FieldValue::Bool(false).is_empty());

        assert!(!FieldValue::from("0.0").is_empty());
        assert!(!FieldValue::from(" ").is_empty());
        assert!(!FieldValue::Int(-1).is_empty());
        assert!(!FieldValue::Bool(true).is_empty());
    }

    #[test]
    fn test_as_i64() {
        assert_eq!(FieldValue::from(" 42 ").as_i64(), Some(42));
        assert_eq!(FieldValue::from("abc").as_i64(), None);
        assert_eq!(FieldValue::Bool(true).as_i64(), Some(1));
        assert_eq!(FieldValue::Float(3.9).as_i64(), Some(3));
        assert_eq!(FieldValue::Float(f64::NAN).as_i64(), None);
    }

    #[test]
    fn test_deserialize_untagged() {
        let values: Vec<FieldValue> = serde_yml::from_str("[true, 3, 1.5, weeks]").unwrap();
        assert_eq!(
            values,
            vec![
                FieldValue::Bool(true),
                FieldValue::Int(3),
                FieldValue::Float(1.5),
                FieldValue::from("weeks"),
            ]
        );
    }
}
