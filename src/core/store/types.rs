//! Record store type definitions
//!
//! Structs written to and read from the course and category tables.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::core::field::FieldValue;

/// Parent id of top-level categories
pub const ROOT_CATEGORY: i64 = 0;

/// Id of the category seeded by `init_schema`
pub const DEFAULT_CATEGORY: i64 = 1;

/// Name of the seeded default category
pub const DEFAULT_CATEGORY_NAME: &str = "Miscellaneous";

/// Course fields stored in dedicated columns; everything else goes to `attributes`
pub(crate) const COURSE_COLUMNS: [&str; 10] = [
    "fullname",
    "shortname",
    "idnumber",
    "summary",
    "format",
    "startdate",
    "visible",
    "sortorder",
    "timecreated",
    "timemodified",
];

// =========================================================================
// Write Types
// =========================================================================

/// A course ready to be persisted
#[derive(Debug, Clone, PartialEq)]
pub struct CourseRecord {
    /// Id of the category the course is placed in
    pub category: i64,
    /// Course fields keyed by canonical field name
    pub fields: BTreeMap<String, FieldValue>,
}

impl CourseRecord {
    pub fn new(category: i64) -> Self {
        Self {
            category,
            fields: BTreeMap::new(),
        }
    }

    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.fields.get(field)
    }

    pub fn set(&mut self, field: impl Into<String>, value: FieldValue) {
        self.fields.insert(field.into(), value);
    }

    /// Text of a field, empty when absent
    pub fn text(&self, field: &str) -> String {
        self.fields.get(field).map(FieldValue::to_text).unwrap_or_default()
    }

    pub fn shortname(&self) -> String {
        self.text("shortname")
    }

    pub fn fullname(&self) -> String {
        self.text("fullname")
    }
}

// =========================================================================
// Read Types
// =========================================================================

/// A category row with its resolved display path
#[derive(Debug, Clone, Serialize)]
pub struct CategoryInfo {
    pub id: i64,
    pub name: String,
    pub parent: i64,
    pub sortorder: i64,
    pub depth: i64,
    pub path: String,
    /// Names along the path joined with " / "
    pub display_path: String,
    pub coursecount: i64,
}

/// A course row for listings
#[derive(Debug, Clone, Serialize)]
pub struct CourseInfo {
    pub id: i64,
    pub category: i64,
    pub sortorder: i64,
    pub shortname: String,
    pub fullname: String,
    pub idnumber: String,
    pub startdate: i64,
    pub visible: bool,
}

/// Store-wide counts
#[derive(Debug, Clone, Default, Serialize)]
pub struct StoreStats {
    pub categories: usize,
    pub courses: usize,
    pub db_size_bytes: u64,
}
