//! Coerced rows and course record assembly

use std::collections::BTreeMap;

use crate::core::field::FieldValue;
use crate::core::store::CourseRecord;
use crate::upload::header::HeaderMap;
use crate::upload::value::{CategoryRef, Coerced};

/// One ingested data line, keyed by canonical field name
#[derive(Debug, Clone, PartialEq)]
pub struct CoercedRow {
    /// Line number in the upload file
    pub line: usize,
    fields: BTreeMap<String, Coerced>,
}

impl CoercedRow {
    pub fn new(line: usize) -> Self {
        Self {
            line,
            fields: BTreeMap::new(),
        }
    }

    pub fn insert(&mut self, field: impl Into<String>, value: Coerced) {
        self.fields.insert(field.into(), value);
    }

    pub fn get(&self, field: &str) -> Option<&Coerced> {
        self.fields.get(field)
    }

    /// Number of cells kept for the row
    pub(crate) fn len(&self) -> usize {
        self.fields.len()
    }

    /// The row's category reference, if it has a category cell
    pub fn category(&self) -> Option<&CategoryRef> {
        match self.fields.get("category") {
            Some(Coerced::Category(category)) => Some(category),
            _ => None,
        }
    }

    /// Text of a plain field, empty when absent
    pub fn text(&self, field: &str) -> String {
        match self.fields.get(field) {
            Some(Coerced::Value(value)) => value.to_text(),
            _ => String::new(),
        }
    }

    pub fn shortname(&self) -> String {
        self.text("shortname")
    }
}

/// Build the course record for a row
///
/// Starts from the run defaults and overlays each header field whose coerced
/// value is not empty, so an empty cell keeps the default. The category is
/// always the resolved id.
pub fn build_record(
    row: &CoercedRow,
    headers: &HeaderMap,
    defaults: &BTreeMap<String, FieldValue>,
    category: i64,
) -> CourseRecord {
    let mut record = CourseRecord::new(category);
    record.fields = defaults.clone();

    for field in headers.iter() {
        if let Some(Coerced::Value(value)) = row.get(field) {
            if !value.is_empty() {
                record.set(field, value.clone());
            }
        }
    }

    record
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::upload::fields::ALLOWED_FIELDS;
    use crate::upload::header::validate_columns;

    fn headers(names: &[&str]) -> HeaderMap {
        let columns: Vec<String> = names.iter().map(|s| s.to_string()).collect();
        validate_columns(&columns, &ALLOWED_FIELDS).unwrap()
    }

    fn defaults() -> BTreeMap<String, FieldValue> {
        BTreeMap::from([
            ("format".to_string(), FieldValue::from("weeks")),
            ("visible".to_string(), FieldValue::Int(1)),
            ("lang".to_string(), FieldValue::from("en")),
        ])
    }

    #[test]
    fn test_row_values_overlay_defaults() {
        let headers = headers(&["shortname", "fullname", "format", "category"]);
        let mut row = CoercedRow::new(2);
        row.insert("shortname", Coerced::Value(FieldValue::from("CS101")));
        row.insert("fullname", Coerced::Value(FieldValue::from("Intro CS")));
        row.insert("format", Coerced::Value(FieldValue::from("topics")));
        row.insert(
            "category",
            Coerced::Category(CategoryRef::Path(vec!["Science".into()])),
        );

        let record = build_record(&row, &headers, &defaults(), 7);
        assert_eq!(record.category, 7);
        assert_eq!(record.shortname(), "CS101");
        assert_eq!(record.get("format"), Some(&FieldValue::from("topics")));
        assert_eq!(record.get("lang"), Some(&FieldValue::from("en")));
        assert!(record.get("category").is_none());
    }

    #[test]
    fn test_empty_cells_keep_defaults() {
        let headers = headers(&["shortname", "fullname", "lang", "visible"]);
        let mut row = CoercedRow::new(2);
        row.insert("shortname", Coerced::Value(FieldValue::from("CS102")));
        row.insert("fullname", Coerced::Value(FieldValue::from("Data")));
        row.insert("lang", Coerced::Value(FieldValue::from("")));
        row.insert("visible", Coerced::Value(FieldValue::from("0")));

        let record = build_record(&row, &headers, &defaults(), 1);
        assert_eq!(record.get("lang"), Some(&FieldValue::from("en")));
        assert_eq!(record.get("visible"), Some(&FieldValue::Int(1)));
    }

    #[test]
    fn test_fields_outside_the_header_are_ignored() {
        let headers = headers(&["shortname", "fullname"]);
        let mut row = CoercedRow::new(5);
        row.insert("shortname", Coerced::Value(FieldValue::from("X")));
        row.insert("fullname", Coerced::Value(FieldValue::from("Y")));
        row.insert("idnumber", Coerced::Value(FieldValue::from("stray")));

        let record = build_record(&row, &headers, &BTreeMap::new(), 1);
        assert!(record.get("idnumber").is_none());
        assert_eq!(record.fields.len(), 2);
    }

    #[test]
    fn test_row_accessors() {
        let mut row = CoercedRow::new(9);
        assert_eq!(row.len(), 0);
        row.insert("shortname", Coerced::Value(FieldValue::Int(101)));
        row.insert("category", Coerced::Category(CategoryRef::Id(3)));
        assert_eq!(row.shortname(), "101");
        assert_eq!(row.category(), Some(&CategoryRef::Id(3)));
        assert_eq!(row.text("category"), "");
        assert_eq!(row.len(), 2);
    }
}
