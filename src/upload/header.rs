//! Header row validation

use crate::upload::error::UploadError;

/// Canonical field names of an upload file, indexed by column
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderMap {
    fields: Vec<String>,
}

impl HeaderMap {
    /// Number of columns
    pub(crate) fn len(&self) -> usize {
        self.fields.len()
    }

    /// Field name of a column
    pub fn field(&self, index: usize) -> Option<&str> {
        self.fields.get(index).map(String::as_str)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.fields.iter().any(|f| f == field)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(String::as_str)
    }

    /// Required fields this header lacks, in the order given
    pub fn missing<'a>(&self, required: &[&'a str]) -> Vec<&'a str> {
        required
            .iter()
            .copied()
            .filter(|field| !self.contains(field))
            .collect()
    }
}

/// Validate a header row against the allowed field names
///
/// Names are matched case-insensitively and canonicalized to lower case. The
/// row must have at least two columns, and no two columns may share a name.
pub fn validate_columns(columns: &[String], allowed: &[&str]) -> Result<HeaderMap, UploadError> {
    if columns.is_empty() {
        return Err(UploadError::CannotReadFile(
            "the file has no header row".to_string(),
        ));
    }
    if columns.len() < 2 {
        return Err(UploadError::TooFewColumns(columns.len()));
    }

    let mut fields: Vec<String> = Vec::with_capacity(columns.len());
    for column in columns {
        let canonical = column.to_lowercase();
        if !allowed.contains(&canonical.as_str()) {
            return Err(UploadError::InvalidFieldName(column.clone()));
        }
        if fields.contains(&canonical) {
            return Err(UploadError::DuplicateFieldName(canonical));
        }
        fields.push(canonical);
    }

    Ok(HeaderMap { fields })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::upload::fields::{ALLOWED_FIELDS, REQUIRED_FIELDS};

    fn columns(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_valid_header_is_canonicalized_in_order() {
        let header = validate_columns(&columns(&["ShortName", "FULLNAME", "category"]), &ALLOWED_FIELDS)
            .unwrap();
        let fields: Vec<&str> = header.iter().collect();
        assert_eq!(fields, vec!["shortname", "fullname", "category"]);
        assert_eq!(header.len(), 3);
        assert_eq!(header.field(1), Some("fullname"));
        assert_eq!(header.field(3), None);
    }

    #[test]
    fn test_empty_header_fails() {
        let err = validate_columns(&[], &ALLOWED_FIELDS).unwrap_err();
        assert!(matches!(err, UploadError::CannotReadFile(_)));
    }

    #[test]
    fn test_single_column_fails() {
        let err = validate_columns(&columns(&["shortname"]), &ALLOWED_FIELDS).unwrap_err();
        assert!(matches!(err, UploadError::TooFewColumns(1)));
    }

    #[test]
    fn test_unknown_field_is_named() {
        let err = validate_columns(&columns(&["shortname", "Colour"]), &ALLOWED_FIELDS).unwrap_err();
        match err {
            UploadError::InvalidFieldName(name) => assert_eq!(name, "Colour"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_case_insensitive_duplicate_fails() {
        let err = validate_columns(&columns(&["shortname", "fullname", "SHORTNAME"]), &ALLOWED_FIELDS)
            .unwrap_err();
        match err {
            UploadError::DuplicateFieldName(name) => assert_eq!(name, "shortname"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_missing_required_fields() {
        let header = validate_columns(&columns(&["shortname", "category"]), &ALLOWED_FIELDS).unwrap();
        assert_eq!(header.missing(&REQUIRED_FIELDS), vec!["fullname"]);

        let header = validate_columns(&columns(&["fullname", "shortname"]), &ALLOWED_FIELDS).unwrap();
        assert!(header.missing(&REQUIRED_FIELDS).is_empty());
    }
}
