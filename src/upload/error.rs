//! Upload error types
//!
//! `UploadError` is always fatal: the run stops and nothing past the failing
//! point is processed. Per-row problems are `Notice`s, not errors.

use miette::Diagnostic;
use thiserror::Error;

use crate::core::store::StoreError;

/// Fatal errors that abort an import run
#[derive(Debug, Error, Diagnostic)]
pub enum UploadError {
    #[error("cannot read the upload file: {0}")]
    #[diagnostic(code(cupload::upload::cannot_read))]
    CannotReadFile(String),

    #[error("unknown character encoding '{0}'")]
    #[diagnostic(
        code(cupload::upload::encoding),
        help("use a WHATWG encoding label such as UTF-8, ISO-8859-1 or windows-1252")
    )]
    UnknownEncoding(String),

    #[error("malformed CSV: {0}")]
    #[diagnostic(code(cupload::upload::csv))]
    Csv(String),

    #[error("the header row has {0} column(s); at least 2 are needed")]
    #[diagnostic(code(cupload::upload::few_columns))]
    TooFewColumns(usize),

    #[error("invalid field name '{0}' in the header row")]
    #[diagnostic(
        code(cupload::upload::invalid_field),
        help("run `cupload template --all` to list the accepted field names")
    )]
    InvalidFieldName(String),

    #[error("duplicate field name '{0}' in the header row")]
    #[diagnostic(code(cupload::upload::duplicate_field))]
    DuplicateFieldName(String),

    #[error("required field(s) missing from the header row: {}", .0.join(","))]
    #[diagnostic(code(cupload::upload::field_required))]
    FieldRequired(Vec<String>),

    #[error("error on line {line}: {reason}")]
    #[diagnostic(code(cupload::upload::line))]
    ErrorOnLine {
        line: usize,
        #[source]
        reason: LineError,
    },

    #[error("did not find any courses to upload")]
    #[diagnostic(code(cupload::upload::no_courses))]
    NoCourses,

    #[error("import exceeded the {limit_secs}s time limit")]
    #[diagnostic(
        code(cupload::upload::time_limit),
        help("raise it with --time-limit or time_limit_secs in the site config")
    )]
    TimeLimitExceeded { limit_secs: u64 },

    #[error(transparent)]
    #[diagnostic(transparent)]
    Store(#[from] StoreError),
}

/// Why a data line could not be ingested
#[derive(Debug, Error)]
pub enum LineError {
    #[error("{cells} cells but only {fields} header fields")]
    TooManyColumns { cells: usize, fields: usize },

    #[error(transparent)]
    Coerce(#[from] CoerceError),
}

/// A cell value that failed validation
#[derive(Debug, Error)]
pub enum CoerceError {
    #[error("category {0} does not exist")]
    UnknownCategory(i64),

    #[error("category must be an id or a path, got a {0}")]
    InvalidCategory(&'static str),

    #[error("cannot parse '{0}' as a date")]
    InvalidDate(String),

    #[error("startdate must be a timestamp or a date, got a {0}")]
    InvalidDateType(&'static str),

    #[error(transparent)]
    Store(#[from] StoreError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_error_message_names_line() {
        let err = UploadError::ErrorOnLine {
            line: 3,
            reason: LineError::TooManyColumns { cells: 4, fields: 3 },
        };
        assert_eq!(
            err.to_string(),
            "error on line 3: 4 cells but only 3 header fields"
        );
    }

    #[test]
    fn test_field_required_lists_fields() {
        let err = UploadError::FieldRequired(vec!["fullname".into(), "shortname".into()]);
        assert!(err.to_string().ends_with("fullname,shortname"));
    }
}
