//! Bulk course upload
//!
//! Reads a delimited text file of course rows, validates it as a whole and
//! then creates the courses and any missing categories in a record store.

pub mod category;
pub mod config;
pub mod error;
pub mod fields;
pub mod header;
pub mod importer;
pub mod reader;
pub mod record;
pub mod value;

#[cfg(test)]
mod testing;

pub use category::{CategoryResolver, Lookup, PathOutcome, PathResolution};
pub use config::{Delimiter, ImportConfig};
pub use error::{CoerceError, LineError, UploadError};
pub use fields::{ALLOWED_FIELDS, REQUIRED_FIELDS};
pub use header::{validate_columns, HeaderMap};
pub use importer::{import_content, BatchImporter, ImportReport, ImportStatus, Notice};
pub use reader::CsvImportReader;
pub use value::{coerce, CategoryRef, Coerced};
