//! SQLite-backed record store for courses and categories
//!
//! This module provides:
//! - The `RecordStore` trait the upload pipeline persists through
//! - `SqliteStore`, the implementation used by the CLI
//! - Read queries used by the listing commands
//!
//! The store file lives at `.cupload/store.db` inside a site directory.

mod queries;
mod schema;
mod types;

pub use types::*;

use std::path::{Path, PathBuf};

use chrono::Utc;
use miette::Diagnostic;
use rusqlite::{params, Connection, OptionalExtension};
use thiserror::Error;

use crate::core::field::FieldValue;

/// Current schema version - tables are recreated on version mismatch
const SCHEMA_VERSION: i32 = 1;

/// Errors raised by the record store
#[derive(Debug, Error, Diagnostic)]
pub enum StoreError {
    #[error("database error: {0}")]
    #[diagnostic(code(cupload::store::sqlite))]
    Sqlite(#[from] rusqlite::Error),

    #[error("category {0} does not exist")]
    #[diagnostic(code(cupload::store::missing_category))]
    MissingCategory(i64),

    #[error("a course with shortname '{0}' already exists")]
    #[diagnostic(code(cupload::store::duplicate_shortname))]
    DuplicateShortname(String),

    #[error("invalid record: {0}")]
    #[diagnostic(code(cupload::store::invalid))]
    Invalid(String),

    #[error("could not encode course attributes: {0}")]
    #[diagnostic(code(cupload::store::attributes))]
    Attributes(#[from] serde_json::Error),
}

/// Persistence operations the upload pipeline needs
///
/// Lookups that fail are fatal to an import run. Failed creates are
/// reported per row and the run continues.
pub trait RecordStore {
    /// Check whether a category with this id exists
    fn category_exists(&self, id: i64) -> Result<bool, StoreError>;

    /// Find a category by name under the given parent
    fn find_category(&self, name: &str, parent: i64) -> Result<Option<i64>, StoreError>;

    /// Create a category under the given parent, returning its id
    fn create_category(&mut self, name: &str, parent: i64) -> Result<i64, StoreError>;

    /// Check whether a course with this shortname exists
    fn course_shortname_exists(&self, shortname: &str) -> Result<bool, StoreError>;

    /// Create a course, returning its id
    fn create_course(&mut self, course: &CourseRecord) -> Result<i64, StoreError>;

    /// Renumber the global course sort order
    fn fix_course_sortorder(&mut self) -> Result<(), StoreError>;
}

/// The record store backed by SQLite
pub struct SqliteStore {
    conn: Connection,
    path: Option<PathBuf>,
}

impl SqliteStore {
    /// Open or create a store file
    ///
    /// A new file gets the current schema and the default category. A file
    /// with a different schema version is rebuilt empty.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let needs_init = !path.exists();
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;

        let mut store = Self {
            conn,
            path: Some(path.to_path_buf()),
        };

        if needs_init {
            store.init_schema()?;
        } else if store.needs_schema_rebuild()? {
            store.reinitialize_schema()?;
        }

        Ok(store)
    }

    /// Open a throwaway store held in memory
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        let mut store = Self { conn, path: None };
        store.init_schema()?;
        Ok(store)
    }

    #[cfg(test)]
    fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn category_path(&self, id: i64) -> Result<Option<(String, i64)>, StoreError> {
        Ok(self
            .conn
            .query_row(
                "SELECT path, depth FROM course_categories WHERE id = ?1",
                params![id],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?)
    }
}

impl RecordStore for SqliteStore {
    fn category_exists(&self, id: i64) -> Result<bool, StoreError> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM course_categories WHERE id = ?1",
            params![id],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    fn find_category(&self, name: &str, parent: i64) -> Result<Option<i64>, StoreError> {
        Ok(self
            .conn
            .query_row(
                "SELECT id FROM course_categories WHERE name = ?1 AND parent = ?2 ORDER BY id LIMIT 1",
                params![name, parent],
                |row| row.get(0),
            )
            .optional()?)
    }

    fn create_category(&mut self, name: &str, parent: i64) -> Result<i64, StoreError> {
        if name.trim().is_empty() {
            return Err(StoreError::Invalid("category name is empty".to_string()));
        }

        let (parent_path, parent_depth) = if parent == ROOT_CATEGORY {
            (String::new(), 0)
        } else {
            self.category_path(parent)?
                .ok_or(StoreError::MissingCategory(parent))?
        };

        let sortorder: i64 = self.conn.query_row(
            "SELECT COALESCE(MAX(sortorder), 0) + 1 FROM course_categories",
            [],
            |row| row.get(0),
        )?;

        let tx = self.conn.transaction()?;
        tx.execute(
            r#"INSERT INTO course_categories
               (name, parent, sortorder, path, depth, coursecount, visible, timemodified)
               VALUES (?1, ?2, ?3, '', ?4, 0, 1, ?5)"#,
            params![name, parent, sortorder, parent_depth + 1, Utc::now().timestamp()],
        )?;
        let id = tx.last_insert_rowid();
        tx.execute(
            "UPDATE course_categories SET path = ?1 WHERE id = ?2",
            params![format!("{}/{}", parent_path, id), id],
        )?;
        tx.commit()?;

        Ok(id)
    }

    fn course_shortname_exists(&self, shortname: &str) -> Result<bool, StoreError> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM course WHERE shortname = ?1",
            params![shortname],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    fn create_course(&mut self, course: &CourseRecord) -> Result<i64, StoreError> {
        let shortname = course.shortname();
        let fullname = course.fullname();
        if shortname.trim().is_empty() {
            return Err(StoreError::Invalid("shortname is empty".to_string()));
        }
        if fullname.trim().is_empty() {
            return Err(StoreError::Invalid(format!(
                "fullname is empty for course '{}'",
                shortname
            )));
        }
        if !self.category_exists(course.category)? {
            return Err(StoreError::MissingCategory(course.category));
        }
        if self.course_shortname_exists(&shortname)? {
            return Err(StoreError::DuplicateShortname(shortname));
        }

        let now = Utc::now().timestamp();
        let int_field = |name: &str| course.get(name).and_then(FieldValue::as_i64);

        let sortorder = match int_field("sortorder") {
            Some(order) => order,
            None => self.conn.query_row(
                "SELECT COALESCE(MAX(sortorder), 0) + 1 FROM course WHERE category = ?1",
                params![course.category],
                |row| row.get(0),
            )?,
        };

        let attributes: serde_json::Map<String, serde_json::Value> = course
            .fields
            .iter()
            .filter(|(name, _)| !COURSE_COLUMNS.contains(&name.as_str()))
            .map(|(name, value)| (name.clone(), value.to_json()))
            .collect();

        self.conn.execute(
            r#"INSERT INTO course
               (category, sortorder, fullname, shortname, idnumber, summary, format,
                startdate, visible, timecreated, timemodified, attributes)
               VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)"#,
            params![
                course.category,
                sortorder,
                fullname,
                shortname,
                course.text("idnumber"),
                course.get("summary").map(FieldValue::to_text),
                course
                    .get("format")
                    .map(FieldValue::to_text)
                    .unwrap_or_else(|| "weeks".to_string()),
                int_field("startdate").unwrap_or(0),
                int_field("visible").unwrap_or(1),
                int_field("timecreated").unwrap_or(now),
                int_field("timemodified").unwrap_or(now),
                serde_json::to_string(&attributes)?,
            ],
        )?;

        Ok(self.conn.last_insert_rowid())
    }

    fn fix_course_sortorder(&mut self) -> Result<(), StoreError> {
        self.renumber_courses()
    }
}
