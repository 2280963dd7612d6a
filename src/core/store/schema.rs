//! Database schema initialization

use chrono::Utc;
use rusqlite::params;

use super::{SqliteStore, StoreError, DEFAULT_CATEGORY, DEFAULT_CATEGORY_NAME, SCHEMA_VERSION};

impl SqliteStore {
    /// Initialize database schema and seed the default category
    pub(super) fn init_schema(&mut self) -> Result<(), StoreError> {
        self.conn.execute_batch(
            r#"
            -- Schema version tracking
            CREATE TABLE IF NOT EXISTS schema_version (
                version INTEGER PRIMARY KEY
            );

            -- Category tree; parent 0 is the root
            CREATE TABLE IF NOT EXISTS course_categories (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                parent INTEGER NOT NULL DEFAULT 0,
                sortorder INTEGER NOT NULL DEFAULT 0,
                path TEXT NOT NULL DEFAULT '',
                depth INTEGER NOT NULL DEFAULT 0,
                coursecount INTEGER NOT NULL DEFAULT 0,
                visible INTEGER NOT NULL DEFAULT 1,
                timemodified INTEGER NOT NULL DEFAULT 0
            );
            CREATE INDEX IF NOT EXISTS idx_categories_name_parent ON course_categories(name, parent);
            CREATE INDEX IF NOT EXISTS idx_categories_parent ON course_categories(parent);

            -- Courses; fields without a column live in the attributes JSON object
            CREATE TABLE IF NOT EXISTS course (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                category INTEGER NOT NULL,
                sortorder INTEGER NOT NULL DEFAULT 0,
                fullname TEXT NOT NULL,
                shortname TEXT NOT NULL UNIQUE,
                idnumber TEXT NOT NULL DEFAULT '',
                summary TEXT,
                format TEXT NOT NULL DEFAULT 'weeks',
                startdate INTEGER NOT NULL DEFAULT 0,
                visible INTEGER NOT NULL DEFAULT 1,
                timecreated INTEGER NOT NULL,
                timemodified INTEGER NOT NULL,
                attributes TEXT NOT NULL DEFAULT '{}',
                FOREIGN KEY (category) REFERENCES course_categories(id)
            );
            CREATE INDEX IF NOT EXISTS idx_course_category ON course(category);
            "#,
        )?;

        self.conn.execute(
            "INSERT OR REPLACE INTO schema_version (version) VALUES (?1)",
            params![SCHEMA_VERSION],
        )?;

        self.conn.execute(
            r#"INSERT OR IGNORE INTO course_categories
               (id, name, parent, sortorder, path, depth, coursecount, visible, timemodified)
               VALUES (?1, ?2, 0, 1, ?3, 1, 0, 1, ?4)"#,
            params![
                DEFAULT_CATEGORY,
                DEFAULT_CATEGORY_NAME,
                format!("/{}", DEFAULT_CATEGORY),
                Utc::now().timestamp()
            ],
        )?;

        Ok(())
    }

    /// Check if schema version matches current version
    pub(super) fn needs_schema_rebuild(&self) -> Result<bool, StoreError> {
        let current_version: i32 = self
            .conn
            .query_row("SELECT version FROM schema_version LIMIT 1", [], |row| {
                row.get(0)
            })
            .unwrap_or(0);

        Ok(current_version != SCHEMA_VERSION)
    }

    /// Drop all tables and reinitialize schema
    pub(super) fn reinitialize_schema(&mut self) -> Result<(), StoreError> {
        tracing::warn!("store schema version mismatch, rebuilding empty store");
        self.conn.execute_batch(
            r#"
            DROP TABLE IF EXISTS schema_version;
            DROP TABLE IF EXISTS course;
            DROP TABLE IF EXISTS course_categories;
            "#,
        )?;

        self.init_schema()
    }
}
