//! Core module - site, configuration and record store

pub mod config;
pub mod field;
pub mod site;
pub mod store;

pub use config::{Config, ConfigError};
pub use field::FieldValue;
pub use site::{Site, SiteError};
pub use store::{CourseRecord, RecordStore, SqliteStore, StoreError};
