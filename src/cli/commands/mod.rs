//! CLI command implementations

pub mod category;
pub mod course;
pub mod import;
pub mod init;
pub mod template;
