//! cupload: bulk course uploads
//!
//! Validates a delimited text file of course definitions and creates the
//! courses, plus any missing categories, in a site's record store.

pub mod cli;
pub mod core;
pub mod upload;
