//! CLI argument definitions using clap derive

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::cli::commands::{
    category::CategoryCommands, course::CourseCommands, import::ImportArgs, init::InitArgs,
    template::TemplateArgs,
};

#[derive(Parser)]
#[command(name = "cupload")]
#[command(author, version, about = "Bulk course upload from CSV files")]
#[command(long_about = "Validates a CSV file of course definitions and creates the courses, along with any missing categories, in a cupload site.")]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub global: GlobalOpts,
}

#[derive(clap::Args, Clone, Debug)]
pub struct GlobalOpts {
    /// Output format
    #[arg(long, short = 'f', global = true, default_value = "auto")]
    pub format: OutputFormat,

    /// Suppress non-essential output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Enable verbose output (debug logging on stderr)
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    /// Site root (default: auto-detect by finding .cupload/)
    #[arg(long, global = true)]
    pub site: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new cupload site
    Init(InitArgs),

    /// Import courses from a CSV file
    Import(ImportArgs),

    /// Print a CSV header template for upload files
    Template(TemplateArgs),

    /// Course category queries
    #[command(subcommand)]
    Category(CategoryCommands),

    /// Course queries
    #[command(subcommand)]
    Course(CourseCommands),
}

#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human readable output with tables
    #[default]
    Auto,
    /// YAML format (full fidelity)
    Yaml,
    /// Tab-separated values (for piping)
    Tsv,
    /// JSON format (for programming)
    Json,
}
