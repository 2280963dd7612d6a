//! `cupload course` command - Course queries

use clap::Subcommand;
use console::style;
use miette::{IntoDiagnostic, Result};
use tabled::{builder::Builder, settings::Style};

use crate::cli::helpers::{format_timestamp, truncate_str};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::site::Site;

#[derive(Subcommand, Debug)]
pub enum CourseCommands {
    /// List courses in sort order
    List {
        /// Only courses in this category id
        #[arg(long, short = 'c')]
        category: Option<i64>,
    },

    /// Show record store statistics
    Stats,
}

pub fn run(cmd: CourseCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        CourseCommands::List { category } => run_list(category, global),
        CourseCommands::Stats => run_stats(global),
    }
}

fn run_list(category: Option<i64>, global: &GlobalOpts) -> Result<()> {
    let site = Site::locate(global.site.as_deref()).map_err(|e| miette::miette!("{}", e))?;
    let store = site.open_store().map_err(|e| miette::miette!("{}", e))?;
    let courses = store.list_courses(category)?;

    match global.format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&courses).into_diagnostic()?);
        }
        OutputFormat::Yaml => {
            print!("{}", serde_yml::to_string(&courses).into_diagnostic()?);
        }
        OutputFormat::Tsv => {
            for course in &courses {
                println!(
                    "{}\t{}\t{}\t{}\t{}",
                    course.id, course.category, course.sortorder, course.shortname, course.fullname
                );
            }
        }
        OutputFormat::Auto => {
            let mut builder = Builder::default();
            builder.push_record(["ID", "Shortname", "Fullname", "Category", "Start", "Visible"]);
            for course in &courses {
                builder.push_record([
                    course.id.to_string(),
                    truncate_str(&course.shortname, 20),
                    truncate_str(&course.fullname, 40),
                    course.category.to_string(),
                    format_timestamp(course.startdate),
                    if course.visible { "yes" } else { "no" }.to_string(),
                ]);
            }
            println!("{}", builder.build().with(Style::rounded()));

            if !global.quiet {
                println!();
                println!("{} course(s) found", style(courses.len()).cyan());
            }
        }
    }

    Ok(())
}

fn run_stats(global: &GlobalOpts) -> Result<()> {
    let site = Site::locate(global.site.as_deref()).map_err(|e| miette::miette!("{}", e))?;
    let store = site.open_store().map_err(|e| miette::miette!("{}", e))?;
    let stats = store.statistics()?;

    match global.format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&stats).into_diagnostic()?);
        }
        OutputFormat::Yaml => {
            print!("{}", serde_yml::to_string(&stats).into_diagnostic()?);
        }
        OutputFormat::Tsv | OutputFormat::Auto => {
            println!("{}", style("Store Status").bold());
            println!("{}", style("─".repeat(40)).dim());
            println!("  Location:    {}", site.store_path().display());
            println!("  Categories:  {}", style(stats.categories).cyan());
            println!("  Courses:     {}", style(stats.courses).cyan());
            println!(
                "  Size:        {} KB",
                style(stats.db_size_bytes / 1024).cyan()
            );
        }
    }

    Ok(())
}
