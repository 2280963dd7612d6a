//! `cupload category` command - Course category queries

use clap::Subcommand;
use console::style;
use miette::{IntoDiagnostic, Result};
use tabled::{builder::Builder, settings::Style};

use crate::cli::helpers::truncate_str;
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::site::Site;

#[derive(Subcommand, Debug)]
pub enum CategoryCommands {
    /// List the category tree with course counts
    List,
}

pub fn run(cmd: CategoryCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        CategoryCommands::List => run_list(global),
    }
}

fn run_list(global: &GlobalOpts) -> Result<()> {
    let site = Site::locate(global.site.as_deref()).map_err(|e| miette::miette!("{}", e))?;
    let store = site.open_store().map_err(|e| miette::miette!("{}", e))?;
    let categories = store.list_categories()?;

    match global.format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&categories).into_diagnostic()?);
        }
        OutputFormat::Yaml => {
            print!("{}", serde_yml::to_string(&categories).into_diagnostic()?);
        }
        OutputFormat::Tsv => {
            for cat in &categories {
                println!("{}\t{}\t{}\t{}", cat.id, cat.parent, cat.display_path, cat.coursecount);
            }
        }
        OutputFormat::Auto => {
            let mut builder = Builder::default();
            builder.push_record(["ID", "Category", "Parent", "Courses"]);
            for cat in &categories {
                let indented = format!("{}{}", "  ".repeat(cat.depth.saturating_sub(1) as usize), cat.name);
                builder.push_record([
                    cat.id.to_string(),
                    truncate_str(&indented, 48),
                    cat.parent.to_string(),
                    cat.coursecount.to_string(),
                ]);
            }
            println!("{}", builder.build().with(Style::rounded()));

            if !global.quiet {
                println!();
                println!(
                    "{} categor{} found",
                    style(categories.len()).cyan(),
                    if categories.len() == 1 { "y" } else { "ies" }
                );
            }
        }
    }

    Ok(())
}
