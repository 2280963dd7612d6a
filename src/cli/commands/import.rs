//! `cupload import` command - Create courses from a CSV file

use console::style;
use miette::{IntoDiagnostic, Result};
use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::cli::helpers::parse_assignment;
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::config::Config;
use crate::core::site::Site;
use crate::upload::fields::is_allowed;
use crate::upload::value::infer;
use crate::upload::{import_content, Delimiter, ImportReport, UploadError};

#[derive(clap::Args, Debug)]
pub struct ImportArgs {
    /// CSV file to import
    pub file: PathBuf,

    /// Character encoding of the file (any WHATWG label, e.g. UTF-8, ISO-8859-1)
    #[arg(long, short = 'e')]
    pub encoding: Option<String>,

    /// Field delimiter: comma, semicolon, colon, tab or cfg
    #[arg(long, short = 'd')]
    pub delimiter: Option<Delimiter>,

    /// Course default for fields a row leaves empty (repeatable)
    #[arg(long = "set", value_name = "FIELD=VALUE", value_parser = parse_assignment)]
    pub defaults: Vec<(String, String)>,

    /// Category id for rows without a category
    #[arg(long, value_name = "ID")]
    pub default_category: Option<i64>,

    /// Treat numeric and boolean looking cells as typed values
    #[arg(long)]
    pub infer_types: bool,

    /// Abort the run after this many seconds
    #[arg(long, value_name = "SECS")]
    pub time_limit: Option<u64>,
}

pub fn run(args: ImportArgs, global: &GlobalOpts) -> Result<()> {
    let site = Site::locate(global.site.as_deref()).map_err(|e| miette::miette!("{}", e))?;

    let mut defaults = BTreeMap::new();
    for (field, value) in &args.defaults {
        if !is_allowed(field) {
            return Err(miette::miette!(
                "Unknown course field '{}' in --set. Run 'cupload template --all' to list fields",
                field
            ));
        }
        defaults.insert(field.clone(), infer(value.clone()));
    }

    let mut config = Config::load(Some(&site));
    config.merge(Config {
        encoding: args.encoding.clone(),
        delimiter: args.delimiter,
        default_category: args.default_category,
        time_limit_secs: args.time_limit,
        infer_types: args.infer_types.then_some(true),
        defaults,
        ..Config::default()
    });
    let import_config = config.import_config()?;

    let content = std::fs::read(&args.file)
        .map_err(|e| UploadError::CannotReadFile(format!("{}: {}", args.file.display(), e)))?;

    let human = matches!(global.format, OutputFormat::Auto);
    if human && !global.quiet {
        println!(
            "{} Importing courses from {} ({}, {})",
            style("→").blue(),
            style(args.file.display()).yellow(),
            import_config.encoding,
            import_config.delimiter
        );
        println!();
    }

    let mut store = site.open_store().map_err(|e| miette::miette!("{}", e))?;
    let report = import_content(&mut store, &content, &import_config)?;

    match global.format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&report).into_diagnostic()?);
        }
        OutputFormat::Yaml => {
            print!("{}", serde_yml::to_string(&report).into_diagnostic()?);
        }
        OutputFormat::Tsv => print_tsv(&report),
        OutputFormat::Auto => print_report(&report, global.quiet),
    }

    Ok(())
}

fn print_report(report: &ImportReport, quiet: bool) {
    for notice in &report.notices {
        println!("{} {}", style("!").red(), notice);
    }
    if !report.notices.is_empty() {
        println!();
    }

    let status = &report.status;
    println!("{}", style("─".repeat(50)).dim());
    println!("{}", style("Course creation status report").bold());
    println!("{}", style("─".repeat(50)).dim());
    println!("  Parsed {} courses from file", style(status.bulk).cyan());
    println!("  Created {} courses", style(status.created).green());
    println!("  Created {} categories", style(status.catcreated).green());
    println!("  Skipped {} courses", style(status.skipped).dim());
    println!(
        "  Failed to create {} courses because of errors",
        style(status.broken).red()
    );
    println!(
        "  Failed to create {} categories because of errors",
        style(status.catbroken).red()
    );

    if !quiet {
        println!();
        println!("{}", style("Courses were re-sorted automatically.").dim());
        if status.catcreated > 0 {
            println!(
                "{}",
                style("New categories were created; review their order with 'cupload category list'.").dim()
            );
        }
    }
}

fn print_tsv(report: &ImportReport) {
    let status = &report.status;
    for (key, value) in [
        ("bulk", status.bulk),
        ("read", status.read),
        ("created", status.created),
        ("skipped", status.skipped),
        ("broken", status.broken),
        ("catcreated", status.catcreated),
        ("catbroken", status.catbroken),
    ] {
        println!("{}\t{}", key, value);
    }
    for notice in &report.notices {
        eprintln!("{}", notice);
    }
}
