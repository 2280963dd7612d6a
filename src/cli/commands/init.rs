//! `cupload init` command - Initialize a new cupload site

use console::style;
use miette::{IntoDiagnostic, Result};
use std::path::Path;

use crate::core::site::{Site, SiteError};

#[derive(clap::Args, Debug)]
pub struct InitArgs {
    /// Directory to initialize (default: current directory)
    #[arg(default_value = ".")]
    pub path: std::path::PathBuf,

    /// Rewrite the site config even if .cupload/ already exists
    #[arg(long)]
    pub force: bool,
}

pub fn run(args: InitArgs) -> Result<()> {
    let path = if args.path.as_os_str() == "." {
        std::env::current_dir().into_diagnostic()?
    } else {
        args.path.clone()
    };

    if !path.exists() {
        std::fs::create_dir_all(&path).into_diagnostic()?;
        println!(
            "{} Created directory {}",
            style("✓").green(),
            style(path.display()).cyan()
        );
    }

    let site = if args.force {
        Site::init_force(&path)
    } else {
        Site::init(&path)
    };

    match site {
        Ok(site) => {
            println!(
                "{} Initialized cupload site at {}",
                style("✓").green(),
                style(site.root().display()).cyan()
            );
            println!();
            println!("Created site structure:");
            print_structure(site.root());
            println!();
            println!("Next steps:");
            println!(
                "  {} Write an upload file header",
                style("cupload template > courses.csv").yellow()
            );
            println!(
                "  {} Upload the courses",
                style("cupload import courses.csv").yellow()
            );
            Ok(())
        }
        Err(SiteError::AlreadyExists(path)) => {
            println!(
                "{} cupload site already exists at {}",
                style("!").yellow(),
                style(path.display()).cyan()
            );
            println!();
            println!(
                "Use {} to rewrite its config",
                style("cupload init --force").yellow()
            );
            Ok(())
        }
        Err(e) => Err(miette::miette!("{}", e)),
    }
}

fn print_structure(root: &Path) {
    let entries = [".cupload/", ".cupload/config.yaml", ".cupload/store.db"];

    for entry in entries {
        if root.join(entry).exists() {
            println!("  {}", style(entry).dim());
        }
    }
}
