//! `cupload template` command - Print an upload file header

use console::style;
use miette::Result;

use crate::cli::helpers::escape_csv;
use crate::upload::fields::{ALLOWED_FIELDS, TEMPLATE_FIELDS};

#[derive(clap::Args, Debug)]
pub struct TemplateArgs {
    /// List every accepted field instead of the common ones
    #[arg(long)]
    pub all: bool,

    /// Leave out the example row
    #[arg(long)]
    pub no_example: bool,
}

pub fn run(args: TemplateArgs) -> Result<()> {
    let fields: &[&str] = if args.all {
        &ALLOWED_FIELDS
    } else {
        &TEMPLATE_FIELDS
    };

    // Output to stdout (can be redirected to file)
    println!("{}", fields.join(","));
    if !args.no_example {
        let example: Vec<String> = fields
            .iter()
            .map(|field| escape_csv(example_value(field)))
            .collect();
        println!("{}", example.join(","));
    }

    // Usage hint on stderr so it doesn't interfere with redirected output
    eprintln!();
    eprintln!(
        "{} Template generated. Redirect to file: cupload template{} > courses.csv",
        style("→").blue(),
        if args.all { " --all" } else { "" }
    );

    Ok(())
}

fn example_value(field: &str) -> &'static str {
    match field {
        "shortname" => "CS101",
        "fullname" => "Introduction to Computing",
        "category" => "Science/Computing",
        "idnumber" => "CS101-2024",
        "summary" => "Programming fundamentals, with labs",
        "startdate" => "2024-09-01",
        "format" => "weeks",
        "numsections" => "12",
        "visible" => "1",
        _ => "",
    }
}
