use clap::Parser;
use miette::Result;
use tracing_subscriber::EnvFilter;

use cupload::cli::{Cli, Commands};

fn main() -> Result<()> {
    // Reset SIGPIPE to default behavior so piping to `head` exits quietly
    #[cfg(unix)]
    {
        unsafe {
            libc::signal(libc::SIGPIPE, libc::SIG_DFL);
        }
    }
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(2)
                .tab_width(4)
                .build(),
        )
    }))?;

    let cli = Cli::parse();
    let global = cli.global;

    init_logging(global.verbose);

    match cli.command {
        Commands::Init(args) => cupload::cli::commands::init::run(args),
        Commands::Import(args) => cupload::cli::commands::import::run(args, &global),
        Commands::Template(args) => cupload::cli::commands::template::run(args),
        Commands::Category(cmd) => cupload::cli::commands::category::run(cmd, &global),
        Commands::Course(cmd) => cupload::cli::commands::course::run(cmd, &global),
    }
}

/// Log to stderr, filtered by `CUPLOAD_LOG` (default `warn`, `debug` with -v)
fn init_logging(verbose: bool) {
    let default = if verbose { "cupload=debug" } else { "warn" };
    let filter = EnvFilter::try_from_env("CUPLOAD_LOG").unwrap_or_else(|_| EnvFilter::new(default));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
