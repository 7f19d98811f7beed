use clap::Parser;
use miette::Result;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cca::cli::commands;
use cca::cli::{Cli, Commands};

fn main() -> Result<()> {
    // Terminate quietly on a closed pipe (`cca record list | head`)
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

    // RUST_LOG wins; otherwise warnings only, or debug with --verbose
    let default_level = if global.verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .with(filter)
        .init();

    match cli.command {
        Commands::Init(args) => commands::init::run(args, &global),
        Commands::Record(cmd) => commands::record::run(cmd, &global),
        Commands::Point(cmd) => commands::point::run(cmd, &global),
        Commands::Eval(cmd) => commands::eval::run(cmd, &global),
        Commands::Analysis(cmd) => commands::analysis::run(cmd, &global),
        Commands::Ref(cmd) => commands::reference::run(cmd, &global),
        Commands::Validate(args) => commands::validate::run(args, &global),
        Commands::Completions(args) => commands::completions::run(args),
    }
}
