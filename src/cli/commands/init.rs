//! `cca init` command - Initialize a new CCA project

use console::style;
use miette::{IntoDiagnostic, Result};
use std::path::Path;

use crate::cli::GlobalOpts;
use crate::core::project::{Project, ProjectError};

#[derive(clap::Args, Debug)]
pub struct InitArgs {
    /// Directory to initialize (default: current directory)
    #[arg(default_value = ".")]
    pub path: std::path::PathBuf,

    /// Force initialization even if .cca/ already exists
    #[arg(long)]
    pub force: bool,
}

pub fn run(args: InitArgs, global: &GlobalOpts) -> Result<()> {
    let path = if args.path.as_os_str() == "." {
        std::env::current_dir().into_diagnostic()?
    } else {
        args.path.clone()
    };

    if !path.exists() {
        std::fs::create_dir_all(&path).into_diagnostic()?;
        if !global.quiet {
            println!(
                "{} Created directory {}",
                style("✓").green(),
                style(path.display()).cyan()
            );
        }
    }

    let project = if args.force {
        Project::init_force(&path)
    } else {
        Project::init(&path)
    };

    match project {
        Ok(project) => {
            if global.quiet {
                return Ok(());
            }
            println!(
                "{} Initialized CCA project at {}",
                style("✓").green(),
                style(project.root().display()).cyan()
            );
            println!();
            println!("Created project structure:");
            print_structure(project.root());
            println!();
            println!("Next steps:");
            println!(
                "  {} Start a critical analysis",
                style("cca record new --title \"...\"").yellow()
            );
            println!(
                "  {} Enter calibration points",
                style("cca point add <id> --interactive").yellow()
            );
            println!(
                "  {} Validate record files",
                style("cca validate").yellow()
            );
            Ok(())
        }
        Err(ProjectError::AlreadyExists(path)) => {
            println!(
                "{} CCA project already exists at {}",
                style("!").yellow(),
                style(path.display()).cyan()
            );
            println!();
            println!("Use {} to reinitialize", style("cca init --force").yellow());
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

fn print_structure(root: &Path) {
    let entries = [".cca/", ".cca/config.yaml", "records/"];
    for entry in entries {
        let marker = if root.join(entry).exists() {
            style("✓").green()
        } else {
            style("-").dim()
        };
        println!("  {} {}", marker, entry);
    }
}
