//! Inkpress CLI
//!
//! Parallel Markdown static site generator.
//!
//! This is the binary entry point. The library functionality is in `lib.rs`.

use clap::Parser;
use color_eyre::eyre::Result;
use inkpress::cmd::SiteArgs;

/// Command-line interface for Inkpress.
#[derive(Parser)]
#[command(
    name = "inkpress",
    version,
    about = "A parallel Markdown static site generator"
)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "inkpress.toml")]
    config: std::path::PathBuf,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

/// Available CLI commands.
#[derive(clap::Subcommand)]
enum Commands {
    /// Build the static site
    Build {
        #[command(flatten)]
        site: SiteArgs,
    },
    /// Validate configuration, templates and content without writing output
    Check {
        #[command(flatten)]
        site: SiteArgs,
        /// Treat warnings as errors
        #[arg(long)]
        strict: bool,
    },
}

fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    inkpress::init_tracing(cli.verbose);

    match cli.command {
        Commands::Build { site } => {
            inkpress::cmd::build::run(&cli.config, &site)?;
        }
        Commands::Check { site, strict } => {
            inkpress::cmd::check::run(&cli.config, &site, strict)?;
        }
    }

    Ok(())
}
