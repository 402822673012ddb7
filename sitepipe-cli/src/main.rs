//! sitepipe — build a static site from a YAML manifest.
//!
//! # Usage
//!
//! ```text
//! sitepipe build [--manifest site.yaml] [--root DIR] [--keep-going]
//! sitepipe -v build        # debug logging (or set RUST_LOG)
//! ```

mod commands;
mod helpers;
mod manifest;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};

use commands::build::BuildArgs;

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "sitepipe",
    version,
    about = "Render templates and YAML data into a static site",
    long_about = None,
)]
struct Cli {
    /// Log step-level detail (same as RUST_LOG=debug).
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run a build manifest and fail if any step recorded an error.
    Build(BuildArgs),
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    match cli.command {
        Commands::Build(args) => args.run(),
    }
}
