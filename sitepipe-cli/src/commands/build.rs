//! `sitepipe build` — run a manifest and checkpoint the result.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Args;
use colored::Colorize;

use sitepipe_core::{CheckpointError, Pipeline};

use crate::helpers;
use crate::manifest::Manifest;

/// Arguments for `sitepipe build`.
#[derive(Args, Debug)]
pub struct BuildArgs {
    /// Path to the build manifest.
    #[arg(long, short = 'm', default_value = "site.yaml")]
    pub manifest: PathBuf,

    /// Directory that relative config paths resolve against
    /// (defaults to the manifest's directory).
    #[arg(long)]
    pub root: Option<PathBuf>,

    /// Report errors but exit successfully.
    #[arg(long)]
    pub keep_going: bool,
}

impl BuildArgs {
    pub fn run(self) -> Result<()> {
        let manifest = Manifest::from_yaml_file(&self.manifest)?;
        let root = match self.root.clone() {
            Some(root) => root,
            None => manifest_dir(&self.manifest),
        };
        tracing::info!(manifest = %self.manifest.display(), root = %root.display(), "building site");

        let mut site = manifest.base_pipeline(&root, &helpers::builtin());
        for step in &manifest.renders {
            step.apply(&mut site);
        }

        report(&site, manifest.renders.len(), self.keep_going)
    }
}

fn manifest_dir(manifest: &Path) -> PathBuf {
    match manifest.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

fn report(site: &Pipeline, steps: usize, keep_going: bool) -> Result<()> {
    let output_dir = site.config().output_dir.display().to_string();
    match site.check() {
        Ok(()) => {
            println!(
                "{} {steps} render step(s) into {output_dir}",
                "✓ built".green().bold()
            );
            Ok(())
        }
        Err(CheckpointError::Failed { count, messages }) => {
            for message in &messages {
                eprintln!("  {} {message}", "✗".red().bold());
            }
            if keep_going {
                println!(
                    "{} {steps} render step(s) into {output_dir} with {count} error(s)",
                    "! built".yellow().bold()
                );
                return Ok(());
            }
            // Exits with status 1 and a fatal log line.
            site.must();
            bail!("build failed with {count} error(s)")
        }
        Err(err) => Err(err).context("build failed"),
    }
}
