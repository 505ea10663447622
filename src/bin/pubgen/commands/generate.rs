//! `pubgen generate` command

use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::cli::GenerateArgs;
use pubgen::ops::{self, Mode};
use pubgen::util::fs::{relative_path, slash_path};
use pubgen::{default_languages, HostConfig};

pub fn execute(args: GenerateArgs) -> Result<()> {
    let root = match args.path {
        Some(path) => path,
        None => std::env::current_dir().context("failed to determine current directory")?,
    };
    let root: PathBuf = root
        .canonicalize()
        .with_context(|| format!("failed to resolve {}", root.display()))?;

    let mut host = HostConfig::for_repo(&root);
    if let Some(repo_name) = args.repo_name {
        host.repo_name = repo_name;
    }
    if !args.build_file_names.is_empty() {
        host.build_file_names = args.build_file_names;
    }
    if args.sdk_repo.is_some() {
        host.sdk_repo = args.sdk_repo;
    }

    let mode = Mode::from(args.mode);
    let report = ops::run(&root, &host, &default_languages(), mode)?;

    if mode == Mode::Print {
        for output in &report.outputs {
            println!("# {}", slash_path(&relative_path(&root, &output.path)));
            print!("{}", output.rendered);
            println!();
        }
    }

    tracing::info!(
        "Generated {} rules and refreshed {} in {} of {} directories",
        report.rules_generated,
        report.rules_merged,
        report.outputs.len(),
        report.dirs_visited
    );

    Ok(())
}
