//! `pubgen completions` command
//!
//! Writes a completion script for `pubgen` to stdout or a file.

use std::io::{self, Write};

use anyhow::{bail, Context, Result};
use clap::CommandFactory;
use clap_complete::{generate, Shell};

use pubgen::util::fs::write_string;

use crate::cli::{Cli, CompletionsArgs};

pub fn execute(args: CompletionsArgs) -> Result<()> {
    let shell = match args.shell.or_else(Shell::from_env) {
        Some(shell) => shell,
        None => bail!("could not detect the shell from $SHELL; pass one explicitly"),
    };

    let script = completion_script(shell)?;

    match args.output {
        Some(path) => {
            write_string(&path, &script)?;
            tracing::info!("Wrote {} completions to {}", shell, path.display());
        }
        None => io::stdout()
            .write_all(script.as_bytes())
            .context("failed to write completions to stdout")?,
    }

    Ok(())
}

fn completion_script(shell: Shell) -> Result<String> {
    let mut cmd = Cli::command();
    let name = cmd.get_name().to_string();

    let mut buf = Vec::new();
    generate(shell, &mut cmd, name, &mut buf);
    String::from_utf8(buf).context("completion script is not valid UTF-8")
}
