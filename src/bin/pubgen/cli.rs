//! CLI definitions using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;

use pubgen::ops::Mode;

/// pubgen - BUILD file generation for Flutter and Dart packages
#[derive(Parser)]
#[command(name = "pubgen")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Generate BUILD rules for every package under a directory
    Generate(GenerateArgs),

    /// List the rule kinds pubgen can emit
    Kinds,

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Args)]
pub struct GenerateArgs {
    /// Repository root (defaults to the current directory)
    pub path: Option<PathBuf>,

    /// Print generated rules or write them into BUILD files
    #[arg(long, value_enum, default_value_t = ModeArg::Print)]
    pub mode: ModeArg,

    /// Main repository name, used for the default SDK repository
    #[arg(long, env = "PUBGEN_REPO_NAME")]
    pub repo_name: Option<String>,

    /// BUILD file name to read and create (may be repeated)
    #[arg(long = "build-file-name")]
    pub build_file_names: Vec<String>,

    /// SDK repository for the root directory, e.g. `@flutter_sdk`
    #[arg(long)]
    pub sdk_repo: Option<String>,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ModeArg {
    Print,
    Fix,
}

impl From<ModeArg> for Mode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Print => Mode::Print,
            ModeArg::Fix => Mode::Fix,
        }
    }
}

#[derive(Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for (defaults to the one in $SHELL)
    #[arg(value_enum)]
    pub shell: Option<Shell>,

    /// Write the script to this file instead of stdout
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,
}
