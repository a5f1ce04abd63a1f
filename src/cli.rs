//! CLI struct definitions for the schemasplit command-line interface.
//!
//! All clap-derived types live here. Dispatch logic lives in `lib.rs`.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[clap(
    name = "schemasplit",
    version = env!("CARGO_PKG_VERSION"),
    about = "Split a monolithic table schema into topic modules with cross-module imports and an index."
)]
pub(crate) struct Cli {
    #[clap(subcommand)]
    pub command: Command,
}

#[derive(clap::Args, Debug)]
pub(crate) struct SourceArgs {
    /// Monolithic schema file to split.
    #[clap(long, short = 's')]
    pub source: PathBuf,
    /// Bucket configuration (TOML). Defaults to the built-in layout.
    #[clap(long, short = 'c')]
    pub config: Option<PathBuf>,
}

#[derive(clap::Args, Debug)]
pub(crate) struct SplitCli {
    #[clap(flatten)]
    pub input: SourceArgs,
    /// Directory that receives the module files and the index.
    #[clap(long, short = 'o')]
    pub out: PathBuf,
    /// Run the pipeline and report, but write nothing.
    #[clap(long)]
    pub dry_run: bool,
    /// Fail instead of warning when modules import each other.
    #[clap(long)]
    pub deny_cycles: bool,
    /// Output format: 'text' or 'json'.
    #[clap(long, default_value = "text", value_parser = ["text", "json"])]
    pub format: String,
    /// Suppress warnings and the summary line.
    #[clap(long, short = 'q')]
    pub quiet: bool,
}

#[derive(clap::Args, Debug)]
pub(crate) struct CheckCli {
    #[clap(flatten)]
    pub input: SourceArgs,
    /// Directory holding previously generated modules.
    #[clap(long, short = 'o')]
    pub out: PathBuf,
}

#[derive(clap::Args, Debug)]
pub(crate) struct PlanCli {
    #[clap(flatten)]
    pub input: SourceArgs,
    /// Output format: 'text' or 'json'.
    #[clap(long, default_value = "text", value_parser = ["text", "json"])]
    pub format: String,
}

#[derive(Subcommand, Debug)]
pub(crate) enum Command {
    /// Split the schema and (re)write every module file plus the index
    #[clap(name = "split")]
    Split(SplitCli),

    /// Verify generated files on disk match a fresh split
    #[clap(name = "check")]
    Check(CheckCli),

    /// Show symbol assignment and cross-module references without writing
    #[clap(name = "plan")]
    Plan(PlanCli),

    /// Print the built-in bucket configuration as TOML
    #[clap(name = "config")]
    Config,
}
