//! schemasplit: split a monolithic table schema into topic modules.
//!
//! A schema file that grew to hold every table of a product is hard to
//! review and slow to navigate. `schemasplit` cuts it into cohesive modules
//! (users, deals, compliance, ...) without breaking it:
//!
//! - **Extract**: find every entity (`export const x = mysqlTable("x", {...})`)
//!   and derived alias (`export type X = typeof x.$inferSelect`)
//! - **Assign**: place entities by a bucket table, aliases next to their entity
//! - **Resolve**: find which module references symbols another module owns
//! - **Synthesize**: emit one import per owning module
//! - **Write**: one file per non-empty module, plus an index re-exporting all
//!
//! The whole run is a pure function of (source text, bucket configuration),
//! so regenerating from identical inputs yields byte-identical files.
//!
//! # Examples
//!
//! ```bash
//! # Split with the built-in bucket layout
//! schemasplit split --source drizzle/schema.ts --out drizzle/schema
//!
//! # Start a custom layout
//! schemasplit config > buckets.toml
//!
//! # Fail CI when the generated modules drift from the source
//! schemasplit check --source drizzle/schema.ts --out drizzle/schema --config buckets.toml
//! ```
//!
//! # Crate Structure
//!
//! - [`core`]: pipeline stages (extract, buckets, deps, imports, emit) and shared types

mod cli;
pub mod core;

use crate::cli::{CheckCli, Cli, Command, PlanCli, SplitCli};
use crate::core::buckets::BucketConfig;
use crate::core::diag;
use crate::core::emit::{self, Manifest};
use crate::core::error::SplitError;
use crate::core::partition::{self, Partition};

use clap::Parser;
use colored::Colorize;
use std::path::Path;

pub use crate::core::error;

pub fn run() -> Result<(), SplitError> {
    let cli = Cli::parse();
    match cli.command {
        Command::Split(args) => run_split(args),
        Command::Check(args) => run_check(args),
        Command::Plan(args) => run_plan(args),
        Command::Config => {
            print!("{}", BucketConfig::default().to_toml()?);
            Ok(())
        }
    }
}

fn load(source: &Path, config: Option<&Path>) -> Result<(BucketConfig, Partition), SplitError> {
    let config = BucketConfig::load(config)?;
    let text = partition::read_source(source)?;
    let origin = source.display().to_string();
    let partition = partition::partition(&text, &origin, &config)?;
    Ok((config, partition))
}

fn run_split(args: SplitCli) -> Result<(), SplitError> {
    let (config, partition) = load(&args.input.source, args.input.config.as_deref())?;

    if args.deny_cycles && !partition.cycles.is_empty() {
        let described = partition
            .cycles
            .iter()
            .map(|c| c.join(" -> "))
            .collect::<Vec<_>>()
            .join("; ");
        return Err(SplitError::ImportCycle(described));
    }

    let files = emit::render(&partition, &config);
    if !args.dry_run {
        emit::write_outputs(&args.out, &files)?;
    }

    if !args.quiet {
        diag::print_warnings(&partition.warnings);
    }

    if args.format == "json" {
        let manifest = Manifest::new(&args.input.source.display().to_string(), &partition, &files);
        println!("{}", serde_json::to_string_pretty(&manifest)?);
    } else if !args.quiet {
        let verb = if args.dry_run { "would write" } else { "wrote" };
        println!(
            "{} {} entities, {} aliases -> {} modules; {} {} files to {}",
            "✓".bright_green(),
            partition.catalog.entities().len(),
            partition.catalog.aliases().len(),
            partition.modules.len(),
            verb,
            files.len(),
            args.out.display()
        );
    }
    Ok(())
}

fn run_check(args: CheckCli) -> Result<(), SplitError> {
    let (config, partition) = load(&args.input.source, args.input.config.as_deref())?;
    let files = emit::render(&partition, &config);
    let report = emit::check_outputs(&args.out, &files, config.extension())?;

    for name in &report.orphaned {
        eprintln!(
            "{} {} is not produced by this schema",
            "orphaned:".bright_yellow(),
            name
        );
    }

    if !report.is_current() {
        let mut problems = Vec::new();
        if !report.missing.is_empty() {
            problems.push(format!("missing {}", report.missing.join(", ")));
        }
        if !report.stale.is_empty() {
            problems.push(format!("out of date {}", report.stale.join(", ")));
        }
        return Err(SplitError::StaleOutput(format!(
            "{} (run `schemasplit split` to regenerate)",
            problems.join("; ")
        )));
    }

    println!(
        "{} {} files in {} match {}",
        "✓".bright_green(),
        files.len(),
        args.out.display(),
        args.input.source.display()
    );
    Ok(())
}

fn run_plan(args: PlanCli) -> Result<(), SplitError> {
    let (config, partition) = load(&args.input.source, args.input.config.as_deref())?;

    if args.format == "json" {
        let files = emit::render(&partition, &config);
        let manifest = Manifest::new(&args.input.source.display().to_string(), &partition, &files);
        println!("{}", serde_json::to_string_pretty(&manifest)?);
        return Ok(());
    }

    diag::print_warnings(&partition.warnings);
    for module in &partition.modules {
        println!(
            "{} ({} symbols)",
            module.name.bright_white().bold(),
            module.owned.len()
        );
        for name in &module.owned {
            let kind = partition.catalog.get(name).map(|s| s.kind()).unwrap_or("?");
            println!("  {} {}", name, format!("[{}]", kind).bright_black());
        }
        for import in partition.imports_for(&module.name) {
            println!(
                "  {} {} from {}",
                "▸".bright_cyan(),
                import.names.join(", "),
                import.from.bright_cyan()
            );
        }
    }
    Ok(())
}
