//! Non-fatal diagnostics and their terminal rendering.

use colored::Colorize;
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum Warning {
    /// An alias names an entity that is not declared; routed to the default bucket.
    UnresolvedAliasReference {
        alias: String,
        entity: String,
        fallback: String,
    },
    /// An entity listed in more than one bucket; the first listing wins.
    DuplicateBucketMember {
        entity: String,
        kept: String,
        ignored: String,
    },
    /// A bucket lists an entity the source does not declare.
    UnknownBucketMember { bucket: String, entity: String },
    /// Modules that import from each other, directly or transitively.
    ImportCycle { modules: Vec<String> },
}

impl Warning {
    pub fn rule(&self) -> &'static str {
        match self {
            Self::UnresolvedAliasReference { .. } => "unresolved-alias-reference",
            Self::DuplicateBucketMember { .. } => "duplicate-bucket-member",
            Self::UnknownBucketMember { .. } => "unknown-bucket-member",
            Self::ImportCycle { .. } => "import-cycle",
        }
    }
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnresolvedAliasReference {
                alias,
                entity,
                fallback,
            } => write!(
                f,
                "alias `{}` references unknown entity `{}`; placed in `{}`",
                alias, entity, fallback
            ),
            Self::DuplicateBucketMember {
                entity,
                kept,
                ignored,
            } => write!(
                f,
                "entity `{}` listed in buckets `{}` and `{}`; keeping `{}`",
                entity, kept, ignored, kept
            ),
            Self::UnknownBucketMember { bucket, entity } => write!(
                f,
                "bucket `{}` lists `{}`, which the source does not declare",
                bucket, entity
            ),
            Self::ImportCycle { modules } => {
                let mut path = modules.join(" -> ");
                if let Some(first) = modules.first() {
                    path.push_str(" -> ");
                    path.push_str(first);
                }
                write!(f, "modules import each other: {}", path)
            }
        }
    }
}

/// One line per warning on stderr.
pub fn print_warnings(warnings: &[Warning]) {
    for w in warnings {
        eprintln!(
            "{}{}{} {}",
            "warning[".bright_yellow().bold(),
            w.rule().bright_yellow().bold(),
            "]:".bright_yellow().bold(),
            w
        );
    }
}

pub fn print_error(message: &str) {
    eprintln!("{} {}", "error:".bright_red().bold(), message);
}
