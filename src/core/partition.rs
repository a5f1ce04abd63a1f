//! The splitting pipeline.
//!
//! source text -> catalog -> bucket assignment -> module bodies ->
//! dependency edges -> imports. Each stage runs to completion before the
//! next one starts; dependency resolution needs every finished body.

use crate::core::buckets::{self, Assignment, BucketConfig};
use crate::core::catalog::Catalog;
use crate::core::deps::{self, DependencyEdge};
use crate::core::diag::Warning;
use crate::core::error::SplitError;
use crate::core::imports::{self, ImportStatement};
use serde::Serialize;
use std::fs;
use std::path::Path;

/// One output partition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Module {
    pub name: String,
    /// Owned symbol names in discovery order.
    pub owned: Vec<String>,
    /// Owned symbols' text joined by blank lines.
    pub body: String,
}

impl Module {
    pub fn is_empty(&self) -> bool {
        self.owned.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct Partition {
    pub catalog: Catalog,
    pub assignment: Assignment,
    /// Non-empty modules in module order.
    pub modules: Vec<Module>,
    pub edges: Vec<DependencyEdge>,
    pub cycles: Vec<Vec<String>>,
    pub warnings: Vec<Warning>,
    module_order: Vec<String>,
}

impl Partition {
    pub fn module(&self, name: &str) -> Option<&Module> {
        self.modules.iter().find(|m| m.name == name)
    }

    pub fn imports_for(&self, consumer: &str) -> Vec<ImportStatement> {
        imports::synthesize(consumer, &self.edges, &self.module_order)
    }
}

pub fn read_source(path: &Path) -> Result<String, SplitError> {
    fs::read_to_string(path).map_err(|source| SplitError::SourceUnreadable {
        path: path.to_path_buf(),
        source,
    })
}

/// Run the whole pipeline over `source`. `origin` labels the source in errors.
pub fn partition(
    source: &str,
    origin: &str,
    config: &BucketConfig,
) -> Result<Partition, SplitError> {
    let catalog = crate::core::extract::extract(source, origin)?;
    let (assignment, mut warnings) = buckets::assign(&catalog, config);

    let module_order = config.module_order();
    let modules: Vec<Module> = module_order
        .iter()
        .map(|name| build_module(name, &catalog, &assignment, config.keep_leading_comments))
        .filter(|m| !m.is_empty())
        .collect();

    let edges = deps::resolve(&modules, &catalog, &assignment);
    let cycles = deps::find_cycles(&module_order, &edges);
    warnings.extend(cycles.iter().map(|c| Warning::ImportCycle { modules: c.clone() }));

    Ok(Partition {
        catalog,
        assignment,
        modules,
        edges,
        cycles,
        warnings,
        module_order,
    })
}

fn build_module(
    name: &str,
    catalog: &Catalog,
    assignment: &Assignment,
    with_comments: bool,
) -> Module {
    let mut owned = Vec::new();
    let mut parts = Vec::new();
    for symbol in catalog.symbols() {
        if assignment.owner_of(symbol.name()) == Some(name) {
            owned.push(symbol.name().to_string());
            parts.push(symbol.module_text(with_comments));
        }
    }
    Module {
        name: name.to_string(),
        owned,
        body: parts.join("\n\n"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::buckets::BucketDef;

    fn config(buckets: &[(&str, &[&str])]) -> BucketConfig {
        BucketConfig {
            default_bucket: "general".to_string(),
            keep_leading_comments: false,
            buckets: buckets
                .iter()
                .map(|(name, entities)| BucketDef {
                    name: name.to_string(),
                    entities: entities.iter().map(|e| e.to_string()).collect(),
                })
                .collect(),
            ..BucketConfig::default()
        }
    }

    #[test]
    fn body_joins_symbols_with_blank_line() {
        let src = "export const users = mysqlTable(\"users\", {});\nexport type UserInsert = typeof users.$inferInsert;\n";
        let p = partition(src, "s.ts", &config(&[("users", &["users"])])).unwrap();
        let m = p.module("users").unwrap();
        assert_eq!(m.owned, vec!["users", "UserInsert"]);
        assert_eq!(
            m.body,
            "export const users = mysqlTable(\"users\", {});\n\nexport type UserInsert = typeof users.$inferInsert;"
        );
    }

    #[test]
    fn empty_modules_are_dropped() {
        let src = "export const users = mysqlTable(\"users\", {});\n";
        let p = partition(src, "s.ts", &config(&[("users", &["users"]), ("deals", &[])])).unwrap();
        let names: Vec<&str> = p.modules.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["users"]);
    }

    #[test]
    fn mutual_references_are_reported_as_cycle() {
        let src = "export const a = mysqlTable(\"a\", { bId: int().references(() => b.id) });\n\
export const b = mysqlTable(\"b\", { aId: int().references(() => a.id) });\n";
        let p = partition(src, "s.ts", &config(&[("left", &["a"]), ("right", &["b"])])).unwrap();
        assert_eq!(p.cycles, vec![vec!["left".to_string(), "right".to_string()]]);
        assert!(p
            .warnings
            .iter()
            .any(|w| matches!(w, Warning::ImportCycle { .. })));
    }

    #[test]
    fn missing_source_is_unreadable() {
        let err = read_source(Path::new("/nonexistent/schema.ts")).unwrap_err();
        assert!(matches!(err, SplitError::SourceUnreadable { .. }));
    }
}
