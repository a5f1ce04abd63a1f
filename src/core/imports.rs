//! Import statement synthesis.

use crate::core::deps::DependencyEdge;
use serde::Serialize;

/// `import { <names> } from "./<from>";`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportStatement {
    pub from: String,
    pub names: Vec<String>,
}

impl ImportStatement {
    pub fn render(&self) -> String {
        format!("import {{ {} }} from \"./{}\";", self.names.join(", "), self.from)
    }
}

/// Imports needed by `consumer`: one statement per owning module, in
/// `module_order`, naming symbols in the order their edges were recorded.
pub fn synthesize(
    consumer: &str,
    edges: &[DependencyEdge],
    module_order: &[String],
) -> Vec<ImportStatement> {
    module_order
        .iter()
        .filter(|owner| owner.as_str() != consumer)
        .filter_map(|owner| {
            let mut names: Vec<String> = Vec::new();
            for edge in edges
                .iter()
                .filter(|e| e.consumer == consumer && &e.owner == owner)
            {
                if !names.contains(&edge.symbol) {
                    names.push(edge.symbol.clone());
                }
            }
            if names.is_empty() {
                None
            } else {
                Some(ImportStatement {
                    from: owner.clone(),
                    names,
                })
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn edge(consumer: &str, owner: &str, symbol: &str) -> DependencyEdge {
        DependencyEdge {
            consumer: consumer.into(),
            owner: owner.into(),
            symbol: symbol.into(),
        }
    }

    #[test]
    fn groups_by_owner_in_module_order() {
        let order: Vec<String> = ["core", "sales", "billing"].iter().map(|s| s.to_string()).collect();
        let edges = vec![
            edge("sales", "billing", "invoices"),
            edge("sales", "core", "users"),
            edge("sales", "core", "User"),
            edge("sales", "core", "users"),
            edge("billing", "core", "users"),
        ];
        let imports = synthesize("sales", &edges, &order);
        assert_eq!(
            imports,
            vec![
                ImportStatement {
                    from: "core".into(),
                    names: vec!["users".into(), "User".into()],
                },
                ImportStatement {
                    from: "billing".into(),
                    names: vec!["invoices".into()],
                },
            ]
        );
        assert_eq!(
            imports[0].render(),
            "import { users, User } from \"./core\";"
        );
    }

    #[test]
    fn never_imports_from_itself() {
        let order = vec!["core".to_string()];
        let edges = vec![edge("core", "core", "users")];
        assert!(synthesize("core", &edges, &order).is_empty());
    }
}
