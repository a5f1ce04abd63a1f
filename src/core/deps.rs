//! Cross-module dependency resolution.
//!
//! A module depends on a symbol owned elsewhere when the symbol's name
//! appears in the module body as a whole token. This is textual: a name in a
//! comment or string literal counts too. The over-approximation is accepted;
//! an unneeded import is harmless, a missing one is not.

use crate::core::buckets::Assignment;
use crate::core::catalog::Catalog;
use crate::core::partition::Module;
use rayon::prelude::*;
use rustc_hash::FxHashSet;
use serde::Serialize;
use std::collections::{BTreeSet, HashSet};

/// `consumer` references `symbol`, which `owner` defines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DependencyEdge {
    pub consumer: String,
    pub owner: String,
    pub symbol: String,
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Maximal identifier runs of `text`.
///
/// A name matches as a whole token exactly when it is one of these runs,
/// since a run is bounded by non-identifier characters on both sides.
pub fn identifier_tokens(text: &str) -> FxHashSet<&str> {
    text.split(|c: char| !is_ident_char(c))
        .filter(|t| !t.is_empty())
        .collect()
}

/// Every edge from each module to symbols owned by other modules.
///
/// Modules are scanned in parallel; edges come back in module order, and
/// within a module in catalog order.
pub fn resolve(modules: &[Module], catalog: &Catalog, assignment: &Assignment) -> Vec<DependencyEdge> {
    modules
        .par_iter()
        .map(|module| {
            let tokens = identifier_tokens(&module.body);
            catalog
                .symbols()
                .filter_map(|symbol| {
                    let name = symbol.name();
                    let owner = assignment.owner_of(name)?;
                    if owner == module.name || !tokens.contains(name) {
                        return None;
                    }
                    Some(DependencyEdge {
                        consumer: module.name.clone(),
                        owner: owner.to_string(),
                        symbol: name.to_string(),
                    })
                })
                .collect::<Vec<_>>()
        })
        .collect::<Vec<_>>()
        .into_iter()
        .flatten()
        .collect()
}

/// Import cycles among modules, each listed once, starting from the module
/// visited first in `order`.
pub fn find_cycles(order: &[String], edges: &[DependencyEdge]) -> Vec<Vec<String>> {
    let index_of = |name: &str| order.iter().position(|m| m == name);
    let mut graph: Vec<Vec<usize>> = vec![Vec::new(); order.len()];
    for edge in edges {
        if let (Some(from), Some(to)) = (index_of(&edge.consumer), index_of(&edge.owner)) {
            graph[from].push(to);
        }
    }
    for targets in &mut graph {
        targets.sort_unstable();
        targets.dedup();
    }

    let mut found: Vec<Vec<usize>> = Vec::new();
    let mut visited = vec![false; order.len()];
    let mut on_path = vec![false; order.len()];
    let mut path = Vec::new();
    for node in 0..order.len() {
        if !visited[node] {
            cycles_dfs(node, &graph, &mut visited, &mut on_path, &mut path, &mut found);
        }
    }

    let mut seen: HashSet<BTreeSet<usize>> = HashSet::new();
    found
        .into_iter()
        .filter(|c| seen.insert(c.iter().copied().collect()))
        .map(|c| c.into_iter().map(|i| order[i].clone()).collect())
        .collect()
}

fn cycles_dfs(
    node: usize,
    graph: &[Vec<usize>],
    visited: &mut [bool],
    on_path: &mut [bool],
    path: &mut Vec<usize>,
    found: &mut Vec<Vec<usize>>,
) {
    visited[node] = true;
    on_path[node] = true;
    path.push(node);

    for &next in &graph[node] {
        if !visited[next] {
            cycles_dfs(next, graph, visited, on_path, path, found);
        } else if on_path[next] {
            if let Some(pos) = path.iter().position(|p| *p == next) {
                found.push(path[pos..].to_vec());
            }
        }
    }

    path.pop();
    on_path[node] = false;
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

    fn order(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn whole_token_matching() {
        let tokens = identifier_tokens("flags: json(\"userFlags\"), owner: int(\"users_id\")");
        assert!(!tokens.contains("user"));
        assert!(!tokens.contains("users"));
        assert!(tokens.contains("userFlags"));
        assert!(identifier_tokens("references(() => users.id)").contains("users"));
        assert!(identifier_tokens("typeof users.$inferSelect").contains("users"));
    }

    #[test]
    fn tokens_split_on_non_identifier_chars() {
        let tokens = identifier_tokens("a.b(c_d, e1) // f-g");
        for name in ["a", "b", "c_d", "e1", "f", "g"] {
            assert!(tokens.contains(name));
        }
        assert!(!tokens.contains("c"));
        assert_eq!(tokens.len(), 6);
    }

    #[test]
    fn mutual_imports_form_a_cycle() {
        let edges = vec![edge("users", "deals", "deals"), edge("deals", "users", "users")];
        let cycles = find_cycles(&order(&["users", "deals"]), &edges);
        assert_eq!(cycles, vec![vec!["users".to_string(), "deals".to_string()]]);
    }

    #[test]
    fn transitive_cycle_is_found_once() {
        let edges = vec![
            edge("a", "b", "x"),
            edge("b", "c", "y"),
            edge("c", "a", "z"),
            edge("c", "a", "w"),
        ];
        let cycles = find_cycles(&order(&["a", "b", "c"]), &edges);
        assert_eq!(cycles.len(), 1);
        assert_eq!(cycles[0], order(&["a", "b", "c"]));
    }

    #[test]
    fn acyclic_graph_has_no_cycles() {
        let edges = vec![edge("sales", "core", "users"), edge("billing", "core", "users")];
        assert!(find_cycles(&order(&["core", "sales", "billing"]), &edges).is_empty());
    }
}
