use std::collections::BTreeMap;

use tracing::debug;

use crate::resolution::is_builtin_func;
use crate::symbols::SymbolTable;
use crate::types::{simple_name, CallEdge, CallGraph, CallGraphEdge, CallGraphNode, FileAnalysis, Symbol};

/// Package recorded on external nodes for the language's built-in functions.
pub const BUILTIN_PACKAGE: &str = "builtin";

/// Merges per-file call edges into one deduplicated, counted call graph.
pub struct CallGraphAssembler;

impl CallGraphAssembler {
    /// Builds the graph from every analysis in the batch.
    ///
    /// Must run after all files finished passes two and three. Every
    /// function and method becomes a node, even when nothing calls it.
    /// Callees the symbol table does not know become external nodes.
    pub fn assemble<'a, I>(analyses: I, table: &SymbolTable) -> CallGraph
    where
        I: IntoIterator<Item = &'a FileAnalysis>,
    {
        let mut nodes: BTreeMap<String, CallGraphNode> = BTreeMap::new();
        let mut counts: BTreeMap<(String, String), u32> = BTreeMap::new();
        let analyses: Vec<&FileAnalysis> = analyses.into_iter().collect();

        for analysis in &analyses {
            for symbol in &analysis.functions {
                nodes
                    .entry(symbol.qualified_name.clone())
                    .or_insert_with(|| internal_node(symbol));
            }
        }

        for analysis in &analyses {
            let aliases = analysis.import_aliases();
            for edge in &analysis.call_edges {
                let target = match &edge.resolved_callee {
                    Some(qualified) => {
                        if !nodes.contains_key(qualified) {
                            let node = match table.lookup(qualified) {
                                Some(symbol) => internal_node(&symbol),
                                None => external_node(edge, None),
                            };
                            nodes.insert(qualified.clone(), node);
                        }
                        qualified.clone()
                    }
                    None => {
                        let path = edge
                            .package_hint
                            .as_ref()
                            .and_then(|alias| aliases.get(alias));
                        let node = external_node(edge, path.map(String::as_str));
                        let id = node.id.clone();
                        nodes.entry(id.clone()).or_insert(node);
                        id
                    }
                };
                *counts.entry((edge.caller.clone(), target)).or_insert(0) += 1;
            }
        }

        let edges: Vec<CallGraphEdge> = counts
            .into_iter()
            .map(|((source, target), count)| CallGraphEdge {
                source,
                target,
                count,
            })
            .collect();
        let graph = CallGraph {
            nodes: nodes.into_values().collect(),
            edges,
        };
        debug!(
            nodes = graph.nodes.len(),
            edges = graph.edges.len(),
            "call graph assembled"
        );
        graph
    }
}

fn internal_node(symbol: &Symbol) -> CallGraphNode {
    CallGraphNode {
        id: symbol.qualified_name.clone(),
        package: symbol.package.clone(),
        name: symbol.name.clone(),
        receiver: symbol.receiver_type.clone(),
        is_external: false,
    }
}

/// Synthesizes a node for a callee outside the analysed sources.
///
/// `import_path` is the path behind the edge's package hint, if any.
fn external_node(edge: &CallEdge, import_path: Option<&str>) -> CallGraphNode {
    let name = simple_name(&edge.callee).to_string();
    match (import_path, edge.package_hint.as_deref()) {
        (Some(path), _) => CallGraphNode {
            id: format!("{}.{}", path, name),
            package: path.to_string(),
            name,
            receiver: None,
            is_external: true,
        },
        (None, Some(alias)) => CallGraphNode {
            id: format!("{}.{}", alias, name),
            package: alias.to_string(),
            name,
            receiver: None,
            is_external: true,
        },
        (None, None) => CallGraphNode {
            id: edge.callee.clone(),
            package: if is_builtin_func(&edge.callee) {
                BUILTIN_PACKAGE.to_string()
            } else {
                String::new()
            },
            name,
            receiver: None,
            is_external: true,
        },
    }
}
