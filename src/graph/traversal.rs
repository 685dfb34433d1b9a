use std::collections::{HashMap, HashSet, VecDeque};

use crate::types::{CallGraph, CallGraphEdge, CallGraphNode};

/// Names that are entry points and never count as uncalled.
const ENTRY_POINTS: &[&str] = &["main", "init"];

/// Read-only traversal and queries over an assembled call graph.
pub struct GraphTraverser<'a> {
    graph: &'a CallGraph,
    nodes: HashMap<&'a str, &'a CallGraphNode>,
}

impl<'a> GraphTraverser<'a> {
    /// Creates a traverser over `graph`.
    pub fn new(graph: &'a CallGraph) -> Self {
        let nodes = graph.nodes.iter().map(|n| (n.id.as_str(), n)).collect();
        Self { graph, nodes }
    }

    /// Looks up a node by id.
    pub fn node(&self, id: &str) -> Option<&'a CallGraphNode> {
        self.nodes.get(id).copied()
    }

    /// Edges whose target is `id`, each paired with the calling node.
    pub fn get_callers(&self, id: &str) -> Vec<(&'a CallGraphNode, &'a CallGraphEdge)> {
        self.graph
            .edges
            .iter()
            .filter(|e| e.target == id)
            .filter_map(|e| self.node(&e.source).map(|n| (n, e)))
            .collect()
    }

    /// Edges whose source is `id`, each paired with the called node.
    pub fn get_callees(&self, id: &str) -> Vec<(&'a CallGraphNode, &'a CallGraphEdge)> {
        self.graph
            .edges
            .iter()
            .filter(|e| e.source == id)
            .filter_map(|e| self.node(&e.target).map(|n| (n, e)))
            .collect()
    }

    /// Breadth-first walk over outgoing edges starting at `start_id`.
    ///
    /// Returns reachable nodes (excluding the start) in visit order, each
    /// with the depth at which it was first reached. Nodes beyond
    /// `max_depth` are not returned.
    pub fn reachable_from(&self, start_id: &str, max_depth: usize) -> Vec<(&'a CallGraphNode, usize)> {
        let mut visited: HashSet<&str> = HashSet::new();
        let mut result = Vec::new();
        let mut queue: VecDeque<(&str, usize)> = VecDeque::new();

        let Some(start) = self.node(start_id) else {
            return result;
        };
        visited.insert(start.id.as_str());
        queue.push_back((start.id.as_str(), 0));

        while let Some((current, depth)) = queue.pop_front() {
            if depth >= max_depth {
                continue;
            }
            for (neighbor, _) in self.get_callees(current) {
                if !visited.insert(neighbor.id.as_str()) {
                    continue;
                }
                result.push((neighbor, depth + 1));
                queue.push_back((neighbor.id.as_str(), depth + 1));
            }
        }
        result
    }

    /// Internal, unexported functions and methods that nothing calls.
    ///
    /// Excludes `main` and `init` (program entry points). Exported names are
    /// skipped since other packages may call them.
    pub fn find_uncalled(&self) -> Vec<&'a CallGraphNode> {
        let called: HashSet<&str> = self.graph.edges.iter().map(|e| e.target.as_str()).collect();
        self.graph
            .nodes
            .iter()
            .filter(|n| !n.is_external)
            .filter(|n| !ENTRY_POINTS.contains(&n.name.as_str()))
            .filter(|n| !crate::types::is_exported(&n.name))
            .filter(|n| !called.contains(n.id.as_str()))
            .collect()
    }
}
