use std::collections::{BTreeMap, HashMap};

use crate::symbols::SymbolTable;
use crate::types::{simple_name, CallEdge, FileAnalysis, ReferenceRecord, Symbol};

/// Shared state of one analysis run.
///
/// The batch driver owns the context. Passes borrow the symbol table;
/// only `record_file` writes the call and reference indices.
#[derive(Debug, Default)]
pub struct AnalysisContext {
    symbols: SymbolTable,
    /// `"file:callerQualifiedName"` -> edges in source order.
    calls: HashMap<String, Vec<CallEdge>>,
    /// Resolved symbol (or raw name) -> occurrences.
    references: HashMap<String, Vec<ReferenceRecord>>,
    /// Completed analyses by path.
    files: BTreeMap<String, FileAnalysis>,
}

impl AnalysisContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn symbols(&self) -> &SymbolTable {
        &self.symbols
    }

    /// Forgets everything previously learned from `path`.
    ///
    /// Called before a file is extracted again so re-analysis replaces
    /// rather than accumulates.
    pub fn forget_file(&mut self, path: &str) {
        self.symbols.remove_file(path);
        let prefix = call_key(path, "");
        self.calls.retain(|key, _| !key.starts_with(&prefix));
        for records in self.references.values_mut() {
            records.retain(|r| r.position.file != path);
        }
        self.references.retain(|_, records| !records.is_empty());
        self.files.remove(path);
    }

    /// Indexes a completed analysis.
    pub fn record_file(&mut self, analysis: FileAnalysis) {
        let path = analysis.path.clone();
        let prefix = call_key(&path, "");
        self.calls.retain(|key, _| !key.starts_with(&prefix));
        for records in self.references.values_mut() {
            records.retain(|r| r.position.file != path);
        }

        for edge in &analysis.call_edges {
            self.calls
                .entry(call_key(&path, &edge.caller))
                .or_default()
                .push(edge.clone());
        }
        for record in &analysis.references {
            self.references
                .entry(record.symbol.clone())
                .or_default()
                .push(record.clone());
        }
        self.references.retain(|_, records| !records.is_empty());
        self.files.insert(path, analysis);
    }

    /// Calls made by `function_name` in `file`.
    ///
    /// Accepts a qualified caller (`pkg.Service.Run`) or a simple name
    /// (`Run`); a simple name gathers every caller with that name.
    pub fn call_hierarchy(&self, file: &str, function_name: &str) -> Vec<CallEdge> {
        if let Some(edges) = self.calls.get(&call_key(file, function_name)) {
            return edges.clone();
        }
        let prefix = call_key(file, "");
        let mut keys: Vec<&String> = self
            .calls
            .keys()
            .filter(|key| {
                key.strip_prefix(&prefix)
                    .map(|caller| simple_name(caller) == function_name)
                    .unwrap_or(false)
            })
            .collect();
        keys.sort();
        keys.into_iter()
            .flat_map(|key| self.calls[key].iter().cloned())
            .collect()
    }

    /// Every recorded occurrence of `qualified_name`, ordered by position.
    pub fn references_of(&self, qualified_name: &str) -> Vec<ReferenceRecord> {
        let mut records = self
            .references
            .get(qualified_name)
            .cloned()
            .unwrap_or_default();
        records.sort_by(|a, b| {
            (&a.position.file, a.position.line, a.position.column)
                .cmp(&(&b.position.file, b.position.line, b.position.column))
        });
        records
    }

    pub fn lookup_symbol(&self, qualified_name: &str) -> Option<Symbol> {
        self.symbols.lookup(qualified_name)
    }

    pub fn file(&self, path: &str) -> Option<&FileAnalysis> {
        self.files.get(path)
    }

    /// Completed analyses in path order.
    pub fn files(&self) -> impl Iterator<Item = &FileAnalysis> {
        self.files.values()
    }
}

fn call_key(file: &str, caller: &str) -> String {
    format!("{}:{}", file, caller)
}
