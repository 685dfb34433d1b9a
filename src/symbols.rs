use std::collections::HashMap;

use dashmap::DashMap;

use crate::types::{simple_name, Symbol};

/// Process-scoped index from qualified name to the latest declaration seen.
///
/// Inserts overwrite: when two files of one package declare the same name
/// the file processed later wins. Shards are locked per key, so pass one
/// can run on many threads at once.
#[derive(Debug, Default)]
pub struct SymbolTable {
    symbols: DashMap<String, Symbol>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces the symbol stored under `qualified_name`.
    pub fn insert(&self, qualified_name: &str, symbol: Symbol) {
        self.symbols.insert(qualified_name.to_string(), symbol);
    }

    pub fn lookup(&self, qualified_name: &str) -> Option<Symbol> {
        self.symbols.get(qualified_name).map(|s| s.value().clone())
    }

    pub fn contains(&self, qualified_name: &str) -> bool {
        self.symbols.contains_key(qualified_name)
    }

    /// Linear scan for entries whose qualified name equals `name` or ends in
    /// the simple-name segment `name`. Sorted by qualified name.
    pub fn lookup_by_simple_name(&self, name: &str) -> Vec<(String, Symbol)> {
        let mut found: Vec<(String, Symbol)> = self
            .symbols
            .iter()
            .filter(|entry| entry.key() == name || simple_name(entry.key()) == name)
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect();
        found.sort_by(|a, b| a.0.cmp(&b.0));
        found
    }

    /// Maps `(line, column)` of every symbol declared in `file` to its
    /// qualified name.
    pub fn declaration_positions(&self, file: &str) -> HashMap<(u32, u32), String> {
        self.symbols
            .iter()
            .filter(|entry| entry.value().position.file == file)
            .map(|entry| {
                let pos = &entry.value().position;
                ((pos.line, pos.column), entry.key().clone())
            })
            .collect()
    }

    /// Drops every symbol declared in `file`.
    pub fn remove_file(&self, file: &str) {
        self.symbols.retain(|_, symbol| symbol.position.file != file);
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}
