use std::collections::{HashMap, HashSet};

use tracing::debug;
use tree_sitter::Node as TsNode;

use crate::extraction::import_alias;
use crate::source::{named_children, SourceFile};
use crate::symbols::SymbolTable;
use crate::types::{
    is_exported, qualified_name, FileAnalysis, Position, RefType, ReferenceRecord, SymbolKind,
};

/// Go keywords and predeclared identifiers. Never recorded as references.
const RESERVED: &[&str] = &[
    "break", "case", "chan", "const", "continue", "default", "defer", "else", "fallthrough",
    "for", "func", "go", "goto", "if", "import", "interface", "map", "package", "range",
    "return", "select", "struct", "switch", "type", "var", "bool", "byte", "complex64",
    "complex128", "error", "float32", "float64", "int", "int8", "int16", "int32", "int64",
    "rune", "string", "uint", "uint8", "uint16", "uint32", "uint64", "uintptr", "any",
    "comparable", "true", "false", "iota", "nil", "_",
];

/// Predeclared functions of the language.
const BUILTIN_FUNCS: &[&str] = &[
    "append", "cap", "clear", "close", "complex", "copy", "delete", "imag", "len", "make",
    "max", "min", "new", "panic", "print", "println", "real", "recover",
];

/// Returns true for keywords, predeclared types/constants and built-in functions.
pub fn is_reserved(name: &str) -> bool {
    RESERVED.contains(&name) || BUILTIN_FUNCS.contains(&name)
}

/// Returns true for the language's predeclared functions.
pub fn is_builtin_func(name: &str) -> bool {
    BUILTIN_FUNCS.contains(&name)
}

/// Pass three: classifies identifier and selector occurrences as
/// declarations, usages or modifications.
pub struct ReferenceResolver;

/// Internal state used during the walk.
struct RefState<'a> {
    file: &'a SourceFile,
    table: &'a SymbolTable,
    package: &'a str,
    aliases: HashMap<String, String>,
    /// `(line, column)` -> qualified name of symbols declared in this file.
    declared: HashMap<(u32, u32), String>,
    /// `(name, line, column)` of assignment left-hand sides.
    assignment_targets: HashSet<(String, u32, u32)>,
    assigned_names: HashSet<String>,
    ignore_single_char: bool,
    seen: HashSet<(u32, u32)>,
    records: Vec<ReferenceRecord>,
}

impl ReferenceResolver {
    /// Classifies every occurrence in `file`. At most one record is kept
    /// per source position; the first detection wins.
    pub fn resolve(
        file: &SourceFile,
        analysis: &FileAnalysis,
        table: &SymbolTable,
        ignore_single_char: bool,
    ) -> Vec<ReferenceRecord> {
        // The file's own declarations win over table entries another file
        // overwrote under the same qualified name.
        let mut declared = table.declaration_positions(file.path());
        declared.extend(analysis.declaration_positions());
        let mut state = RefState {
            file,
            table,
            package: &analysis.package,
            aliases: analysis.import_aliases(),
            declared,
            assignment_targets: HashSet::new(),
            assigned_names: HashSet::new(),
            ignore_single_char,
            seen: HashSet::new(),
            records: Vec::new(),
        };
        Self::collect_assignment_targets(&mut state, file.root());
        Self::visit(&mut state, file.root());
        debug!(file = %file.path(), references = state.records.len(), "references resolved");
        state.records
    }

    // ----------------------------
    // Assignment targets
    // ----------------------------

    fn collect_assignment_targets(state: &mut RefState<'_>, node: TsNode<'_>) {
        match node.kind() {
            "assignment_statement" | "short_var_declaration" => {
                if let Some(left) = node.child_by_field_name("left") {
                    for target in named_children(left) {
                        Self::add_target(state, target);
                    }
                }
            }
            "inc_statement" | "dec_statement" => {
                if let Some(target) = named_children(node).into_iter().next() {
                    Self::add_target(state, target);
                }
            }
            _ => {}
        }
        for child in named_children(node) {
            Self::collect_assignment_targets(state, child);
        }
    }

    fn add_target(state: &mut RefState<'_>, target: TsNode<'_>) {
        if !matches!(target.kind(), "identifier" | "selector_expression") {
            return;
        }
        let name = compact_text(state.file, target);
        let pos = state.file.position(target);
        state.assigned_names.insert(name.clone());
        state.assignment_targets.insert((name, pos.line, pos.column));
    }

    // ----------------------------
    // Classification walk
    // ----------------------------

    fn visit(state: &mut RefState<'_>, node: TsNode<'_>) {
        match node.kind() {
            "package_clause" | "import_declaration" | "comment" => return,
            "call_expression" => {
                // Callees are always usages.
                if let Some(function) = node.child_by_field_name("function") {
                    match function.kind() {
                        "identifier" => Self::classify_identifier(state, function, true),
                        "selector_expression" => Self::classify_selector(state, function, true),
                        _ => {}
                    }
                }
            }
            "selector_expression" => Self::classify_selector(state, node, false),
            "qualified_type" => Self::classify_qualified_type(state, node),
            "identifier" | "type_identifier" => Self::classify_identifier(state, node, false),
            "field_identifier" => {
                // Only declaration sites; member accesses go through selectors.
                let pos = state.file.position(node);
                if state.declared.contains_key(&(pos.line, pos.column)) {
                    Self::classify_identifier(state, node, false);
                }
            }
            _ => {}
        }
        for child in named_children(node) {
            Self::visit(state, child);
        }
    }

    fn classify_identifier(state: &mut RefState<'_>, node: TsNode<'_>, callee: bool) {
        let name = state.file.node_text(node).to_string();
        let pos = state.file.position(node);
        let key = (pos.line, pos.column);
        if state.seen.contains(&key) || is_reserved(&name) {
            return;
        }
        let declared = state.declared.get(&key).cloned();
        if state.ignore_single_char
            && name.chars().count() <= 1
            && declared.is_none()
            && !state.assigned_names.contains(&name)
        {
            return;
        }

        let (symbol, resolved, ref_type) = if callee {
            let (symbol, resolved) = Self::resolve_name(state, &name);
            (symbol, resolved, RefType::Usage)
        } else if let Some(qualified) = declared {
            (qualified, true, RefType::Declaration)
        } else {
            let (symbol, resolved) = Self::resolve_name(state, &name);
            let ref_type = if state
                .assignment_targets
                .contains(&(name.clone(), pos.line, pos.column))
            {
                RefType::Modification
            } else {
                RefType::Usage
            };
            (symbol, resolved, ref_type)
        };
        Self::push(state, symbol, resolved, ref_type, pos);
    }

    fn classify_selector(state: &mut RefState<'_>, node: TsNode<'_>, callee: bool) {
        let pos = state.file.position(node);
        let key = (pos.line, pos.column);
        if state.seen.contains(&key) {
            return;
        }
        let (Some(operand), Some(field)) = (
            node.child_by_field_name("operand"),
            node.child_by_field_name("field"),
        ) else {
            return;
        };
        let member = state.file.node_text(field).to_string();
        let text = compact_text(state.file, node);

        let (symbol, resolved) = match Self::import_path_of(state, operand) {
            Some(path) => Self::resolve_imported(state, &path, &member),
            None => Self::resolve_member(state, &member).unwrap_or((text.clone(), false)),
        };
        let ref_type = if !callee
            && state
                .assignment_targets
                .contains(&(text, pos.line, pos.column))
        {
            RefType::Modification
        } else {
            RefType::Usage
        };
        Self::push(state, symbol, resolved, ref_type, pos);
    }

    /// `pkg.Type` in type position.
    fn classify_qualified_type(state: &mut RefState<'_>, node: TsNode<'_>) {
        let pos = state.file.position(node);
        if state.seen.contains(&(pos.line, pos.column)) {
            return;
        }
        let (Some(package), Some(name)) = (
            node.child_by_field_name("package"),
            node.child_by_field_name("name"),
        ) else {
            return;
        };
        let alias = state.file.node_text(package).to_string();
        let name = state.file.node_text(name).to_string();
        let (symbol, resolved) = match state.aliases.get(&alias).cloned() {
            Some(path) => Self::resolve_imported(state, &path, &name),
            None => (format!("{}.{}", alias, name), false),
        };
        Self::push(state, symbol, resolved, RefType::Usage, pos);
    }

    // ----------------------------
    // Name resolution
    // ----------------------------

    /// Unqualified names: this package first, then any top-level symbol
    /// with the same simple name for exported identifiers. Anything else is
    /// kept under its raw name.
    fn resolve_name(state: &RefState<'_>, name: &str) -> (String, bool) {
        let local = qualified_name(state.package, None, name);
        if state.table.contains(&local) {
            return (local, true);
        }
        if is_exported(name) {
            let top_level = state
                .table
                .lookup_by_simple_name(name)
                .into_iter()
                .find(|(qualified, s)| {
                    qualified.matches('.').count() == 1 && s.kind != SymbolKind::Import
                });
            if let Some((qualified, _)) = top_level {
                return (qualified, true);
            }
        }
        (name.to_string(), false)
    }

    /// `alias.Name` through the import table. Falls back to the import path
    /// as the package part when the target package was never analysed.
    fn resolve_imported(state: &RefState<'_>, path: &str, name: &str) -> (String, bool) {
        let candidate = qualified_name(import_alias(path), None, name);
        if state.table.contains(&candidate) {
            (candidate, true)
        } else {
            (format!("{}.{}", path, name), false)
        }
    }

    /// `value.member`: the first method or field with that name.
    fn resolve_member(state: &RefState<'_>, member: &str) -> Option<(String, bool)> {
        state
            .table
            .lookup_by_simple_name(member)
            .into_iter()
            .find(|(_, s)| matches!(s.kind, SymbolKind::Method | SymbolKind::Field))
            .map(|(qualified, _)| (qualified, true))
    }

    fn import_path_of(state: &RefState<'_>, operand: TsNode<'_>) -> Option<String> {
        if operand.kind() != "identifier" {
            return None;
        }
        state.aliases.get(state.file.node_text(operand)).cloned()
    }

    fn push(
        state: &mut RefState<'_>,
        symbol: String,
        resolved: bool,
        ref_type: RefType,
        position: Position,
    ) {
        if !state.seen.insert((position.line, position.column)) {
            return;
        }
        state.records.push(ReferenceRecord {
            symbol,
            ref_type,
            position,
            resolved,
        });
    }
}

/// Node text with whitespace removed, so `s . x` and `s.x` key alike.
fn compact_text(file: &SourceFile, node: TsNode<'_>) -> String {
    file.node_text(node)
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect()
}
