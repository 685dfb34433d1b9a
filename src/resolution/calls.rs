use std::collections::HashMap;

use tracing::{debug, trace};
use tree_sitter::Node as TsNode;

use crate::extraction::{callee_text, import_alias};
use crate::source::{named_children, SourceFile};
use crate::symbols::SymbolTable;
use crate::types::{qualified_name, CallEdge, FileAnalysis, SymbolKind};

/// Pass two: finds every call expression in a file and attributes it to
/// its enclosing function or method.
pub struct CallHierarchyBuilder;

/// Internal state used during the walk.
struct CallState<'a> {
    file: &'a SourceFile,
    analysis: &'a FileAnalysis,
    table: &'a SymbolTable,
    aliases: HashMap<String, String>,
    /// Index into `analysis.functions` of each enclosing declaration;
    /// `None` for declarations that pass one skipped.
    enclosing: Vec<Option<usize>>,
    edges: Vec<CallEdge>,
}

impl CallHierarchyBuilder {
    /// Returns one edge per call expression that sits inside a known
    /// function or method. Calls at package level are dropped.
    pub fn build(file: &SourceFile, analysis: &FileAnalysis, table: &SymbolTable) -> Vec<CallEdge> {
        let mut state = CallState {
            file,
            analysis,
            table,
            aliases: analysis.import_aliases(),
            enclosing: Vec::new(),
            edges: Vec::new(),
        };
        Self::visit(&mut state, file.root());
        debug!(file = %file.path(), calls = state.edges.len(), "call hierarchy built");
        state.edges
    }

    fn visit(state: &mut CallState<'_>, node: TsNode<'_>) {
        match node.kind() {
            "function_declaration" | "method_declaration" => {
                let index = Self::declaration_index(state, node);
                state.enclosing.push(index);
                Self::visit_children(state, node);
                state.enclosing.pop();
            }
            "call_expression" => {
                if let Some(Some(index)) = state.enclosing.last().copied() {
                    Self::record_call(state, node, index);
                }
                Self::visit_children(state, node);
            }
            _ => Self::visit_children(state, node),
        }
    }

    fn visit_children(state: &mut CallState<'_>, node: TsNode<'_>) {
        let mut cursor = node.walk();
        if cursor.goto_first_child() {
            loop {
                Self::visit(state, cursor.node());
                if !cursor.goto_next_sibling() {
                    break;
                }
            }
        }
    }

    /// Matches a declaration node to the symbol pass one built for it.
    fn declaration_index(state: &CallState<'_>, node: TsNode<'_>) -> Option<usize> {
        let name = node.child_by_field_name("name")?;
        let position = state.file.position(name);
        state
            .analysis
            .functions
            .iter()
            .position(|f| f.position.same_location(&position))
    }

    fn record_call(state: &mut CallState<'_>, node: TsNode<'_>, index: usize) {
        let Some(function) = node.child_by_field_name("function") else {
            return;
        };
        let callee = callee_text(state.file, function);
        let package_hint = Self::package_hint(state, function);
        let arguments = node
            .child_by_field_name("arguments")
            .map(|args| {
                named_children(args)
                    .into_iter()
                    .map(|a| state.file.node_text(a).to_string())
                    .collect()
            })
            .unwrap_or_default();

        let resolved_callee = resolve_callee(
            state.table,
            &state.analysis.package,
            &state.aliases,
            &callee,
            package_hint.as_deref(),
        );
        if resolved_callee.is_none() {
            trace!(file = %state.file.path(), callee = %callee, "unresolved call");
        }

        let caller = state.analysis.functions[index].qualified_name.clone();
        state.edges.push(CallEdge {
            caller,
            callee,
            package_hint,
            resolved_callee,
            file: state.file.path().to_string(),
            position: state.file.position(node),
            arguments,
        });
    }

    /// `x` of `x.y(...)` when `x` is an import alias of this file.
    fn package_hint(state: &CallState<'_>, function: TsNode<'_>) -> Option<String> {
        if function.kind() != "selector_expression" {
            return None;
        }
        let operand = function.child_by_field_name("operand")?;
        if operand.kind() != "identifier" {
            return None;
        }
        let alias = state.file.node_text(operand);
        state.aliases.contains_key(alias).then(|| alias.to_string())
    }
}

/// Resolves a callee to a qualified name known to the symbol table.
///
/// - package-qualified `alias.Name` -> `importPackage.Name`
/// - bare `name` -> `package.name`
/// - other `x.name` -> the first method or field named `name`
pub fn resolve_callee(
    table: &SymbolTable,
    package: &str,
    aliases: &HashMap<String, String>,
    callee: &str,
    package_hint: Option<&str>,
) -> Option<String> {
    if let Some(alias) = package_hint {
        let path = aliases.get(alias)?;
        let name = callee.strip_prefix(alias)?.strip_prefix('.')?;
        let candidate = qualified_name(import_alias(path), None, name);
        return table.contains(&candidate).then_some(candidate);
    }

    if is_identifier(callee) {
        let candidate = qualified_name(package, None, callee);
        return table.contains(&candidate).then_some(candidate);
    }

    let (_, member) = callee.rsplit_once('.')?;
    if !is_identifier(member) {
        return None;
    }
    table
        .lookup_by_simple_name(member)
        .into_iter()
        .find(|(_, s)| matches!(s.kind, SymbolKind::Method | SymbolKind::Field))
        .map(|(qualified, _)| qualified)
}

fn is_identifier(text: &str) -> bool {
    !text.is_empty()
        && text.chars().all(|c| c.is_alphanumeric() || c == '_')
        && !text.starts_with(|c: char| c.is_ascii_digit())
}
