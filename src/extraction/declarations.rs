/// Declaration extraction for Go source files.
///
/// Walks the top level of a file once, builds a `Symbol` for every
/// import, constant, variable, type and function/method, and inserts each
/// one into the shared symbol table under its qualified name.
use tracing::{debug, warn};
use tree_sitter::Node as TsNode;

use crate::source::{field_children, find_child_by_kind, named_children, SourceFile};
use crate::symbols::SymbolTable;
use crate::sync::content_hash;
use crate::types::{qualified_name, FileAnalysis, Symbol, SymbolKind};

/// Type text recorded for constants and variables that only have an initializer.
pub const INFERRED_TYPE: &str = "inferred";

/// Extracts declarations from a parsed Go file.
pub struct DeclarationExtractor;

/// Internal state used during the top-level walk.
struct ExtractionState<'a> {
    file: &'a SourceFile,
    table: &'a SymbolTable,
    analysis: FileAnalysis,
    extract_docstrings: bool,
}

impl<'a> ExtractionState<'a> {
    fn package(&self) -> &str {
        &self.analysis.package
    }

    fn text(&self, node: TsNode<'_>) -> String {
        self.file.node_text(node).to_string()
    }

    /// Records a skipped declaration.
    fn skip(&mut self, node: TsNode<'_>, reason: &str) {
        let pos = self.file.position(node);
        let message = format!(
            "{}:{}:{}: skipped {}: {}",
            pos.file,
            pos.line,
            pos.column,
            node.kind(),
            reason
        );
        warn!(file = %pos.file, line = pos.line, "{}", message);
        self.analysis.warnings.push(message);
    }

    /// Sets the qualified name and inserts the symbol into the table.
    fn register(&self, symbol: &mut Symbol, receiver: Option<&str>) {
        symbol.qualified_name = qualified_name(self.package(), receiver, &symbol.name);
        self.table.insert(&symbol.qualified_name, symbol.clone());
    }
}

impl DeclarationExtractor {
    /// Extracts every top-level declaration of `file`.
    ///
    /// Never fails: declarations with an unexpected shape are skipped and
    /// reported in `FileAnalysis::warnings`.
    pub fn extract(file: &SourceFile, table: &SymbolTable, extract_docstrings: bool) -> FileAnalysis {
        let mut state = ExtractionState {
            file,
            table,
            analysis: FileAnalysis {
                path: file.path().to_string(),
                content_hash: content_hash(file.text()),
                ..FileAnalysis::default()
            },
            extract_docstrings,
        };

        let root = file.root();
        match find_child_by_kind(root, "package_clause") {
            Some(clause) => Self::visit_package(&mut state, clause),
            None => state.skip(root, "missing package clause"),
        }

        for child in named_children(root) {
            Self::visit_node(&mut state, child);
        }

        debug!(
            file = %file.path(),
            declarations = state.analysis.declarations().count(),
            warnings = state.analysis.warnings.len(),
            "declarations extracted"
        );
        state.analysis
    }

    /// Dispatches a top-level node on its type.
    fn visit_node(state: &mut ExtractionState<'_>, node: TsNode<'_>) {
        match node.kind() {
            "import_declaration" => Self::visit_imports(state, node),
            "const_declaration" => Self::visit_value_declaration(state, node, SymbolKind::Constant),
            "var_declaration" => Self::visit_value_declaration(state, node, SymbolKind::Variable),
            "type_declaration" => Self::visit_type_declaration(state, node),
            "function_declaration" => Self::visit_function(state, node),
            "method_declaration" => Self::visit_method(state, node),
            _ => {}
        }
    }

    fn visit_package(state: &mut ExtractionState<'_>, node: TsNode<'_>) {
        match find_child_by_kind(node, "package_identifier") {
            Some(ident) => state.analysis.package = state.text(ident),
            None => state.skip(node, "package clause has no name"),
        }
    }

    // ----------------------------
    // Imports
    // ----------------------------

    /// Imports can be `import "foo"` or `import ( "foo"; bar "baz" )`.
    fn visit_imports(state: &mut ExtractionState<'_>, node: TsNode<'_>) {
        for child in named_children(node) {
            match child.kind() {
                "import_spec" => Self::visit_single_import(state, child),
                "import_spec_list" => {
                    for spec in named_children(child) {
                        if spec.kind() == "import_spec" {
                            Self::visit_single_import(state, spec);
                        }
                    }
                }
                _ => {}
            }
        }
    }

    fn visit_single_import(state: &mut ExtractionState<'_>, node: TsNode<'_>) {
        let Some(path_node) = node.child_by_field_name("path") else {
            state.skip(node, "import without a path");
            return;
        };
        let path = state
            .text(path_node)
            .trim()
            .trim_matches(|c| c == '"' || c == '`')
            .to_string();
        if path.is_empty() {
            state.skip(node, "empty import path");
            return;
        }
        let alias = match node.child_by_field_name("name") {
            Some(name) => state.text(name),
            None => import_alias(&path).to_string(),
        };

        let mut symbol = Symbol::new(&alias, SymbolKind::Import, state.package(), state.file.position(node));
        symbol.declared_type = path;
        symbol.doc_comment = Self::doc_for(state, node);
        state.register(&mut symbol, None);
        state.analysis.imports.push(symbol);
    }

    // ----------------------------
    // Constants and variables
    // ----------------------------

    fn visit_value_declaration(state: &mut ExtractionState<'_>, node: TsNode<'_>, kind: SymbolKind) {
        let group_doc = Self::doc_for(state, node);
        let mut specs = Vec::new();
        collect_specs(node, &mut specs);

        // Constants without type or value repeat the previous spec (iota groups).
        let mut previous_type: Option<String> = None;
        for spec in specs {
            let names = field_children(spec, "name");
            if names.is_empty() {
                state.skip(spec, "value spec without names");
                continue;
            }
            let values = spec
                .child_by_field_name("value")
                .map(named_children)
                .unwrap_or_default();

            let declared_type = match spec.child_by_field_name("type") {
                Some(ty) => state.text(ty),
                None if !values.is_empty() => INFERRED_TYPE.to_string(),
                None if kind == SymbolKind::Constant => previous_type.clone().unwrap_or_default(),
                None => String::new(),
            };
            previous_type = Some(declared_type.clone());

            let doc = Self::doc_for(state, spec).or_else(|| group_doc.clone());
            for (i, name_node) in names.iter().enumerate() {
                let name = state.text(*name_node);
                let mut symbol = Symbol::new(&name, kind, state.package(), state.file.position(*name_node));
                symbol.declared_type = declared_type.clone();
                symbol.literal_value = values.get(i).map(|v| state.text(*v));
                symbol.doc_comment = doc.clone();
                state.register(&mut symbol, None);
                match kind {
                    SymbolKind::Constant => state.analysis.constants.push(symbol),
                    _ => state.analysis.variables.push(symbol),
                }
            }
        }
    }

    // ----------------------------
    // Types
    // ----------------------------

    /// A type_declaration holds one or more type_spec / type_alias children.
    fn visit_type_declaration(state: &mut ExtractionState<'_>, node: TsNode<'_>) {
        let group_doc = Self::doc_for(state, node);
        for spec in named_children(node) {
            if !matches!(spec.kind(), "type_spec" | "type_alias") {
                continue;
            }
            let (Some(name_node), Some(type_node)) = (named(spec, "name"), named(spec, "type"))
            else {
                state.skip(spec, "type spec without name or underlying type");
                continue;
            };
            let name = state.text(name_node);
            let mut symbol = Symbol::new(&name, SymbolKind::TypeAlias, state.package(), state.file.position(name_node));
            symbol.doc_comment = Self::doc_for(state, spec).or_else(|| group_doc.clone());

            match (spec.kind(), type_node.kind()) {
                ("type_spec", "struct_type") => {
                    symbol.kind = SymbolKind::Record;
                    symbol.declared_type = "struct".to_string();
                    symbol.fields = Self::extract_struct_fields(state, &name, type_node);
                    state.register(&mut symbol, None);
                    state.analysis.records.push(symbol);
                }
                ("type_spec", "interface_type") => {
                    symbol.kind = SymbolKind::Interface;
                    symbol.declared_type = "interface".to_string();
                    symbol.method_names = Self::extract_interface_methods(state, type_node);
                    state.register(&mut symbol, None);
                    state.analysis.interfaces.push(symbol);
                }
                _ => {
                    symbol.declared_type = state.text(type_node);
                    state.register(&mut symbol, None);
                    state.analysis.types.push(symbol);
                }
            }
        }
    }

    /// Extracts fields from a struct_type. Each field is also registered
    /// under `package.Type.field`.
    fn extract_struct_fields(state: &mut ExtractionState<'_>, owner: &str, struct_type: TsNode<'_>) -> Vec<Symbol> {
        let mut fields = Vec::new();
        let Some(list) = find_child_by_kind(struct_type, "field_declaration_list") else {
            return fields;
        };
        for decl in named_children(list) {
            if decl.kind() != "field_declaration" {
                continue;
            }
            let Some(type_node) = decl.child_by_field_name("type") else {
                state.skip(decl, "field without a type");
                continue;
            };
            let mut type_text = state.text(type_node);
            let tag = decl.child_by_field_name("tag").map(|t| state.text(t));
            let doc = Self::doc_for(state, decl);

            let names = field_children(decl, "name");
            let entries: Vec<(String, TsNode<'_>)> = if names.is_empty() {
                // Embedded field: named after its type.
                if !type_text.starts_with('*') && find_child_by_kind(decl, "*").is_some() {
                    type_text = format!("*{}", type_text);
                }
                vec![(embedded_field_name(&type_text).to_string(), type_node)]
            } else {
                names.iter().map(|n| (state.text(*n), *n)).collect()
            };

            for (name, at) in entries {
                let mut field = Symbol::new(&name, SymbolKind::Field, state.package(), state.file.position(at));
                field.declared_type = type_text.clone();
                field.literal_value = tag.clone();
                field.doc_comment = doc.clone();
                state.register(&mut field, Some(owner));
                fields.push(field);
            }
        }
        fields
    }

    /// Method names of an interface; embedded interfaces are recorded by type name.
    fn extract_interface_methods(state: &ExtractionState<'_>, iface: TsNode<'_>) -> Vec<String> {
        let mut names = Vec::new();
        for child in named_children(iface) {
            match child.kind() {
                "method_elem" | "method_spec" => {
                    if let Some(name) = child.child_by_field_name("name") {
                        names.push(state.text(name));
                    }
                }
                "type_elem" | "constraint_elem" | "interface_type_name" | "type_identifier" | "qualified_type" => {
                    names.push(state.text(child).trim().to_string());
                }
                _ => {}
            }
        }
        names
    }

    // ----------------------------
    // Functions and methods
    // ----------------------------

    fn visit_function(state: &mut ExtractionState<'_>, node: TsNode<'_>) {
        let Some(name_node) = named(node, "name") else {
            state.skip(node, "function without a name");
            return;
        };
        let name = state.text(name_node);
        let mut symbol = Symbol::new(&name, SymbolKind::Function, state.package(), state.file.position(name_node));
        Self::fill_signature(state, node, &mut symbol);
        state.register(&mut symbol, None);
        state.analysis.functions.push(symbol);
    }

    fn visit_method(state: &mut ExtractionState<'_>, node: TsNode<'_>) {
        let Some(name_node) = named(node, "name") else {
            state.skip(node, "method without a name");
            return;
        };
        let receiver_text = node
            .child_by_field_name("receiver")
            .and_then(|r| find_child_by_kind(r, "parameter_declaration"))
            .and_then(|p| p.child_by_field_name("type"))
            .map(|t| state.text(t));
        let Some(receiver_text) = receiver_text else {
            state.skip(node, "method without a receiver type");
            return;
        };
        let receiver = receiver_base(&receiver_text).to_string();
        if receiver.is_empty() {
            state.skip(node, "method receiver has no type name");
            return;
        }

        let name = state.text(name_node);
        let mut symbol = Symbol::new(&name, SymbolKind::Method, state.package(), state.file.position(name_node));
        symbol.pointer_receiver = receiver_text.trim_start().starts_with('*');
        symbol.receiver_type = Some(receiver.clone());
        Self::fill_signature(state, node, &mut symbol);
        state.register(&mut symbol, Some(&receiver));
        state.analysis.functions.push(symbol);
    }

    /// Fills signature text, doc comment, parameters and results.
    fn fill_signature(state: &ExtractionState<'_>, node: TsNode<'_>, symbol: &mut Symbol) {
        let text = state.file.node_text(node);
        symbol.declared_type = match node.child_by_field_name("body") {
            Some(body) => state
                .file
                .slice(node.start_byte(), body.start_byte())
                .trim()
                .to_string(),
            None => text.trim().to_string(),
        };
        symbol.doc_comment = Self::doc_for(state, node);
        if let Some(params) = node.child_by_field_name("parameters") {
            symbol.parameters = Self::extract_parameters(state, params, SymbolKind::Parameter);
        }
        if let Some(result) = node.child_by_field_name("result") {
            symbol.results = if result.kind() == "parameter_list" {
                Self::extract_parameters(state, result, SymbolKind::Result)
            } else {
                let mut anonymous = Symbol::new("", SymbolKind::Result, state.package(), state.file.position(result));
                anonymous.declared_type = state.text(result);
                vec![anonymous]
            };
        }
    }

    /// One entry per declared name; unnamed entries get an empty name.
    fn extract_parameters(state: &ExtractionState<'_>, list: TsNode<'_>, kind: SymbolKind) -> Vec<Symbol> {
        let mut out = Vec::new();
        for decl in named_children(list) {
            if !matches!(decl.kind(), "parameter_declaration" | "variadic_parameter_declaration") {
                continue;
            }
            let mut type_text = decl
                .child_by_field_name("type")
                .map(|t| state.text(t))
                .unwrap_or_default();
            if decl.kind() == "variadic_parameter_declaration" {
                type_text = format!("...{}", type_text);
            }
            let names = field_children(decl, "name");
            if names.is_empty() {
                let mut param = Symbol::new("", kind, state.package(), state.file.position(decl));
                param.declared_type = type_text;
                out.push(param);
                continue;
            }
            for name_node in names {
                let mut param = Symbol::new(&state.text(name_node), kind, state.package(), state.file.position(name_node));
                param.declared_type = type_text.clone();
                out.push(param);
            }
        }
        out
    }

    // ----------------------------
    // Doc comments
    // ----------------------------

    fn doc_for(state: &ExtractionState<'_>, node: TsNode<'_>) -> Option<String> {
        if !state.extract_docstrings {
            return None;
        }
        extract_docstring(state.file, node)
    }
}

/// A field child that the parser actually found (not inserted by error recovery).
fn named<'a>(node: TsNode<'a>, field: &str) -> Option<TsNode<'a>> {
    node.child_by_field_name(field)
        .filter(|child| !child.is_missing() && !child.is_error())
}

/// Collects const_spec / var_spec nodes, descending into var_spec_list.
fn collect_specs<'a>(node: TsNode<'a>, out: &mut Vec<TsNode<'a>>) {
    for child in named_children(node) {
        match child.kind() {
            "const_spec" | "var_spec" => out.push(child),
            "var_spec_list" => collect_specs(child, out),
            _ => {}
        }
    }
}

/// Local alias of an import: the last path segment.
pub fn import_alias(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

/// Strips the pointer marker and type arguments from a receiver type.
///
/// `*Service` -> `Service`, `*List[T]` -> `List`.
pub fn receiver_base(text: &str) -> &str {
    let trimmed = text.trim().trim_start_matches('*').trim_start_matches('(').trim();
    let end = trimmed.find(['[', ')']).unwrap_or(trimmed.len());
    trimmed[..end].trim()
}

/// Name of an embedded field: the type name without pointer, package
/// qualifier or type arguments.
pub fn embedded_field_name(type_text: &str) -> &str {
    let base = receiver_base(type_text);
    base.rsplit('.').next().unwrap_or(base)
}

/// Collects the contiguous comment block immediately preceding `node`.
///
/// Each comment must end on the row right above the node (or above the
/// comment collected before it). A comment trailing code on its own row
/// ends the block.
pub fn extract_docstring(file: &SourceFile, node: TsNode<'_>) -> Option<String> {
    let mut comments = Vec::new();
    let mut next_row = node.start_position().row;
    let mut current = node.prev_named_sibling();
    while let Some(sibling) = current {
        if sibling.kind() != "comment" || sibling.end_position().row + 1 != next_row {
            break;
        }
        if is_trailing_comment(sibling) {
            break;
        }
        comments.push(file.node_text(sibling));
        next_row = sibling.start_position().row;
        current = sibling.prev_named_sibling();
    }
    if comments.is_empty() {
        return None;
    }
    // Collected closest first.
    comments.reverse();
    let cleaned: Vec<String> = comments.iter().map(|c| clean_comment(c)).collect();
    let result = cleaned.join("\n").trim().to_string();
    if result.is_empty() {
        None
    } else {
        Some(result)
    }
}

/// True when `comment` shares its first row with the token before it.
fn is_trailing_comment(comment: TsNode<'_>) -> bool {
    let row = comment.start_position().row;
    let mut current = comment.prev_sibling();
    while let Some(before) = current {
        // Line terminators end on the following row.
        if before.kind().trim().is_empty() {
            current = before.prev_sibling();
            continue;
        }
        return before.kind() != "comment" && before.end_position().row == row;
    }
    false
}

/// Strip comment markers from a single Go comment.
fn clean_comment(comment: &str) -> String {
    let trimmed = comment.trim();
    if let Some(stripped) = trimmed.strip_prefix("//") {
        stripped.strip_prefix(' ').unwrap_or(stripped).to_string()
    } else if trimmed.starts_with("/*") && trimmed.ends_with("*/") && trimmed.len() >= 4 {
        trimmed[2..trimmed.len() - 2]
            .lines()
            .map(|line| {
                let l = line.trim();
                l.strip_prefix("* ")
                    .or_else(|| l.strip_prefix('*'))
                    .unwrap_or(l)
            })
            .collect::<Vec<_>>()
            .join("\n")
            .trim()
            .to_string()
    } else {
        trimmed.to_string()
    }
}
