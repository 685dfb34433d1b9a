use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::errors::Result;

/// A location inside a source file.
///
/// `line` and `column` are 1-based; `offset` is the 0-based byte offset
/// from the start of the file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    pub file: String,
    pub line: u32,
    pub column: u32,
    pub offset: usize,
}

impl Position {
    /// Returns true if both positions name the same file, line and column.
    pub fn same_location(&self, other: &Position) -> bool {
        self.file == other.file && self.line == other.line && self.column == other.column
    }
}

/// Kinds of declared symbols.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SymbolKind {
    Import,
    Constant,
    Variable,
    TypeAlias,
    Record,
    Interface,
    Function,
    Method,
    Field,
    Parameter,
    Result,
}

#[allow(clippy::should_implement_trait)]
impl SymbolKind {
    /// Returns the string representation of this symbol kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            SymbolKind::Import => "import",
            SymbolKind::Constant => "constant",
            SymbolKind::Variable => "variable",
            SymbolKind::TypeAlias => "type_alias",
            SymbolKind::Record => "record",
            SymbolKind::Interface => "interface",
            SymbolKind::Function => "function",
            SymbolKind::Method => "method",
            SymbolKind::Field => "field",
            SymbolKind::Parameter => "parameter",
            SymbolKind::Result => "result",
        }
    }

    /// Parses a string into a `SymbolKind`, returning `None` for unrecognized values.
    pub fn from_str(s: &str) -> Option<SymbolKind> {
        match s {
            "import" => Some(SymbolKind::Import),
            "constant" => Some(SymbolKind::Constant),
            "variable" => Some(SymbolKind::Variable),
            "type_alias" => Some(SymbolKind::TypeAlias),
            "record" => Some(SymbolKind::Record),
            "interface" => Some(SymbolKind::Interface),
            "function" => Some(SymbolKind::Function),
            "method" => Some(SymbolKind::Method),
            "field" => Some(SymbolKind::Field),
            "parameter" => Some(SymbolKind::Parameter),
            "result" => Some(SymbolKind::Result),
            _ => None,
        }
    }

    /// Returns true for functions and methods.
    pub fn is_callable(&self) -> bool {
        matches!(self, SymbolKind::Function | SymbolKind::Method)
    }
}

/// A declared name and everything the extractor learned about it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Symbol {
    pub name: String,
    pub qualified_name: String,
    pub kind: SymbolKind,
    pub package: String,
    /// Free-form type text. `"inferred"` when only an initializer is present.
    pub declared_type: String,
    pub literal_value: Option<String>,
    pub exported: bool,
    pub position: Position,
    pub doc_comment: Option<String>,
    pub fields: Vec<Symbol>,
    pub method_names: Vec<String>,
    pub parameters: Vec<Symbol>,
    pub results: Vec<Symbol>,
    /// Receiver type name with the pointer marker and type arguments removed.
    pub receiver_type: Option<String>,
    pub pointer_receiver: bool,
}

impl Symbol {
    /// Creates a symbol with empty kind-specific children.
    pub fn new(name: &str, kind: SymbolKind, package: &str, position: Position) -> Self {
        Self {
            name: name.to_string(),
            qualified_name: String::new(),
            kind,
            package: package.to_string(),
            declared_type: String::new(),
            literal_value: None,
            exported: is_exported(name),
            position,
            doc_comment: None,
            fields: Vec::new(),
            method_names: Vec::new(),
            parameters: Vec::new(),
            results: Vec::new(),
            receiver_type: None,
            pointer_receiver: false,
        }
    }
}

/// Go export rule: a name is visible outside its package when its first
/// character is upper-case.
pub fn is_exported(name: &str) -> bool {
    name.starts_with(|c: char| c.is_uppercase())
}

/// Builds `package.[receiver.]name`.
pub fn qualified_name(package: &str, receiver: Option<&str>, name: &str) -> String {
    match receiver {
        Some(recv) => format!("{}.{}.{}", package, recv, name),
        None => format!("{}.{}", package, name),
    }
}

/// Returns the trailing segment of a qualified name.
pub fn simple_name(qualified: &str) -> &str {
    qualified.rsplit('.').next().unwrap_or(qualified)
}

/// A call expression found inside a function or method body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallEdge {
    /// Qualified name of the enclosing declaration.
    pub caller: String,
    /// Callee as written: `name` or `operand.name`.
    pub callee: String,
    /// Import alias used as the selector operand, if any.
    pub package_hint: Option<String>,
    /// Qualified name of the callee when the symbol table knows it.
    pub resolved_callee: Option<String>,
    pub file: String,
    pub position: Position,
    pub arguments: Vec<String>,
}

/// How an identifier occurrence relates to the symbol it names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RefType {
    Declaration,
    Usage,
    Modification,
}

impl RefType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RefType::Declaration => "declaration",
            RefType::Usage => "usage",
            RefType::Modification => "modification",
        }
    }
}

/// One classified identifier or selector occurrence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceRecord {
    /// Resolved qualified name, or the raw name when resolution failed.
    pub symbol: String,
    pub ref_type: RefType,
    pub position: Position,
    pub resolved: bool,
}

/// Which branch statement a `Branch` node records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BranchKind {
    Break,
    Continue,
    Goto,
    Fallthrough,
}

impl BranchKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BranchKind::Break => "break",
            BranchKind::Continue => "continue",
            BranchKind::Goto => "goto",
            BranchKind::Fallthrough => "fallthrough",
        }
    }
}

/// Closed set of statement kinds produced by the decomposer.
///
/// `Other` carries the raw tree-sitter node type of anything not listed so
/// that no statement is dropped.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatementKind {
    Assignment,
    Block,
    Branch(BranchKind),
    Declaration,
    FunctionCall,
    Expression,
    For,
    Range,
    If,
    Else,
    IncDec,
    Return,
    Switch,
    TypeSwitch,
    Select,
    Case,
    DefaultCase,
    Go,
    Defer,
    Labeled,
    Send,
    Empty,
    Other(String),
}

impl StatementKind {
    /// Returns the textual kind name.
    pub fn as_str(&self) -> &str {
        match self {
            StatementKind::Assignment => "assignment",
            StatementKind::Block => "block",
            StatementKind::Branch(kind) => kind.as_str(),
            StatementKind::Declaration => "declaration",
            StatementKind::FunctionCall => "function_call",
            StatementKind::Expression => "expression",
            StatementKind::For => "for",
            StatementKind::Range => "range",
            StatementKind::If => "if",
            StatementKind::Else => "else",
            StatementKind::IncDec => "inc_dec",
            StatementKind::Return => "return",
            StatementKind::Switch => "switch",
            StatementKind::TypeSwitch => "type_switch",
            StatementKind::Select => "select",
            StatementKind::Case => "case",
            StatementKind::DefaultCase => "default_case",
            StatementKind::Go => "go",
            StatementKind::Defer => "defer",
            StatementKind::Labeled => "labeled",
            StatementKind::Send => "send",
            StatementKind::Empty => "empty",
            StatementKind::Other(raw) => raw.as_str(),
        }
    }
}

/// A decomposed statement and its nested statements.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatementNode {
    pub kind: StatementKind,
    pub text: String,
    pub position: Position,
    pub conditions: Vec<String>,
    pub touched_variables: Vec<String>,
    pub callee_names: Vec<String>,
    /// Assignment right-hand sides, returned expressions, loop updates.
    pub values: Vec<String>,
    pub label: Option<String>,
    pub operator: Option<String>,
    pub children: Vec<StatementNode>,
}

impl StatementNode {
    pub fn new(kind: StatementKind, text: String, position: Position) -> Self {
        Self {
            kind,
            text,
            position,
            conditions: Vec::new(),
            touched_variables: Vec::new(),
            callee_names: Vec::new(),
            values: Vec::new(),
            label: None,
            operator: None,
            children: Vec::new(),
        }
    }

    /// Pre-order walk over this node and all of its descendants.
    pub fn flatten(&self) -> Vec<&StatementNode> {
        let mut out = Vec::new();
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            out.push(node);
            for child in node.children.iter().rev() {
                stack.push(child);
            }
        }
        out
    }

    /// Number of nodes in this subtree, including itself.
    pub fn count(&self) -> usize {
        1 + self.children.iter().map(StatementNode::count).sum::<usize>()
    }
}

/// The literal source of one function or method plus its statement tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CodeBlock {
    pub qualified_name: String,
    /// Empty when the declaration's byte range was inconsistent.
    pub content: String,
    pub start_offset: usize,
    pub end_offset: usize,
    pub start_line: u32,
    pub end_line: u32,
    pub statements: Vec<StatementNode>,
}

/// Everything learned about one file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FileAnalysis {
    pub path: String,
    pub package: String,
    pub content_hash: String,
    pub imports: Vec<Symbol>,
    pub constants: Vec<Symbol>,
    pub variables: Vec<Symbol>,
    pub types: Vec<Symbol>,
    pub records: Vec<Symbol>,
    pub interfaces: Vec<Symbol>,
    /// Functions and methods, in source order.
    pub functions: Vec<Symbol>,
    pub code_blocks: Vec<CodeBlock>,
    pub call_edges: Vec<CallEdge>,
    pub references: Vec<ReferenceRecord>,
    /// Malformed declarations that were skipped.
    pub warnings: Vec<String>,
}

impl FileAnalysis {
    /// All top-level declarations in the order they are grouped.
    pub fn declarations(&self) -> impl Iterator<Item = &Symbol> {
        self.imports
            .iter()
            .chain(self.constants.iter())
            .chain(self.variables.iter())
            .chain(self.types.iter())
            .chain(self.records.iter())
            .chain(self.interfaces.iter())
            .chain(self.functions.iter())
    }

    /// Maps each import alias to its import path.
    pub fn import_aliases(&self) -> HashMap<String, String> {
        self.imports
            .iter()
            .map(|s| (s.name.clone(), s.declared_type.clone()))
            .collect()
    }

    /// Maps `(line, column)` of every symbol this file declared, struct
    /// fields included, to its qualified name.
    pub fn declaration_positions(&self) -> HashMap<(u32, u32), String> {
        self.declarations()
            .flat_map(|s| std::iter::once(s).chain(s.fields.iter()))
            .map(|s| ((s.position.line, s.position.column), s.qualified_name.clone()))
            .collect()
    }

    /// Finds a function or method by qualified name.
    pub fn function(&self, qualified_name: &str) -> Option<&Symbol> {
        self.functions
            .iter()
            .find(|s| s.qualified_name == qualified_name)
    }

    /// Serializes the analysis as a JSON document.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Finds the code block of a function or method by qualified name.
    pub fn code_block(&self, qualified_name: &str) -> Option<&CodeBlock> {
        self.code_blocks
            .iter()
            .find(|b| b.qualified_name == qualified_name)
    }
}

/// A node of the repository call graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallGraphNode {
    /// Qualified name, or a synthesized name for external callees.
    pub id: String,
    pub package: String,
    pub name: String,
    pub receiver: Option<String>,
    pub is_external: bool,
}

/// A deduplicated caller -> callee edge with its occurrence count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallGraphEdge {
    pub source: String,
    pub target: String,
    pub count: u32,
}

/// Repository-scope call graph.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallGraph {
    pub nodes: Vec<CallGraphNode>,
    pub edges: Vec<CallGraphEdge>,
}
