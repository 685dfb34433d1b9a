/// Parsed Go source file and position lookups.
///
/// Wraps the tree-sitter Go grammar. Every pass works on a `SourceFile`
/// and asks it for node text and positions.
use std::path::Path;

use tree_sitter::{Node as TsNode, Parser, Tree};

use crate::errors::{AnalysisError, Result};
use crate::types::Position;

/// A file's path, raw text and syntax tree.
#[derive(Debug)]
pub struct SourceFile {
    path: String,
    text: String,
    tree: Tree,
}

impl SourceFile {
    /// Parses `text` as Go. `path` is used for positions only.
    pub fn parse(path: &str, text: &str) -> Result<Self> {
        let mut parser = Parser::new();
        let language = tree_sitter_go::LANGUAGE;
        parser
            .set_language(&language.into())
            .map_err(|e| AnalysisError::Parse {
                message: format!("failed to load Go grammar: {e}"),
                path: path.to_string(),
            })?;
        let tree = parser
            .parse(text, None)
            .ok_or_else(|| AnalysisError::Parse {
                message: "tree-sitter parse returned None".to_string(),
                path: path.to_string(),
            })?;
        Ok(Self {
            path: path.to_string(),
            text: text.to_string(),
            tree,
        })
    }

    /// Reads the whole file from disk and parses it.
    pub fn read(path: &Path) -> Result<Self> {
        let display = path.to_string_lossy().to_string();
        let text = std::fs::read_to_string(path).map_err(|e| AnalysisError::File {
            message: format!("failed to read source: {e}"),
            path: display.clone(),
        })?;
        Self::parse(&display, &text)
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn root(&self) -> TsNode<'_> {
        self.tree.root_node()
    }

    /// Source text covered by `node`. Empty for invalid UTF-8.
    pub fn node_text(&self, node: TsNode<'_>) -> &str {
        node.utf8_text(self.text.as_bytes()).unwrap_or("")
    }

    /// Start position of `node`.
    pub fn position(&self, node: TsNode<'_>) -> Position {
        let point = node.start_position();
        Position {
            file: self.path.clone(),
            line: point.row as u32 + 1,
            column: point.column as u32 + 1,
            offset: node.start_byte(),
        }
    }

    /// End line (1-based) of `node`.
    pub fn end_line(&self, node: TsNode<'_>) -> u32 {
        node.end_position().row as u32 + 1
    }

    /// Slices `[start, end)` out of the file text.
    ///
    /// Returns an empty string when the range is reversed, runs past the end
    /// of the file, or splits a UTF-8 sequence.
    pub fn slice(&self, start: usize, end: usize) -> &str {
        if end < start || end > self.text.len() {
            return "";
        }
        self.text.get(start..end).unwrap_or("")
    }
}

/// Returns the first child of `node` whose kind is `kind`.
pub fn find_child_by_kind<'a>(node: TsNode<'a>, kind: &str) -> Option<TsNode<'a>> {
    let mut cursor = node.walk();
    if cursor.goto_first_child() {
        loop {
            let child = cursor.node();
            if child.kind() == kind {
                return Some(child);
            }
            if !cursor.goto_next_sibling() {
                break;
            }
        }
    }
    None
}

/// Named children of `node`, skipping comments.
pub fn named_children(node: TsNode<'_>) -> Vec<TsNode<'_>> {
    let mut cursor = node.walk();
    node.named_children(&mut cursor)
        .filter(|c| c.kind() != "comment")
        .collect()
}

/// Named children attached to `field` on `node`. Separators that share
/// the field (commas in `a, b int`) are left out.
pub fn field_children<'a>(node: TsNode<'a>, field: &str) -> Vec<TsNode<'a>> {
    let mut cursor = node.walk();
    node.children_by_field_name(field, &mut cursor)
        .filter(|c| c.is_named())
        .collect()
}

/// The statements of a block-like node.
///
/// Newer grammars wrap statements in a `statement_list`; older ones put
/// them directly under the block. Both shapes are flattened here.
pub fn block_statements(node: TsNode<'_>) -> Vec<TsNode<'_>> {
    let mut out = Vec::new();
    for child in named_children(node) {
        if child.kind() == "statement_list" {
            out.extend(named_children(child));
        } else {
            out.push(child);
        }
    }
    out
}
