use tracing::debug;
use tree_sitter::Node as TsNode;

use crate::extraction::declarations::receiver_base;
use crate::extraction::statements::StatementDecomposer;
use crate::source::{named_children, SourceFile};
use crate::types::{CodeBlock, FileAnalysis, Symbol, SymbolKind};

/// Slices the literal source of every function and method and decomposes
/// its body.
pub struct CodeBlockExtractor;

impl CodeBlockExtractor {
    /// Builds one `CodeBlock` per function/method symbol in `analysis`.
    ///
    /// Symbols whose declaration node cannot be found again are skipped.
    pub fn extract(file: &SourceFile, analysis: &FileAnalysis) -> Vec<CodeBlock> {
        let decls: Vec<TsNode<'_>> = named_children(file.root())
            .into_iter()
            .filter(|n| matches!(n.kind(), "function_declaration" | "method_declaration"))
            .collect();

        let blocks: Vec<CodeBlock> = analysis
            .functions
            .iter()
            .filter_map(|symbol| {
                let node = Self::locate(file, &decls, symbol)?;
                Some(Self::build_block(file, node, symbol))
            })
            .collect();

        debug!(file = %file.path(), blocks = blocks.len(), "code blocks extracted");
        blocks
    }

    /// Finds the declaration node of `symbol` by name and, for methods,
    /// receiver type. Prefers the node whose name sits at the symbol's
    /// position when several match.
    fn locate<'a>(file: &SourceFile, decls: &[TsNode<'a>], symbol: &Symbol) -> Option<TsNode<'a>> {
        let mut candidates = decls.iter().copied().filter(|decl| {
            let Some(name) = decl.child_by_field_name("name") else {
                return false;
            };
            if file.node_text(name) != symbol.name {
                return false;
            }
            match symbol.kind {
                SymbolKind::Method => decl
                    .child_by_field_name("receiver")
                    .and_then(|r| named_children(r).into_iter().next())
                    .and_then(|p| p.child_by_field_name("type"))
                    .map(|t| Some(receiver_base(file.node_text(t))) == symbol.receiver_type.as_deref())
                    .unwrap_or(false),
                _ => decl.kind() == "function_declaration",
            }
        });

        let first = candidates.next()?;
        let at_position = std::iter::once(first).chain(candidates).find(|decl| {
            decl.child_by_field_name("name")
                .map(|n| file.position(n).same_location(&symbol.position))
                .unwrap_or(false)
        });
        Some(at_position.unwrap_or(first))
    }

    fn build_block(file: &SourceFile, node: TsNode<'_>, symbol: &Symbol) -> CodeBlock {
        let start = file.position(node);
        let end_offset = node.end_byte();
        let statements = match node.child_by_field_name("body") {
            Some(body) => StatementDecomposer::decompose_block(file, body),
            None => Vec::new(),
        };
        CodeBlock {
            qualified_name: symbol.qualified_name.clone(),
            content: file.slice(start.offset, end_offset).to_string(),
            start_offset: start.offset,
            end_offset,
            start_line: start.line,
            end_line: file.end_line(node),
            statements,
        }
    }
}
