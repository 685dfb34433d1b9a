/// Pass one: declaration extraction, code blocks and statement trees.
///
/// Everything here runs against a single parsed file and only writes to
/// that file's `FileAnalysis` plus the shared symbol table.
mod code_blocks;
mod declarations;
mod statements;

pub use code_blocks::CodeBlockExtractor;
pub use declarations::{
    embedded_field_name, extract_docstring, import_alias, receiver_base, DeclarationExtractor,
    INFERRED_TYPE,
};
pub use statements::{callee_text, collect_calls, StatementDecomposer};

use crate::source::SourceFile;
use crate::symbols::SymbolTable;
use crate::types::FileAnalysis;

/// Runs the whole of pass one for `file`.
pub fn extract_file(file: &SourceFile, table: &SymbolTable, extract_docstrings: bool) -> FileAnalysis {
    let mut analysis = DeclarationExtractor::extract(file, table, extract_docstrings);
    analysis.code_blocks = CodeBlockExtractor::extract(file, &analysis);
    analysis
}
