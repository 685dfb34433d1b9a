/// Repository-level call graph assembly.
pub mod assembler;

/// Traversal and queries over an assembled call graph.
pub mod traversal;

pub use assembler::{CallGraphAssembler, BUILTIN_PACKAGE};
pub use traversal::GraphTraverser;
