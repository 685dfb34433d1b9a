/// Passes two and three.
///
/// Both passes read the symbol table built by pass one, so they must only
/// run once every file of a batch has been through declaration extraction.
mod calls;
mod references;

pub use calls::{resolve_callee, CallHierarchyBuilder};
pub use references::{is_builtin_func, is_reserved, ReferenceResolver};
