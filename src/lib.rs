pub mod analyzer;
pub mod config;
pub mod context;
pub mod errors;
pub mod extraction;
pub mod graph;
pub mod resolution;
pub mod source;
pub mod symbols;
pub mod sync;
pub mod types;
