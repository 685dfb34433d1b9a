use thiserror::Error;

/// Errors that can occur while analysing Go sources.
///
/// Only unreadable input and configuration problems surface as errors.
/// Malformed declarations, unresolved names and inconsistent positions are
/// absorbed by the passes and reported through `FileAnalysis::warnings`.
#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("file error: {message} (path: {path})")]
    File { message: String, path: String },

    #[error("parse error: {message} (path: {path})")]
    Parse { message: String, path: String },

    #[error("config error: {message}")]
    Config { message: String },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenience alias for results using `AnalysisError`.
pub type Result<T> = std::result::Result<T, AnalysisError>;
