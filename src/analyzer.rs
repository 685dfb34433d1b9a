use std::path::{Path, PathBuf};
use std::time::Instant;

use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::config::{load_config, should_include_file, AnalyzerConfig};
use crate::context::AnalysisContext;
use crate::errors::{AnalysisError, Result};
use crate::extraction::extract_file;
use crate::graph::CallGraphAssembler;
use crate::resolution::{CallHierarchyBuilder, ReferenceResolver};
use crate::source::SourceFile;
use crate::symbols::SymbolTable;
use crate::types::*;

/// Batch driver: owns the configuration and the analysis context and runs
/// the three passes in order.
pub struct Analyzer {
    config: AnalyzerConfig,
    context: AnalysisContext,
}

/// A file the batch could not analyse.
#[derive(Debug, Clone, PartialEq)]
pub struct FileFailure {
    pub path: String,
    pub message: String,
}

/// Result of analysing a batch of files.
#[derive(Debug, Clone)]
pub struct BatchReport {
    /// Completed analyses, in input order.
    pub analyses: Vec<FileAnalysis>,
    /// Files that failed to read or parse. Siblings are unaffected.
    pub failures: Vec<FileFailure>,
    /// Inputs rejected by the include/exclude patterns.
    pub skipped: Vec<String>,
    /// Time taken in milliseconds.
    pub duration_ms: u64,
}

// ---------------------------------------------------------------------------
// Lifecycle
// ---------------------------------------------------------------------------

impl Analyzer {
    pub fn new(config: AnalyzerConfig) -> Self {
        Self {
            config,
            context: AnalysisContext::new(),
        }
    }

    /// Creates an analyzer using the configuration saved under `project_root`.
    pub fn open(project_root: &Path) -> Result<Self> {
        Ok(Self::new(load_config(project_root)?))
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    pub fn context(&self) -> &AnalysisContext {
        &self.context
    }
}

impl Default for Analyzer {
    fn default() -> Self {
        Self::new(AnalyzerConfig::default())
    }
}

// ---------------------------------------------------------------------------
// Analysis
// ---------------------------------------------------------------------------

impl Analyzer {
    /// Runs all three passes on a single file.
    ///
    /// Cross-file lookups see whatever earlier calls put in the symbol
    /// table; use a batch when files depend on each other.
    pub fn analyze_source(&mut self, path: &str, text: &str) -> Result<FileAnalysis> {
        let file = self.prepare(path, text)?;
        self.context.forget_file(path);
        let table = self.context.symbols();
        let analysis = extract_file(&file, table, self.config.extract_docstrings);
        let analysis = resolve_file(
            &file,
            analysis,
            table,
            self.config.ignore_single_char_identifiers,
        );
        self.context.record_file(analysis.clone());
        Ok(analysis)
    }

    /// Analyses in-memory `(path, text)` pairs as one batch.
    pub fn analyze_sources(&mut self, sources: &[(String, String)]) -> BatchReport {
        let inputs = sources
            .iter()
            .map(|(path, text)| (path.clone(), Ok(text.clone())))
            .collect();
        self.run_batch(inputs)
    }

    /// Reads and analyses files from disk as one batch.
    pub fn analyze_files(&mut self, paths: &[PathBuf]) -> BatchReport {
        let inputs = paths
            .iter()
            .map(|path| {
                let display = path.to_string_lossy().to_string();
                let text = std::fs::read_to_string(path).map_err(|e| AnalysisError::File {
                    message: format!("failed to read source: {e}"),
                    path: display.clone(),
                });
                (display, text)
            })
            .collect();
        self.run_batch(inputs)
    }

    /// Assembles the call graph over every file analysed so far.
    pub fn call_graph(&self) -> CallGraph {
        CallGraphAssembler::assemble(self.context.files(), self.context.symbols())
    }

    /// Pass one for every file, then passes two and three for every file.
    fn run_batch(&mut self, inputs: Vec<(String, Result<String>)>) -> BatchReport {
        let start = Instant::now();
        let mut failures = Vec::new();
        let mut skipped = Vec::new();
        let mut files = Vec::new();

        for (path, text) in inputs {
            if !should_include_file(&path, &self.config) {
                debug!(file = %path, "skipped by include/exclude patterns");
                skipped.push(path);
                continue;
            }
            match text.and_then(|text| self.prepare(&path, &text)) {
                Ok(file) => files.push(file),
                Err(e) => {
                    warn!(file = %path, error = %e, "file analysis failed");
                    failures.push(FileFailure {
                        path,
                        message: e.to_string(),
                    });
                }
            }
        }

        for file in &files {
            self.context.forget_file(file.path());
        }

        let table = self.context.symbols();
        let docs = self.config.extract_docstrings;
        let ignore_single = self.config.ignore_single_char_identifiers;
        let parallel = self.config.parallel;

        // Pass one must finish for every file before any lookups happen.
        let extract = |file: &SourceFile| extract_file(file, table, docs);
        let extracted: Vec<FileAnalysis> = if parallel {
            files.par_iter().map(extract).collect()
        } else {
            files.iter().map(extract).collect()
        };
        debug!(files = files.len(), symbols = table.len(), "pass one complete");

        let resolve = |(file, analysis): (&SourceFile, FileAnalysis)| {
            resolve_file(file, analysis, table, ignore_single)
        };
        let analyses: Vec<FileAnalysis> = if parallel {
            files
                .par_iter()
                .zip(extracted.into_par_iter())
                .map(resolve)
                .collect()
        } else {
            files.iter().zip(extracted).map(resolve).collect()
        };

        for analysis in &analyses {
            self.context.record_file(analysis.clone());
        }

        let report = BatchReport {
            analyses,
            failures,
            skipped,
            duration_ms: start.elapsed().as_millis() as u64,
        };
        info!(
            analysed = report.analyses.len(),
            failed = report.failures.len(),
            skipped = report.skipped.len(),
            duration_ms = report.duration_ms,
            "batch complete"
        );
        report
    }

    /// Applies the size limit and parses.
    fn prepare(&self, path: &str, text: &str) -> Result<SourceFile> {
        if text.len() as u64 > self.config.max_file_size {
            return Err(AnalysisError::File {
                message: format!(
                    "file is {} bytes, larger than max_file_size {}",
                    text.len(),
                    self.config.max_file_size
                ),
                path: path.to_string(),
            });
        }
        SourceFile::parse(path, text)
    }
}

/// Passes two and three for one file.
fn resolve_file(
    file: &SourceFile,
    mut analysis: FileAnalysis,
    table: &SymbolTable,
    ignore_single_char: bool,
) -> FileAnalysis {
    analysis.call_edges = CallHierarchyBuilder::build(file, &analysis, table);
    analysis.references = ReferenceResolver::resolve(file, &analysis, table, ignore_single_char);
    analysis
}

// ---------------------------------------------------------------------------
// Query delegation
// ---------------------------------------------------------------------------

impl Analyzer {
    /// Calls made by `function_name` (simple or qualified) in `file`.
    pub fn call_hierarchy(&self, file: &str, function_name: &str) -> Vec<CallEdge> {
        self.context.call_hierarchy(file, function_name)
    }

    /// Every recorded occurrence of `qualified_name`.
    pub fn references_of(&self, qualified_name: &str) -> Vec<ReferenceRecord> {
        self.context.references_of(qualified_name)
    }

    /// The latest declaration stored under `qualified_name`.
    pub fn lookup_symbol(&self, qualified_name: &str) -> Option<Symbol> {
        self.context.lookup_symbol(qualified_name)
    }
}
