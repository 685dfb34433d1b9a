use std::fs;
use std::path::{Path, PathBuf};

use glob::Pattern;
use serde::{Deserialize, Serialize};

use crate::errors::{AnalysisError, Result};

/// Name of the configuration file stored inside the `.gograph` directory.
pub const CONFIG_FILENAME: &str = "config.json";

/// Name of the hidden directory holding analyzer settings.
pub const GOGRAPH_DIR: &str = ".gograph";

/// Analyzer configuration.
///
/// Controls which files a batch accepts, size limits, and pass toggles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzerConfig {
    /// Schema version of the configuration.
    pub version: u32,
    /// Glob patterns for files to analyse.
    pub include: Vec<String>,
    /// Glob patterns for files to skip.
    pub exclude: Vec<String>,
    /// Maximum file size in bytes; larger files fail with a file error.
    pub max_file_size: u64,
    /// Whether to attach doc comments to symbols.
    pub extract_docstrings: bool,
    /// Whether pass one runs on a thread pool.
    pub parallel: bool,
    /// Whether one-character identifiers that are never assigned are
    /// left out of the reference records.
    pub ignore_single_char_identifiers: bool,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            version: 1,
            include: vec!["**/*.go".to_string()],
            exclude: vec![
                "vendor/**".to_string(),
                ".git/**".to_string(),
                ".gograph/**".to_string(),
                "testdata/**".to_string(),
                "node_modules/**".to_string(),
            ],
            max_file_size: 1_048_576,
            extract_docstrings: true,
            parallel: true,
            ignore_single_char_identifiers: true,
        }
    }
}

/// Returns the path to the `.gograph` directory within the given project root.
pub fn get_gograph_dir(project_root: &Path) -> PathBuf {
    project_root.join(GOGRAPH_DIR)
}

/// Returns the path to `config.json` within the `.gograph` directory.
pub fn get_config_path(project_root: &Path) -> PathBuf {
    get_gograph_dir(project_root).join(CONFIG_FILENAME)
}

/// Loads the configuration from disk, or the defaults when none was saved.
pub fn load_config(project_root: &Path) -> Result<AnalyzerConfig> {
    let config_path = get_config_path(project_root);

    if !config_path.exists() {
        return Ok(AnalyzerConfig::default());
    }

    let contents = fs::read_to_string(&config_path).map_err(|e| AnalysisError::Config {
        message: format!(
            "failed to read config file '{}': {}",
            config_path.display(),
            e
        ),
    })?;

    serde_json::from_str(&contents).map_err(|e| AnalysisError::Config {
        message: format!(
            "failed to parse config file '{}': {}",
            config_path.display(),
            e
        ),
    })
}

/// Saves the configuration to disk.
///
/// Writes a temporary file and renames it over the final location, so a
/// partial write never leaves a truncated config behind.
pub fn save_config(project_root: &Path, config: &AnalyzerConfig) -> Result<()> {
    let dir = get_gograph_dir(project_root);
    fs::create_dir_all(&dir).map_err(|e| AnalysisError::Config {
        message: format!("failed to create directory '{}': {}", dir.display(), e),
    })?;

    let config_path = get_config_path(project_root);
    let tmp_path = config_path.with_extension("tmp");

    let json = serde_json::to_string_pretty(config).map_err(|e| AnalysisError::Config {
        message: format!("failed to serialize config: {}", e),
    })?;

    fs::write(&tmp_path, &json).map_err(|e| AnalysisError::Config {
        message: format!(
            "failed to write temporary config file '{}': {}",
            tmp_path.display(),
            e
        ),
    })?;

    fs::rename(&tmp_path, &config_path).map_err(|e| AnalysisError::Config {
        message: format!(
            "failed to rename '{}' to '{}': {}",
            tmp_path.display(),
            config_path.display(),
            e
        ),
    })?;

    Ok(())
}

/// Determines whether a file should be analysed.
///
/// A file is included only if it matches at least one include pattern and
/// no exclude pattern. Exclude patterns take precedence.
pub fn should_include_file(file_path: &str, config: &AnalyzerConfig) -> bool {
    let match_opts = glob::MatchOptions {
        case_sensitive: true,
        require_literal_separator: false,
        require_literal_leading_dot: false,
    };

    let matches = |patterns: &[String]| {
        patterns.iter().any(|p| {
            Pattern::new(p)
                .map(|pattern| pattern.matches_with(file_path, match_opts))
                .unwrap_or(false)
        })
    };

    !matches(&config.exclude) && matches(&config.include)
}
