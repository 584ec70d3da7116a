//! Error types for settings loading.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur when loading or validating settings.
#[derive(Debug, Error)]
pub enum ConfigError {
	/// Error reading a settings file.
	#[error("I/O error reading {path}: {error}")]
	Io {
		/// Path to the file that failed to read.
		path: PathBuf,
		/// The underlying I/O error.
		error: std::io::Error,
	},

	/// The settings document is not valid JSON or has mistyped values.
	#[error("settings parse error: {0}")]
	Parse(#[from] serde_json::Error),

	/// `only_complete_after_regex` does not compile.
	#[error("invalid completion trigger pattern {pattern:?}: {error}")]
	InvalidRegex {
		/// The offending pattern.
		pattern: String,
		/// The underlying regex error.
		error: regex::Error,
	},

	/// Reload was requested on a store that was not loaded from a file.
	#[error("settings store has no backing file")]
	NoSource,
}

/// Result type for settings operations.
pub type Result<T> = std::result::Result<T, ConfigError>;
