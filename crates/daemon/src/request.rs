//! Request kinds, per-request context snapshots and answers.

use std::path::PathBuf;
use std::sync::Arc;

use crate::types::CompletionEntry;

/// Request kind tag, used for debounce keys and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestKind {
	Autocomplete,
	FuncArgs,
}

impl RequestKind {
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Autocomplete => "autocomplete",
			Self::FuncArgs => "funcargs",
		}
	}
}

/// A request with its typed parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
	/// Completions at the cursor, call parameters first.
	Autocomplete {
		/// Ask the engine for fuzzy matches.
		fuzzy: bool,
	},
	/// A snippet template of the enclosing call's parameters.
	FuncArgs {
		/// Include keyword parameters with their defaults; otherwise only
		/// required parameters up to the first `...`.
		complete_all: bool,
	},
}

impl Request {
	pub fn kind(&self) -> RequestKind {
		match self {
			Self::Autocomplete { .. } => RequestKind::Autocomplete,
			Self::FuncArgs { .. } => RequestKind::FuncArgs,
		}
	}
}

/// Immutable snapshot of a view at dispatch time.
#[derive(Debug, Clone)]
pub struct RequestContext {
	/// `None` for unsaved buffers.
	pub path: Option<PathBuf>,
	pub source: Arc<str>,
	/// Zero-based line.
	pub line: usize,
	/// Zero-based column.
	pub column: usize,
	pub request: Request,
}

impl RequestContext {
	pub fn kind(&self) -> RequestKind {
		self.request.kind()
	}
}

/// Result of a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Answer {
	/// Deduplicated completion list.
	Completions(Vec<CompletionEntry>),
	/// Comma-joined parameter placeholders for snippet insertion.
	Template(String),
}
