//! Contract of the external static analyzer.
//!
//! The pipeline never analyzes Python itself. An [`AnalysisEngine`]
//! implementation turns a source snapshot plus cursor position and
//! environment into a [`Script`], which answers completion and call-signature
//! queries. Implementations are called from the per-window workers only and
//! may block.

use std::fmt;
use std::path::{Path, PathBuf};

/// Text encoding passed to the engine with every source snapshot.
pub const SOURCE_ENCODING: &str = "utf-8";

/// Failures reported by the engine.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
	/// An interpreter or virtualenv path could not be used.
	#[error("cannot create environment: {0}")]
	Environment(String),
	/// Analysis of a script failed.
	#[error("analysis failed: {0}")]
	Analysis(String),
}

/// Result alias for engine calls.
pub type EngineResult<T> = Result<T, EngineError>;

/// A resolved Python environment as reported by the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Environment {
	/// Interpreter executable or virtualenv root the environment was built from.
	pub executable: PathBuf,
	/// The environment's own module search path.
	pub sys_path: Vec<PathBuf>,
}

/// Inputs of one analysis call.
#[derive(Debug, Clone, Copy)]
pub struct ScriptRequest<'a> {
	pub source: &'a str,
	/// One-based line.
	pub line: usize,
	/// Zero-based column.
	pub column: usize,
	/// `None` for unsaved buffers.
	pub path: Option<&'a Path>,
	pub encoding: &'static str,
	pub environment: &'a Environment,
	pub search_paths: &'a [PathBuf],
}

/// A native completion candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
	pub name: String,
	/// Engine type tag, e.g. `function`, `module`, `instance`.
	pub kind: String,
}

impl Completion {
	pub fn new(name: impl Into<String>, kind: impl Into<String>) -> Self {
		Self {
			name: name.into(),
			kind: kind.into(),
		}
	}
}

/// Formal parameter kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
	PositionalOnly,
	PositionalOrKeyword,
	/// `*args`
	VarPositional,
	KeywordOnly,
	/// `**kwargs`
	VarKeyword,
}

/// One formal parameter of a call signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameter {
	pub name: String,
	pub kind: ParamKind,
	/// Source text of the literal default value, if any.
	pub default: Option<String>,
}

impl Parameter {
	/// A parameter without a default value.
	pub fn required(name: impl Into<String>, kind: ParamKind) -> Self {
		Self {
			name: name.into(),
			kind,
			default: None,
		}
	}

	/// A parameter with a default value.
	pub fn with_default(name: impl Into<String>, kind: ParamKind, default: impl Into<String>) -> Self {
		Self {
			name: name.into(),
			kind,
			default: Some(default.into()),
		}
	}
}

/// The call enclosing the cursor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallSignature {
	/// Callee name.
	pub name: String,
	pub params: Vec<Parameter>,
}

/// An analyzed source snapshot.
pub trait Script {
	/// Completions at the cursor.
	fn completions(&self, fuzzy: bool) -> EngineResult<Vec<Completion>>;

	/// Signatures of the call whose argument list contains the cursor, innermost first.
	fn call_signatures(&self) -> EngineResult<Vec<CallSignature>>;
}

/// The external analyzer.
pub trait AnalysisEngine: Send + Sync + 'static {
	/// The environment discovered without any configuration.
	fn default_environment(&self) -> EngineResult<Environment>;

	/// Builds an environment from a virtualenv root or interpreter executable.
	fn create_environment(&self, path: &Path) -> EngineResult<Environment>;

	/// Analyzes one source snapshot.
	fn analyze<'a>(&'a self, request: ScriptRequest<'a>) -> EngineResult<Box<dyn Script + 'a>>;
}

impl fmt::Debug for dyn AnalysisEngine {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str("AnalysisEngine")
	}
}
