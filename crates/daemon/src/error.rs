use std::path::PathBuf;

use crate::engine::EngineError;

/// A convenient type alias for `Result` with `E` = [`DaemonError`].
pub type Result<T, E = DaemonError> = std::result::Result<T, E>;

/// Errors surfaced by the pipeline.
///
/// Only configuration errors reach callers of daemon creation; analysis and
/// delivery failures are logged and reduced to "no result".
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum DaemonError {
	/// The configured virtualenv or interpreter could not be turned into an environment.
	#[error("invalid python environment {path}: {source}")]
	Environment {
		/// Path after variable substitution.
		path: PathBuf,
		/// Engine-reported reason.
		#[source]
		source: EngineError,
	},
	/// No environment configured and the engine has no default one.
	#[error("no default python environment: {0}")]
	DefaultEnvironment(#[source] EngineError),
	/// The window's worker no longer accepts jobs.
	#[error("analysis worker for window {0} is closed")]
	WorkerClosed(u64),
	/// The tracing subscriber could not be installed or reconfigured.
	#[error("logging setup failed: {0}")]
	Logging(String),
}
