//! Per-window analysis state.

use std::path::PathBuf;

use pyhint_config::Settings;
use tracing::info;

use crate::Result;
use crate::engine::{AnalysisEngine, Environment};
use crate::env::{self, ResolvedEnvironment};
use crate::facade;
use crate::request::{Answer, RequestContext};
use crate::types::WindowKey;
use crate::vars::ViewVariables;

/// Resolved environment and search path for one window.
///
/// Immutable once built; a configuration change replaces the whole daemon.
#[derive(Debug, Clone)]
pub struct Daemon {
	window: WindowKey,
	resolved: ResolvedEnvironment,
}

impl Daemon {
	/// Resolves the environment for `window` from its view variables.
	///
	/// # Errors
	///
	/// Returns a configuration error if the configured environment cannot be built.
	pub fn new(window: WindowKey, engine: &dyn AnalysisEngine, vars: &ViewVariables, settings: &Settings) -> Result<Self> {
		let resolved = env::resolve(engine, vars, settings)?;
		info!(
			window = window.0,
			executable = %resolved.environment.executable.display(),
			paths = resolved.search_paths.len(),
			"daemon created"
		);
		Ok(Self { window, resolved })
	}

	pub fn window(&self) -> WindowKey {
		self.window
	}

	pub fn environment(&self) -> &Environment {
		&self.resolved.environment
	}

	pub fn search_paths(&self) -> &[PathBuf] {
		&self.resolved.search_paths
	}

	/// Runs one request against this window's environment.
	pub fn request(&self, engine: &dyn AnalysisEngine, ctx: &RequestContext) -> Option<Answer> {
		facade::execute(engine, &self.resolved, ctx)
	}
}
