//! Environment resolution for a window's daemon.
//!
//! Selection order for the host platform: configured virtualenv, then
//! configured interpreter, then the engine's default environment. Extra
//! package paths are expanded and placed in front of the environment's own
//! search path so project-local packages shadow installed ones.

use std::path::PathBuf;

use pyhint_config::{Platform, Settings};
use tracing::debug;

use crate::engine::{AnalysisEngine, Environment};
use crate::vars::ViewVariables;
use crate::{DaemonError, Result};

/// Environment plus the full, ordered search path handed to the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedEnvironment {
	pub environment: Environment,
	pub search_paths: Vec<PathBuf>,
}

/// Resolves the environment for the host platform.
pub fn resolve(engine: &dyn AnalysisEngine, vars: &ViewVariables, settings: &Settings) -> Result<ResolvedEnvironment> {
	resolve_for(engine, vars, settings, Platform::current())
}

/// Resolves the environment as if running on `platform`.
///
/// Construction failures for a configured path are returned, never replaced
/// by the default environment.
pub fn resolve_for(
	engine: &dyn AnalysisEngine,
	vars: &ViewVariables,
	settings: &Settings,
	platform: Platform,
) -> Result<ResolvedEnvironment> {
	let virtualenv = settings.python_virtualenv.get(platform);
	let interpreter = settings.python_interpreter.get(platform);

	let configured = if !virtualenv.is_empty() {
		Some(virtualenv)
	} else if !interpreter.is_empty() {
		Some(interpreter)
	} else {
		None
	};

	let environment = match configured {
		Some(raw) => {
			let path = PathBuf::from(vars.substitute(raw));
			debug!(configured = %raw, path = %path.display(), "python environment");
			engine
				.create_environment(&path)
				.map_err(|source| DaemonError::Environment { path, source })?
		}
		None => engine.default_environment().map_err(DaemonError::DefaultEnvironment)?,
	};

	let extra = settings.python_package_paths.get(platform);
	let mut search_paths = vars.substitute_paths(extra);
	if !search_paths.is_empty() {
		debug!(extra = ?search_paths, "extra package paths");
	}
	search_paths.extend(environment.sys_path.iter().cloned());

	Ok(ResolvedEnvironment {
		environment,
		search_paths,
	})
}
