//! Tracing setup with a runtime-adjustable level.
//!
//! Output goes to a timestamped file under the log directory, or to stderr
//! if no directory is given or the file cannot be opened. The level filter
//! sits behind a reload layer so `logging_level` changes apply immediately.

use std::fs::{File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{DateTime, Local};
use pyhint_config::LogLevel;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{Registry, fmt, reload};

use crate::{DaemonError, Result};

/// Prefix of log file names.
pub const LOG_FILE_PREFIX: &str = "LOG";

pub fn level_filter(level: LogLevel) -> LevelFilter {
	match level {
		LogLevel::Error => LevelFilter::ERROR,
		LogLevel::Info => LevelFilter::INFO,
		LogLevel::Debug => LevelFilter::DEBUG,
	}
}

/// `<local data dir>/pyhint/logs`, if the platform has one.
pub fn default_log_dir() -> Option<PathBuf> {
	dirs::data_local_dir().map(|dir| dir.join("pyhint").join("logs"))
}

/// `<dir>/<prefix>-<YYYYmmdd-HHMMSS>.log`
pub fn log_file_path(dir: &Path, prefix: &str, now: DateTime<Local>) -> PathBuf {
	dir.join(format!("{prefix}-{}.log", now.format("%Y%m%d-%H%M%S")))
}

/// Handle onto the installed level filter.
#[derive(Debug, Clone)]
pub struct LogHandle {
	filter: reload::Handle<LevelFilter, Registry>,
	path: Option<PathBuf>,
}

impl LogHandle {
	/// Log file in use, `None` when logging to stderr.
	pub fn path(&self) -> Option<&Path> {
		self.path.as_deref()
	}

	pub fn level(&self) -> Option<LevelFilter> {
		self.filter.clone_current()
	}

	/// Replaces the active level.
	pub fn set_level(&self, level: LogLevel) -> Result<()> {
		self.filter
			.modify(|filter| *filter = level_filter(level))
			.map_err(|err| DaemonError::Logging(err.to_string()))?;
		tracing::info!(level = %level, "logging level changed");
		Ok(())
	}
}

fn reloadable(level: LogLevel, path: Option<PathBuf>) -> (reload::Layer<LevelFilter, Registry>, LogHandle) {
	let (layer, filter) = reload::Layer::new(level_filter(level));
	(layer, LogHandle { filter, path })
}

fn open_log_file(dir: &Path) -> io::Result<(PathBuf, File)> {
	std::fs::create_dir_all(dir)?;
	let path = log_file_path(dir, LOG_FILE_PREFIX, Local::now());
	let file = OpenOptions::new().create(true).append(true).open(&path)?;
	Ok((path, file))
}

/// Installs the global subscriber.
///
/// # Errors
///
/// Fails if a global subscriber is already installed.
pub fn init(level: LogLevel, dir: Option<&Path>) -> Result<LogHandle> {
	let (opened, open_error) = match dir.map(open_log_file) {
		Some(Ok(opened)) => (Some(opened), None),
		Some(Err(err)) => (None, Some(err)),
		None => (None, None),
	};

	let handle = match opened {
		Some((path, file)) => {
			let (filter, handle) = reloadable(level, Some(path));
			let layer = fmt::layer().with_writer(Mutex::new(file)).with_ansi(false).with_target(true);
			tracing_subscriber::registry()
				.with(filter)
				.with(layer)
				.try_init()
				.map_err(|err| DaemonError::Logging(err.to_string()))?;
			handle
		}
		None => {
			let (filter, handle) = reloadable(level, None);
			let layer = fmt::layer().with_writer(io::stderr).with_target(true);
			tracing_subscriber::registry()
				.with(filter)
				.with(layer)
				.try_init()
				.map_err(|err| DaemonError::Logging(err.to_string()))?;
			handle
		}
	};

	if let Some(err) = open_error {
		tracing::warn!(dir = ?dir, error = %err, "cannot open log file, logging to stderr");
	}
	tracing::info!(path = ?handle.path(), level = %level, "tracing initialized");
	Ok(handle)
}
