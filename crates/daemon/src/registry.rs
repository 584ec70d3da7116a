//! Window-keyed daemon and worker registry.
//!
//! Both maps live under one lock and are replaced wholesale on invalidation,
//! so readers observe either the old state or the empty one. Entries are
//! re-created lazily by the next request for a window. A worker re-created
//! after invalidation waits for the retired one to drain, keeping at most
//! one analysis call per window in flight.

use std::sync::Arc;

use parking_lot::RwLock;
use pyhint_config::{SettingKey, Settings, SettingsChanged};
use pyhint_worker::SerialWorker;
use rustc_hash::FxHashMap as HashMap;
use tokio::sync::oneshot;
use tracing::{debug, info};

use crate::Result;
use crate::daemon::Daemon;
use crate::engine::AnalysisEngine;
use crate::types::WindowKey;
use crate::vars::ViewVariables;

#[derive(Default)]
struct RegistryState {
	daemons: HashMap<WindowKey, Arc<Daemon>>,
	workers: HashMap<WindowKey, Arc<SerialWorker>>,
	/// Drain signals of invalidated workers, awaited by their replacements.
	retiring: HashMap<WindowKey, oneshot::Receiver<()>>,
	/// Bumped on every invalidation; a daemon resolved under an older
	/// generation is returned to its caller but not cached.
	generation: u64,
}

/// Per-window daemons and single-capacity workers.
#[derive(Default)]
pub struct DaemonRegistry {
	state: RwLock<RegistryState>,
}

impl std::fmt::Debug for DaemonRegistry {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		let state = self.state.read();
		f.debug_struct("DaemonRegistry")
			.field("daemons", &state.daemons.len())
			.field("workers", &state.workers.len())
			.field("generation", &state.generation)
			.finish()
	}
}

impl DaemonRegistry {
	pub fn new() -> Self {
		Self::default()
	}

	/// Returns the cached daemon for `window`, resolving one on first use.
	///
	/// Resolution runs outside the lock. If two callers race, the first
	/// insert wins and both receive it.
	///
	/// # Errors
	///
	/// Configuration errors from environment resolution are returned and
	/// nothing is cached.
	pub fn get_or_create(
		&self,
		window: WindowKey,
		engine: &dyn AnalysisEngine,
		vars: &ViewVariables,
		settings: &Settings,
	) -> Result<Arc<Daemon>> {
		let generation = {
			let state = self.state.read();
			if let Some(daemon) = state.daemons.get(&window) {
				return Ok(Arc::clone(daemon));
			}
			state.generation
		};

		let daemon = Arc::new(Daemon::new(window, engine, vars, settings)?);

		let mut state = self.state.write();
		if state.generation != generation {
			debug!(window = window.0, "registry invalidated during resolution, not caching");
			return Ok(daemon);
		}
		Ok(Arc::clone(state.daemons.entry(window).or_insert(daemon)))
	}

	/// Returns the cached daemon for `window` without resolving.
	pub fn get(&self, window: WindowKey) -> Option<Arc<Daemon>> {
		self.state.read().daemons.get(&window).cloned()
	}

	/// Returns the window's worker, starting it on first use.
	pub fn worker(&self, window: WindowKey) -> Arc<SerialWorker> {
		if let Some(worker) = self.state.read().workers.get(&window) {
			return Arc::clone(worker);
		}
		let mut guard = self.state.write();
		let RegistryState { workers, retiring, .. } = &mut *guard;
		let worker = workers.entry(window).or_insert_with(|| {
			let name = format!("pyhint-window-{}", window.0);
			Arc::new(match retiring.remove(&window) {
				Some(predecessor) => {
					debug!(window = window.0, "worker waits for its retired predecessor");
					SerialWorker::after(name, predecessor)
				}
				None => SerialWorker::new(name),
			})
		});
		Arc::clone(worker)
	}

	/// Drops every daemon and worker handle.
	///
	/// Jobs already queued on a dropped worker still run to completion; the
	/// window's next worker starts taking jobs once they have.
	pub fn invalidate_all(&self) {
		let (daemons, workers) = {
			let mut state = self.state.write();
			state.generation += 1;
			let workers = std::mem::take(&mut state.workers);
			for (window, worker) in &workers {
				state.retiring.insert(*window, worker.drained());
			}
			(std::mem::take(&mut state.daemons), workers)
		};
		info!(daemons = daemons.len(), workers = workers.len(), "registry invalidated");
	}

	/// Invalidates if any environment-affecting setting changed.
	///
	/// Returns whether the registry was cleared.
	pub fn on_settings_changed(&self, change: &SettingsChanged) -> bool {
		if !change.any_changed(&SettingKey::ENVIRONMENT) {
			return false;
		}
		self.invalidate_all();
		true
	}

	/// Forgets one window, stopping its worker after the current job.
	pub fn remove_window(&self, window: WindowKey) {
		let worker = {
			let mut state = self.state.write();
			state.daemons.remove(&window);
			state.retiring.remove(&window);
			state.workers.remove(&window)
		};
		if let Some(worker) = worker {
			worker.shutdown();
		}
	}

	/// Number of cached daemons.
	pub fn len(&self) -> usize {
		self.state.read().daemons.len()
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	/// Clears both maps and stops every worker.
	pub fn shutdown(&self) {
		let workers = {
			let mut state = self.state.write();
			state.generation += 1;
			state.daemons.clear();
			state.retiring.clear();
			std::mem::take(&mut state.workers)
		};
		for worker in workers.values() {
			worker.shutdown();
		}
	}
}
