//! Debounced, per-window request dispatch.
//!
//! A request travels: [`Dispatcher::ask`] arms a debounce timer keyed by the
//! requesting instance and request kind; when it fires the job is queued on
//! the window's [`SerialWorker`](pyhint_worker::SerialWorker), which resolves
//! the daemon and calls the engine; a non-empty answer is posted back to the
//! window through the [`UiRouter`] and the callback runs on the UI context
//! against the window's active view.

use std::sync::Arc;

use pyhint_config::SettingsStore;
use pyhint_worker::Debouncer;
use tracing::{debug, error, trace, warn};

use crate::engine::AnalysisEngine;
use crate::registry::DaemonRegistry;
use crate::request::{Answer, Request, RequestContext, RequestKind};
use crate::types::{InstanceId, WindowKey};
use crate::ui::{UiRouter, View};
use crate::vars::ViewVariables;
use crate::{DaemonError, Result};

/// Calls are coalesced per requesting instance and request kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DebounceKey {
	pub instance: InstanceId,
	pub kind: RequestKind,
}

/// One request, snapshotted from a view at dispatch time.
#[derive(Debug, Clone)]
pub struct Ask {
	pub window: WindowKey,
	pub instance: InstanceId,
	pub vars: ViewVariables,
	pub context: RequestContext,
}

impl Ask {
	/// Snapshots `view` at `location`, defaulting to the start of the first
	/// selection. `None` if the view has no window or no cursor.
	pub fn from_view(view: &dyn View, instance: InstanceId, location: Option<usize>, request: Request) -> Option<Self> {
		let window = view.window()?;
		let location = location.or_else(|| view.selections().first().map(|sel| sel.start))?;
		let (line, column) = view.rowcol(location);
		Some(Self {
			window,
			instance,
			vars: view.variables(),
			context: RequestContext {
				path: view.file_name(),
				source: view.text().into(),
				line,
				column,
				request,
			},
		})
	}

	pub fn key(&self) -> DebounceKey {
		DebounceKey {
			instance: self.instance,
			kind: self.context.kind(),
		}
	}
}

/// Shared handle onto the request pipeline.
#[derive(Clone)]
pub struct Dispatcher {
	engine: Arc<dyn AnalysisEngine>,
	settings: Arc<SettingsStore>,
	registry: Arc<DaemonRegistry>,
	router: Arc<UiRouter>,
	debouncer: Debouncer<DebounceKey>,
}

impl std::fmt::Debug for Dispatcher {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Dispatcher")
			.field("registry", &self.registry)
			.field("debouncer", &self.debouncer)
			.finish_non_exhaustive()
	}
}

impl Dispatcher {
	pub fn new(
		engine: Arc<dyn AnalysisEngine>,
		settings: Arc<SettingsStore>,
		registry: Arc<DaemonRegistry>,
		router: Arc<UiRouter>,
	) -> Self {
		Self {
			engine,
			settings,
			registry,
			router,
			debouncer: Debouncer::new(),
		}
	}

	pub fn registry(&self) -> &Arc<DaemonRegistry> {
		&self.registry
	}

	pub fn router(&self) -> &Arc<UiRouter> {
		&self.router
	}

	pub fn settings(&self) -> &Arc<SettingsStore> {
		&self.settings
	}

	/// Schedules `ask`, superseding any pending call under the same key.
	///
	/// Returns immediately. `callback` runs on the UI context with the
	/// window's active view, and only if the request produced an answer.
	pub fn ask<F>(&self, ask: Ask, callback: F)
	where
		F: FnOnce(&mut dyn View, Answer) + Send + 'static,
	{
		let key = ask.key();
		let delay = self.settings.snapshot().completion_delay();
		trace!(window = ask.window.0, kind = key.kind.as_str(), delay_ms = delay.as_millis() as u64, "ask");

		let this = self.clone();
		self.debouncer.schedule(key, delay, move || this.submit(ask, callback));
	}

	/// Resolves the daemon and runs `ask` on the calling thread.
	///
	/// # Errors
	///
	/// Returns the configuration error if the window's daemon cannot be built.
	pub fn ask_sync(&self, ask: &Ask) -> Result<Option<Answer>> {
		let settings = self.settings.snapshot();
		let daemon = self
			.registry
			.get_or_create(ask.window, self.engine.as_ref(), &ask.vars, &settings)?;
		Ok(daemon.request(self.engine.as_ref(), &ask.context))
	}

	/// Returns true if a call is armed for `key`.
	pub fn is_pending(&self, key: &DebounceKey) -> bool {
		self.debouncer.is_pending(key)
	}

	/// Drops pending calls and stops every worker.
	pub fn shutdown(&self) {
		self.debouncer.cancel_all();
		self.registry.shutdown();
		self.router.clear();
	}

	fn submit<F>(&self, ask: Ask, callback: F)
	where
		F: FnOnce(&mut dyn View, Answer) + Send + 'static,
	{
		let window = ask.window;
		let kind = ask.context.kind();
		let worker = self.registry.worker(window);
		let this = self.clone();

		let submitted = worker.submit(move || {
			let answer = match this.ask_sync(&ask) {
				Ok(Some(answer)) => answer,
				Ok(None) => return,
				Err(err) => {
					error!(window = window.0, kind = kind.as_str(), error = %err, "daemon unavailable, request dropped");
					return;
				}
			};
			debug!(window = window.0, kind = kind.as_str(), "delivering answer");
			this.router
				.deliver(window, Box::new(move |view: &mut dyn View| callback(view, answer)));
		});

		if let Err(err) = submitted.map_err(|_| DaemonError::WorkerClosed(window.0)) {
			warn!(worker = worker.name(), kind = kind.as_str(), error = %err, "request dropped");
		}
	}
}
