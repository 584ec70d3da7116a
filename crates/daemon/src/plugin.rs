//! Root context owning the pipeline for the lifetime of the plugin.
//!
//! [`Plugin::start`] wires the registry, router and dispatcher together and
//! subscribes the registry and the logger to settings changes.
//! [`Plugin::shutdown`] undoes all of it.

use std::sync::Arc;

use pyhint_config::{LogLevel, SettingKey, SettingsChanged, SettingsStore};
use pyhint_worker::TaskClass;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::commands::ParamsAutocomplete;
use crate::dispatch::Dispatcher;
use crate::engine::AnalysisEngine;
use crate::listener::CompletionListener;
use crate::logging::LogHandle;
use crate::registry::DaemonRegistry;
use crate::types::{ViewId, WindowKey};
use crate::ui::{UiRouter, WindowInbox};

/// The running pipeline.
#[derive(Debug)]
pub struct Plugin {
	dispatcher: Dispatcher,
	log: Option<LogHandle>,
	cancel: CancellationToken,
}

impl Plugin {
	/// Builds the pipeline and starts the settings observers.
	///
	/// Observers run on the worker runtime until [`Self::shutdown`].
	pub fn start(settings: Arc<SettingsStore>, engine: Arc<dyn AnalysisEngine>, log: Option<LogHandle>) -> Self {
		let registry = Arc::new(DaemonRegistry::new());
		let router = Arc::new(UiRouter::new());
		let dispatcher = Dispatcher::new(engine, Arc::clone(&settings), Arc::clone(&registry), router);
		let cancel = CancellationToken::new();

		observe("registry", settings.subscribe(), cancel.clone(), move |change| match change {
			Some(change) => {
				registry.on_settings_changed(change);
			}
			None => registry.invalidate_all(),
		});

		if let Some(log) = log.clone() {
			let store = Arc::clone(&settings);
			observe("logging", settings.subscribe(), cancel.clone(), move |change| {
				let level = match change {
					Some(change) if change.has_changed(SettingKey::LoggingLevel) => change.settings.logging_level,
					Some(_) => return,
					None => store.snapshot().logging_level,
				};
				if let Err(err) = log.set_level(level) {
					error!(error = %err, "cannot apply logging level");
				}
			});
		}

		info!("pipeline started");
		Self { dispatcher, log, cancel }
	}

	pub fn dispatcher(&self) -> &Dispatcher {
		&self.dispatcher
	}

	pub fn settings(&self) -> &Arc<SettingsStore> {
		self.dispatcher.settings()
	}

	pub fn registry(&self) -> &Arc<DaemonRegistry> {
		self.dispatcher.registry()
	}

	pub fn log(&self) -> Option<&LogHandle> {
		self.log.as_ref()
	}

	/// Creates the completion listener for a newly opened view.
	pub fn completion_listener(&self, view: ViewId) -> CompletionListener {
		CompletionListener::new(view, self.dispatcher.clone())
	}

	pub fn params_command(&self) -> ParamsAutocomplete {
		ParamsAutocomplete::new(self.dispatcher.clone())
	}

	/// Opens a window's delivery channel. The UI context owns the inbox.
	pub fn attach_window(&self, window: WindowKey) -> WindowInbox {
		debug!(window = window.0, "window attached");
		self.dispatcher.router().attach(window)
	}

	/// Closes a window: later deliveries are dropped and its worker stops.
	pub fn detach_window(&self, window: WindowKey) {
		debug!(window = window.0, "window detached");
		self.dispatcher.router().detach(window);
		self.registry().remove_window(window);
	}

	/// Advances `logging_level` to the next value and returns it.
	pub fn toggle_logging_level(&self) -> LogLevel {
		let mut next = LogLevel::default();
		self.settings().update(|settings| {
			next = settings.logging_level.next();
			settings.logging_level = next;
		});
		next
	}

	pub fn is_shut_down(&self) -> bool {
		self.cancel.is_cancelled()
	}

	/// Stops the observers, drops pending calls and stops every worker.
	pub fn shutdown(&self) {
		if self.cancel.is_cancelled() {
			return;
		}
		self.cancel.cancel();
		self.dispatcher.shutdown();
		info!("pipeline stopped");
	}
}

/// Runs `on_change` for every settings event until cancelled.
///
/// `None` means events were missed and the handler should resynchronize.
fn observe<F>(name: &'static str, mut events: broadcast::Receiver<SettingsChanged>, cancel: CancellationToken, mut on_change: F)
where
	F: FnMut(Option<&SettingsChanged>) + Send + 'static,
{
	pyhint_worker::spawn(TaskClass::Queue, async move {
		loop {
			let event = tokio::select! {
				biased;
				_ = cancel.cancelled() => break,
				event = events.recv() => event,
			};
			match event {
				Ok(change) => on_change(Some(&change)),
				Err(RecvError::Lagged(skipped)) => {
					warn!(observer = name, skipped, "settings events missed");
					on_change(None);
				}
				Err(RecvError::Closed) => break,
			}
		}
		debug!(observer = name, "settings observer stopped");
	});
}
