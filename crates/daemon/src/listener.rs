//! Per-view completion listener.
//!
//! The editor queries synchronously and the engine answers asynchronously, so
//! a query at a new cursor location only starts a request and answers empty.
//! When the result arrives the reconciler decides whether to redisplay the
//! popup; the editor then queries again at the same location and receives
//! the stored list.

use std::sync::Arc;

use parking_lot::Mutex;
use pyhint_config::Settings;
use tracing::{debug, info};

use crate::dispatch::{Ask, Dispatcher};
use crate::reconcile::{self, CompletionState};
use crate::request::{Answer, Request};
use crate::types::{CompletionEntry, InstanceId, ViewId};
use crate::ui::View;

/// Answer to one completion query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryResponse {
	/// Not handled here; the editor uses its own completions.
	Decline,
	/// A request is in flight. Show nothing and suppress word and explicit
	/// completions meanwhile.
	Pending,
	/// The list to show.
	Completions(Vec<CompletionEntry>),
}

/// Completion listener bound to one view.
#[derive(Debug)]
pub struct CompletionListener {
	instance: InstanceId,
	view: ViewId,
	dispatcher: Dispatcher,
	state: Arc<Mutex<CompletionState>>,
}

impl CompletionListener {
	pub fn new(view: ViewId, dispatcher: Dispatcher) -> Self {
		Self {
			instance: InstanceId::next(),
			view,
			dispatcher,
			state: Arc::default(),
		}
	}

	pub fn instance(&self) -> InstanceId {
		self.instance
	}

	pub fn view(&self) -> ViewId {
		self.view
	}

	/// Snapshot of the completion bookkeeping.
	pub fn state(&self) -> CompletionState {
		self.state.lock().clone()
	}

	/// Checks the view is the active one, allowed if a REPL, and that the
	/// first cursor is inside the configured scope.
	pub fn is_enabled(view: &dyn View, settings: &Settings) -> bool {
		if !view.is_active() {
			return false;
		}
		if view.is_repl() && !settings.enable_in_sublime_repl {
			debug!(view = view.id().0, "completion disabled in REPL views");
			return false;
		}
		let in_scope = view
			.selections()
			.first()
			.is_some_and(|sel| view.score_selector(sel.start, &settings.commands_scope));
		if !in_scope {
			debug!(view = view.id().0, scope = %settings.commands_scope, "cursor outside completion scope");
		}
		in_scope
	}

	/// Handles the editor's completion query.
	pub fn on_query_completions(&self, view: &dyn View, _prefix: &str, locations: &[usize]) -> QueryResponse {
		let settings = self.dispatcher.settings().snapshot();
		if !Self::is_enabled(view, &settings) {
			return QueryResponse::Decline;
		}
		let Some(&location) = locations.first() else {
			return QueryResponse::Decline;
		};

		info!(view = view.id().0, location, "completions triggered");

		if let Some(trigger) = &settings.only_complete_after_regex {
			let previous = view.char_before(location).map(String::from).unwrap_or_default();
			if !trigger.matches_start(&previous) {
				return QueryResponse::Decline;
			}
		}

		let mut state = self.state.lock();
		if !state.expects(location) {
			state.mark_requested(location);
			drop(state);
			self.request(view, location, &settings);
			return QueryResponse::Pending;
		}

		if state.is_in_flight(location) {
			debug!(location, "completions still in flight");
			return QueryResponse::Pending;
		}
		match state.consume(location) {
			Some(completions) => QueryResponse::Completions(completions),
			None => QueryResponse::Decline,
		}
	}

	fn request(&self, view: &dyn View, location: usize, settings: &Settings) {
		let request = Request::Autocomplete {
			fuzzy: settings.fuzzy_jedi_completions,
		};
		let Some(ask) = Ask::from_view(view, self.instance, Some(location), request) else {
			debug!(view = view.id().0, "view has no window, not requesting completions");
			return;
		};

		let state = Arc::clone(&self.state);
		let store = Arc::clone(self.dispatcher.settings());
		self.dispatcher.ask(ask, move |active: &mut dyn View, answer: Answer| {
			let Answer::Completions(completions) = answer else {
				return;
			};

			let action = {
				let mut state = state.lock();
				if !state.expects(location) {
					debug!(location, "stale completions discarded");
					return;
				}
				state.on_new_result(location, completions, active.is_auto_complete_visible())
			};
			debug!(view = active.id().0, ?action, "completions received");
			reconcile::apply(active, action, &store.snapshot().sublime_completions_visibility);
		});
	}
}
