//! Decides whether a freshly delivered completion list replaces the popup.
//!
//! The editor narrows a visible popup by itself as the user types, so a new
//! list whose insertion texts are all already shown needs no redraw.

use std::mem;

use pyhint_config::CompletionVisibility;
use rustc_hash::FxHashSet as HashSet;

use crate::types::CompletionEntry;
use crate::ui::{UiCommand, View};

/// What the UI should do with a new result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileAction {
	/// Leave the popup as it is.
	Suppress,
	/// Hide the popup and show it again so the editor re-queries.
	ReplaceAndShow,
}

/// Completion bookkeeping for one listener.
#[derive(Debug, Clone, Default)]
pub struct CompletionState {
	current: Vec<CompletionEntry>,
	previous: Vec<CompletionEntry>,
	/// Cursor offset of the outstanding request, cleared once its result is consumed.
	last_request_location: Option<usize>,	/// Cursor offset `current` was computed for.
	delivered_at: Option<usize>,
}

impl CompletionState {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn current(&self) -> &[CompletionEntry] {
		&self.current
	}

	pub fn previous(&self) -> &[CompletionEntry] {
		&self.previous
	}

	pub fn last_request_location(&self) -> Option<usize> {
		self.last_request_location
	}

	pub fn delivered_at(&self) -> Option<usize> {
		self.delivered_at
	}

	/// Records that a request was issued at `location`.
	pub fn mark_requested(&mut self, location: usize) {
		self.last_request_location = Some(location);
		if self.delivered_at == Some(location) {
			self.delivered_at = None;
		}
	}

	/// Returns true if a result for `location` is still wanted.
	pub fn expects(&self, location: usize) -> bool {
		self.last_request_location == Some(location)
	}

	/// True while the request issued at `location` has not been answered.
	pub fn is_in_flight(&self, location: usize) -> bool {
		self.expects(location) && self.delivered_at != Some(location)
	}

	/// Hands out the list delivered for `location` to a repeat query and
	/// clears the marker.
	///
	/// Returns `None` without touching the marker while the request is in
	/// flight, and `None` after clearing it if the delivered list is empty.
	pub fn consume(&mut self, location: usize) -> Option<Vec<CompletionEntry>> {
		if !self.expects(location) || self.delivered_at != Some(location) {
			return None;
		}
		self.last_request_location = None;
		(!self.current.is_empty()).then(|| self.current.clone())
	}

	/// Installs `new`, computed for `location`, as the current list and
	/// decides the UI action.
	///
	/// `current` moves to `previous` whatever the outcome.
	pub fn on_new_result(&mut self, location: usize, new: Vec<CompletionEntry>, popup_visible: bool) -> ReconcileAction {
		self.previous = mem::replace(&mut self.current, new);
		self.delivered_at = Some(location);

		if self.current.is_empty() {
			return ReconcileAction::Suppress;
		}
		if !popup_visible || !is_subset(&self.current, &self.previous) {
			ReconcileAction::ReplaceAndShow
		} else {
			ReconcileAction::Suppress
		}
	}
}

/// True if every insertion text of `new` also appears in `previous`.
///
/// Labels are ignored: two entries that insert the same text are equal.
pub fn is_subset(new: &[CompletionEntry], previous: &[CompletionEntry]) -> bool {
	let previous: HashSet<&str> = previous.iter().map(|e| e.insert_text.as_str()).collect();
	new.iter().all(|e| previous.contains(e.insert_text.as_str()))
}

/// Commands that redisplay the popup.
pub fn show_commands(visibility: &CompletionVisibility) -> [UiCommand; 2] {
	[
		UiCommand::HideAutoComplete,
		UiCommand::ShowAutoComplete {
			api_completions_only: visibility.engine_only(),
			disable_auto_insert: true,
			next_completion_if_showing: false,
		},
	]
}

/// Carries out `action` on `view`.
pub fn apply(view: &mut dyn View, action: ReconcileAction, visibility: &CompletionVisibility) {
	if action == ReconcileAction::ReplaceAndShow {
		for command in show_commands(visibility) {
			view.run_command(command);
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::test_support::MockView;
	use crate::types::{ViewId, WindowKey};

	fn entries(texts: &[&str]) -> Vec<CompletionEntry> {
		texts.iter().map(|t| CompletionEntry::new(format!("{t}\tname"), *t)).collect()
	}

	fn state_showing(texts: &[&str]) -> CompletionState {
		let mut state = CompletionState::new();
		state.on_new_result(0, entries(texts), false);
		state
	}

	#[test]
	fn narrowed_list_with_visible_popup_is_suppressed() {
		let mut state = state_showing(&["foo", "bar"]);
		assert_eq!(state.on_new_result(0, entries(&["foo"]), true), ReconcileAction::Suppress);
	}

	#[test]
	fn widened_list_replaces_popup() {
		let mut state = state_showing(&["foo"]);
		assert_eq!(state.on_new_result(0, entries(&["foo", "bar"]), true), ReconcileAction::ReplaceAndShow);
	}

	#[test]
	fn identical_list_is_suppressed() {
		let mut state = state_showing(&["foo", "bar"]);
		assert_eq!(state.on_new_result(0, entries(&["bar", "foo"]), true), ReconcileAction::Suppress);
	}

	#[test]
	fn hidden_popup_always_shows() {
		let mut state = state_showing(&["foo", "bar"]);
		assert_eq!(state.on_new_result(0, entries(&["foo"]), false), ReconcileAction::ReplaceAndShow);
	}

	#[test]
	fn empty_result_is_suppressed_but_recorded() {
		let mut state = state_showing(&["foo"]);
		assert_eq!(state.on_new_result(0, Vec::new(), false), ReconcileAction::Suppress);
		assert_eq!(state.previous(), entries(&["foo"]).as_slice());
		assert!(state.current().is_empty());
	}

	#[test]
	fn previous_tracks_last_current() {
		let mut state = state_showing(&["a"]);
		state.on_new_result(0, entries(&["b"]), true);
		assert_eq!(state.previous(), entries(&["a"]).as_slice());
		assert_eq!(state.current(), entries(&["b"]).as_slice());
	}

	#[test]
	fn subset_ignores_labels() {
		let new = vec![CompletionEntry::new("foo\tfunction", "foo")];
		let previous = vec![CompletionEntry::new("foo\tinstance", "foo")];
		assert!(is_subset(&new, &previous));
	}

	#[test]
	fn consume_requires_matching_location_and_results() {
		let mut state = CompletionState::new();
		state.mark_requested(7);
		assert_eq!(state.consume(7), None);

		assert!(state.is_in_flight(7));

		state.on_new_result(7, entries(&["x"]), false);
		assert!(!state.is_in_flight(7));
		assert_eq!(state.consume(8), None);
		assert_eq!(state.consume(7), Some(entries(&["x"])));
		assert_eq!(state.last_request_location(), None);
		assert_eq!(state.consume(7), None);
	}

	#[test]
	fn list_for_other_location_is_not_consumed() {
		let mut state = CompletionState::new();
		state.mark_requested(3);
		state.on_new_result(3, entries(&["path", "sep"]), false);
		assert_eq!(state.consume(3), Some(entries(&["path", "sep"])));

		state.mark_requested(4);
		assert_eq!(state.consume(4), None);
		assert!(state.expects(4));
		assert!(state.is_in_flight(4));
	}

	#[test]
	fn rerequest_at_delivered_location_waits_for_fresh_list() {
		let mut state = CompletionState::new();
		state.mark_requested(5);
		state.on_new_result(5, entries(&["a"]), false);
		state.consume(5);

		state.mark_requested(5);
		assert!(state.is_in_flight(5));
		assert_eq!(state.consume(5), None);
	}

	#[test]
	fn empty_delivery_clears_marker() {
		let mut state = CompletionState::new();
		state.mark_requested(2);
		state.on_new_result(2, Vec::new(), false);
		assert_eq!(state.consume(2), None);
		assert_eq!(state.last_request_location(), None);
	}

	#[test]
	fn apply_redisplays_with_visibility_policy() {
		let mut view = MockView::new(ViewId(1), WindowKey(1));
		apply(&mut view, ReconcileAction::ReplaceAndShow, &CompletionVisibility::Mixed("all".into()));
		assert_eq!(
			view.commands,
			vec![
				UiCommand::HideAutoComplete,
				UiCommand::ShowAutoComplete {
					api_completions_only: false,
					disable_auto_insert: true,
					next_completion_if_showing: false,
				},
			]
		);

		let mut view = MockView::new(ViewId(2), WindowKey(1));
		apply(&mut view, ReconcileAction::Suppress, &CompletionVisibility::Jedi);
		assert!(view.commands.is_empty());
	}
}
