//! Call-parameter completion after an opening bracket.

use pyhint_config::FunctionParams;
use tracing::debug;

use crate::dispatch::{Ask, Dispatcher};
use crate::request::{Answer, Request};
use crate::types::InstanceId;
use crate::ui::{UiCommand, View};

/// Inserts a snippet of the enclosing call's parameters.
///
/// The bracket itself is inserted by the editor before the command runs.
#[derive(Debug)]
pub struct ParamsAutocomplete {
	instance: InstanceId,
	dispatcher: Dispatcher,
}

impl ParamsAutocomplete {
	pub fn new(dispatcher: Dispatcher) -> Self {
		Self {
			instance: InstanceId::next(),
			dispatcher,
		}
	}

	pub fn instance(&self) -> InstanceId {
		self.instance
	}

	/// Asks for the parameter template at the end of the first selection.
	///
	/// Returns false if parameter completion is off or the view has no cursor.
	pub fn run(&self, view: &dyn View) -> bool {
		let mode = self.dispatcher.settings().snapshot().auto_complete_function_params;
		if !mode.is_enabled() {
			return false;
		}
		let Some(location) = view.selections().first().map(|sel| sel.end) else {
			return false;
		};
		let request = Request::FuncArgs {
			complete_all: mode == FunctionParams::All,
		};
		let Some(ask) = Ask::from_view(view, self.instance, Some(location), request) else {
			return false;
		};

		debug!(view = view.id().0, location, mode = mode.as_str(), "requesting call parameters");
		self.dispatcher.ask(ask, |active: &mut dyn View, answer: Answer| {
			let Answer::Template(template) = answer else {
				return;
			};
			if template.is_empty() {
				return;
			}
			active.run_command(UiCommand::InsertSnippet { contents: template });
		});
		true
	}
}
