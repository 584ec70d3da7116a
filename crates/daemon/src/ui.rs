//! Editor-facing surface: the view abstraction, UI commands, and per-window
//! delivery channels.
//!
//! Background workers never touch UI state directly. They post a
//! [`Delivery`] to the window's channel through [`UiRouter::deliver`]; the UI
//! context drains its [`WindowInbox`] and runs each delivery against whatever
//! view is active at that moment.

use std::ops::Range;
use std::path::PathBuf;

use parking_lot::RwLock;
use rustc_hash::FxHashMap as HashMap;
use tokio::sync::mpsc;
use tracing::{info, trace};

use crate::types::{ViewId, WindowKey};
use crate::vars::ViewVariables;

/// Side effects the pipeline asks the editor to perform on a view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiCommand {
	/// Hide the completion popup.
	HideAutoComplete,
	/// Show the completion popup, querying the listener again.
	ShowAutoComplete {
		/// Suppress the editor's own word completions.
		api_completions_only: bool,
		disable_auto_insert: bool,
		next_completion_if_showing: bool,
	},
	/// Insert a snippet at the cursor.
	InsertSnippet { contents: String },
}

/// A view as seen from the UI context.
///
/// Offsets are character offsets into the buffer.
pub trait View {
	fn id(&self) -> ViewId;

	/// The owning window, `None` for detached views.
	fn window(&self) -> Option<WindowKey>;

	/// True when this is the active view of the active window.
	fn is_active(&self) -> bool;

	fn file_name(&self) -> Option<PathBuf>;

	/// Full buffer text.
	fn text(&self) -> String;

	/// Zero-based `(line, column)` of an offset.
	fn rowcol(&self, offset: usize) -> (usize, usize);

	fn selections(&self) -> Vec<Range<usize>>;

	fn char_before(&self, offset: usize) -> Option<char>;

	/// True when the scope at `offset` matches `selector`.
	fn score_selector(&self, offset: usize, selector: &str) -> bool;

	fn is_repl(&self) -> bool;

	fn is_auto_complete_visible(&self) -> bool;

	/// Variables for path substitution.
	fn variables(&self) -> ViewVariables;

	fn run_command(&mut self, command: UiCommand);
}

/// Work to run on the UI context against the window's active view.
pub type Delivery = Box<dyn FnOnce(&mut dyn View) + Send + 'static>;

/// Routes deliveries to per-window channels.
#[derive(Debug, Default)]
pub struct UiRouter {
	windows: RwLock<HashMap<WindowKey, mpsc::UnboundedSender<Delivery>>>,
}

impl UiRouter {
	pub fn new() -> Self {
		Self::default()
	}

	/// Opens the delivery channel for a window, replacing any previous one.
	pub fn attach(&self, window: WindowKey) -> WindowInbox {
		let (tx, rx) = mpsc::unbounded_channel();
		self.windows.write().insert(window, tx);
		WindowInbox { window, rx }
	}

	/// Closes a window's channel; later deliveries are dropped.
	pub fn detach(&self, window: WindowKey) {
		self.windows.write().remove(&window);
	}

	pub fn is_attached(&self, window: WindowKey) -> bool {
		self.windows.read().get(&window).is_some_and(|tx| !tx.is_closed())
	}

	/// Posts a delivery to a window. Returns false, logging, if the window is gone.
	pub fn deliver(&self, window: WindowKey, delivery: Delivery) -> bool {
		let sent = match self.windows.read().get(&window) {
			Some(tx) => tx.send(delivery).is_ok(),
			None => false,
		};
		if !sent {
			info!(window = window.0, "unable to find a window where the result must be delivered");
		}
		sent
	}

	/// Closes every channel.
	pub fn clear(&self) {
		self.windows.write().clear();
	}
}

/// Receiving end of one window's delivery channel, owned by the UI context.
#[derive(Debug)]
pub struct WindowInbox {
	window: WindowKey,
	rx: mpsc::UnboundedReceiver<Delivery>,
}

impl WindowInbox {
	pub fn window(&self) -> WindowKey {
		self.window
	}

	/// Runs every queued delivery against `active`. Returns how many ran.
	pub fn drain(&mut self, active: &mut dyn View) -> usize {
		let mut ran = 0;
		while let Ok(delivery) = self.rx.try_recv() {
			trace!(window = self.window.0, view = active.id().0, "ui delivery");
			delivery(active);
			ran += 1;
		}
		ran
	}

	/// Waits for the next delivery; `None` once the window is detached and drained.
	pub async fn recv(&mut self) -> Option<Delivery> {
		self.rx.recv().await
	}
}
