//! Scripted engine and view doubles shared by the crate's tests.

use std::ops::Range;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use pyhint_config::{Settings, SettingsStore};
use rustc_hash::FxHashMap as HashMap;

use crate::dispatch::Dispatcher;
use crate::engine::{
	AnalysisEngine, CallSignature, Completion, EngineError, EngineResult, Environment, Script, ScriptRequest,
};
use crate::registry::DaemonRegistry;
use crate::types::{ViewId, WindowKey};
use crate::ui::{UiCommand, UiRouter, View, WindowInbox};
use crate::vars::ViewVariables;

/// What the engine saw for one `analyze` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeenRequest {
	pub source: String,
	pub line: usize,
	pub column: usize,
	pub path: Option<PathBuf>,
	pub encoding: &'static str,
	pub executable: PathBuf,
	pub search_paths: Vec<PathBuf>,
}

#[derive(Default)]
struct Scripted {
	completions: Vec<Completion>,
	signatures: Vec<CallSignature>,
	analyze_error: Option<EngineError>,
	panic_on_analyze: bool,
	delay: Option<Duration>,
	failing_envs: HashMap<PathBuf, EngineError>,
	created: Vec<PathBuf>,
	seen: Vec<SeenRequest>,
	fuzzy: Vec<bool>,
}

/// An [`AnalysisEngine`] that replays configured answers and records calls.
#[derive(Default)]
pub struct MockEngine {
	script: Mutex<Scripted>,
	default_calls: AtomicUsize,
	running: AtomicUsize,
	max_running: AtomicUsize,
}

impl MockEngine {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn default_env(&self) -> Environment {
		Environment {
			executable: PathBuf::from("/usr/bin/python3"),
			sys_path: vec![PathBuf::from("/usr/lib/python3/site-packages")],
		}
	}

	pub fn set_completions(&self, completions: Vec<Completion>) {
		self.script.lock().completions = completions;
	}

	pub fn set_signatures(&self, signatures: Vec<CallSignature>) {
		self.script.lock().signatures = signatures;
	}

	pub fn fail_analysis(&self, error: EngineError) {
		self.script.lock().analyze_error = Some(error);
	}

	pub fn panic_on_analyze(&self) {
		self.script.lock().panic_on_analyze = true;
	}

	/// Makes every `analyze` call block the calling thread for `delay`.
	pub fn set_delay(&self, delay: Duration) {
		self.script.lock().delay = Some(delay);
	}

	pub fn fail_environment(&self, path: impl Into<PathBuf>, error: EngineError) {
		self.script.lock().failing_envs.insert(path.into(), error);
	}

	pub fn created_paths(&self) -> Vec<PathBuf> {
		self.script.lock().created.clone()
	}

	pub fn default_calls(&self) -> usize {
		self.default_calls.load(Ordering::SeqCst)
	}

	/// Number of environment resolutions, configured or default.
	pub fn resolutions(&self) -> usize {
		self.default_calls() + self.script.lock().created.len()
	}

	pub fn seen(&self) -> Vec<SeenRequest> {
		self.script.lock().seen.clone()
	}

	pub fn analyze_calls(&self) -> usize {
		self.script.lock().seen.len()
	}

	pub fn fuzzy_flags(&self) -> Vec<bool> {
		self.script.lock().fuzzy.clone()
	}

	/// Highest number of `analyze` calls observed running at once.
	pub fn max_concurrent(&self) -> usize {
		self.max_running.load(Ordering::SeqCst)
	}
}

impl AnalysisEngine for MockEngine {
	fn default_environment(&self) -> EngineResult<Environment> {
		self.default_calls.fetch_add(1, Ordering::SeqCst);
		Ok(self.default_env())
	}

	fn create_environment(&self, path: &Path) -> EngineResult<Environment> {
		let mut script = self.script.lock();
		if let Some(err) = script.failing_envs.get(path) {
			return Err(err.clone());
		}
		script.created.push(path.to_path_buf());
		Ok(Environment {
			executable: path.to_path_buf(),
			sys_path: vec![path.join("lib")],
		})
	}

	fn analyze<'a>(&'a self, request: ScriptRequest<'a>) -> EngineResult<Box<dyn Script + 'a>> {
		let (delay, panic, error) = {
			let mut script = self.script.lock();
			script.seen.push(SeenRequest {
				source: request.source.to_string(),
				line: request.line,
				column: request.column,
				path: request.path.map(Path::to_path_buf),
				encoding: request.encoding,
				executable: request.environment.executable.clone(),
				search_paths: request.search_paths.to_vec(),
			});
			(script.delay, script.panic_on_analyze, script.analyze_error.clone())
		};

		let running = self.running.fetch_add(1, Ordering::SeqCst) + 1;
		self.max_running.fetch_max(running, Ordering::SeqCst);
		if let Some(delay) = delay {
			std::thread::sleep(delay);
		}
		self.running.fetch_sub(1, Ordering::SeqCst);

		if panic {
			panic!("engine exploded");
		}
		if let Some(err) = error {
			return Err(err);
		}
		Ok(Box::new(MockScript { engine: self }))
	}
}

struct MockScript<'a> {
	engine: &'a MockEngine,
}

impl Script for MockScript<'_> {
	fn completions(&self, fuzzy: bool) -> EngineResult<Vec<Completion>> {
		let mut script = self.engine.script.lock();
		script.fuzzy.push(fuzzy);
		Ok(script.completions.clone())
	}

	fn call_signatures(&self) -> EngineResult<Vec<CallSignature>> {
		Ok(self.engine.script.lock().signatures.clone())
	}
}

/// A dispatcher over `engine` with `window` attached to its router.
pub fn dispatcher(engine: &Arc<MockEngine>, settings: Settings, window: WindowKey) -> (Dispatcher, WindowInbox) {
	let router = Arc::new(UiRouter::new());
	let inbox = router.attach(window);
	let dispatcher = Dispatcher::new(
		Arc::clone(engine) as Arc<dyn AnalysisEngine>,
		Arc::new(SettingsStore::new(settings)),
		Arc::new(DaemonRegistry::new()),
		router,
	);
	(dispatcher, inbox)
}

/// A [`View`] over an in-memory buffer that records UI commands.
#[derive(Debug, Clone)]
pub struct MockView {
	pub id: ViewId,
	pub window: Option<WindowKey>,
	pub active: bool,
	pub file: Option<PathBuf>,
	pub text: String,
	pub selections: Vec<Range<usize>>,
	pub repl: bool,
	/// Whether the cursor scope matches any selector.
	pub in_scope: bool,
	pub popup_visible: bool,
	pub vars: ViewVariables,
	pub commands: Vec<UiCommand>,
}

impl MockView {
	/// An active, empty, in-scope view with the cursor at offset 0.
	pub fn new(id: ViewId, window: WindowKey) -> Self {
		Self {
			id,
			window: Some(window),
			active: true,
			file: None,
			text: String::new(),
			selections: vec![0..0],
			repl: false,
			in_scope: true,
			popup_visible: false,
			vars: ViewVariables::new(),
			commands: Vec::new(),
		}
	}

	/// Replaces the buffer and moves the cursor to its end.
	pub fn with_text(mut self, text: &str) -> Self {
		let end = text.chars().count();
		self.text = text.to_string();
		self.selections = vec![end..end];
		self
	}

	pub fn with_file(mut self, file: impl Into<PathBuf>) -> Self {
		self.file = Some(file.into());
		self
	}

	/// Offset of the first cursor.
	pub fn cursor(&self) -> usize {
		self.selections.first().map_or(0, |sel| sel.end)
	}

	/// Types `text` at the first cursor.
	pub fn type_text(&mut self, text: &str) {
		let at = self.cursor();
		let byte = self.text.char_indices().nth(at).map_or(self.text.len(), |(i, _)| i);
		self.text.insert_str(byte, text);
		let end = at + text.chars().count();
		self.selections = vec![end..end];
	}
}

impl View for MockView {
	fn id(&self) -> ViewId {
		self.id
	}

	fn window(&self) -> Option<WindowKey> {
		self.window
	}

	fn is_active(&self) -> bool {
		self.active
	}

	fn file_name(&self) -> Option<PathBuf> {
		self.file.clone()
	}

	fn text(&self) -> String {
		self.text.clone()
	}

	fn rowcol(&self, offset: usize) -> (usize, usize) {
		let mut row = 0;
		let mut col = 0;
		for ch in self.text.chars().take(offset) {
			if ch == '\n' {
				row += 1;
				col = 0;
			} else {
				col += 1;
			}
		}
		(row, col)
	}

	fn selections(&self) -> Vec<Range<usize>> {
		self.selections.clone()
	}

	fn char_before(&self, offset: usize) -> Option<char> {
		offset.checked_sub(1).and_then(|i| self.text.chars().nth(i))
	}

	fn score_selector(&self, _offset: usize, _selector: &str) -> bool {
		self.in_scope
	}

	fn is_repl(&self) -> bool {
		self.repl
	}

	fn is_auto_complete_visible(&self) -> bool {
		self.popup_visible
	}

	fn variables(&self) -> ViewVariables {
		self.vars.clone()
	}

	fn run_command(&mut self, command: UiCommand) {
		match &command {
			UiCommand::HideAutoComplete => self.popup_visible = false,
			UiCommand::ShowAutoComplete { .. } => self.popup_visible = true,
			UiCommand::InsertSnippet { .. } => {}
		}
		self.commands.push(command);
	}
}
