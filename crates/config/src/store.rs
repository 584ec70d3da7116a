//! Live settings with change notification.
//!
//! [`SettingsStore`] keeps the current [`Settings`] snapshot behind an
//! [`ArcSwap`] so readers never block, and publishes a [`SettingsChanged`]
//! event whenever a replacement actually changes something. Components that
//! depend on a setting subscribe explicitly and unsubscribe by dropping their
//! receiver.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use arc_swap::ArcSwap;
use parking_lot::Mutex;
use tokio::sync::broadcast;

use crate::settings::{SettingKey, Settings};
use crate::{ConfigError, Result};

/// Capacity of the change-notification channel.
const EVENT_BUFFER: usize = 16;

/// One settings replacement, as seen by subscribers.
#[derive(Debug, Clone)]
pub struct SettingsChanged {
	/// Keys whose values differ from the previous snapshot.
	pub keys: Vec<SettingKey>,
	/// The snapshot now in effect.
	pub settings: Arc<Settings>,
}

impl SettingsChanged {
	/// Returns true if `key` changed.
	pub fn has_changed(&self, key: SettingKey) -> bool {
		self.keys.contains(&key)
	}

	/// Returns true if any of `keys` changed.
	pub fn any_changed(&self, keys: &[SettingKey]) -> bool {
		keys.iter().any(|key| self.has_changed(*key))
	}
}

/// Shared, observable settings.
#[derive(Debug)]
pub struct SettingsStore {
	current: ArcSwap<Settings>,
	source: Mutex<Option<PathBuf>>,
	events: broadcast::Sender<SettingsChanged>,
}

impl Default for SettingsStore {
	fn default() -> Self {
		Self::new(Settings::default())
	}
}

impl SettingsStore {
	/// Creates a store holding `settings`, without a backing file.
	pub fn new(settings: Settings) -> Self {
		let (events, _) = broadcast::channel(EVENT_BUFFER);
		Self {
			current: ArcSwap::from_pointee(settings),
			source: Mutex::new(None),
			events,
		}
	}

	/// Creates a store from a JSON settings file.
	pub fn load(path: impl AsRef<Path>) -> Result<Self> {
		let path = path.as_ref();
		let settings = read_settings(path)?;
		let store = Self::new(settings);
		*store.source.lock() = Some(path.to_path_buf());
		tracing::info!(path = %path.display(), "settings loaded");
		Ok(store)
	}

	/// Returns the current snapshot.
	pub fn snapshot(&self) -> Arc<Settings> {
		self.current.load_full()
	}

	/// Subscribes to change notifications. Drop the receiver to unsubscribe.
	pub fn subscribe(&self) -> broadcast::Receiver<SettingsChanged> {
		self.events.subscribe()
	}

	/// Returns the number of live subscriptions.
	pub fn subscriber_count(&self) -> usize {
		self.events.receiver_count()
	}

	/// Installs `settings`, notifying subscribers if anything changed.
	///
	/// Returns the changed keys.
	pub fn replace(&self, settings: Settings) -> Vec<SettingKey> {
		let next = Arc::new(settings);
		let previous = self.current.swap(Arc::clone(&next));
		let keys = previous.changed_keys(&next);
		if keys.is_empty() {
			return keys;
		}

		tracing::debug!(changed = ?keys.iter().map(|k| k.as_str()).collect::<Vec<_>>(), "settings changed");
		// No subscribers is not an error.
		let _ = self.events.send(SettingsChanged {
			keys: keys.clone(),
			settings: next,
		});
		keys
	}

	/// Applies `edit` to a copy of the current snapshot and installs it.
	pub fn update(&self, edit: impl FnOnce(&mut Settings)) -> Vec<SettingKey> {
		let mut next = Settings::clone(&self.snapshot());
		edit(&mut next);
		self.replace(next)
	}

	/// Re-reads the backing file and installs its contents.
	///
	/// On error the current snapshot is kept.
	pub fn reload(&self) -> Result<Vec<SettingKey>> {
		let path = self.source.lock().clone().ok_or(ConfigError::NoSource)?;
		let settings = read_settings(&path)?;
		Ok(self.replace(settings))
	}
}

fn read_settings(path: &Path) -> Result<Settings> {
	let content = std::fs::read_to_string(path).map_err(|error| ConfigError::Io {
		path: path.to_path_buf(),
		error,
	})?;
	Settings::parse(&content)
}

#[cfg(test)]
mod tests {
	use std::io::Write;

	use super::*;
	use crate::settings::LogLevel;

	#[tokio::test]
	async fn replace_notifies_with_changed_keys() {
		let store = SettingsStore::default();
		let mut rx = store.subscribe();

		let keys = store.update(|s| s.python_virtualenv.linux = "/venv".into());
		assert_eq!(keys, vec![SettingKey::PythonVirtualenv]);

		let event = rx.recv().await.unwrap();
		assert!(event.has_changed(SettingKey::PythonVirtualenv));
		assert!(event.any_changed(&SettingKey::ENVIRONMENT));
		assert!(!event.has_changed(SettingKey::LoggingLevel));
		assert_eq!(event.settings.python_virtualenv.linux, "/venv");
	}

	#[tokio::test]
	async fn identical_replace_is_silent() {
		let store = SettingsStore::default();
		let mut rx = store.subscribe();
		assert!(store.replace(Settings::default()).is_empty());
		assert!(matches!(rx.try_recv(), Err(broadcast::error::TryRecvError::Empty)));
	}

	#[test]
	fn dropping_receiver_unsubscribes() {
		let store = SettingsStore::default();
		let rx = store.subscribe();
		assert_eq!(store.subscriber_count(), 1);
		drop(rx);
		assert_eq!(store.subscriber_count(), 0);
	}

	#[test]
	fn load_and_reload_from_file() {
		let mut file = tempfile::NamedTempFile::new().unwrap();
		write!(file, r#"{{"logging_level": "INFO"}}"#).unwrap();
		let store = SettingsStore::load(file.path()).unwrap();
		assert_eq!(store.snapshot().logging_level, LogLevel::Info);

		std::fs::write(file.path(), r#"{"logging_level": "DEBUG", "completion_timeout": 25}"#).unwrap();
		let keys = store.reload().unwrap();
		assert_eq!(keys, vec![SettingKey::CompletionTimeout, SettingKey::LoggingLevel]);
		assert_eq!(store.snapshot().completion_timeout, 25);
	}

	#[test]
	fn failed_reload_keeps_snapshot() {
		let file = tempfile::NamedTempFile::new().unwrap();
		std::fs::write(file.path(), r#"{"completion_timeout": 30}"#).unwrap();
		let store = SettingsStore::load(file.path()).unwrap();

		std::fs::write(file.path(), "{ not json").unwrap();
		assert!(matches!(store.reload(), Err(ConfigError::Parse(_))));
		assert_eq!(store.snapshot().completion_timeout, 30);
	}

	#[test]
	fn reload_without_source_fails() {
		let store = SettingsStore::default();
		assert!(matches!(store.reload(), Err(ConfigError::NoSource)));
	}

	#[test]
	fn missing_file_reports_path() {
		let err = SettingsStore::load("/nonexistent/pyhint.json").unwrap_err();
		assert!(err.to_string().contains("/nonexistent/pyhint.json"));
	}
}
