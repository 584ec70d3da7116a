//! Settings for the completion pipeline.
//!
//! Settings are read from a JSON document whose keys mirror the plugin's
//! historical settings file:
//!
//! ```json
//! {
//!     "python_virtualenv": { "linux": "$project_path/.venv" },
//!     "python_interpreter": { "windows": "C:\\Python311\\python.exe" },
//!     "python_package_paths": { "osx": ["$folder/src"] },
//!     "auto_complete_function_params": "all",
//!     "completion_timeout": 10,
//!     "only_complete_after_regex": null,
//!     "fuzzy_jedi_completions": false,
//!     "sublime_completions_visibility": "default",
//!     "commands_scope": "source.python - string - comment",
//!     "enable_in_sublime_repl": false,
//!     "logging_level": "ERROR"
//! }
//! ```
//!
//! Path values may contain `$variables`; they are expanded per view by the
//! environment resolver, not here.
//!
//! [`SettingsStore`] owns the live snapshot and publishes
//! [`SettingsChanged`] events to subscribers.

mod error;
mod platform;
mod settings;
mod store;

pub use error::{ConfigError, Result};
pub use platform::{PerPlatform, Platform};
pub use settings::{
	CompletionVisibility, DEFAULT_COMMANDS_SCOPE, DEFAULT_COMPLETION_TIMEOUT_MS, FunctionParams, LogLevel,
	SettingKey, Settings, TriggerPattern,
};
pub use store::{SettingsChanged, SettingsStore};
