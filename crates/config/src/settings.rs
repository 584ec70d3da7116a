//! The recognized settings and their defaults.

use std::fmt;
use std::time::Duration;

use regex::Regex;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::platform::PerPlatform;

/// How call parameters are completed after an opening bracket.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FunctionParams {
	/// Every parameter, keyword parameters with their default values.
	#[default]
	All,
	/// Only parameters without a default value.
	Required,
	/// Parameter completion is disabled.
	Off,
}

impl FunctionParams {
	pub fn is_enabled(self) -> bool {
		self != Self::Off
	}

	pub const fn as_str(self) -> &'static str {
		match self {
			Self::All => "all",
			Self::Required => "required",
			Self::Off => "off",
		}
	}
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawFunctionParams {
	Flag(bool),
	Mode(String),
}

impl<'de> Deserialize<'de> for FunctionParams {
	fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
		// Any enabled value other than "all" means required-only.
		Ok(match Option::<RawFunctionParams>::deserialize(deserializer)? {
			None | Some(RawFunctionParams::Flag(false)) => Self::Off,
			Some(RawFunctionParams::Flag(true)) => Self::Required,
			Some(RawFunctionParams::Mode(mode)) => match mode.as_str() {
				"all" => Self::All,
				"required" => Self::Required,
				"" | "off" | "none" => Self::Off,
				other => {
					tracing::warn!(value = other, "unknown auto_complete_function_params value, completing required parameters");
					Self::Required
				}
			},
		})
	}
}

impl Serialize for FunctionParams {
	fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
		match self {
			Self::Off => serializer.serialize_bool(false),
			mode => serializer.serialize_str(mode.as_str()),
		}
	}
}

/// Whether the editor's own word completions are shown next to engine results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum CompletionVisibility {
	/// Engine results only (the historical default).
	Default,
	/// Engine results only.
	Jedi,
	/// Any other value: let the editor mix in its own completions.
	Mixed(String),
}

impl CompletionVisibility {
	/// Returns true when native word completion should be inhibited.
	pub fn engine_only(&self) -> bool {
		matches!(self, Self::Default | Self::Jedi)
	}
}

impl From<String> for CompletionVisibility {
	fn from(value: String) -> Self {
		match value.as_str() {
			"default" => Self::Default,
			"jedi" => Self::Jedi,
			_ => Self::Mixed(value),
		}
	}
}

impl From<CompletionVisibility> for String {
	fn from(value: CompletionVisibility) -> Self {
		match value {
			CompletionVisibility::Default => "default".into(),
			CompletionVisibility::Jedi => "jedi".into(),
			CompletionVisibility::Mixed(other) => other,
		}
	}
}

/// Logging verbosity, spelled `ERROR` / `INFO` / `DEBUG` in settings files.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogLevel {
	#[default]
	#[serde(alias = "error")]
	Error,
	#[serde(alias = "info")]
	Info,
	#[serde(alias = "debug")]
	Debug,
}

impl LogLevel {
	/// Returns the level following this one, wrapping around.
	pub fn next(self) -> Self {
		match self {
			Self::Error => Self::Info,
			Self::Info => Self::Debug,
			Self::Debug => Self::Error,
		}
	}

	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Error => "ERROR",
			Self::Info => "INFO",
			Self::Debug => "DEBUG",
		}
	}
}

impl fmt::Display for LogLevel {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// A compiled `only_complete_after_regex` pattern.
///
/// Compiled while deserializing so a bad pattern is rejected at load time.
#[derive(Debug, Clone)]
pub struct TriggerPattern(Regex);

impl TriggerPattern {
	pub fn new(pattern: &str) -> crate::Result<Self> {
		Regex::new(pattern).map(Self).map_err(|error| crate::ConfigError::InvalidRegex {
			pattern: pattern.to_string(),
			error,
		})
	}

	/// Returns true if the pattern matches at the start of `text`.
	pub fn matches_start(&self, text: &str) -> bool {
		self.0.find(text).is_some_and(|m| m.start() == 0)
	}

	pub fn as_str(&self) -> &str {
		self.0.as_str()
	}
}

impl PartialEq for TriggerPattern {
	fn eq(&self, other: &Self) -> bool {
		self.as_str() == other.as_str()
	}
}

impl<'de> Deserialize<'de> for TriggerPattern {
	fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
		let pattern = String::deserialize(deserializer)?;
		Self::new(&pattern).map_err(D::Error::custom)
	}
}

impl Serialize for TriggerPattern {
	fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
		serializer.serialize_str(self.as_str())
	}
}

fn deserialize_trigger<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<TriggerPattern>, D::Error> {
	match Option::<String>::deserialize(deserializer)? {
		None => Ok(None),
		Some(pattern) if pattern.is_empty() => Ok(None),
		Some(pattern) => TriggerPattern::new(&pattern).map(Some).map_err(D::Error::custom),
	}
}

/// Identifies one setting, used in change notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SettingKey {
	PythonVirtualenv,
	PythonInterpreter,
	PythonPackagePaths,
	AutoCompleteFunctionParams,
	CompletionTimeout,
	OnlyCompleteAfterRegex,
	FuzzyCompletions,
	CompletionsVisibility,
	CommandsScope,
	EnableInRepl,
	LoggingLevel,
}

impl SettingKey {
	/// Settings whose change invalidates every resolved environment.
	pub const ENVIRONMENT: [SettingKey; 3] = [
		SettingKey::PythonVirtualenv,
		SettingKey::PythonInterpreter,
		SettingKey::PythonPackagePaths,
	];

	/// Returns the name used in settings files.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::PythonVirtualenv => "python_virtualenv",
			Self::PythonInterpreter => "python_interpreter",
			Self::PythonPackagePaths => "python_package_paths",
			Self::AutoCompleteFunctionParams => "auto_complete_function_params",
			Self::CompletionTimeout => "completion_timeout",
			Self::OnlyCompleteAfterRegex => "only_complete_after_regex",
			Self::FuzzyCompletions => "fuzzy_jedi_completions",
			Self::CompletionsVisibility => "sublime_completions_visibility",
			Self::CommandsScope => "commands_scope",
			Self::EnableInRepl => "enable_in_sublime_repl",
			Self::LoggingLevel => "logging_level",
		}
	}
}

/// Default scope selector restricting where completion runs.
pub const DEFAULT_COMMANDS_SCOPE: &str = "source.python - string - comment";

/// Default debounce window in milliseconds.
pub const DEFAULT_COMPLETION_TIMEOUT_MS: u64 = 10;

/// Plugin settings.
///
/// Unknown keys in a settings file are ignored; missing keys take the
/// defaults below.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
	/// Virtual environment root per platform. Takes precedence over the interpreter.
	pub python_virtualenv: PerPlatform<String>,
	/// Interpreter executable per platform.
	pub python_interpreter: PerPlatform<String>,
	/// Extra search paths per platform, prepended to the environment's own.
	pub python_package_paths: PerPlatform<Vec<String>>,
	pub auto_complete_function_params: FunctionParams,
	/// Debounce window in milliseconds.
	pub completion_timeout: u64,
	#[serde(deserialize_with = "deserialize_trigger")]
	pub only_complete_after_regex: Option<TriggerPattern>,
	pub fuzzy_jedi_completions: bool,
	pub sublime_completions_visibility: CompletionVisibility,
	pub commands_scope: String,
	pub enable_in_sublime_repl: bool,
	pub logging_level: LogLevel,
}

impl Default for Settings {
	fn default() -> Self {
		Self {
			python_virtualenv: PerPlatform::default(),
			python_interpreter: PerPlatform::default(),
			python_package_paths: PerPlatform::default(),
			auto_complete_function_params: FunctionParams::All,
			completion_timeout: DEFAULT_COMPLETION_TIMEOUT_MS,
			only_complete_after_regex: None,
			fuzzy_jedi_completions: false,
			sublime_completions_visibility: CompletionVisibility::Default,
			commands_scope: DEFAULT_COMMANDS_SCOPE.to_string(),
			enable_in_sublime_repl: false,
			logging_level: LogLevel::Error,
		}
	}
}

impl Settings {
	/// Parses a JSON settings document.
	pub fn parse(input: &str) -> crate::Result<Self> {
		Ok(serde_json::from_str(input)?)
	}

	/// Returns the debounce window as a duration.
	pub fn completion_delay(&self) -> Duration {
		Duration::from_millis(self.completion_timeout)
	}

	/// Lists the settings whose values differ between `self` and `other`.
	pub fn changed_keys(&self, other: &Settings) -> Vec<SettingKey> {
		let mut keys = Vec::new();
		let mut check = |changed: bool, key: SettingKey| {
			if changed {
				keys.push(key);
			}
		};

		check(self.python_virtualenv != other.python_virtualenv, SettingKey::PythonVirtualenv);
		check(self.python_interpreter != other.python_interpreter, SettingKey::PythonInterpreter);
		check(self.python_package_paths != other.python_package_paths, SettingKey::PythonPackagePaths);
		check(
			self.auto_complete_function_params != other.auto_complete_function_params,
			SettingKey::AutoCompleteFunctionParams,
		);
		check(self.completion_timeout != other.completion_timeout, SettingKey::CompletionTimeout);
		check(self.only_complete_after_regex != other.only_complete_after_regex, SettingKey::OnlyCompleteAfterRegex);
		check(self.fuzzy_jedi_completions != other.fuzzy_jedi_completions, SettingKey::FuzzyCompletions);
		check(
			self.sublime_completions_visibility != other.sublime_completions_visibility,
			SettingKey::CompletionsVisibility,
		);
		check(self.commands_scope != other.commands_scope, SettingKey::CommandsScope);
		check(self.enable_in_sublime_repl != other.enable_in_sublime_repl, SettingKey::EnableInRepl);
		check(self.logging_level != other.logging_level, SettingKey::LoggingLevel);

		keys
	}
}
