//! View variables and `$variable` expansion for path settings.
//!
//! Expansion rules:
//! * `$name` and `${name}` expand to the variable's value;
//! * `${name:default}` falls back to `default`, itself expanded;
//! * `\$` is a literal dollar sign;
//! * unknown variables expand to the empty string.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use pyhint_config::Platform;

/// Snapshot of the variables visible to one view.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewVariables {
	vars: BTreeMap<String, String>,
}

impl ViewVariables {
	/// Creates an empty variable set.
	pub fn new() -> Self {
		Self::default()
	}

	/// Derives the standard variables from a view's file, project file and first folder.
	pub fn for_view(file: Option<&Path>, project_file: Option<&Path>, folder: Option<&Path>) -> Self {
		let mut vars = Self::new();
		vars.insert("platform", platform_name(Platform::current()));

		if let Some(file) = file {
			vars.insert("file", display(file));
			if let Some(parent) = file.parent() {
				vars.insert("file_path", display(parent));
			}
			if let Some(name) = file.file_name() {
				vars.insert("file_name", name.to_string_lossy());
			}
			if let Some(stem) = file.file_stem() {
				vars.insert("file_base_name", stem.to_string_lossy());
			}
			if let Some(ext) = file.extension() {
				vars.insert("file_extension", ext.to_string_lossy());
			}
		}

		if let Some(project) = project_file {
			vars.insert("project", display(project));
			if let Some(parent) = project.parent() {
				vars.insert("project_path", display(parent));
			}
			if let Some(name) = project.file_name() {
				vars.insert("project_name", name.to_string_lossy());
			}
			if let Some(stem) = project.file_stem() {
				vars.insert("project_base_name", stem.to_string_lossy());
			}
		}

		if let Some(folder) = folder {
			vars.insert("folder", display(folder));
		}

		vars
	}

	/// Sets a variable, replacing any previous value.
	pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
		self.vars.insert(name.into(), value.into());
	}

	pub fn get(&self, name: &str) -> Option<&str> {
		self.vars.get(name).map(String::as_str)
	}

	/// Expands every variable reference in `input`.
	pub fn substitute(&self, input: &str) -> String {
		let mut out = String::with_capacity(input.len());
		let mut chars = input.chars().peekable();

		while let Some(c) = chars.next() {
			match c {
				'\\' if chars.peek() == Some(&'$') => {
					chars.next();
					out.push('$');
				}
				'$' => match chars.peek() {
					Some('{') => {
						chars.next();
						let body = take_braced(&mut chars);
						match body.split_once(':') {
							Some((name, default)) => match self.get(name) {
								Some(value) => out.push_str(value),
								None => out.push_str(&self.substitute(default)),
							},
							None => out.push_str(self.get(&body).unwrap_or_default()),
						}
					}
					Some(next) if is_name_char(*next) => {
						let mut name = String::new();
						while let Some(&ch) = chars.peek() {
							if !is_name_char(ch) {
								break;
							}
							name.push(ch);
							chars.next();
						}
						out.push_str(self.get(&name).unwrap_or_default());
					}
					_ => out.push('$'),
				},
				_ => out.push(c),
			}
		}

		out
	}

	/// Expands each entry of `inputs` into a path.
	pub fn substitute_paths<S: AsRef<str>>(&self, inputs: &[S]) -> Vec<PathBuf> {
		inputs.iter().map(|s| PathBuf::from(self.substitute(s.as_ref()))).collect()
	}
}

/// Reads up to the matching `}`, honoring nested braces in defaults.
fn take_braced(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> String {
	let mut depth = 0usize;
	let mut body = String::new();
	for ch in chars.by_ref() {
		match ch {
			'{' => depth += 1,
			'}' if depth == 0 => break,
			'}' => depth -= 1,
			_ => {}
		}
		body.push(ch);
	}
	body
}

fn is_name_char(c: char) -> bool {
	c.is_ascii_alphanumeric() || c == '_'
}

fn display(path: &Path) -> String {
	path.to_string_lossy().into_owned()
}

fn platform_name(platform: Platform) -> &'static str {
	match platform {
		Platform::Windows => "Windows",
		Platform::Osx => "OSX",
		Platform::Linux => "Linux",
	}
}
