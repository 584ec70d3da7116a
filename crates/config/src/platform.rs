//! Per-platform setting values.

use serde::{Deserialize, Serialize};

/// Host platform families distinguished by path settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Platform {
	Windows,
	Osx,
	Linux,
}

impl Platform {
	/// Returns the platform this binary was built for.
	pub const fn current() -> Self {
		if cfg!(target_os = "windows") {
			Self::Windows
		} else if cfg!(target_os = "macos") {
			Self::Osx
		} else {
			Self::Linux
		}
	}

	/// Returns the settings key for this platform.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Windows => "windows",
			Self::Osx => "osx",
			Self::Linux => "linux",
		}
	}
}

/// One value per platform, keyed `windows` / `osx` / `linux` in settings files.
///
/// Missing keys take `T::default()`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PerPlatform<T> {
	pub windows: T,
	pub osx: T,
	pub linux: T,
}

impl<T> PerPlatform<T> {
	/// Returns the value for `platform`.
	pub fn get(&self, platform: Platform) -> &T {
		match platform {
			Platform::Windows => &self.windows,
			Platform::Osx => &self.osx,
			Platform::Linux => &self.linux,
		}
	}

	/// Returns the value for the host platform.
	pub fn current(&self) -> &T {
		self.get(Platform::current())
	}

	/// Returns a mutable reference to the value for `platform`.
	pub fn get_mut(&mut self, platform: Platform) -> &mut T {
		match platform {
			Platform::Windows => &mut self.windows,
			Platform::Osx => &mut self.osx,
			Platform::Linux => &mut self.linux,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn missing_platform_keys_default() {
		let parsed: PerPlatform<String> = serde_json::from_str(r#"{"linux": "/usr/bin/python3"}"#).unwrap();
		assert_eq!(parsed.get(Platform::Linux), "/usr/bin/python3");
		assert_eq!(parsed.get(Platform::Windows), "");
		assert_eq!(parsed.get(Platform::Osx), "");
	}

	#[test]
	fn get_mut_targets_one_platform() {
		let mut paths: PerPlatform<Vec<String>> = PerPlatform::default();
		paths.get_mut(Platform::Osx).push("/opt/lib".into());
		assert!(paths.linux.is_empty());
		assert_eq!(paths.osx, vec!["/opt/lib".to_string()]);
	}
}
