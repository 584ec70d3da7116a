use std::sync::atomic::{AtomicU64, Ordering};

/// Stable identity of an editor window for its lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct WindowKey(pub u64);

/// Identity of a view (a tab showing one buffer).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ViewId(pub u64);

/// Identity of one requesting component (a completion listener or command).
///
/// Debounced calls are coalesced per instance and request kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct InstanceId(pub u64);

impl InstanceId {
	/// Allocates a process-unique instance ID.
	pub fn next() -> Self {
		static NEXT: AtomicU64 = AtomicU64::new(1);
		Self(NEXT.fetch_add(1, Ordering::Relaxed))
	}
}

/// One `(display label, insertion text)` completion pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CompletionEntry {
	/// Text shown in the popup, `"<name>\t<kind>"`.
	pub label: String,
	/// Text inserted on accept; may be a snippet.
	pub insert_text: String,
}

impl CompletionEntry {
	pub fn new(label: impl Into<String>, insert_text: impl Into<String>) -> Self {
		Self {
			label: label.into(),
			insert_text: insert_text.into(),
		}
	}
}
