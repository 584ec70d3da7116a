use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Monotonic generation clock identifying scheduled calls.
#[derive(Debug, Default, Clone)]
pub(crate) struct GenerationClock {
	next: Arc<AtomicU64>,
}

impl GenerationClock {
	/// Creates a new generation clock starting at generation 1.
	pub fn new() -> Self {
		Self::default()
	}

	/// Returns the next generation ID.
	pub fn next(&self) -> u64 {
		self.next.fetch_add(1, Ordering::AcqRel).wrapping_add(1)
	}
}
