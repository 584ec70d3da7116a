//! Keyed delay-and-coalesce scheduling.
//!
//! [`Debouncer::schedule`] arms a timer for a key. Scheduling again under the
//! same key before the timer fires cancels the earlier call, so only the last
//! call submitted within a coalescing window ever runs. Timers never block the
//! caller; they run on the worker runtime.

use std::fmt;
use std::hash::Hash;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use rustc_hash::FxHashMap as HashMap;
use tokio::time::{Instant, sleep_until};
use tokio_util::sync::CancellationToken;

use crate::TaskClass;
use crate::token::GenerationClock;

/// One armed, not-yet-fired call.
struct PendingCall {
	generation: u64,
	deadline: Instant,
	cancel: CancellationToken,
}

/// Per-key cancellable timers.
///
/// Cloning yields another handle onto the same timer table.
pub struct Debouncer<K> {
	pending: Arc<Mutex<HashMap<K, PendingCall>>>,
	clock: GenerationClock,
}

impl<K> Clone for Debouncer<K> {
	fn clone(&self) -> Self {
		Self {
			pending: Arc::clone(&self.pending),
			clock: self.clock.clone(),
		}
	}
}

impl<K> Default for Debouncer<K> {
	fn default() -> Self {
		Self {
			pending: Arc::new(Mutex::new(HashMap::default())),
			clock: GenerationClock::new(),
		}
	}
}

impl<K: fmt::Debug> fmt::Debug for Debouncer<K> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Debouncer")
			.field("pending", &self.pending.lock().keys().collect::<Vec<_>>())
			.finish()
	}
}

impl<K> Debouncer<K>
where
	K: Eq + Hash + Clone + fmt::Debug + Send + 'static,
{
	/// Creates an empty debouncer.
	pub fn new() -> Self {
		Self::default()
	}

	/// Runs `task` once `delay` has elapsed without another call for `key`.
	///
	/// Any earlier call still pending under `key` is cancelled. The swap of
	/// the timer handle happens under the table lock.
	pub fn schedule<F>(&self, key: K, delay: Duration, task: F)
	where
		F: FnOnce() + Send + 'static,
	{
		let generation = self.clock.next();
		let deadline = Instant::now() + delay;
		let cancel = CancellationToken::new();

		let superseded = self.pending.lock().insert(
			key.clone(),
			PendingCall {
				generation,
				deadline,
				cancel: cancel.clone(),
			},
		);
		if let Some(previous) = superseded {
			previous.cancel.cancel();
			tracing::trace!(key = ?key, generation = previous.generation, "debounce.superseded");
		}

		let pending = Arc::clone(&self.pending);
		crate::spawn(TaskClass::Timer, async move {
			tokio::select! {
				_ = cancel.cancelled() => return,
				_ = sleep_until(deadline) => {}
			}

			{
				let mut guard = pending.lock();
				match guard.get(&key) {
					Some(call) if call.generation == generation => {
						guard.remove(&key);
					}
					_ => return,
				}
			}

			tracing::trace!(key = ?key, generation, "debounce.fire");
			task();
		});
	}

	/// Cancels the pending call for `key`, returning whether one existed.
	pub fn cancel(&self, key: &K) -> bool {
		match self.pending.lock().remove(key) {
			Some(call) => {
				call.cancel.cancel();
				true
			}
			None => false,
		}
	}

	/// Cancels every pending call.
	pub fn cancel_all(&self) {
		let drained: Vec<_> = self.pending.lock().drain().collect();
		for (_, call) in drained {
			call.cancel.cancel();
		}
	}

	/// Returns true if a call is armed for `key`.
	pub fn is_pending(&self, key: &K) -> bool {
		self.pending.lock().contains_key(key)
	}

	/// Returns the deadline of the call armed for `key`.
	pub fn deadline(&self, key: &K) -> Option<Instant> {
		self.pending.lock().get(key).map(|call| call.deadline)
	}

	/// Returns the number of armed calls.
	pub fn pending_count(&self) -> usize {
		self.pending.lock().len()
	}
}
