//! Single-capacity background worker.
//!
//! A [`SerialWorker`] owns one queue consumer. Jobs are executed one at a
//! time, in submission order, on the blocking pool; a job submitted while
//! another is running waits in an unbounded FIFO queue. Independent workers
//! run in parallel with each other.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;

use crate::{TaskClass, join_error_panic_message, spawn, spawn_blocking};

type Job = Box<dyn FnOnce() + Send + 'static>;

/// Errors returned when submitting to a worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SubmitError {
	/// The worker was shut down and no longer accepts jobs.
	#[error("serial worker is closed")]
	Closed,
}

/// Handle onto a single-capacity job queue.
///
/// Dropping the last handle closes the queue; jobs already queued still run.
/// [`SerialWorker::shutdown`] stops the consumer after the current job.
#[derive(Debug)]
pub struct SerialWorker {
	name: Arc<str>,
	tx: mpsc::UnboundedSender<Job>,
	queued: Arc<AtomicUsize>,
	cancel: CancellationToken,
}

impl SerialWorker {
	/// Starts a worker consumer on the worker runtime.
	pub fn new(name: impl Into<Arc<str>>) -> Self {
		Self::start(name.into(), None)
	}

	/// Starts a worker that takes no job until `predecessor` resolves.
	///
	/// Pair with [`Self::drained`] on the worker being replaced so the two
	/// never run jobs at the same time.
	pub fn after(name: impl Into<Arc<str>>, predecessor: oneshot::Receiver<()>) -> Self {
		Self::start(name.into(), Some(predecessor))
	}

	fn start(name: Arc<str>, predecessor: Option<oneshot::Receiver<()>>) -> Self {
		let (tx, mut rx) = mpsc::unbounded_channel::<Job>();
		let queued = Arc::new(AtomicUsize::new(0));
		let cancel = CancellationToken::new();

		let consumer_name = Arc::clone(&name);
		let consumer_queued = Arc::clone(&queued);
		let consumer_cancel = cancel.clone();
		spawn(TaskClass::Queue, async move {
			if let Some(predecessor) = predecessor {
				tokio::select! {
					biased;
					_ = consumer_cancel.cancelled() => {}
					_ = predecessor => tracing::trace!(worker = %consumer_name, "predecessor drained"),
				}
			}
			loop {
				let job = tokio::select! {
					biased;
					_ = consumer_cancel.cancelled() => break,
					job = rx.recv() => match job {
						Some(job) => job,
						None => break,
					},
				};

				if let Err(err) = spawn_blocking(TaskClass::Analysis, job).await {
					match join_error_panic_message(err) {
						Some(msg) => tracing::error!(worker = %consumer_name, panic = %msg, "serial worker job panicked"),
						None => tracing::warn!(worker = %consumer_name, "serial worker job cancelled"),
					}
				}
				consumer_queued.fetch_sub(1, Ordering::AcqRel);
			}
			tracing::debug!(worker = %consumer_name, "serial worker stopped");
		});

		Self { name, tx, queued, cancel }
	}

	/// Returns the worker name used in logs.
	pub fn name(&self) -> &str {
		&self.name
	}

	/// Enqueues a job behind any queued or running job.
	pub fn submit<F>(&self, job: F) -> Result<(), SubmitError>
	where
		F: FnOnce() + Send + 'static,
	{
		if self.cancel.is_cancelled() {
			return Err(SubmitError::Closed);
		}
		self.queued.fetch_add(1, Ordering::AcqRel);
		if self.tx.send(Box::new(job)).is_err() {
			self.queued.fetch_sub(1, Ordering::AcqRel);
			return Err(SubmitError::Closed);
		}
		Ok(())
	}

	/// Enqueues a job and returns a receiver for its output.
	///
	/// The receiver errors if the worker shuts down before running the job.
	pub fn call<F, R>(&self, job: F) -> Result<oneshot::Receiver<R>, SubmitError>
	where
		F: FnOnce() -> R + Send + 'static,
		R: Send + 'static,
	{
		let (tx, rx) = oneshot::channel();
		self.submit(move || {
			let _ = tx.send(job());
		})?;
		Ok(rx)
	}

	/// Returns a receiver that resolves once every job submitted before this
	/// call has finished.
	///
	/// It also resolves, with an error, if the worker stops first.
	pub fn drained(&self) -> oneshot::Receiver<()> {
		let (tx, rx) = oneshot::channel();
		let _ = self.submit(move || {
			let _ = tx.send(());
		});
		rx
	}

	/// Returns the number of queued plus running jobs.
	pub fn backlog(&self) -> usize {
		self.queued.load(Ordering::Acquire)
	}

	/// Returns true once [`Self::shutdown`] has been called.
	pub fn is_closed(&self) -> bool {
		self.cancel.is_cancelled()
	}

	/// Stops accepting jobs; the consumer exits after its current job.
	pub fn shutdown(&self) {
		if !self.cancel.is_cancelled() {
			tracing::debug!(worker = %self.name, backlog = self.backlog(), "serial worker shutdown");
			self.cancel.cancel();
		}
	}
}

#[cfg(test)]
mod tests;
