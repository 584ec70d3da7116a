/// Execution classes used for spawn tracing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskClass {
	/// Debounce timers waiting out a coalescing window.
	Timer,
	/// Long-lived queue consumers owned by a serial worker.
	Queue,
	/// Blocking analysis calls executed on the blocking pool.
	Analysis,
}

impl TaskClass {
	pub(crate) const fn as_str(self) -> &'static str {
		match self {
			Self::Timer => "timer",
			Self::Queue => "queue",
			Self::Analysis => "analysis",
		}
	}
}
