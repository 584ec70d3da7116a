//! Worker primitives for the completion pipeline.
//!
//! * [`Debouncer`]: per-key cancellable timers that coalesce bursts of calls.
//! * [`SerialWorker`]: a capacity-1 FIFO executor for blocking work.
//! * [`spawn`] / [`spawn_blocking`]: runtime-aware spawn helpers that fall
//!   back to a shared global runtime when called outside of Tokio.

mod class;
mod debounce;
mod serial;
mod spawn;
mod token;

pub use class::TaskClass;
pub use debounce::Debouncer;
pub use serial::{SerialWorker, SubmitError};
pub use spawn::{join_error_panic_message, panic_payload_message, spawn, spawn_blocking};
