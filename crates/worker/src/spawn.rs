use std::any::Any;
use std::future::Future;
use std::sync::OnceLock;

use tokio::task::{JoinError, JoinHandle};

use crate::TaskClass;

fn runtime_handle() -> tokio::runtime::Handle {
	if let Ok(handle) = tokio::runtime::Handle::try_current() {
		return handle;
	}

	static GLOBAL_RT: OnceLock<tokio::runtime::Runtime> = OnceLock::new();
	let runtime = GLOBAL_RT.get_or_init(|| {
		tokio::runtime::Builder::new_multi_thread()
			.enable_all()
			.worker_threads(2)
			.thread_name("pyhint-worker-global")
			.build()
			.expect("failed to build pyhint-worker global tokio runtime")
	});
	runtime.handle().clone()
}

/// Spawns an async task on the current runtime, or the shared global one when
/// called from a thread without a runtime (e.g. the editor UI thread).
pub fn spawn<F>(class: TaskClass, fut: F) -> JoinHandle<F::Output>
where
	F: Future + Send + 'static,
	F::Output: Send + 'static,
{
	tracing::trace!(worker_class = class.as_str(), "worker.spawn");
	runtime_handle().spawn(fut)
}

/// Spawns blocking work on the blocking pool of the same runtime.
pub fn spawn_blocking<F, R>(class: TaskClass, f: F) -> JoinHandle<R>
where
	F: FnOnce() -> R + Send + 'static,
	R: Send + 'static,
{
	tracing::trace!(worker_class = class.as_str(), "worker.spawn_blocking");
	runtime_handle().spawn_blocking(f)
}

/// Extracts the panic message from a join error, if the task panicked.
pub fn join_error_panic_message(err: JoinError) -> Option<String> {
	if !err.is_panic() {
		return None;
	}
	Some(panic_payload_message(err.into_panic().as_ref()))
}

/// Renders a panic payload as text.
pub fn panic_payload_message(payload: &(dyn Any + Send)) -> String {
	if let Some(msg) = payload.downcast_ref::<&'static str>() {
		(*msg).to_string()
	} else if let Some(msg) = payload.downcast_ref::<String>() {
		msg.clone()
	} else {
		"non-string panic payload".to_string()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[tokio::test]
	async fn extracts_static_str_payload() {
		let handle = tokio::spawn(async { panic!("boom-str") });
		let err = handle.await.unwrap_err();
		let msg = join_error_panic_message(err).expect("should be a panic");
		assert!(msg.contains("boom-str"), "expected 'boom-str', got: {msg}");
	}

	#[tokio::test]
	async fn extracts_string_payload() {
		let handle = tokio::spawn(async { panic!("{}", String::from("boom-string")) });
		let err = handle.await.unwrap_err();
		let msg = join_error_panic_message(err).expect("should be a panic");
		assert!(msg.contains("boom-string"), "expected 'boom-string', got: {msg}");
	}

	#[tokio::test]
	async fn returns_none_for_cancellation() {
		let handle = tokio::spawn(async {
			tokio::time::sleep(std::time::Duration::from_secs(60)).await;
		});
		handle.abort();
		let err = handle.await.unwrap_err();
		assert!(join_error_panic_message(err).is_none(), "cancelled task should return None");
	}

	#[test]
	fn spawn_without_runtime_uses_global() {
		let (tx, rx) = std::sync::mpsc::channel();
		let _ = spawn(TaskClass::Timer, async move {
			let _ = tx.send(7);
		});
		assert_eq!(rx.recv_timeout(std::time::Duration::from_secs(5)).ok(), Some(7));
	}
}
