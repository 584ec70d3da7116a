use std::sync::atomic::AtomicBool;
use std::sync::mpsc as std_mpsc;
use std::time::Duration;

use parking_lot::Mutex;

use super::*;

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn jobs_on_one_worker_never_overlap() {
	let worker = SerialWorker::new("window-1");
	let running = Arc::new(AtomicUsize::new(0));
	let overlap = Arc::new(AtomicBool::new(false));
	let mut done = Vec::new();

	for _ in 0..6 {
		let running = Arc::clone(&running);
		let overlap = Arc::clone(&overlap);
		done.push(
			worker
				.call(move || {
					if running.fetch_add(1, Ordering::SeqCst) > 0 {
						overlap.store(true, Ordering::SeqCst);
					}
					std::thread::sleep(Duration::from_millis(5));
					running.fetch_sub(1, Ordering::SeqCst);
				})
				.expect("worker open"),
		);
	}

	for rx in done {
		rx.await.expect("job ran");
	}
	assert!(!overlap.load(Ordering::SeqCst));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn jobs_run_in_submission_order() {
	let worker = SerialWorker::new("window-1");
	let order = Arc::new(Mutex::new(Vec::new()));

	let mut last = None;
	for i in 0..5 {
		let order = Arc::clone(&order);
		last = Some(worker.call(move || order.lock().push(i)).expect("worker open"));
	}
	last.expect("submitted").await.expect("job ran");

	assert_eq!(*order.lock(), vec![0, 1, 2, 3, 4]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn independent_workers_run_concurrently() {
	let first = SerialWorker::new("window-1");
	let second = SerialWorker::new("window-2");
	let (a_tx, a_rx) = std_mpsc::channel::<()>();
	let (b_tx, b_rx) = std_mpsc::channel::<()>();

	let a = first
		.call(move || {
			let _ = a_tx.send(());
			b_rx.recv_timeout(Duration::from_secs(5)).is_ok()
		})
		.expect("worker open");
	let b = second
		.call(move || {
			let _ = b_tx.send(());
			a_rx.recv_timeout(Duration::from_secs(5)).is_ok()
		})
		.expect("worker open");

	assert!(a.await.expect("job ran"));
	assert!(b.await.expect("job ran"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn panicking_job_does_not_stop_worker() {
	let worker = SerialWorker::new("window-1");
	worker.submit(|| panic!("engine exploded")).expect("worker open");
	let rx = worker.call(|| 42).expect("worker open");
	assert_eq!(rx.await.ok(), Some(42));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn shutdown_rejects_new_jobs() {
	let worker = SerialWorker::new("window-1");
	worker.shutdown();
	assert!(worker.is_closed());
	assert_eq!(worker.submit(|| {}), Err(SubmitError::Closed));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn backlog_drains_to_zero() {
	let worker = SerialWorker::new("window-1");
	let (release_tx, release_rx) = std_mpsc::channel::<()>();

	worker
		.submit(move || {
			let _ = release_rx.recv_timeout(Duration::from_secs(5));
		})
		.expect("worker open");
	let tail = worker.call(|| ()).expect("worker open");
	assert_eq!(worker.backlog(), 2);

	let _ = release_tx.send(());
	tail.await.expect("job ran");
	tokio::task::yield_now().await;
	for _ in 0..100 {
		if worker.backlog() == 0 {
			break;
		}
		tokio::time::sleep(Duration::from_millis(1)).await;
	}
	assert_eq!(worker.backlog(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn successor_waits_for_predecessor_to_drain() {
	let old = SerialWorker::new("window-1");
	let running = Arc::new(AtomicUsize::new(0));
	let overlap = Arc::new(AtomicBool::new(false));
	let (started_tx, started_rx) = std_mpsc::channel::<()>();

	let job = {
		let running = Arc::clone(&running);
		let overlap = Arc::clone(&overlap);
		move || {
			if running.fetch_add(1, Ordering::SeqCst) > 0 {
				overlap.store(true, Ordering::SeqCst);
			}
			std::thread::sleep(Duration::from_millis(50));
			running.fetch_sub(1, Ordering::SeqCst);
		}
	};
	let first = old
		.call({
			let job = job.clone();
			move || {
				let _ = started_tx.send(());
				job();
			}
		})
		.expect("worker open");
	started_rx.recv_timeout(Duration::from_secs(5)).expect("first job started");

	let new = SerialWorker::after("window-1", old.drained());
	drop(old);
	let second = new.call(job).expect("worker open");

	first.await.expect("job ran");
	second.await.expect("job ran");
	assert!(!overlap.load(Ordering::SeqCst));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn successor_of_stopped_worker_starts_at_once() {
	let old = SerialWorker::new("window-1");
	old.shutdown();
	let new = SerialWorker::after("window-1", old.drained());
	let rx = new.call(|| 7).expect("worker open");
	assert_eq!(rx.await.ok(), Some(7));
}
