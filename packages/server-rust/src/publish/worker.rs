//! Background worker for queued tasks.
//!
//! Provides a generic `BackgroundWorker<R>` that processes tasks from a
//! bounded mpsc channel via a `BackgroundRunnable` implementation and drains
//! whatever is still queued when it is stopped.

use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{mpsc, oneshot};

// ---------------------------------------------------------------------------
// BackgroundRunnable trait
// ---------------------------------------------------------------------------

/// Trait for task handlers executed by `BackgroundWorker`.
#[async_trait]
pub trait BackgroundRunnable: Send + 'static {
    /// The type of task this runnable processes.
    type Task: Send + 'static;

    /// Process a single task.
    async fn run(&mut self, task: Self::Task);

    /// Called once after the queue is drained on shutdown. Default is a no-op.
    async fn shutdown(&mut self) {}
}

// ---------------------------------------------------------------------------
// BackgroundWorker
// ---------------------------------------------------------------------------

/// Generic background worker that processes tasks via an mpsc channel.
///
/// The worker spawns a tokio task that:
/// 1. Listens for tasks on the mpsc channel
/// 2. Calls `BackgroundRunnable::run()` for each task
/// 3. On stop, closes the channel and runs every task already queued
/// 4. Calls `BackgroundRunnable::shutdown()`
///
/// The worker also exits once every sender has been dropped.
pub struct BackgroundWorker<R: BackgroundRunnable> {
    shutdown_tx: Option<oneshot::Sender<()>>,
    handle: Option<tokio::task::JoinHandle<()>>,
    _runnable: std::marker::PhantomData<fn() -> R>,
}

impl<R: BackgroundRunnable> BackgroundWorker<R> {
    /// Start the background worker with the given runnable and queue capacity.
    ///
    /// Returns the worker handle together with the sending half of its queue.
    /// Senders are cheap to clone and are the only way to submit work.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    pub fn start(mut runnable: R, capacity: usize) -> (Self, mpsc::Sender<R::Task>) {
        let (tx, mut rx) = mpsc::channel::<R::Task>(capacity);
        let (shutdown_tx, mut shutdown_rx) = oneshot::channel::<()>();

        let handle = tokio::spawn(async move {
            loop {
                tokio::select! {
                    task = rx.recv() => {
                        match task {
                            Some(t) => runnable.run(t).await,
                            None => break, // All senders dropped.
                        }
                    }
                    _ = &mut shutdown_rx => {
                        rx.close();
                        while let Some(t) = rx.recv().await {
                            runnable.run(t).await;
                        }
                        break;
                    }
                }
            }

            runnable.shutdown().await;
        });

        let worker = Self {
            shutdown_tx: Some(shutdown_tx),
            handle: Some(handle),
            _runnable: std::marker::PhantomData,
        };
        (worker, tx)
    }

    /// Stop the worker, waiting up to `timeout` for queued tasks to be
    /// processed.
    ///
    /// Returns `false` if the timeout expired; the worker task is aborted and
    /// whatever was still queued is dropped.
    pub async fn stop(&mut self, timeout: Duration) -> bool {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        let Some(mut handle) = self.handle.take() else {
            return true;
        };
        if tokio::time::timeout(timeout, &mut handle).await.is_ok() {
            true
        } else {
            handle.abort();
            false
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    use super::*;

    const FLUSH: Duration = Duration::from_secs(5);

    struct CountingRunnable {
        run_count: Arc<AtomicU32>,
        shutdown_called: Arc<AtomicU32>,
        delay: Duration,
    }

    #[async_trait]
    impl BackgroundRunnable for CountingRunnable {
        type Task = String;

        async fn run(&mut self, _task: String) {
            tokio::time::sleep(self.delay).await;
            self.run_count.fetch_add(1, Ordering::SeqCst);
        }

        async fn shutdown(&mut self) {
            self.shutdown_called.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn counting(delay: Duration) -> (CountingRunnable, Arc<AtomicU32>, Arc<AtomicU32>) {
        let run_count = Arc::new(AtomicU32::new(0));
        let shutdown_called = Arc::new(AtomicU32::new(0));
        let runnable = CountingRunnable {
            run_count: Arc::clone(&run_count),
            shutdown_called: Arc::clone(&shutdown_called),
            delay,
        };
        (runnable, run_count, shutdown_called)
    }

    #[tokio::test]
    async fn start_submit_and_stop() {
        let (runnable, run_count, shutdown_called) = counting(Duration::ZERO);
        let (mut worker, tx) = BackgroundWorker::start(runnable, 16);

        tx.send("task-1".to_string()).await.unwrap();
        tx.send("task-2".to_string()).await.unwrap();
        tx.send("task-3".to_string()).await.unwrap();

        // Give the worker time to process tasks.
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(run_count.load(Ordering::SeqCst), 3);

        assert!(worker.stop(FLUSH).await);
        assert_eq!(shutdown_called.load(Ordering::SeqCst), 1);
        assert!(worker.stop(FLUSH).await);
    }

    #[tokio::test]
    async fn stop_drains_queued_tasks() {
        let (runnable, run_count, _) = counting(Duration::from_millis(10));
        let (mut worker, tx) = BackgroundWorker::start(runnable, 16);

        for i in 0..5 {
            tx.try_send(format!("task-{i}")).unwrap();
        }
        assert!(worker.stop(FLUSH).await);

        assert_eq!(run_count.load(Ordering::SeqCst), 5);
    }

    #[tokio::test]
    async fn submit_after_stop_fails() {
        let (runnable, _, _) = counting(Duration::ZERO);
        let (mut worker, tx) = BackgroundWorker::start(runnable, 4);
        worker.stop(FLUSH).await;

        assert!(tx.try_send("late-task".to_string()).is_err());
    }

    #[tokio::test]
    async fn worker_exits_when_senders_dropped() {
        let (runnable, _, shutdown_called) = counting(Duration::ZERO);
        let (mut worker, tx) = BackgroundWorker::start(runnable, 4);
        drop(tx);

        worker.stop(FLUSH).await;
        assert_eq!(shutdown_called.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn stop_gives_up_after_timeout() {
        let (runnable, run_count, shutdown_called) = counting(Duration::from_millis(200));
        let (mut worker, tx) = BackgroundWorker::start(runnable, 16);
        for i in 0..10 {
            tx.try_send(format!("task-{i}")).unwrap();
        }

        let started = tokio::time::Instant::now();
        assert!(!worker.stop(Duration::from_millis(50)).await);

        assert!(started.elapsed() < Duration::from_secs(1));
        tokio::time::sleep(Duration::from_millis(250)).await;
        assert_eq!(run_count.load(Ordering::SeqCst), 0);
        assert_eq!(shutdown_called.load(Ordering::SeqCst), 0);
    }
}
