use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::runtime::{Builder, Handle, Runtime};
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::error::{WorkerError, WorkerResult};

/// How long an idle worker thread is kept before it is released
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(30);

/// One slot per core, leaving one for the orchestrating runtime.
pub fn default_slots() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get().saturating_sub(1))
        .unwrap_or(1)
        .max(1)
}

/// Bounded pool of blocking worker threads for CPU-bound encode jobs.
///
/// Threads live on a dedicated runtime that is provisioned on the first
/// submission, so a pool that never receives work never spawns a thread.
/// Idle threads are released after `idle_timeout`. At most `slots` jobs run at
/// once; further submissions wait for a slot in arrival order.
pub struct WorkerPool {
    slots: usize,
    idle_timeout: Duration,
    semaphore: Arc<Semaphore>,
    runtime: Mutex<Option<Runtime>>,
    active_jobs: Arc<AtomicUsize>,
    closed: AtomicBool,
}

impl WorkerPool {
    pub fn new(slots: usize) -> Self {
        Self::with_idle_timeout(slots, DEFAULT_IDLE_TIMEOUT)
    }

    pub fn with_idle_timeout(slots: usize, idle_timeout: Duration) -> Self {
        let slots = slots.max(1);
        Self {
            slots,
            idle_timeout,
            semaphore: Arc::new(Semaphore::new(slots)),
            runtime: Mutex::new(None),
            active_jobs: Arc::new(AtomicUsize::new(0)),
            closed: AtomicBool::new(false),
        }
    }

    pub fn slots(&self) -> usize {
        self.slots
    }

    pub fn active_jobs(&self) -> usize {
        self.active_jobs.load(Ordering::SeqCst)
    }

    pub fn is_provisioned(&self) -> bool {
        self.runtime.lock().map(|rt| rt.is_some()).unwrap_or(false)
    }

    pub fn is_shut_down(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    fn handle(&self) -> WorkerResult<Handle> {
        let mut runtime = self
            .runtime
            .lock()
            .map_err(|_| WorkerError::InitializationError("pool state poisoned".into()))?;
        if self.is_shut_down() {
            return Err(WorkerError::ShutDown);
        }
        if let Some(rt) = runtime.as_ref() {
            return Ok(rt.handle().clone());
        }

        let rt = Builder::new_multi_thread()
            .worker_threads(1)
            .max_blocking_threads(self.slots)
            .thread_keep_alive(self.idle_timeout)
            .thread_name("minify-worker")
            .build()
            .map_err(|e| WorkerError::InitializationError(e.to_string()))?;
        debug!("Worker pool provisioned with {} slots", self.slots);
        let handle = rt.handle().clone();
        *runtime = Some(rt);
        Ok(handle)
    }

    /// Runs `job` on a worker thread once a slot is free.
    ///
    /// Returns `Aborted` if `cancel` fires while waiting for a slot or while
    /// the job runs. A running job is not interrupted; it sees the token and
    /// should stop at its next checkpoint. Its slot is freed when it returns.
    pub async fn submit<F, T>(&self, cancel: &CancellationToken, job: F) -> WorkerResult<T>
    where
        F: FnOnce(&CancellationToken) -> T + Send + 'static,
        T: Send + 'static,
    {
        let handle = self.handle()?;

        let permit = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(WorkerError::Aborted),
            permit = self.semaphore.clone().acquire_owned() => permit?,
        };

        let token = cancel.clone();
        let active = ActiveJob::enter(self.active_jobs.clone());
        let task = handle.spawn_blocking(move || {
            let _permit = permit;
            let _active = active;
            job(&token)
        });

        tokio::select! {
            biased;
            joined = task => joined.map_err(WorkerError::from),
            _ = cancel.cancelled() => Err(WorkerError::Aborted),
        }
    }

    /// Stops accepting work and releases the worker threads.
    ///
    /// Safe to call more than once and from async code. Jobs already running
    /// finish on their own threads.
    pub fn shutdown(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        self.semaphore.close();
        let runtime = match self.runtime.lock() {
            Ok(mut rt) => rt.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        if let Some(rt) = runtime {
            let active = self.active_jobs();
            if active > 0 {
                warn!("Shutting down worker pool with {} jobs still running", active);
            }
            rt.shutdown_background();
            debug!("Worker pool shut down");
        }
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.shutdown();
    }
}

struct ActiveJob(Arc<AtomicUsize>);

impl ActiveJob {
    fn enter(counter: Arc<AtomicUsize>) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for ActiveJob {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[tokio::test(flavor = "multi_thread")]
    async fn never_runs_more_than_slots_at_once() {
        let pool = Arc::new(WorkerPool::new(2));
        let running = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));
        let cancel = CancellationToken::new();

        let jobs = (0..6).map(|_| {
            let running = running.clone();
            let peak = peak.clone();
            let pool = pool.clone();
            let cancel = cancel.clone();
            async move {
                pool.submit(&cancel, move |_| {
                    let now = running.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    std::thread::sleep(Duration::from_millis(40));
                    running.fetch_sub(1, Ordering::SeqCst);
                })
                .await
            }
        });
        for result in futures::future::join_all(jobs).await {
            result.unwrap();
        }

        assert!(peak.load(Ordering::SeqCst) <= 2);
        assert_eq!(pool.active_jobs(), 0);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn provisioned_lazily() {
        let pool = WorkerPool::new(1);
        assert!(!pool.is_provisioned());
        let cancel = CancellationToken::new();
        assert_eq!(pool.submit(&cancel, |_| 21 * 2).await.unwrap(), 42);
        assert!(pool.is_provisioned());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn cancelled_before_slot_is_aborted() {
        let pool = WorkerPool::new(1);
        let cancel = CancellationToken::new();
        cancel.cancel();
        let err = pool.submit(&cancel, |_| ()).await.unwrap_err();
        assert!(matches!(err, WorkerError::Aborted));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn waiting_job_aborts_promptly() {
        let pool = Arc::new(WorkerPool::new(1));
        let holder = CancellationToken::new();
        let busy = {
            let pool = pool.clone();
            let holder = holder.clone();
            tokio::spawn(async move {
                pool.submit(&holder, |_| std::thread::sleep(Duration::from_millis(300)))
                    .await
            })
        };
        tokio::time::sleep(Duration::from_millis(30)).await;

        let waiter = CancellationToken::new();
        let trigger = waiter.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            trigger.cancel();
        });
        let started = Instant::now();
        let err = pool.submit(&waiter, |_| ()).await.unwrap_err();
        assert!(matches!(err, WorkerError::Aborted));
        assert!(started.elapsed() < Duration::from_millis(250));

        busy.await.unwrap().unwrap();
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn running_job_sees_cancellation() {
        let pool = WorkerPool::new(1);
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            trigger.cancel();
        });
        let err = pool
            .submit(&cancel, |token| {
                while !token.is_cancelled() {
                    std::thread::sleep(Duration::from_millis(5));
                }
                // stay busy past the cancellation so the abort is observed first
                std::thread::sleep(Duration::from_millis(100));
            })
            .await
            .unwrap_err();
        assert!(matches!(err, WorkerError::Aborted));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn panic_is_isolated() {
        let pool = WorkerPool::new(1);
        let cancel = CancellationToken::new();
        let err = pool
            .submit(&cancel, |_| -> u8 { panic!("decoder exploded") })
            .await
            .unwrap_err();
        assert!(matches!(err, WorkerError::Panicked(ref msg) if msg.contains("decoder exploded")));

        // the slot came back
        assert_eq!(pool.submit(&cancel, |_| 1u8).await.unwrap(), 1);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn shutdown_is_idempotent_and_final() {
        let pool = WorkerPool::new(2);
        let cancel = CancellationToken::new();
        pool.submit(&cancel, |_| ()).await.unwrap();

        pool.shutdown();
        pool.shutdown();
        assert!(pool.is_shut_down());
        assert!(!pool.is_provisioned());

        let err = pool.submit(&cancel, |_| ()).await.unwrap_err();
        assert!(matches!(err, WorkerError::ShutDown));
    }

    #[test]
    fn default_slots_is_at_least_one() {
        assert!(default_slots() >= 1);
    }
}
