//! Fixed-size worker pool with a shared FIFO task queue.
//!
//! One mutex guards the queue and the active-task count; two condition
//! variables signal "work available" to idle workers and "all done" to
//! anyone blocked in [`ThreadPool::wait_all`]. Workers run until the pool
//! is dropped, at which point the queue is drained and every thread joined.

use std::collections::VecDeque;
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::JoinHandle;

type Job = Box<dyn FnOnce() + Send + 'static>;

struct PoolState {
    jobs: VecDeque<Job>,
    active: usize,
    stop: bool,
}

struct PoolShared {
    state: Mutex<PoolState>,
    work_available: Condvar,
    all_done: Condvar,
}

fn lock(shared: &PoolShared) -> MutexGuard<'_, PoolState> {
    // A poisoned mutex only means a job panicked; the queue itself is
    // still consistent, so keep going.
    shared.state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Worker pool used for page extraction and whole-document batch tasks.
pub struct ThreadPool {
    shared: Arc<PoolShared>,
    workers: Vec<JoinHandle<()>>,
}

impl ThreadPool {
    /// Spawn `num_threads` workers (at least one).
    pub fn new(num_threads: usize) -> Self {
        let shared = Arc::new(PoolShared {
            state: Mutex::new(PoolState {
                jobs: VecDeque::new(),
                active: 0,
                stop: false,
            }),
            work_available: Condvar::new(),
            all_done: Condvar::new(),
        });

        let count = num_threads.max(1);
        let mut workers = Vec::with_capacity(count);
        for i in 0..count {
            let shared = Arc::clone(&shared);
            let handle = std::thread::Builder::new()
                .name(format!("pdfchunk-worker-{i}"))
                .spawn(move || worker_loop(&shared))
                .expect("failed to spawn worker thread");
            workers.push(handle);
        }

        log::debug!("thread pool started with {count} workers");
        Self { shared, workers }
    }

    /// Enqueue a job. Jobs run in FIFO order across the pool.
    pub fn execute<F>(&self, job: F)
    where
        F: FnOnce() + Send + 'static,
    {
        {
            let mut state = lock(&self.shared);
            state.active += 1;
            state.jobs.push_back(Box::new(job));
        }
        self.shared.work_available.notify_one();
    }

    /// Block until the queue is empty and no job is running.
    pub fn wait_all(&self) {
        let mut state = lock(&self.shared);
        while !state.jobs.is_empty() || state.active > 0 {
            state = self
                .shared
                .all_done
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// Jobs waiting in the queue (not yet picked up by a worker).
    pub fn queue_len(&self) -> usize {
        lock(&self.shared).jobs.len()
    }

    /// Jobs currently enqueued or running.
    pub fn active_count(&self) -> usize {
        lock(&self.shared).active
    }

    /// Number of worker threads.
    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }
}

impl Drop for ThreadPool {
    fn drop(&mut self) {
        {
            let mut state = lock(&self.shared);
            state.stop = true;
        }
        self.shared.work_available.notify_all();
        for handle in self.workers.drain(..) {
            let _ = handle.join();
        }
    }
}

fn worker_loop(shared: &PoolShared) {
    loop {
        let job = {
            let mut state = lock(shared);
            loop {
                if let Some(job) = state.jobs.pop_front() {
                    break job;
                }
                if state.stop {
                    return;
                }
                state = shared
                    .work_available
                    .wait(state)
                    .unwrap_or_else(PoisonError::into_inner);
            }
        };

        // Run outside the lock; a panicking job must not wedge the pool, so
        // the active count is repaired before unwinding is swallowed.
        let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(job));
        if outcome.is_err() {
            log::warn!("worker job panicked");
        }

        let mut state = lock(shared);
        state.active -= 1;
        if state.jobs.is_empty() && state.active == 0 {
            shared.all_done.notify_all();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::mpsc;

    #[test]
    fn runs_all_jobs() {
        let pool = ThreadPool::new(4);
        let counter = Arc::new(AtomicUsize::new(0));

        for _ in 0..100 {
            let counter = Arc::clone(&counter);
            pool.execute(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            });
        }
        pool.wait_all();

        assert_eq!(counter.load(Ordering::SeqCst), 100);
        assert_eq!(pool.active_count(), 0);
        assert_eq!(pool.queue_len(), 0);
    }

    #[test]
    fn jobs_run_on_worker_threads() {
        let pool = ThreadPool::new(2);
        let (tx, rx) = mpsc::channel();
        let main_thread = std::thread::current().id();

        pool.execute(move || {
            let _ = tx.send(std::thread::current().id());
        });

        let worker_thread = rx.recv().expect("job ran");
        assert_ne!(worker_thread, main_thread);
    }

    #[test]
    fn at_least_one_worker_even_for_zero() {
        let pool = ThreadPool::new(0);
        assert_eq!(pool.worker_count(), 1);

        let (tx, rx) = mpsc::channel();
        pool.execute(move || {
            let _ = tx.send(42);
        });
        assert_eq!(rx.recv().unwrap(), 42);
    }

    #[test]
    fn panicking_job_does_not_wedge_the_pool() {
        let pool = ThreadPool::new(1);
        pool.execute(|| panic!("boom"));

        let (tx, rx) = mpsc::channel();
        pool.execute(move || {
            let _ = tx.send("still alive");
        });

        assert_eq!(rx.recv().unwrap(), "still alive");
        pool.wait_all();
        assert_eq!(pool.active_count(), 0);
    }

    #[test]
    fn drop_joins_workers() {
        let counter = Arc::new(AtomicUsize::new(0));
        {
            let pool = ThreadPool::new(3);
            for _ in 0..20 {
                let counter = Arc::clone(&counter);
                pool.execute(move || {
                    counter.fetch_add(1, Ordering::SeqCst);
                });
            }
            pool.wait_all();
        }
        assert_eq!(counter.load(Ordering::SeqCst), 20);
    }
}
