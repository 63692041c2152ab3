//! Confined execution context
//!
//! A single tokio task draining an unbounded job channel. Jobs run one at a time in the
//! order they were posted, so everything delivered through one context is totally
//! ordered. Cloning a context shares the same consumer task.

use mpa_common::{Error, Result};
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error};

type Job = Box<dyn FnOnce() + Send + 'static>;

enum Task {
    Run(Job),
    /// Hold every later job until the signal fires or its sender is dropped
    Barrier(oneshot::Receiver<()>),
}

/// Handle to a single-consumer job queue running on the tokio runtime
#[derive(Clone)]
pub struct ExecutionContext {
    name: Arc<str>,
    tx: mpsc::UnboundedSender<Task>,
}

impl ExecutionContext {
    /// Start a new consumer task on the current tokio runtime
    ///
    /// # Errors
    ///
    /// [`Error::InvalidState`] when called outside a tokio runtime.
    pub fn spawn(name: impl Into<String>) -> Result<Self> {
        let name: Arc<str> = Arc::from(name.into());
        let runtime = tokio::runtime::Handle::try_current().map_err(|e| {
            Error::InvalidState(format!("execution context '{}' needs a tokio runtime: {}", name, e))
        })?;

        let (tx, mut rx) = mpsc::unbounded_channel::<Task>();
        let task_name = Arc::clone(&name);
        runtime.spawn(async move {
            debug!(context = %task_name, "Execution context started");
            while let Some(task) = rx.recv().await {
                match task {
                    Task::Run(job) => {
                        // Listener sets isolate their own deliveries; this catches anything else.
                        if catch_unwind(AssertUnwindSafe(job)).is_err() {
                            error!(context = %task_name, "Job panicked on execution context");
                        }
                    }
                    Task::Barrier(signal) => {
                        let _ = signal.await;
                    }
                }
            }
            debug!(context = %task_name, "Execution context drained and stopped");
        });

        Ok(Self { name, tx })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Queue a job behind everything posted so far
    ///
    /// Returns `false` if the consumer task is gone and the job was dropped.
    pub fn post(&self, job: impl FnOnce() + Send + 'static) -> bool {
        self.tx.send(Task::Run(Box::new(job))).is_ok()
    }

    /// Hold jobs posted to this context after the call until `other` has run everything
    /// posted to it so far
    ///
    /// A stopped `other` releases the hold immediately.
    pub fn wait_for(&self, other: &ExecutionContext) -> bool {
        let (done_tx, done_rx) = oneshot::channel();
        other.post(move || {
            let _ = done_tx.send(());
        });
        self.tx.send(Task::Barrier(done_rx)).is_ok()
    }

    /// Wait until every job posted before this call has run
    pub async fn idle(&self) {
        let (done_tx, done_rx) = oneshot::channel();
        if self.post(move || {
            let _ = done_tx.send(());
        }) {
            let _ = done_rx.await;
        }
    }
}

impl fmt::Debug for ExecutionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecutionContext")
            .field("name", &self.name)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[tokio::test]
    async fn test_jobs_run_in_post_order() {
        let context = ExecutionContext::spawn("test").unwrap();
        let seen = Arc::new(Mutex::new(Vec::new()));

        for i in 0..50 {
            let seen = Arc::clone(&seen);
            assert!(context.post(move || seen.lock().unwrap().push(i)));
        }
        context.idle().await;

        assert_eq!(*seen.lock().unwrap(), (0..50).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn test_panicking_job_does_not_stop_context() {
        let context = ExecutionContext::spawn("test").unwrap();
        let ran = Arc::new(Mutex::new(false));

        context.post(|| panic!("boom"));
        let flag = Arc::clone(&ran);
        context.post(move || *flag.lock().unwrap() = true);
        context.idle().await;

        assert!(*ran.lock().unwrap());
    }

    #[test]
    fn test_spawn_outside_runtime_fails() {
        let result = ExecutionContext::spawn("orphan");
        assert!(matches!(result, Err(Error::InvalidState(_))));
    }

    #[tokio::test]
    async fn test_clones_share_one_queue() {
        let context = ExecutionContext::spawn("shared").unwrap();
        let clone = context.clone();
        let seen = Arc::new(Mutex::new(Vec::new()));

        let a = Arc::clone(&seen);
        context.post(move || a.lock().unwrap().push("first"));
        let b = Arc::clone(&seen);
        clone.post(move || b.lock().unwrap().push("second"));
        clone.idle().await;

        assert_eq!(*seen.lock().unwrap(), vec!["first", "second"]);
        assert_eq!(clone.name(), "shared");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_wait_for_holds_jobs_until_other_drains() {
        let first = ExecutionContext::spawn("first").unwrap();
        let second = ExecutionContext::spawn("second").unwrap();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let (gate_tx, gate_rx) = std::sync::mpsc::channel::<()>();

        let a = Arc::clone(&seen);
        first.post(move || {
            // Blocks the first context until the test opens the gate
            let _ = gate_rx.recv();
            a.lock().unwrap().push("old");
        });
        assert!(second.wait_for(&first));
        let b = Arc::clone(&seen);
        second.post(move || b.lock().unwrap().push("new"));

        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        assert!(seen.lock().unwrap().is_empty());

        gate_tx.send(()).unwrap();
        second.idle().await;
        assert_eq!(*seen.lock().unwrap(), vec!["old", "new"]);
    }

    #[tokio::test]
    async fn test_wait_for_self_does_not_deadlock() {
        let context = ExecutionContext::spawn("solo").unwrap();
        assert!(context.wait_for(&context));
        context.idle().await;
    }
}
