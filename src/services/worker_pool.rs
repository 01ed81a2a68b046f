//! Fixed-size worker pool over a bounded job queue.
//!
//! # Lifecycle
//!
//! 1. `new` spawns the workers, which all pull from one shared receiver
//! 2. `submit` enqueues jobs, waiting while the queue is full
//! 3. `shutdown` closes the queue; queued jobs still run
//! 4. `await_termination` joins the workers within a timeout
//!
//! Workers that are still busy when the timeout expires are detached, not
//! aborted. They finish their current job in the background.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::error::BankError;

type Job = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;

pub struct WorkerPool {
    sender: Option<mpsc::Sender<Job>>,
    workers: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    /// Spawn `size` workers sharing a queue of `queue_capacity` jobs.
    ///
    /// Must be called from within a tokio runtime.
    ///
    /// # Errors
    ///
    /// - `InvalidConfig`: `size` or `queue_capacity` is zero
    pub fn new(size: usize, queue_capacity: usize) -> Result<Self, BankError> {
        if size == 0 {
            return Err(BankError::InvalidConfig(
                "worker pool needs at least one worker".to_string(),
            ));
        }
        if queue_capacity == 0 {
            return Err(BankError::InvalidConfig(
                "job queue capacity must be positive".to_string(),
            ));
        }

        let (sender, receiver) = mpsc::channel::<Job>(queue_capacity);
        let receiver = Arc::new(Mutex::new(receiver));

        let workers = (0..size)
            .map(|worker_id| {
                let receiver = Arc::clone(&receiver);
                tokio::spawn(async move {
                    loop {
                        // Release the receiver before running the job so
                        // other workers can pick up the next one.
                        let job = receiver.lock().await.recv().await;
                        match job {
                            Some(job) => {
                                tracing::debug!(worker_id, "Worker executing job");
                                job.await;
                            }
                            None => break,
                        }
                    }
                    tracing::debug!(worker_id, "Worker stopped");
                })
            })
            .collect();

        Ok(Self {
            sender: Some(sender),
            workers,
        })
    }

    /// Enqueue a job for the next free worker.
    ///
    /// # Errors
    ///
    /// - `PoolClosed`: the pool has been shut down
    pub async fn submit<F>(&self, job: F) -> Result<(), BankError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let sender = self.sender.as_ref().ok_or(BankError::PoolClosed)?;
        sender
            .send(Box::pin(job))
            .await
            .map_err(|_| BankError::PoolClosed)
    }

    /// Stop accepting jobs. Jobs already queued still run.
    pub fn shutdown(&mut self) {
        self.sender.take();
    }

    /// Shut down and wait for every worker to drain the queue.
    ///
    /// Returns `true` if all workers finished within `timeout`.
    pub async fn await_termination(self, timeout: Duration) -> bool {
        self.await_termination_until(Instant::now() + timeout).await
    }

    /// Like `await_termination`, bounded by an absolute `deadline`.
    ///
    /// Lets a caller share one deadline between submission and the final wait.
    pub async fn await_termination_until(mut self, deadline: Instant) -> bool {
        self.shutdown();

        let workers = std::mem::take(&mut self.workers);
        let join_all = async move {
            for worker in workers {
                if let Err(e) = worker.await {
                    tracing::warn!("Worker task failed: {}", e);
                }
            }
        };

        match tokio::time::timeout_at(deadline, join_all).await {
            Ok(()) => true,
            Err(_) => {
                tracing::warn!("Worker pool did not terminate before deadline");
                false
            }
        }
    }
}
