// src/annotate/pool.rs

use std::thread;

use super::job_queue::{JobQueue, QueueItem};
use crate::errors::PipelineError;

/// Fixed-size pool of OS threads pulling from one [`JobQueue`].
#[derive(Debug, Clone, Copy)]
pub struct WorkerPool {
    size: usize,
}

impl WorkerPool {
    pub fn new(size: usize) -> Self {
        Self { size: size.max(1) }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Runs every queued job to completion.
    ///
    /// Each worker builds its own state with `init(worker_id)` and feeds every
    /// job it dequeues to `handle`. The sentinel is enqueued once all workers are
    /// running. Returns the worker states in worker-id order, or the first
    /// failure (by worker id) after all workers have been joined.
    pub fn run<J, S, I, F>(&self, queue: &JobQueue<J>, init: I, handle: F) -> Result<Vec<S>, PipelineError>
    where
        J: Send,
        S: Send,
        I: Fn(usize) -> Result<S, PipelineError> + Sync,
        F: Fn(&mut S, J) -> Result<(), PipelineError> + Sync,
    {
        let (init, handle) = (&init, &handle);

        let outcomes: Vec<thread::Result<Result<S, PipelineError>>> = thread::scope(|scope| {
            let handles: Vec<_> = (0..self.size)
                .map(|worker_id| {
                    scope.spawn(move || -> Result<S, PipelineError> {
                        let mut state = init(worker_id)?;
                        loop {
                            match queue.pop() {
                                QueueItem::Job(job) => handle(&mut state, job)?,
                                QueueItem::Sentinel => {
                                    queue.close();
                                    break;
                                }
                            }
                        }
                        log::debug!("Worker {} observed end of queue", worker_id);
                        Ok(state)
                    })
                })
                .collect();
            queue.close();
            handles.into_iter().map(|h| h.join()).collect()
        });

        let mut states = Vec::with_capacity(self.size);
        let mut first_error = None;
        for (worker_id, outcome) in outcomes.into_iter().enumerate() {
            match outcome {
                Ok(Ok(state)) => states.push(state),
                Ok(Err(e)) => {
                    log::error!("Worker {} failed: {}", worker_id, e);
                    first_error.get_or_insert(e.in_worker(worker_id));
                }
                Err(_) => {
                    log::error!("Worker {} panicked", worker_id);
                    first_error.get_or_insert(PipelineError::WorkerPanicked { worker_id });
                }
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(states),
        }
    }
}
