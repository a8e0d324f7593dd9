// src/annotate/job_queue.rs

use parking_lot::{Condvar, Mutex};
use std::collections::VecDeque;

/// What a worker can take off the queue.
#[derive(Debug, PartialEq, Eq)]
pub enum QueueItem<T> {
    Job(T),
    /// End of work. A worker that takes it puts it back before exiting,
    /// so every worker in the pool sees it exactly once.
    Sentinel,
}

/// Shared FIFO job queue with blocking pop.
pub struct JobQueue<T> {
    items: Mutex<VecDeque<QueueItem<T>>>,
    available: Condvar,
}

impl<T> Default for JobQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> JobQueue<T> {
    pub fn new() -> Self {
        Self {
            items: Mutex::new(VecDeque::new()),
            available: Condvar::new(),
        }
    }

    pub fn push(&self, job: T) {
        self.items.lock().push_back(QueueItem::Job(job));
        self.available.notify_one();
    }

    /// Enqueues the termination sentinel.
    pub fn close(&self) {
        self.items.lock().push_back(QueueItem::Sentinel);
        self.available.notify_one();
    }

    /// Blocks until an item is available.
    pub fn pop(&self) -> QueueItem<T> {
        let mut items = self.items.lock();
        loop {
            if let Some(item) = items.pop_front() {
                return item;
            }
            self.available.wait(&mut items);
        }
    }

    pub fn len(&self) -> usize {
        self.items.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.lock().is_empty()
    }
}

impl<T> FromIterator<T> for JobQueue<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let queue = JobQueue::new();
        queue
            .items
            .lock()
            .extend(iter.into_iter().map(QueueItem::Job));
        queue
    }
}
