//! FIFO queue of render tasks waiting for a scheduling slot.
//!
//! There are no priorities: the head is always the oldest task, and a task
//! that failed is re-appended at the tail so it never jumps ahead of work
//! enqueued before its retry.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use super::task::{RenderHandle, RenderId};

/// A render task waiting in the queue.
#[derive(Debug, Clone)]
pub struct PendingTask {
    /// The callback to run.
    pub handle: RenderHandle,

    /// Execution attempts made so far.
    pub attempts: u32,

    /// When the task (re-)entered the queue.
    pub enqueued_at: Instant,
}

impl PendingTask {
    /// Creates a task that has never been attempted.
    pub fn new(handle: RenderHandle) -> Self {
        Self {
            handle,
            attempts: 0,
            enqueued_at: Instant::now(),
        }
    }

    /// Returns how long this task has been waiting in the queue.
    pub fn wait_time(&self) -> Duration {
        self.enqueued_at.elapsed()
    }

    /// Returns the handle identity.
    pub fn id(&self) -> RenderId {
        self.handle.id()
    }
}

/// First-in, first-out queue of pending render tasks.
///
/// Not thread-safe; the scheduler wraps it in its state mutex.
#[derive(Debug, Default)]
pub struct PendingQueue {
    tasks: VecDeque<PendingTask>,
}

impl PendingQueue {
    /// Creates an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a task at the tail.
    pub fn push_back(&mut self, mut task: PendingTask) {
        task.enqueued_at = Instant::now();
        self.tasks.push_back(task);
    }

    /// Removes and returns the oldest task.
    pub fn pop_front(&mut self) -> Option<PendingTask> {
        self.tasks.pop_front()
    }

    /// Returns true if a task with this identity is queued.
    pub fn contains(&self, id: RenderId) -> bool {
        self.tasks.iter().any(|t| t.id() == id)
    }

    /// Removes every task with this identity, returning how many were removed.
    pub fn remove(&mut self, id: RenderId) -> usize {
        let before = self.tasks.len();
        self.tasks.retain(|t| t.id() != id);
        before - self.tasks.len()
    }

    /// Removes and returns all tasks in queue order.
    pub fn drain(&mut self) -> Vec<PendingTask> {
        self.tasks.drain(..).collect()
    }

    /// Returns the number of queued tasks.
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Returns true if nothing is queued.
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Iterates tasks from head to tail.
    pub fn iter(&self) -> impl Iterator<Item = &PendingTask> {
        self.tasks.iter()
    }
}
