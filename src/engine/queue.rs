// src/engine/queue.rs

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::Utc;
use thiserror::Error;
use tokio::sync::Notify;
use tracing::{debug, trace};

use super::work::{WorkItem, WorkRequest};

/// Default number of pending items.
pub const DEFAULT_CAPACITY: usize = 10;

/// Why an enqueue attempt was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum EnqueueError {
    #[error("queue is full")]
    Full,
    #[error("queue is closed")]
    Closed,
}

#[derive(Debug)]
struct QueueState {
    items: VecDeque<WorkItem>,
    next_seq: u64,
    closed: bool,
}

/// Fixed-capacity FIFO shared by every producer and the single worker.
///
/// Semantics:
/// - `enqueue` never blocks; it admits the item iff occupancy is below
///   capacity at the instant of the call. The check and the push happen under
///   one lock, so occupancy never exceeds capacity.
/// - `dequeue` suspends the consumer until an item is available and returns
///   items in admission order (which is also sequence-number order).
/// - After `close`, new items are rejected and `dequeue` returns `None` once
///   the remaining items are drained.
///
/// Wake-ups use a single stored permit, so this is designed for one consumer.
#[derive(Debug)]
pub struct BoundedQueue {
    capacity: usize,
    state: Mutex<QueueState>,
    available: Notify,
}

impl BoundedQueue {
    /// Create a queue holding at most `capacity` items (clamped to >= 1).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            state: Mutex::new(QueueState {
                items: VecDeque::with_capacity(capacity),
                next_seq: 1,
                closed: false,
            }),
            available: Notify::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, QueueState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Current occupancy.
    pub fn len(&self) -> usize {
        self.lock().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_full(&self) -> bool {
        self.len() >= self.capacity
    }

    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    /// Admit `request` if there is room. Returns `true` iff it was admitted.
    pub fn enqueue(&self, request: &WorkRequest) -> bool {
        self.try_enqueue(request).is_ok()
    }

    /// Like [`enqueue`](Self::enqueue) but reports the assigned sequence
    /// number or the rejection reason.
    pub fn try_enqueue(&self, request: &WorkRequest) -> Result<u64, EnqueueError> {
        let seq = {
            let mut state = self.lock();
            if state.closed {
                return Err(EnqueueError::Closed);
            }
            if state.items.len() >= self.capacity {
                trace!(
                    task = %request.task.name,
                    len = state.items.len(),
                    capacity = self.capacity,
                    "queue full; rejecting"
                );
                return Err(EnqueueError::Full);
            }

            let seq = state.next_seq;
            state.next_seq += 1;
            state.items.push_back(WorkItem {
                task: request.task.clone(),
                question: request.question.clone(),
                kind: request.task.kind,
                enqueued_at: Utc::now(),
                seq,
            });
            debug!(
                task = %request.task.name,
                kind = %request.task.kind,
                seq,
                len = state.items.len(),
                "work item admitted"
            );
            seq
        };

        self.available.notify_one();
        Ok(seq)
    }

    /// Wait for the next item.
    ///
    /// Returns `None` once the queue is closed and empty.
    pub async fn dequeue(&self) -> Option<WorkItem> {
        loop {
            {
                let mut state = self.lock();
                if let Some(item) = state.items.pop_front() {
                    return Some(item);
                }
                if state.closed {
                    return None;
                }
            }
            self.available.notified().await;
        }
    }

    /// Non-suspending variant of [`dequeue`](Self::dequeue).
    pub fn try_dequeue(&self) -> Option<WorkItem> {
        self.lock().items.pop_front()
    }

    /// Stop admitting new items; already queued items stay drainable.
    pub fn close(&self) {
        self.lock().closed = true;
        self.available.notify_one();
    }

    /// Stop admitting new items and drop everything still queued.
    ///
    /// Returns the number of discarded items.
    pub fn close_and_discard(&self) -> usize {
        let discarded = {
            let mut state = self.lock();
            state.closed = true;
            let n = state.items.len();
            state.items.clear();
            n
        };
        self.available.notify_one();
        discarded
    }
}

impl Default for BoundedQueue {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
