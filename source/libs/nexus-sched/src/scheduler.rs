// Copyright 2026 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Queue registry and fan-out.

use std::collections::BTreeMap;
use std::ops::Bound;
use std::sync::Arc;
use std::time::Instant;

use log::debug;
use parking_lot::RwLock;

use crate::queue::{Queue, DEFAULT_CAPACITY};
use crate::{QueueId, Task};

/// Owns the queues and dispatches task operations to them.
///
/// The scheduler is passive: it owns no threads and never reads the clock.
/// One external consumer thread drives it through [`perform`]; producer
/// threads call [`add`] and [`remove`] concurrently. Queues are created
/// lazily on first use of an id — call [`prepare`] from a non-critical
/// thread to keep that first-use allocation out of a latency-sensitive one.
///
/// [`perform`]: Scheduler::perform
/// [`add`]: Scheduler::add
/// [`remove`]: Scheduler::remove
/// [`prepare`]: Scheduler::prepare
pub struct Scheduler {
    queues: RwLock<BTreeMap<QueueId, Arc<Queue>>>,
}

impl Scheduler {
    /// Creates an empty scheduler.
    pub fn new() -> Self {
        Self {
            queues: RwLock::new(BTreeMap::new()),
        }
    }

    /// Ensures the queue for `queue_id` exists. Idempotent.
    pub fn prepare(&self, queue_id: QueueId) {
        self.queue(queue_id, DEFAULT_CAPACITY);
    }

    /// Ensures the queue for `queue_id` exists with room for at least
    /// `capacity` simultaneously scheduled tasks, so that later operations
    /// on it stay allocation-free. Idempotent; never shrinks.
    pub fn prepare_with_capacity(&self, queue_id: QueueId, capacity: usize) {
        self.queue(queue_id, capacity).reserve(capacity);
    }

    /// Schedules `task` to fire at `time` on its queue, superseding any
    /// earlier schedule of the same task. Never blocks on the consumer.
    pub fn add(&self, task: &Task, time: Instant) {
        self.queue(task.queue_id(), DEFAULT_CAPACITY)
            .add(task.core(), time);
    }

    /// Rescinds any pending execution of `task`. Never blocks on the
    /// consumer. A task whose queue was never touched is not scheduled, so
    /// this is a no-op for it.
    pub fn remove(&self, task: &Task) {
        let queue = self.queues.read().get(&task.queue_id()).cloned();
        if let Some(queue) = queue {
            queue.remove(task.core());
        }
    }

    /// Runs every queue's due work, in ascending queue-id order.
    ///
    /// Callbacks run with no scheduler lock held, so they may re-enter
    /// [`add`]/[`remove`]/[`prepare`] freely — the registry is re-read
    /// between queues rather than held across them. At most one thread may
    /// perform a given queue at a time.
    ///
    /// [`add`]: Scheduler::add
    /// [`remove`]: Scheduler::remove
    /// [`prepare`]: Scheduler::prepare
    pub fn perform(&self, now: Instant) {
        let mut cursor = Bound::Unbounded;
        loop {
            let next = {
                let queues = self.queues.read();
                queues
                    .range((cursor, Bound::Unbounded))
                    .next()
                    .map(|(id, queue)| (*id, Arc::clone(queue)))
            };
            let Some((id, queue)) = next else {
                break;
            };
            queue.perform(now);
            cursor = Bound::Excluded(id);
        }
    }

    fn queue(&self, queue_id: QueueId, capacity: usize) -> Arc<Queue> {
        if let Some(queue) = self.queues.read().get(&queue_id) {
            return Arc::clone(queue);
        }
        let mut queues = self.queues.write();
        let queue = queues.entry(queue_id).or_insert_with(|| {
            debug!("sched: queue {queue_id} created");
            Arc::new(Queue::with_capacity(queue_id, capacity))
        });
        Arc::clone(queue)
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}
