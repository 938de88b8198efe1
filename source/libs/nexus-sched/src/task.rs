// Copyright 2026 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Task handles and the per-task deferred-intent slot.

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use parking_lot::Mutex;

use crate::{Callback, QueueId};

/// Intent recorded for a task while its queue's main list is held by the
/// consumer. Each task carries exactly one slot: re-arming an armed slot
/// overwrites it, so the last intent wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Pending {
    /// No deferred intent. The task may still sit on the deferred list
    /// transiently (a fast-path add or remove resets the slot without
    /// unlinking); reconciliation skips such entries.
    Available,
    /// Schedule at the carried instant during reconciliation.
    Add(Instant),
    /// Unschedule during reconciliation.
    Remove,
}

/// Shared state behind a [`Task`] handle.
pub(crate) struct TaskCore {
    queue_id: QueueId,
    /// Fired by the consumer only; the lock is what makes the handle
    /// shareable across producer threads.
    body: Mutex<Box<dyn Callback>>,
    /// Acquired only after the main or deferred lock, never before.
    pending: Mutex<Pending>,
}

impl TaskCore {
    pub(crate) fn queue_id(&self) -> QueueId {
        self.queue_id
    }

    pub(crate) fn pending(&self) -> &Mutex<Pending> {
        &self.pending
    }

    pub(crate) fn fire(&self) {
        self.body.lock().fire();
    }
}

/// Handle to a schedulable callback.
///
/// A task is identified by the handle itself, not by its contents: clones
/// refer to the same task, and scheduling a task that is already scheduled
/// moves it instead of duplicating it. Queues keep their own clones, so
/// dropping every user-held handle while the task is scheduled is safe — the
/// callback still fires. Use [`Scheduler::remove`](crate::Scheduler::remove)
/// to cancel.
///
/// A callback that captures a clone of its own task (the usual self-
/// rescheduling pattern) forms a reference cycle and keeps the task alive for
/// the life of the program; that is normally what a repeating timer wants.
#[derive(Clone)]
pub struct Task {
    core: Arc<TaskCore>,
}

impl Task {
    /// Creates a task on the root queue.
    pub fn new(callback: impl Callback) -> Self {
        Self::with_queue(callback, QueueId::ROOT)
    }

    /// Creates a task on the given queue. The queue id is fixed for the
    /// task's lifetime.
    pub fn with_queue(callback: impl Callback, queue_id: QueueId) -> Self {
        Self {
            core: Arc::new(TaskCore {
                queue_id,
                body: Mutex::new(Box::new(callback)),
                pending: Mutex::new(Pending::Available),
            }),
        }
    }

    /// The queue this task belongs to.
    pub fn queue_id(&self) -> QueueId {
        self.core.queue_id
    }

    pub(crate) fn core(&self) -> &Arc<TaskCore> {
        &self.core
    }
}

impl PartialEq for Task {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.core, &other.core)
    }
}

impl Eq for Task {}

impl fmt::Debug for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task")
            .field("queue_id", &self.core.queue_id)
            .finish_non_exhaustive()
    }
}
