// Copyright 2026 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Single-consumer / many-producer time-ordered task queue.
//!
//! Two lists, one lock each. The main list is the time-sorted schedule; the
//! consumer drains its due prefix under the main lock. Producers probe that
//! lock with `try_lock`: on contention (the consumer is mid-drain) the
//! operation is parked on the deferred list instead, and the consumer
//! replays it during the reconciliation phase of its next pass. Producers
//! therefore only ever wait on the deferred lock, which is held for a few
//! instructions at a time.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Instant;

use log::trace;
use parking_lot::Mutex;

use crate::task::{Pending, TaskCore};
use crate::QueueId;

/// List capacity reserved when a queue is created without an explicit hint.
pub(crate) const DEFAULT_CAPACITY: usize = 64;

struct Entry {
    time: Instant,
    task: Arc<TaskCore>,
}

pub(crate) struct Queue {
    id: QueueId,
    /// Sorted non-decreasing by time. Insertion keeps equal-time entries in
    /// insertion order, so equal deadlines fire FIFO.
    main: Mutex<Vec<Entry>>,
    /// LIFO stack of tasks with an armed intent slot. Order is irrelevant:
    /// replaying an intent is a full add/remove, so the main list ends up
    /// sorted by time regardless of pop order.
    deferred: Mutex<Vec<Arc<TaskCore>>>,
    /// Consumer-only scratch holding the due prefix between detach and
    /// execution. Kept on the queue so a perform pass does not allocate.
    ready: Mutex<VecDeque<Entry>>,
}

impl Queue {
    pub(crate) fn with_capacity(id: QueueId, capacity: usize) -> Self {
        Self {
            id,
            main: Mutex::new(Vec::with_capacity(capacity)),
            deferred: Mutex::new(Vec::with_capacity(capacity)),
            ready: Mutex::new(VecDeque::with_capacity(capacity)),
        }
    }

    /// Grows list storage so later operations stay allocation-free. Blocks
    /// on the main lock; meant for setup, not for the hot path.
    pub(crate) fn reserve(&self, capacity: usize) {
        let mut main = self.main.lock();
        let want = capacity.saturating_sub(main.len());
        main.reserve(want);
        drop(main);
        let mut deferred = self.deferred.lock();
        let want = capacity.saturating_sub(deferred.len());
        deferred.reserve(want);
        drop(deferred);
        let mut ready = self.ready.lock();
        let want = capacity.saturating_sub(ready.len());
        ready.reserve(want);
    }

    /// Schedules `task` at `time`, superseding any earlier schedule of the
    /// same task in this queue.
    pub(crate) fn add(&self, task: &Arc<TaskCore>, time: Instant) {
        if let Some(mut main) = self.main.try_lock() {
            splice_out(&mut main, task);
            // First slot whose successor is strictly later: equal times keep
            // insertion order.
            let at = main.partition_point(|entry| entry.time <= time);
            main.insert(
                at,
                Entry {
                    time,
                    task: Arc::clone(task),
                },
            );
            // Disarm any intent parked before we won the lock; the stale
            // deferred link (if any) is skipped during reconciliation.
            *task.pending().lock() = Pending::Available;
        } else {
            let mut deferred = self.deferred.lock();
            let mut pending = task.pending().lock();
            if *pending == Pending::Available {
                deferred.push(Arc::clone(task));
            }
            *pending = Pending::Add(time);
            trace!("queue {}: add diverted to deferred list", self.id);
        }
    }

    /// Rescinds any pending execution of `task`.
    pub(crate) fn remove(&self, task: &Arc<TaskCore>) {
        if let Some(mut main) = self.main.try_lock() {
            splice_out(&mut main, task);
            *task.pending().lock() = Pending::Available;
        } else {
            let mut deferred = self.deferred.lock();
            let mut pending = task.pending().lock();
            if *pending == Pending::Available {
                deferred.push(Arc::clone(task));
            }
            *pending = Pending::Remove;
            trace!("queue {}: remove diverted to deferred list", self.id);
        }
    }

    /// Drains and fires everything due at or before `now`, then returns.
    ///
    /// One pass: work that becomes due while callbacks run (including
    /// deferred adds replayed this pass) waits for the next call. Exactly one
    /// thread may be inside `perform` for a given queue at a time.
    pub(crate) fn perform(&self, now: Instant) {
        let mut ready = self.ready.lock();

        // Detach the due prefix. Producers that hit this window divert to
        // the deferred list instead of waiting.
        {
            let mut main = self.main.lock();
            let due = main.partition_point(|entry| entry.time <= now);
            ready.extend(main.drain(..due));
        }

        // Reconcile intents parked while the main lock was held. The
        // deferred lock is released before each replay: the replay re-enters
        // add/remove, which may push the task right back if a producer holds
        // the main lock at that moment.
        loop {
            let popped = { self.deferred.lock().pop() };
            let Some(task) = popped else {
                break;
            };
            let intent = std::mem::replace(&mut *task.pending().lock(), Pending::Available);
            match intent {
                Pending::Add(time) => self.add(&task, time),
                Pending::Remove => self.remove(&task),
                Pending::Available => {}
            }
        }

        // Fire in list order, holding no list lock, so callbacks may freely
        // re-enter add/remove. Each entry leaves the ready buffer before its
        // callback runs; if a callback panics, the rest of the batch is
        // picked up by the next pass.
        if !ready.is_empty() {
            trace!("queue {}: firing {} due task(s)", self.id, ready.len());
        }
        while let Some(entry) = ready.pop_front() {
            entry.task.fire();
        }
    }
}

fn splice_out(main: &mut Vec<Entry>, task: &Arc<TaskCore>) {
    if let Some(at) = main.iter().position(|entry| Arc::ptr_eq(&entry.task, task)) {
        main.remove(at);
    }
}
