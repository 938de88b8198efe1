// Copyright 2026 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! CONTEXT: Time-ordered task scheduler for soft-real-time host threads
//! OWNERS: @runtime
//! STATUS: Functional
//! API_STABILITY: Unstable (Phase 1)
//! TEST_COVERAGE: unit tests per module, scenario tests in tests/,
//!   threaded end-to-end coverage in tests/sched_e2e
//!
//! Notes:
//! - One consumer thread per queue, any number of producer threads.
//! - Producers never wait on the consumer: while the consumer is draining a
//!   queue, add/remove divert to a deferred list that is reconciled at the
//!   start of the next perform pass.
//! - Steady-state add/remove/perform do not allocate; list storage is
//!   capacity-reserved and task handles are reference-counted.
//!
//! The scheduler owns no threads. A host loop (UI tick, message pump, the
//! driver behind an audio callback) calls [`Scheduler::perform`] with the
//! current instant; producer threads schedule work with [`Scheduler::add`]
//! and rescind it with [`Scheduler::remove`]. Each [`Task`] names its queue
//! via [`QueueId`], so independent producer domains (DSP, engine, GUI) never
//! contend on one lock.

#![forbid(unsafe_code)]
#![deny(clippy::all, missing_docs)]

mod queue;
mod scheduler;
mod task;

pub use scheduler::Scheduler;
pub use task::Task;

use std::fmt;

/// Identifies the queue a [`Task`] belongs to.
///
/// Producers sharing a queue id serialize through that queue's locks; giving
/// each producer domain its own id keeps them independent. Ids are plain
/// integers chosen by the application; [`QueueId::ROOT`] is the conventional
/// default.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct QueueId(u32);

impl QueueId {
    /// The default queue.
    pub const ROOT: QueueId = QueueId(0);

    /// Wraps a raw queue id.
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// Returns the raw numeric id.
    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl From<u32> for QueueId {
    fn from(raw: u32) -> Self {
        Self(raw)
    }
}

impl fmt::Display for QueueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Body of a [`Task`].
///
/// Any `FnMut() + Send + 'static` closure is a `Callback` through the blanket
/// impl below; implement the trait directly when the body is a method on a
/// long-lived object (a timer target, a widget, a voice in a synth graph).
pub trait Callback: Send + 'static {
    /// Invoked on the consumer thread each time the task comes due.
    fn fire(&mut self);
}

impl<F: FnMut() + Send + 'static> Callback for F {
    fn fire(&mut self) {
        self()
    }
}
