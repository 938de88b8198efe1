// Copyright 2026 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! CONTEXT: Threaded test harness for the task scheduler
//! INTENT: Shared producer/consumer plumbing for the end-to-end scenarios
//! DEPS: nexus-sched (system under test), crossbeam-channel (event collection)
//!
//! The harness owns nothing the library does not expose publicly: a consumer
//! thread that polls [`Scheduler::perform`] on a fixed period, and task sets
//! whose callbacks report invocations over a channel.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, Sender};
use nexus_sched::{QueueId, Scheduler, Task};

/// Consumer loop calling `perform(now)` every `period` until stopped.
pub struct Consumer {
    stop: Arc<AtomicBool>,
    handle: JoinHandle<()>,
}

impl Consumer {
    /// Spawns the consumer thread.
    pub fn spawn(sched: Arc<Scheduler>, period: Duration) -> Self {
        let stop = Arc::new(AtomicBool::new(false));
        let handle = {
            let stop = Arc::clone(&stop);
            thread::spawn(move || {
                while !stop.load(Ordering::Relaxed) {
                    sched.perform(Instant::now());
                    thread::sleep(period);
                }
                // final pass so nothing already due is left behind
                sched.perform(Instant::now());
            })
        };
        Self { stop, handle }
    }

    /// Stops the loop and waits for the thread.
    pub fn join(self) {
        self.stop.store(true, Ordering::Relaxed);
        self.handle.join().expect("consumer thread panicked");
    }
}

/// Builds `count` tasks on `queue` whose callbacks send their index on
/// `events` each time they fire.
pub fn reporting_tasks(count: usize, queue: QueueId, events: &Sender<usize>) -> Vec<Task> {
    (0..count)
        .map(|index| {
            let events = events.clone();
            Task::with_queue(
                move || {
                    let _ = events.send(index);
                },
                queue,
            )
        })
        .collect()
}

/// Receives until `expected` events arrived or `deadline` passed; returns
/// the number received.
pub fn drain_events(events: &Receiver<usize>, expected: usize, deadline: Duration) -> usize {
    let until = Instant::now() + deadline;
    let mut seen = 0;
    while seen < expected {
        let left = until.saturating_duration_since(Instant::now());
        if left.is_zero() {
            break;
        }
        match events.recv_timeout(left) {
            Ok(_) => seen += 1,
            Err(_) => break,
        }
    }
    seen
}
