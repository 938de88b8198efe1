// Copyright 2026 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! CONTEXT: Producer/consumer soak for the task scheduler
//! TEST_SCOPE:
//!   - one consumer polling on a period, one producer re-scheduling a
//!     rotating task set under a live clock
//!   - terminates with at least one invocation per task slot, no deadlock

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use nexus_sched::{QueueId, Scheduler};
use sched_e2e::{drain_events, reporting_tasks, Consumer};

#[test]
fn soak_reaches_target_invocation_count() {
    const SLOTS: usize = 128;

    let sched = Arc::new(Scheduler::new());
    sched.prepare_with_capacity(QueueId::ROOT, SLOTS);

    let (tx, rx) = crossbeam_channel::unbounded();
    let tasks = Arc::new(reporting_tasks(SLOTS, QueueId::ROOT, &tx));

    let consumer = Consumer::spawn(Arc::clone(&sched), Duration::from_millis(20));

    let stop = Arc::new(AtomicBool::new(false));
    let producer = {
        let sched = Arc::clone(&sched);
        let tasks = Arc::clone(&tasks);
        let stop = Arc::clone(&stop);
        thread::spawn(move || {
            let mut i = 0usize;
            while !stop.load(Ordering::Relaxed) {
                let delta = if i % 2 == 0 { 5 } else { 17 };
                sched.add(&tasks[i % SLOTS], Instant::now() + Duration::from_millis(delta));
                i += 1;
                thread::sleep(Duration::from_millis(10));
            }
        })
    };

    // one full rotation of the task set, with generous headroom for CI
    let seen = drain_events(&rx, SLOTS, Duration::from_secs(30));

    stop.store(true, Ordering::Relaxed);
    producer.join().expect("producer thread panicked");
    consumer.join();

    assert!(seen >= SLOTS, "only {seen} invocations out of {SLOTS}");
}
