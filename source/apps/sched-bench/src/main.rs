// Copyright 2026 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Exercises the scheduler the way an interactive host would: a DSP domain
//! re-arming dense near-future work, a GUI domain ticking at frame rate, an
//! engine domain scheduling sparse messages, one consumer draining them all.
//!
//! Run with `RUST_LOG=debug` to watch queue creation and deferred-path
//! traffic.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use log::info;
use nexus_sched::{QueueId, Scheduler, Task};

const DSP: QueueId = QueueId::new(0);
const ENGINE: QueueId = QueueId::new(1);
const GUI: QueueId = QueueId::new(2);

const RUN_FOR: Duration = Duration::from_secs(2);

struct Domain {
    name: &'static str,
    queue: QueueId,
    tasks: usize,
    /// pause between producer bursts
    cadence: Duration,
    /// how far ahead of now each task is armed
    horizon: Duration,
}

static DOMAINS: [Domain; 3] = [
    Domain {
        name: "dsp",
        queue: DSP,
        tasks: 256,
        cadence: Duration::from_millis(1),
        horizon: Duration::from_millis(2),
    },
    Domain {
        name: "engine",
        queue: ENGINE,
        tasks: 128,
        cadence: Duration::from_millis(5),
        horizon: Duration::from_millis(25),
    },
    Domain {
        name: "gui",
        queue: GUI,
        tasks: 64,
        cadence: Duration::from_millis(16),
        horizon: Duration::from_millis(16),
    },
];

fn main() {
    env_logger::init();

    let sched = Arc::new(Scheduler::new());
    let stop = Arc::new(AtomicBool::new(false));
    let mut producers = Vec::new();
    let mut counters = Vec::new();

    for domain in &DOMAINS {
        sched.prepare_with_capacity(domain.queue, domain.tasks);

        let fired = Arc::new(AtomicUsize::new(0));
        let tasks: Vec<Task> = (0..domain.tasks)
            .map(|_| {
                let fired = Arc::clone(&fired);
                Task::with_queue(
                    move || {
                        fired.fetch_add(1, Ordering::Relaxed);
                    },
                    domain.queue,
                )
            })
            .collect();
        counters.push((domain.name, Arc::clone(&fired)));

        let sched = Arc::clone(&sched);
        let stop = Arc::clone(&stop);
        producers.push(thread::spawn(move || {
            let mut round = 0usize;
            while !stop.load(Ordering::Relaxed) {
                let due = Instant::now() + domain.horizon;
                for task in &tasks {
                    sched.add(task, due);
                }
                round += 1;
                thread::sleep(domain.cadence);
            }
            round
        }));
    }

    let consumer = {
        let sched = Arc::clone(&sched);
        let stop = Arc::clone(&stop);
        thread::spawn(move || {
            let mut passes = 0usize;
            while !stop.load(Ordering::Relaxed) {
                sched.perform(Instant::now());
                passes += 1;
                thread::sleep(Duration::from_millis(2));
            }
            passes
        })
    };

    info!("sched-bench: running for {:?}", RUN_FOR);
    thread::sleep(RUN_FOR);
    stop.store(true, Ordering::Relaxed);

    let mut rounds = Vec::new();
    for producer in producers {
        rounds.push(producer.join().expect("producer thread panicked"));
    }
    let passes = consumer.join().expect("consumer thread panicked");

    println!("consumer: {passes} perform passes over {:?}", RUN_FOR);
    for ((name, fired), rounds) in counters.iter().zip(&rounds) {
        println!(
            "{name}: {} invocations across {rounds} producer rounds",
            fired.load(Ordering::Relaxed)
        );
    }
}
