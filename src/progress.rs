//! # Progress — Shared Search Counters
//!
//! Lock-free counters shared by every search worker, plus an optional
//! background thread that logs a status line at a fixed interval.
//!
//! The `attempts` counter doubles as the global attempt budget: workers claim
//! an attempt with [`Progress::claim_attempt`] before drawing a candidate, so
//! a budget of N allows exactly N candidates across all workers.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tracing::info;

const REPORTER_TICK: Duration = Duration::from_millis(100);

pub struct Progress {
    /// Candidates drawn.
    pub attempts: AtomicU64,
    /// Candidates rejected by the q / 2q+1 small-factor sieve.
    pub sieved: AtomicU64,
    /// Candidates whose q passed the full-confidence test.
    pub q_passed: AtomicU64,
    pub found: AtomicU64,
    start: Instant,
    shutdown: AtomicBool,
}

impl Progress {
    pub fn new() -> Arc<Self> {
        Arc::new(Progress {
            attempts: AtomicU64::new(0),
            sieved: AtomicU64::new(0),
            q_passed: AtomicU64::new(0),
            found: AtomicU64::new(0),
            start: Instant::now(),
            shutdown: AtomicBool::new(false),
        })
    }

    /// Reserve one attempt against `budget`. Returns false once the budget
    /// is spent; an unbounded search always succeeds.
    pub fn claim_attempt(&self, budget: Option<u64>) -> bool {
        match budget {
            None => {
                self.attempts.fetch_add(1, Ordering::Relaxed);
                true
            }
            Some(max) => self
                .attempts
                .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |n| {
                    (n < max).then_some(n + 1)
                })
                .is_ok(),
        }
    }

    pub fn attempts(&self) -> u64 {
        self.attempts.load(Ordering::Relaxed)
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Log status every `every` until [`Progress::stop`] is called.
    pub fn start_reporter(self: &Arc<Self>, every: Duration) -> thread::JoinHandle<()> {
        let progress = Arc::clone(self);
        thread::spawn(move || {
            let mut last = Instant::now();
            while !progress.shutdown.load(Ordering::Relaxed) {
                thread::sleep(REPORTER_TICK);
                if last.elapsed() >= every {
                    progress.print_status();
                    last = Instant::now();
                }
            }
        })
    }

    pub fn print_status(&self) {
        let elapsed = self.start.elapsed();
        let attempts = self.attempts();
        let rate = if elapsed.as_secs() > 0 {
            attempts as f64 / elapsed.as_secs_f64()
        } else {
            0.0
        };
        let h = elapsed.as_secs() / 3600;
        let m = (elapsed.as_secs() % 3600) / 60;
        let s = elapsed.as_secs() % 60;
        info!(
            attempts,
            sieved = self.sieved.load(Ordering::Relaxed),
            q_passed = self.q_passed.load(Ordering::Relaxed),
            found = self.found.load(Ordering::Relaxed),
            rate = format_args!("{:.2}", rate),
            elapsed = format_args!("{:02}:{:02}:{:02}", h, m, s),
            "search progress"
        );
    }

    pub fn stop(&self) {
        self.shutdown.store(true, Ordering::Relaxed);
    }
}
