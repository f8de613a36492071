//! Re-highlight Scheduler
//!
//! The cooperative layer above the block processor. Edits arrive in bursts;
//! reprocessing on every keystroke would saturate the UI thread. This
//! scheduler queues re-highlight requests on a bounded channel (capacity 3
//! by default — beyond that, new requests are coalesced away rather than
//! queued unboundedly), delays a request briefly when others are pending so
//! a burst collapses into one pass, holds the queue after each run, and
//! announces completion once per drain, slightly delayed so the UI is not
//! repainted mid-burst.
//!
//! Block processing inside one request is strictly sequential; the capacity
//! applies to requests, never to blocks.

use log::{debug, warn};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::mpsc::{self, SyncSender, TrySendError};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::error::{Error, Result};

// ─────────────────────────────────────────────────────────────────────────────
// Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Timing and backpressure knobs. The defaults are tuned for interactive
/// editing; tests shrink them.
#[derive(Debug, Clone, Copy)]
pub struct SchedulerConfig {
    /// Maximum requests in flight; extra requests are coalesced.
    pub capacity: usize,
    /// Delay before running a request while others are still pending.
    pub debounce: Duration,
    /// Quiet period after each run before the next may start.
    pub hold: Duration,
    /// Delay between the queue draining and the completion callback.
    pub drain_delay: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            capacity: 3,
            debounce: Duration::from_millis(250),
            hold: Duration::from_millis(500),
            drain_delay: Duration::from_millis(750),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Request Scope
// ─────────────────────────────────────────────────────────────────────────────

/// What a re-highlight request covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RehighlightScope {
    /// Reprocess every block, resetting state (profile/theme change,
    /// construct-integrity repair).
    FullDocument,
    /// Reprocess a single changed block.
    Block(usize),
    /// Reprocess the visible block range.
    VisibleRegion { first: usize, last: usize },
}

// ─────────────────────────────────────────────────────────────────────────────
// Scheduler
// ─────────────────────────────────────────────────────────────────────────────

struct Shared {
    pending: AtomicUsize,
    cancelled: AtomicBool,
}

/// Debounced, bounded re-highlight queue with a single worker.
///
/// The worker invokes the `run` callback for each surviving request and the
/// `on_drained` callback once per full drain. Cancellation is cooperative:
/// pending requests are dropped, an already-started run completes.
pub struct RehighlightScheduler {
    config: SchedulerConfig,
    tx: Option<SyncSender<RehighlightScope>>,
    shared: Arc<Shared>,
    worker: Option<JoinHandle<()>>,
}

impl RehighlightScheduler {
    /// Spawn the worker. `run` performs one re-highlight pass; `on_drained`
    /// fires when the queue has fully drained and the drain delay elapsed.
    pub fn new<R, D>(config: SchedulerConfig, mut run: R, mut on_drained: D) -> Result<Self>
    where
        R: FnMut(RehighlightScope) + Send + 'static,
        D: FnMut() + Send + 'static,
    {
        let (tx, rx) = mpsc::sync_channel::<RehighlightScope>(config.capacity.max(1));
        let shared = Arc::new(Shared {
            pending: AtomicUsize::new(0),
            cancelled: AtomicBool::new(false),
        });

        let worker_shared = Arc::clone(&shared);
        let worker = thread::Builder::new()
            .name("marklight-rehighlight".to_string())
            .spawn(move || {
                while let Ok(scope) = rx.recv() {
                    if worker_shared.cancelled.load(Ordering::SeqCst) {
                        worker_shared.pending.fetch_sub(1, Ordering::SeqCst);
                        debug!("dropping pending re-highlight request: cancelled");
                        continue;
                    }
                    if worker_shared.pending.load(Ordering::SeqCst) > 1 {
                        // Others are queued behind this one: let the burst
                        // settle and coalesce into fewer passes.
                        thread::sleep(config.debounce);
                    }
                    run(scope);
                    worker_shared.pending.fetch_sub(1, Ordering::SeqCst);
                    thread::sleep(config.hold);
                    if worker_shared.pending.load(Ordering::SeqCst) == 0 {
                        thread::sleep(config.drain_delay);
                        if worker_shared.pending.load(Ordering::SeqCst) == 0
                            && !worker_shared.cancelled.load(Ordering::SeqCst)
                        {
                            on_drained();
                        }
                    }
                }
            })
            .map_err(|e| Error::Application(format!("failed to spawn re-highlight worker: {}", e)))?;

        Ok(Self {
            config,
            tx: Some(tx),
            shared,
            worker: Some(worker),
        })
    }

    /// Queue a re-highlight request. Returns `false` when the request was
    /// coalesced away (queue at capacity) or the scheduler is cancelled.
    pub fn request(&self, scope: RehighlightScope) -> bool {
        if self.shared.cancelled.load(Ordering::SeqCst) {
            debug!("ignoring re-highlight request after cancellation");
            return false;
        }
        if self.shared.pending.load(Ordering::SeqCst) >= self.config.capacity {
            debug!("re-highlight queue full; coalescing {:?}", scope);
            return false;
        }
        let Some(tx) = self.tx.as_ref() else {
            return false;
        };

        self.shared.pending.fetch_add(1, Ordering::SeqCst);
        match tx.try_send(scope) {
            Ok(()) => true,
            Err(TrySendError::Full(scope)) => {
                self.shared.pending.fetch_sub(1, Ordering::SeqCst);
                debug!("re-highlight queue full; coalescing {:?}", scope);
                false
            }
            Err(TrySendError::Disconnected(_)) => {
                self.shared.pending.fetch_sub(1, Ordering::SeqCst);
                warn!("re-highlight worker is gone; request dropped");
                false
            }
        }
    }

    /// Requests accepted but not yet completed.
    pub fn pending(&self) -> usize {
        self.shared.pending.load(Ordering::SeqCst)
    }

    /// Cooperatively cancel: pending requests are dropped, an in-flight run
    /// completes. Safe to call more than once.
    pub fn cancel(&self) {
        self.shared.cancelled.store(true, Ordering::SeqCst);
    }

    /// Cancel and wait for whatever already-started work cannot be aborted.
    /// Join failures are logged, never raised.
    pub fn shutdown(&mut self) {
        self.cancel();
        self.tx.take();
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                warn!("re-highlight worker panicked during shutdown");
            }
        }
    }
}

impl Drop for RehighlightScheduler {
    fn drop(&mut self) {
        self.shutdown();
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> SchedulerConfig {
        SchedulerConfig {
            capacity: 3,
            debounce: Duration::from_millis(2),
            hold: Duration::from_millis(2),
            drain_delay: Duration::from_millis(5),
        }
    }

    fn counters() -> (Arc<AtomicUsize>, Arc<AtomicUsize>) {
        (Arc::new(AtomicUsize::new(0)), Arc::new(AtomicUsize::new(0)))
    }

    #[test]
    fn test_single_request_runs_and_drains_once() {
        let (executed, drained) = counters();
        let (e, d) = (Arc::clone(&executed), Arc::clone(&drained));
        let scheduler = RehighlightScheduler::new(
            test_config(),
            move |_| {
                e.fetch_add(1, Ordering::SeqCst);
            },
            move || {
                d.fetch_add(1, Ordering::SeqCst);
            },
        )
        .expect("scheduler");

        assert!(scheduler.request(RehighlightScope::FullDocument));
        thread::sleep(Duration::from_millis(200));
        assert_eq!(executed.load(Ordering::SeqCst), 1);
        assert_eq!(drained.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_burst_is_coalesced_to_capacity() {
        let (executed, drained) = counters();
        let (e, d) = (Arc::clone(&executed), Arc::clone(&drained));
        let scheduler = RehighlightScheduler::new(
            test_config(),
            move |_| {
                // Slow enough that the burst below lands while running
                thread::sleep(Duration::from_millis(20));
                e.fetch_add(1, Ordering::SeqCst);
            },
            move || {
                d.fetch_add(1, Ordering::SeqCst);
            },
        )
        .expect("scheduler");

        let mut accepted = 0;
        for i in 0..7 {
            if scheduler.request(RehighlightScope::Block(i)) {
                accepted += 1;
            }
        }
        assert!(accepted <= 3, "accepted {} of 7 requests", accepted);

        thread::sleep(Duration::from_millis(400));
        let runs = executed.load(Ordering::SeqCst);
        assert!(runs >= 1 && runs <= 3, "executed {} passes", runs);
        // Completion announced exactly once, after the last pass
        assert_eq!(drained.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_cancel_drops_pending_requests() {
        let (executed, drained) = counters();
        let (e, d) = (Arc::clone(&executed), Arc::clone(&drained));
        let mut scheduler = RehighlightScheduler::new(
            test_config(),
            move |_| {
                thread::sleep(Duration::from_millis(30));
                e.fetch_add(1, Ordering::SeqCst);
            },
            move || {
                d.fetch_add(1, Ordering::SeqCst);
            },
        )
        .expect("scheduler");

        for i in 0..3 {
            scheduler.request(RehighlightScope::Block(i));
        }
        scheduler.cancel();
        scheduler.shutdown();

        // At most the already-started run completed; the rest were dropped
        assert!(executed.load(Ordering::SeqCst) <= 1);
        assert_eq!(drained.load(Ordering::SeqCst), 0);
        assert_eq!(scheduler.pending(), 0);
    }

    #[test]
    fn test_requests_after_cancel_are_rejected() {
        let scheduler =
            RehighlightScheduler::new(test_config(), |_| {}, || {}).expect("scheduler");
        scheduler.cancel();
        assert!(!scheduler.request(RehighlightScope::FullDocument));
    }

    #[test]
    fn test_drop_joins_worker() {
        let (executed, _drained) = counters();
        let e = Arc::clone(&executed);
        {
            let scheduler = RehighlightScheduler::new(
                test_config(),
                move |_| {
                    e.fetch_add(1, Ordering::SeqCst);
                },
                || {},
            )
            .expect("scheduler");
            scheduler.request(RehighlightScope::FullDocument);
            // Dropped immediately; must not hang or panic
        }
    }

    #[test]
    fn test_scope_equality() {
        assert_eq!(RehighlightScope::Block(3), RehighlightScope::Block(3));
        assert_ne!(
            RehighlightScope::Block(3),
            RehighlightScope::VisibleRegion { first: 0, last: 3 }
        );
    }
}
