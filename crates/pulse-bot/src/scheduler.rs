//! Independent periodic cycle runners.
//!
//! Each cycle runs on its own interval task, so a slow or stuck decision
//! cycle never delays the broadcast cycle. A firing that lands while the
//! previous invocation of the same cycle is still running is skipped and
//! logged, never stacked.

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// A unit of periodic work.
#[async_trait]
pub trait PeriodicCycle: Send + Sync + 'static {
    fn name(&self) -> &'static str;

    async fn run(&self);
}

/// Spawn a cycle on a fixed interval.
///
/// The first firing happens immediately. Invocations are spawned so the
/// interval keeps ticking while a cycle runs; the busy flag turns an
/// overlapping firing into a logged skip.
pub fn spawn_periodic(cycle: Arc<dyn PeriodicCycle>, period: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        let busy = Arc::new(AtomicBool::new(false));

        loop {
            interval.tick().await;

            if busy.swap(true, Ordering::AcqRel) {
                warn!(
                    cycle = cycle.name(),
                    "Previous invocation still running, firing skipped"
                );
                continue;
            }

            debug!(cycle = cycle.name(), "Cycle firing");
            let cycle = Arc::clone(&cycle);
            let busy = Arc::clone(&busy);
            tokio::spawn(async move {
                cycle.run().await;
                busy.store(false, Ordering::Release);
            });
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    /// Cycle that runs longer than its scheduling period.
    struct SlowCycle {
        duration: Duration,
        runs: AtomicUsize,
        concurrent: AtomicUsize,
        max_concurrent: AtomicUsize,
    }

    #[async_trait]
    impl PeriodicCycle for SlowCycle {
        fn name(&self) -> &'static str {
            "slow"
        }

        async fn run(&self) {
            let now = self.concurrent.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_concurrent.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(self.duration).await;
            self.concurrent.fetch_sub(1, Ordering::SeqCst);
            self.runs.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_cycle_is_skipped_not_stacked() {
        let cycle = Arc::new(SlowCycle {
            duration: Duration::from_millis(250),
            runs: AtomicUsize::new(0),
            concurrent: AtomicUsize::new(0),
            max_concurrent: AtomicUsize::new(0),
        });

        let handle = spawn_periodic(
            Arc::clone(&cycle) as Arc<dyn PeriodicCycle>,
            Duration::from_millis(100),
        );

        tokio::time::sleep(Duration::from_millis(1050)).await;
        handle.abort();

        // Ten ticks in the window, but a 250 ms cycle on a 100 ms period
        // means most firings are skipped.
        let runs = cycle.runs.load(Ordering::SeqCst);
        assert!(runs >= 2, "cycle ran {runs} times");
        assert!(runs <= 5, "skipped firings must not stack ({runs} runs)");
        assert_eq!(
            cycle.max_concurrent.load(Ordering::SeqCst),
            1,
            "the same cycle must never run concurrently with itself"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_independent_cycles_do_not_block_each_other() {
        let slow = Arc::new(SlowCycle {
            duration: Duration::from_millis(10_000),
            runs: AtomicUsize::new(0),
            concurrent: AtomicUsize::new(0),
            max_concurrent: AtomicUsize::new(0),
        });
        let fast = Arc::new(SlowCycle {
            duration: Duration::from_millis(1),
            runs: AtomicUsize::new(0),
            concurrent: AtomicUsize::new(0),
            max_concurrent: AtomicUsize::new(0),
        });

        let slow_handle = spawn_periodic(
            Arc::clone(&slow) as Arc<dyn PeriodicCycle>,
            Duration::from_millis(100),
        );
        let fast_handle = spawn_periodic(
            Arc::clone(&fast) as Arc<dyn PeriodicCycle>,
            Duration::from_millis(100),
        );

        tokio::time::sleep(Duration::from_millis(1050)).await;
        slow_handle.abort();
        fast_handle.abort();

        // The stuck slow cycle never completed a run; the fast one kept
        // its cadence regardless.
        assert_eq!(slow.runs.load(Ordering::SeqCst), 0);
        assert!(fast.runs.load(Ordering::SeqCst) >= 8);
    }
}
