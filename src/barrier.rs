// src/barrier.rs

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;

/// Counting barrier that opens once a fixed number of signals have arrived.
///
/// Each dispatched segment owns one [`BarrierGuard`]; dropping the guard is
/// the signal, so the count reaches zero on success, error, cancellation
/// and panic alike.
#[derive(Debug)]
pub struct CompletionBarrier {
    remaining: AtomicUsize,
    notify: Notify,
}

impl CompletionBarrier {
    pub fn new(count: usize) -> Arc<Self> {
        Arc::new(Self {
            remaining: AtomicUsize::new(count),
            notify: Notify::new(),
        })
    }

    /// Hands out the guard for one participant.
    pub fn guard(self: &Arc<Self>) -> BarrierGuard {
        BarrierGuard { barrier: Some(self.clone()) }
    }

    pub fn remaining(&self) -> usize {
        self.remaining.load(Ordering::SeqCst)
    }

    fn arrive(&self) {
        // Saturate at zero; extra arrivals are a caller bug but must not wrap.
        let previous = self
            .remaining
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));
        if previous == Ok(1) {
            self.notify.notify_waiters();
        }
    }

    /// Waits until every guard has been dropped.
    pub async fn wait(&self) {
        loop {
            let notified = self.notify.notified();
            if self.remaining() == 0 {
                return;
            }
            notified.await;
        }
    }
}

/// Signals its barrier exactly once, when dropped or on [`arrive`](Self::arrive).
#[derive(Debug)]
pub struct BarrierGuard {
    barrier: Option<Arc<CompletionBarrier>>,
}

impl BarrierGuard {
    pub fn arrive(mut self) {
        if let Some(barrier) = self.barrier.take() {
            barrier.arrive();
        }
    }
}

impl Drop for BarrierGuard {
    fn drop(&mut self) {
        if let Some(barrier) = self.barrier.take() {
            barrier.arrive();
        }
    }
}
