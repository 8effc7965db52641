use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

#[derive(Debug, Default)]
pub struct Metrics {
    leader_calls: AtomicU64,
    follower_joins: AtomicU64,
    lock_timeouts: AtomicU64,
    canceled_waits: AtomicU64,
    abandoned_leaders: AtomicU64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub leader_calls: u64,
    pub follower_joins: u64,
    pub lock_timeouts: u64,
    pub canceled_waits: u64,
    pub abandoned_leaders: u64,
}

impl Metrics {
    pub fn record_leader(&self) {
        self.leader_calls.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_follower(&self) {
        self.follower_joins.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_lock_timeout(&self) {
        self.lock_timeouts.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_canceled_wait(&self) {
        self.canceled_waits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_abandoned_leader(&self) {
        self.abandoned_leaders.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            leader_calls: self.leader_calls.load(Ordering::Relaxed),
            follower_joins: self.follower_joins.load(Ordering::Relaxed),
            lock_timeouts: self.lock_timeouts.load(Ordering::Relaxed),
            canceled_waits: self.canceled_waits.load(Ordering::Relaxed),
            abandoned_leaders: self.abandoned_leaders.load(Ordering::Relaxed),
        }
    }
}
