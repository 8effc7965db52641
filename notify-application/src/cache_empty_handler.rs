//! Single-flight handling of cache empty events.
//!
//! Concurrent events for the same channel collapse into one backend call made
//! by the first caller (the leader). Every other caller (a follower) waits for
//! the leader's outcome, but only up to the lock timeout: after that it makes
//! its own call so a hung backend cannot stall delivery on the channel.
//! A leader that goes away without an outcome (its caller canceled, or its
//! future was dropped) hands the channel back: the waiting followers elect
//! exactly one new leader among themselves.
//!
//! Deduplication is per process. With several server instances the backend
//! has to tolerate repeated notifications for the same channel.

use std::sync::Arc;
use std::time::Duration;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tokio::sync::watch;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use notify_domain::{NotifyError, NotifyRequest, NotifyResponse};

use crate::dispatch::notify_cache_empty;
use crate::metrics::Metrics;
use crate::registry::ProxyRegistry;

pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(5);

type Outcome = Result<NotifyResponse, NotifyError>;

#[derive(Clone, Default)]
pub struct CacheEmptyHandlerConfig {
    pub proxies: ProxyRegistry,
    /// Longest time a follower waits for the leader. Zero means [`DEFAULT_LOCK_TIMEOUT`].
    pub lock_timeout: Duration,
}

#[derive(Debug, Clone)]
enum CallState {
    Pending,
    Done(Outcome),
    /// Leader went away without an outcome worth sharing. Followers elect a
    /// new leader through the map instead of each calling the backend.
    Abandoned,
}

/// In-flight call for one channel. Its presence in the map is the lock.
struct PendingCall {
    state: watch::Sender<CallState>,
}

impl PendingCall {
    fn new() -> Self {
        let (state, _) = watch::channel(CallState::Pending);
        Self { state }
    }
}

enum Role<'a> {
    Leader(LeaderGuard<'a>),
    Follower(watch::Receiver<CallState>),
}

/// Releases the channel lock when the leader is done, whatever way it ends.
struct LeaderGuard<'a> {
    pending: &'a DashMap<String, Arc<PendingCall>>,
    metrics: &'a Metrics,
    channel: &'a str,
    call: Arc<PendingCall>,
    outcome: Option<Outcome>,
}

impl LeaderGuard<'_> {
    fn finish(mut self, outcome: Outcome) {
        self.outcome = Some(outcome);
    }
}

impl Drop for LeaderGuard<'_> {
    fn drop(&mut self) {
        self.pending
            .remove_if(self.channel, |_, call| Arc::ptr_eq(call, &self.call));
        // A canceled leader only speaks for its own caller.
        let state = match self.outcome.take() {
            Some(Err(NotifyError::Canceled)) | None => {
                self.metrics.record_abandoned_leader();
                CallState::Abandoned
            }
            Some(outcome) => CallState::Done(outcome),
        };
        self.call.state.send_replace(state);
    }
}

pub struct CacheEmptyHandler {
    proxies: ProxyRegistry,
    pending: DashMap<String, Arc<PendingCall>>,
    lock_timeout: Duration,
    metrics: Arc<Metrics>,
}

impl CacheEmptyHandler {
    pub fn new(config: CacheEmptyHandlerConfig) -> Self {
        Self::with_metrics(config, Arc::new(Metrics::default()))
    }

    pub fn with_metrics(config: CacheEmptyHandlerConfig, metrics: Arc<Metrics>) -> Self {
        let lock_timeout = if config.lock_timeout.is_zero() {
            DEFAULT_LOCK_TIMEOUT
        } else {
            config.lock_timeout
        };
        Self {
            proxies: config.proxies,
            pending: DashMap::new(),
            lock_timeout,
            metrics,
        }
    }

    pub fn lock_timeout(&self) -> Duration {
        self.lock_timeout
    }

    pub fn metrics(&self) -> &Arc<Metrics> {
        &self.metrics
    }

    /// Number of channels with a backend call in flight.
    pub fn in_flight(&self) -> usize {
        self.pending.len()
    }

    /// Notifies the backend that the cache of `channel` became empty.
    ///
    /// Returns [`NotifyError::Canceled`] when `ctx` fires while waiting on
    /// another caller's backend call.
    pub async fn handle(&self, ctx: &CancellationToken, channel: &str) -> Outcome {
        let deadline = Instant::now() + self.lock_timeout;
        loop {
            match self.join_or_lead(channel) {
                Role::Leader(guard) => {
                    self.metrics.record_leader();
                    let request = NotifyRequest::new(channel);
                    let outcome = notify_cache_empty(ctx, &request, &self.proxies).await;
                    guard.finish(outcome.clone());
                    return outcome;
                }
                Role::Follower(state) => {
                    self.metrics.record_follower();
                    if let Some(outcome) = self.follow(ctx, channel, state, deadline).await {
                        return outcome;
                    }
                    debug!(
                        "cache empty leader gave up, electing a new one: channel={}",
                        channel
                    );
                }
            }
        }
    }

    fn join_or_lead<'a>(&'a self, channel: &'a str) -> Role<'a> {
        match self.pending.entry(channel.to_string()) {
            Entry::Occupied(entry) => Role::Follower(entry.get().state.subscribe()),
            Entry::Vacant(entry) => {
                let call = Arc::new(PendingCall::new());
                entry.insert(Arc::clone(&call));
                Role::Leader(LeaderGuard {
                    pending: &self.pending,
                    metrics: &self.metrics,
                    channel,
                    call,
                    outcome: None,
                })
            }
        }
    }

    /// `None` means the leader was abandoned and the caller has to join again.
    async fn follow(
        &self,
        ctx: &CancellationToken,
        channel: &str,
        mut state: watch::Receiver<CallState>,
        deadline: Instant,
    ) -> Option<Outcome> {
        let settled = tokio::select! {
            settled = async {
                state
                    .wait_for(|current| !matches!(current, CallState::Pending))
                    .await
                    .map(|current| (*current).clone())
            } => settled.unwrap_or(CallState::Abandoned),
            _ = tokio::time::sleep_until(deadline) => {
                self.metrics.record_lock_timeout();
                warn!(
                    "timeout waiting for cache empty lock, making independent call: channel={}, timeout={:?}",
                    channel, self.lock_timeout
                );
                return Some(self.notify_independently(ctx, channel).await);
            }
            _ = ctx.cancelled() => {
                self.metrics.record_canceled_wait();
                debug!("cache empty wait canceled: channel={}", channel);
                return Some(Err(NotifyError::Canceled));
            }
        };

        match settled {
            CallState::Done(outcome) => Some(outcome),
            CallState::Pending | CallState::Abandoned => None,
        }
    }

    /// Leaves the channel lock untouched: the original leader still owns it.
    async fn notify_independently(&self, ctx: &CancellationToken, channel: &str) -> Outcome {
        let request = NotifyRequest::new(channel);
        notify_cache_empty(ctx, &request, &self.proxies).await
    }
}
