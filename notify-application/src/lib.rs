// Notify Application Layer

pub mod cache_empty_handler;
pub mod dispatch;
pub mod metrics;
pub mod registry;

#[cfg(test)]
mod testing;

pub use cache_empty_handler::{CacheEmptyHandler, CacheEmptyHandlerConfig, DEFAULT_LOCK_TIMEOUT};
pub use dispatch::notify_cache_empty;
pub use metrics::{Metrics, MetricsSnapshot};
pub use registry::{ProxyEntry, ProxyRegistry};
