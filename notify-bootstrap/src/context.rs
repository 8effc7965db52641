use std::sync::Arc;

use anyhow::Result;
use tracing::info;

use notify_application::{CacheEmptyHandler, CacheEmptyHandlerConfig, Metrics};
use notify_infrastructure::{build_proxy_registry, AppConfig};

pub struct AppContext {
    pub handler: CacheEmptyHandler,
    pub metrics: Arc<Metrics>,
}

impl AppContext {
    pub async fn new() -> Result<Self> {
        let config = AppConfig::load().await?;
        Self::from_config(&config)
    }

    /// Builds the proxy bindings; must run inside the tokio runtime.
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let proxies = build_proxy_registry(&config.proxies)?;
        info!(
            "cache empty handler ready: proxies={}, configured={}, lock_timeout_ms={}",
            proxies.len(),
            proxies.configured_count(),
            config.lock_timeout_ms
        );

        let metrics = Arc::new(Metrics::default());
        let handler = CacheEmptyHandler::with_metrics(
            CacheEmptyHandlerConfig {
                proxies,
                lock_timeout: config.lock_timeout(),
            },
            metrics.clone(),
        );
        Ok(Self { handler, metrics })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn wires_configured_proxies() {
        let config = AppConfig::from_toml(
            r#"
            lock_timeout_ms = 250

            [[proxies]]
            name = "backend"
            endpoint = "http://127.0.0.1:3000/cache_empty"

            [[proxies]]
            name = "disabled"
            endpoint = ""
            "#,
        )
        .expect("config");

        let context = AppContext::from_config(&config).expect("context");
        assert_eq!(context.handler.lock_timeout().as_millis(), 250);
        assert_eq!(context.handler.in_flight(), 0);
        assert_eq!(context.metrics.snapshot().leader_calls, 0);
    }
}
