use std::sync::Arc;

use anyhow::{anyhow, Result};
use tracing::{info, warn};

use notify_application::ProxyRegistry;
use notify_domain::{NotificationProxy, ProxyConfig};

use super::grpc_proxy::GrpcNotificationProxy;
use super::http_proxy::HttpNotificationProxy;

/// Builds the binding matching the endpoint scheme.
pub fn new_notification_proxy(config: ProxyConfig) -> Result<Arc<dyn NotificationProxy>> {
    let endpoint = config.endpoint.trim();
    if endpoint.starts_with("grpc://") {
        let proxy = GrpcNotificationProxy::new(config)?;
        return Ok(Arc::new(proxy));
    }
    if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
        let proxy = HttpNotificationProxy::new(config)?;
        return Ok(Arc::new(proxy));
    }
    Err(anyhow!(
        "unsupported cache empty proxy endpoint: name={}, endpoint={}",
        config.name,
        config.endpoint
    ))
}

/// Proxies without an endpoint are kept as unconfigured slots.
pub fn build_proxy_registry(proxies: &[ProxyConfig]) -> Result<ProxyRegistry> {
    let mut registry = ProxyRegistry::new();
    for config in proxies {
        if !config.is_configured() {
            warn!("cache empty proxy has no endpoint: proxy_name={}", config.name);
            registry.register_unconfigured(config.name.clone());
            continue;
        }
        let proxy = new_notification_proxy(config.clone())?;
        info!(
            "cache empty proxy registered: proxy_name={}, protocol={}, endpoint={}, use_base64={}, include_meta={}",
            config.name,
            proxy.protocol(),
            config.endpoint,
            proxy.use_base64(),
            proxy.include_meta()
        );
        registry.register(config.name.clone(), proxy);
    }
    if has_several_usable(&registry) {
        warn!(
            "more than one cache empty proxy configured, only the first usable one is called: count={}",
            registry.configured_count()
        );
    }
    Ok(registry)
}

fn has_several_usable(registry: &ProxyRegistry) -> bool {
    registry.configured_count() > 1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn builds_bindings_by_scheme() {
        let registry = build_proxy_registry(&[
            ProxyConfig::new("disabled", ""),
            ProxyConfig::new("http", "http://127.0.0.1:3000/cache_empty"),
            ProxyConfig::new("grpc", "grpc://127.0.0.1:10001"),
        ])
        .expect("registry");

        let protocols: Vec<Option<&str>> = registry
            .iter()
            .map(|entry| entry.proxy.as_ref().map(|proxy| proxy.protocol()))
            .collect();
        assert_eq!(protocols, vec![None, Some("http"), Some("grpc")]);
        assert_eq!(registry.configured_count(), 2);
    }

    #[test]
    fn rejects_unknown_scheme() {
        let err = build_proxy_registry(&[ProxyConfig::new("ws", "ws://127.0.0.1:3000")])
            .expect_err("unknown scheme");
        assert!(err.to_string().contains("unsupported"));
    }

    #[tokio::test]
    async fn unconfigured_slots_do_not_count_as_usable() {
        let registry = build_proxy_registry(&[
            ProxyConfig::new("disabled", ""),
            ProxyConfig::new("http", "http://127.0.0.1:3000/cache_empty"),
        ])
        .expect("registry");
        assert_eq!(registry.len(), 2);
        assert!(!has_several_usable(&registry));

        let registry = build_proxy_registry(&[
            ProxyConfig::new("first", "http://127.0.0.1:3000/cache_empty"),
            ProxyConfig::new("second", "grpc://127.0.0.1:10001"),
        ])
        .expect("registry");
        assert!(has_several_usable(&registry));
    }
}
