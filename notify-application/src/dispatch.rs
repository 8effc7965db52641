use tokio_util::sync::CancellationToken;
use tracing::{debug, error};

use notify_domain::{NotifyError, NotifyRequest, NotifyResponse};

use crate::registry::ProxyRegistry;

/// Sends `request` through the first configured proxy of the registry.
///
/// The registry is not a failover chain: the first usable entry answers,
/// successfully or not. Unconfigured slots are logged and skipped. With no
/// usable entry at all there is nothing to repopulate, so an empty result is
/// returned instead of an error.
pub async fn notify_cache_empty(
    ctx: &CancellationToken,
    request: &NotifyRequest,
    proxies: &ProxyRegistry,
) -> Result<NotifyResponse, NotifyError> {
    for entry in proxies.iter() {
        let Some(proxy) = entry.proxy.as_ref() else {
            error!("cache empty proxy is not configured: proxy_name={}", entry.name);
            continue;
        };
        return match proxy.notify(ctx, request).await {
            Ok(response) => Ok(response),
            Err(err) if err.is_canceled() => {
                debug!(
                    "cache empty proxy call canceled: proxy_name={}, channel={}",
                    entry.name, request.channel
                );
                Err(err)
            }
            Err(err) => {
                error!(
                    "error calling cache empty proxy: proxy_name={}, protocol={}, channel={}, err={}",
                    entry.name,
                    proxy.protocol(),
                    request.channel,
                    err
                );
                Err(err)
            }
        };
    }
    Ok(NotifyResponse::default())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::testing::MockProxy;

    fn request() -> NotifyRequest {
        NotifyRequest::new("chat:room-1")
    }

    #[tokio::test]
    async fn empty_registry_returns_default_response() {
        let ctx = CancellationToken::new();
        let response = notify_cache_empty(&ctx, &request(), &ProxyRegistry::new())
            .await
            .expect("default response");
        assert_eq!(response, NotifyResponse::default());
        assert!(!response.is_populated());
    }

    #[tokio::test]
    async fn unconfigured_slots_only_return_default_response() {
        let mut registry = ProxyRegistry::new();
        registry.register_unconfigured("first");
        registry.register_unconfigured("second");

        let ctx = CancellationToken::new();
        let response = notify_cache_empty(&ctx, &request(), &registry)
            .await
            .expect("default response");
        assert!(!response.is_populated());
    }

    #[tokio::test]
    async fn unconfigured_slot_is_skipped() {
        let proxy = Arc::new(MockProxy::populated());
        let mut registry = ProxyRegistry::new();
        registry.register_unconfigured("broken");
        registry.register("backend", proxy.clone());

        let ctx = CancellationToken::new();
        let response = notify_cache_empty(&ctx, &request(), &registry)
            .await
            .expect("response");
        assert!(response.is_populated());
        assert_eq!(proxy.calls(), 1);
        assert_eq!(proxy.channels(), vec!["chat:room-1".to_string()]);
    }

    #[tokio::test]
    async fn first_error_is_returned_without_failover() {
        let failing = Arc::new(MockProxy::new(Err(NotifyError::Status(503))));
        let healthy = Arc::new(MockProxy::populated());
        let registry = ProxyRegistry::new()
            .with_proxy("failing", failing.clone())
            .with_proxy("healthy", healthy.clone());

        let ctx = CancellationToken::new();
        let err = notify_cache_empty(&ctx, &request(), &registry)
            .await
            .expect_err("first proxy error");
        assert!(matches!(err, NotifyError::Status(503)));
        assert_eq!(failing.calls(), 1);
        assert_eq!(healthy.calls(), 0);
    }

    #[tokio::test]
    async fn first_success_wins() {
        let first = Arc::new(MockProxy::new(Ok(NotifyResponse::populated(false))));
        let second = Arc::new(MockProxy::populated());
        let registry = ProxyRegistry::new()
            .with_proxy("first", first.clone())
            .with_proxy("second", second.clone());

        let ctx = CancellationToken::new();
        let response = notify_cache_empty(&ctx, &request(), &registry)
            .await
            .expect("response");
        assert!(!response.is_populated());
        assert_eq!(first.calls(), 1);
        assert_eq!(second.calls(), 0);
    }
}
