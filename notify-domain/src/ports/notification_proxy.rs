use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::entities::{NotifyRequest, NotifyResponse};
use crate::error::NotifyError;

/// Transport binding able to deliver cache empty notifications to a backend.
#[async_trait]
pub trait NotificationProxy: Send + Sync {
    /// Calls the backend. Must stop waiting as soon as `ctx` is canceled.
    async fn notify(
        &self,
        ctx: &CancellationToken,
        request: &NotifyRequest,
    ) -> Result<NotifyResponse, NotifyError>;

    /// Protocol name for logging and metrics.
    fn protocol(&self) -> &'static str;

    /// Binary payloads going to the backend are base64 encoded.
    fn use_base64(&self) -> bool;

    /// Connection meta is attached to requests.
    fn include_meta(&self) -> bool;
}
