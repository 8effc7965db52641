use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use notify_domain::{cancellable, NotificationProxy, NotifyError, NotifyRequest, NotifyResponse};

/// In-memory backend recording every call it receives.
pub struct MockProxy {
    outcome: Result<NotifyResponse, NotifyError>,
    delay: Duration,
    first_call_delay: Option<Duration>,
    calls: AtomicUsize,
    channels: Mutex<Vec<String>>,
}

impl MockProxy {
    pub fn new(outcome: Result<NotifyResponse, NotifyError>) -> Self {
        Self {
            outcome,
            delay: Duration::ZERO,
            first_call_delay: None,
            calls: AtomicUsize::new(0),
            channels: Mutex::new(Vec::new()),
        }
    }

    pub fn populated() -> Self {
        Self::new(Ok(NotifyResponse::populated(true)))
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Only the very first call sleeps for `delay`; later calls use the regular delay.
    pub fn with_first_call_delay(mut self, delay: Duration) -> Self {
        self.first_call_delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn channels(&self) -> Vec<String> {
        let mut channels = self.channels.lock().expect("channels lock").clone();
        channels.sort();
        channels
    }
}

#[async_trait]
impl NotificationProxy for MockProxy {
    async fn notify(
        &self,
        ctx: &CancellationToken,
        request: &NotifyRequest,
    ) -> Result<NotifyResponse, NotifyError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        self.channels
            .lock()
            .expect("channels lock")
            .push(request.channel.clone());
        let delay = match self.first_call_delay {
            Some(delay) if call == 1 => delay,
            _ => self.delay,
        };
        cancellable(ctx, async {
            tokio::time::sleep(delay).await;
            self.outcome.clone()
        })
        .await
    }

    fn protocol(&self) -> &'static str {
        "mock"
    }

    fn use_base64(&self) -> bool {
        false
    }

    fn include_meta(&self) -> bool {
        false
    }
}
