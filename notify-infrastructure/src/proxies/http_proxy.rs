use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use reqwest::Client;
use tokio_util::sync::CancellationToken;

use notify_domain::{
    cancellable, NotificationProxy, NotifyError, NotifyRequest, NotifyResponse, ProxyConfig,
};

/// Largest backend answer accepted. A cache empty response is a few bytes.
pub const MAX_RESPONSE_BYTES: usize = 64 * 1024;

/// Posts cache empty notifications as JSON to an HTTP backend.
pub struct HttpNotificationProxy {
    config: ProxyConfig,
    client: Client,
    headers: HeaderMap,
}

impl HttpNotificationProxy {
    pub fn new(config: ProxyConfig) -> Result<Self> {
        let headers = build_headers(&config)?;
        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|err| anyhow!("error creating HTTP client: {}", err))?;
        Ok(Self {
            config,
            client,
            headers,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.config.endpoint
    }

    async fn call(&self, body: Vec<u8>) -> Result<NotifyResponse, NotifyError> {
        let response = self
            .client
            .post(&self.config.endpoint)
            .headers(self.headers.clone())
            .body(body)
            .send()
            .await
            .map_err(NotifyError::transport)?;

        let status = response.status();
        if !status.is_success() {
            return Err(self.transform_status(status.as_u16()));
        }
        let data = read_body(response).await?;
        serde_json::from_slice(&data).map_err(|err| NotifyError::Decode(err.to_string()))
    }

    fn transform_status(&self, status_code: u16) -> NotifyError {
        match self.config.find_transform(status_code) {
            Some(transform) => NotifyError::from(&transform.to_error),
            None => NotifyError::Status(status_code),
        }
    }
}

#[async_trait]
impl NotificationProxy for HttpNotificationProxy {
    async fn notify(
        &self,
        ctx: &CancellationToken,
        request: &NotifyRequest,
    ) -> Result<NotifyResponse, NotifyError> {
        let body =
            serde_json::to_vec(request).map_err(|err| NotifyError::Encode(err.to_string()))?;
        cancellable(ctx, self.call(body)).await
    }

    fn protocol(&self) -> &'static str {
        "http"
    }

    fn use_base64(&self) -> bool {
        self.config.binary_encoding
    }

    fn include_meta(&self) -> bool {
        self.config.include_connection_meta
    }
}

async fn read_body(mut response: reqwest::Response) -> Result<Vec<u8>, NotifyError> {
    if let Some(length) = response.content_length() {
        if length > MAX_RESPONSE_BYTES as u64 {
            return Err(body_too_large());
        }
    }
    let mut body = Vec::new();
    while let Some(chunk) = response.chunk().await.map_err(NotifyError::transport)? {
        if body.len() + chunk.len() > MAX_RESPONSE_BYTES {
            return Err(body_too_large());
        }
        body.extend_from_slice(&chunk);
    }
    Ok(body)
}

fn body_too_large() -> NotifyError {
    NotifyError::Decode(format!(
        "response body exceeds {} bytes",
        MAX_RESPONSE_BYTES
    ))
}

fn build_headers(config: &ProxyConfig) -> Result<HeaderMap> {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    for (name, value) in &config.static_http_headers {
        let header_name = HeaderName::from_bytes(name.trim().as_bytes())
            .map_err(|err| anyhow!("invalid header name {}: {}", name, err))?;
        let header_value = HeaderValue::from_str(value)
            .map_err(|err| anyhow!("invalid value for header {}: {}", name, err))?;
        headers.insert(header_name, header_value);
    }
    Ok(headers)
}
