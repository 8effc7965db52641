use anyhow::{anyhow, Result};
use async_trait::async_trait;
use tonic::metadata::{AsciiMetadataKey, AsciiMetadataValue};
use tonic::transport::{Certificate, ClientTlsConfig, Endpoint};
use tokio_util::sync::CancellationToken;

use notify_domain::{
    cancellable, GrpcTlsConfig, NotificationProxy, NotifyError, NotifyRequest, NotifyResponse,
    ProxyConfig,
};

use super::proto::{CacheEmptyProxyClient, NotifyCacheEmptyRequest};

/// Sends cache empty notifications over a unary gRPC call.
///
/// RPC statuses are returned untransformed inside [`NotifyError::Transport`].
pub struct GrpcNotificationProxy {
    config: ProxyConfig,
    client: CacheEmptyProxyClient,
    metadata: Vec<(AsciiMetadataKey, AsciiMetadataValue)>,
}

impl GrpcNotificationProxy {
    /// Must be called within a tokio runtime: the channel drives its
    /// connection from a background task.
    pub fn new(config: ProxyConfig) -> Result<Self> {
        let target = grpc_target(&config.endpoint, config.grpc_tls.enabled)
            .map_err(|err| anyhow!("error getting grpc host: {}", err))?;
        let metadata = build_metadata(&config)?;

        let mut endpoint = Endpoint::from_shared(target)
            .map_err(|err| anyhow!("error creating grpc endpoint: {}", err))?
            .connect_timeout(config.timeout());
        if config.grpc_tls.enabled {
            endpoint = endpoint
                .tls_config(tls_config(&config.grpc_tls)?)
                .map_err(|err| anyhow!("error creating grpc tls config: {}", err))?;
        }
        let channel = endpoint.connect_lazy();

        Ok(Self {
            config,
            client: CacheEmptyProxyClient::new(channel),
            metadata,
        })
    }

    fn build_request(&self, request: &NotifyRequest) -> tonic::Request<NotifyCacheEmptyRequest> {
        let mut grpc_request = tonic::Request::new(NotifyCacheEmptyRequest::from(request));
        grpc_request.set_timeout(self.config.timeout());
        for (key, value) in &self.metadata {
            grpc_request
                .metadata_mut()
                .insert(key.clone(), value.clone());
        }
        grpc_request
    }
}

#[async_trait]
impl NotificationProxy for GrpcNotificationProxy {
    async fn notify(
        &self,
        ctx: &CancellationToken,
        request: &NotifyRequest,
    ) -> Result<NotifyResponse, NotifyError> {
        let grpc_request = self.build_request(request);
        let timeout = self.config.timeout();
        let mut client = self.client.clone();
        let call = async move {
            match tokio::time::timeout(timeout, client.notify_cache_empty(grpc_request)).await {
                Ok(Ok(response)) => Ok(NotifyResponse::from(response.into_inner())),
                Ok(Err(status)) => Err(NotifyError::transport(status)),
                Err(_) => Err(NotifyError::transport(tonic::Status::deadline_exceeded(
                    "cache empty proxy call timed out",
                ))),
            }
        };
        cancellable(ctx, call).await
    }

    fn protocol(&self) -> &'static str {
        "grpc"
    }

    fn use_base64(&self) -> bool {
        self.config.binary_encoding
    }

    fn include_meta(&self) -> bool {
        self.config.include_connection_meta
    }
}

/// Turns `grpc://host:port` into the URI the transport dials.
pub fn grpc_target(endpoint: &str, tls: bool) -> Result<String> {
    let endpoint = endpoint.trim();
    let host = endpoint
        .strip_prefix("grpc://")
        .ok_or_else(|| anyhow!("endpoint must start with grpc://: {}", endpoint))?
        .trim_end_matches('/');
    if host.is_empty() {
        return Err(anyhow!("endpoint has no host: {}", endpoint));
    }
    let scheme = if tls { "https" } else { "http" };
    Ok(format!("{}://{}", scheme, host))
}

fn tls_config(tls: &GrpcTlsConfig) -> Result<ClientTlsConfig> {
    let mut config = match &tls.ca_cert_path {
        Some(path) => {
            let pem = std::fs::read(path)
                .map_err(|err| anyhow!("error reading grpc ca certificate {}: {}", path, err))?;
            ClientTlsConfig::new().ca_certificate(Certificate::from_pem(pem))
        }
        None => ClientTlsConfig::new().with_webpki_roots(),
    };
    if let Some(server_name) = &tls.server_name {
        config = config.domain_name(server_name.clone());
    }
    Ok(config)
}

fn build_metadata(config: &ProxyConfig) -> Result<Vec<(AsciiMetadataKey, AsciiMetadataValue)>> {
    let mut metadata = Vec::with_capacity(config.grpc_metadata.len() + 1);
    for (key, value) in &config.grpc_metadata {
        metadata.push(parse_metadata(key, value)?);
    }
    if let (Some(key), Some(value)) = (&config.grpc_credentials_key, &config.grpc_credentials_value) {
        metadata.push(parse_metadata(key, value)?);
    }
    Ok(metadata)
}

fn parse_metadata(key: &str, value: &str) -> Result<(AsciiMetadataKey, AsciiMetadataValue)> {
    let parsed_key = AsciiMetadataKey::from_bytes(key.trim().to_lowercase().as_bytes())
        .map_err(|err| anyhow!("invalid grpc metadata key {}: {}", key, err))?;
    let parsed_value = value
        .parse::<AsciiMetadataValue>()
        .map_err(|err| anyhow!("invalid grpc metadata value for {}: {}", key, err))?;
    Ok((parsed_key, parsed_value))
}
