use anyhow::{anyhow, Result};

use notify_domain::ProxyConfig;

const ENDPOINT_SCHEMES: [&str; 3] = ["http://", "https://", "grpc://"];

pub fn validate_endpoint(value: &str) -> Result<()> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(());
    }
    let Some(scheme) = ENDPOINT_SCHEMES
        .iter()
        .find(|scheme| value.starts_with(*scheme))
    else {
        return Err(anyhow!(
            "endpoint must start with http://, https:// or grpc://: {}",
            value
        ));
    };
    if value[scheme.len()..].trim_matches('/').is_empty() {
        return Err(anyhow!("endpoint has no host: {}", value));
    }
    Ok(())
}

pub fn validate_proxy(proxy: &ProxyConfig) -> Result<()> {
    validate_endpoint(&proxy.endpoint).map_err(|err| anyhow!("proxy {}: {}", proxy.name, err))?;
    if proxy.timeout_ms == 0 {
        return Err(anyhow!("proxy {}: timeout_ms must be greater than 0", proxy.name));
    }
    for transform in &proxy.status_to_code_transforms {
        if !(100..=599).contains(&transform.status_code) {
            return Err(anyhow!(
                "proxy {}: status_code {} out of range",
                proxy.name,
                transform.status_code
            ));
        }
        if transform.to_error.code == 0 {
            return Err(anyhow!(
                "proxy {}: transform for status {} needs a non-zero error code",
                proxy.name,
                transform.status_code
            ));
        }
    }
    if proxy.grpc_credentials_key.is_some() != proxy.grpc_credentials_value.is_some() {
        return Err(anyhow!(
            "proxy {}: grpc_credentials_key and grpc_credentials_value must be set together",
            proxy.name
        ));
    }
    Ok(())
}
