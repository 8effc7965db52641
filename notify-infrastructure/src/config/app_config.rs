use std::env;
use std::path::Path;
use std::time::Duration;

use anyhow::{anyhow, Result};
use serde::Deserialize;
use tokio::fs;
use tracing::warn;

use notify_domain::ProxyConfig;

use super::validation::validate_proxy;

pub const DEFAULT_LOCK_TIMEOUT_MS: u64 = 5000;

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct AppConfig {
    pub lock_timeout_ms: u64,
    pub proxies: Vec<ProxyConfig>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            lock_timeout_ms: DEFAULT_LOCK_TIMEOUT_MS,
            proxies: Vec::new(),
        }
    }
}

impl AppConfig {
    pub async fn load() -> Result<Self> {
        let path = env::var("CACHEWAKE_CONFIG").unwrap_or_else(|_| "./config.toml".to_string());
        let file_path = Path::new(&path);
        if !file_path.exists() {
            warn!("config file not found, using defaults: path={}", path);
            let mut config = AppConfig::default();
            config.apply_env_overrides();
            config.normalize();
            config.validate()?;
            return Ok(config);
        }
        let content = fs::read_to_string(file_path).await?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let mut config: AppConfig = toml::from_str(content)?;
        config.apply_env_overrides();
        config.normalize();
        config.validate()?;
        Ok(config)
    }

    pub fn normalize(&mut self) {
        if self.lock_timeout_ms == 0 {
            self.lock_timeout_ms = DEFAULT_LOCK_TIMEOUT_MS;
        }
        for (index, proxy) in self.proxies.iter_mut().enumerate() {
            proxy.name = proxy.name.trim().to_string();
            if proxy.name.is_empty() {
                proxy.name = format!("proxy-{}", index + 1);
            }
            proxy.endpoint = proxy.endpoint.trim().to_string();
            proxy.grpc_credentials_key = normalize_text(proxy.grpc_credentials_key.take());
            proxy.grpc_credentials_value = normalize_text(proxy.grpc_credentials_value.take());
            proxy.grpc_tls.ca_cert_path = normalize_text(proxy.grpc_tls.ca_cert_path.take());
            proxy.grpc_tls.server_name = normalize_text(proxy.grpc_tls.server_name.take());
            proxy.static_http_headers.retain(|name, _| !name.trim().is_empty());
            proxy.grpc_metadata.retain(|key, _| !key.trim().is_empty());
        }
    }

    pub fn validate(&self) -> Result<()> {
        let mut names = std::collections::HashSet::new();
        for proxy in &self.proxies {
            if !names.insert(proxy.name.as_str()) {
                return Err(anyhow!("duplicate proxy name: {}", proxy.name));
            }
            validate_proxy(proxy)?;
        }
        Ok(())
    }

    pub fn lock_timeout(&self) -> Duration {
        Duration::from_millis(self.lock_timeout_ms)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(value) = env::var("CACHEWAKE_LOCK_TIMEOUT_MS") {
            self.lock_timeout_ms = value.parse().unwrap_or(self.lock_timeout_ms);
        }
        if let Ok(value) = env::var("CACHEWAKE_PROXY_ENDPOINT") {
            self.proxies = vec![ProxyConfig::new("default", value)];
        }
        if let Ok(value) = env::var("CACHEWAKE_PROXY_TIMEOUT_MS") {
            for proxy in &mut self.proxies {
                proxy.timeout_ms = value.parse().unwrap_or(proxy.timeout_ms);
            }
        }
    }
}

fn normalize_text(value: Option<String>) -> Option<String> {
    value.and_then(|raw| {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_proxies_with_transforms() {
        let config = AppConfig::from_toml(
            r#"
lock_timeout_ms = 750

[[proxies]]
name = "backend"
endpoint = " http://127.0.0.1:3000/cache_empty "
timeout_ms = 2000
binary_encoding = true
static_http_headers = { "x-api-key" = "secret" }

[[proxies.status_to_code_transforms]]
status_code = 503
to_error = { code = 1000, message = "backend unavailable", temporary = true }

[[proxies]]
endpoint = "grpc://127.0.0.1:10001"
grpc_credentials_key = "authorization"
grpc_credentials_value = "Bearer token"
"#,
        )
        .expect("parse config");

        assert_eq!(config.lock_timeout(), Duration::from_millis(750));
        assert_eq!(config.proxies.len(), 2);

        let http = &config.proxies[0];
        assert_eq!(http.endpoint, "http://127.0.0.1:3000/cache_empty");
        assert_eq!(http.timeout_ms, 2000);
        assert!(http.binary_encoding);
        assert_eq!(
            http.static_http_headers.get("x-api-key").map(String::as_str),
            Some("secret")
        );
        let transform = http.find_transform(503).expect("transform");
        assert_eq!(transform.to_error.code, 1000);
        assert!(transform.to_error.temporary);

        let grpc = &config.proxies[1];
        assert_eq!(grpc.name, "proxy-2");
        assert_eq!(grpc.timeout_ms, notify_domain::DEFAULT_PROXY_TIMEOUT_MS);
    }

    #[test]
    fn zero_lock_timeout_falls_back_to_default() {
        let mut config = AppConfig {
            lock_timeout_ms: 0,
            proxies: Vec::new(),
        };
        config.normalize();
        assert_eq!(config.lock_timeout_ms, DEFAULT_LOCK_TIMEOUT_MS);
    }

    #[test]
    fn blank_optionals_become_none() {
        let mut proxy = ProxyConfig::new("backend", "grpc://backend:10001");
        proxy.grpc_credentials_key = Some("  ".to_string());
        proxy.grpc_tls.server_name = Some(String::new());
        let mut config = AppConfig {
            lock_timeout_ms: 1000,
            proxies: vec![proxy],
        };
        config.normalize();
        assert!(config.proxies[0].grpc_credentials_key.is_none());
        assert!(config.proxies[0].grpc_tls.server_name.is_none());
    }

    #[test]
    fn rejects_duplicate_names() {
        let config = AppConfig {
            lock_timeout_ms: 1000,
            proxies: vec![
                ProxyConfig::new("backend", "http://a/cache_empty"),
                ProxyConfig::new("backend", "http://b/cache_empty"),
            ],
        };
        let err = config.validate().expect_err("duplicate");
        assert!(err.to_string().contains("duplicate proxy name"));
    }

    #[test]
    fn example_config_is_valid() {
        let mut config: AppConfig =
            toml::from_str(include_str!("../../../config.example.toml")).expect("parse");
        config.normalize();
        config.validate().expect("valid");
        assert_eq!(config.proxies.len(), 1);
        assert_eq!(
            config.proxies[0].find_transform(503).map(|item| item.to_error.code),
            Some(1000)
        );
    }
}
