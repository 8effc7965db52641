use std::collections::HashMap;

use serde::{Deserialize, Serialize};

pub const DEFAULT_PROXY_TIMEOUT_MS: u64 = 1000;

/// Settings of one backend target. Shared by the HTTP and gRPC bindings,
/// each binding reads the fields relevant to its protocol.
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct ProxyConfig {
    pub name: String,
    pub endpoint: String,
    pub timeout_ms: u64,
    pub binary_encoding: bool,
    pub include_connection_meta: bool,
    pub static_http_headers: HashMap<String, String>,
    pub status_to_code_transforms: Vec<StatusToCodeTransform>,
    pub grpc_metadata: HashMap<String, String>,
    pub grpc_credentials_key: Option<String>,
    pub grpc_credentials_value: Option<String>,
    pub grpc_tls: GrpcTlsConfig,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            name: String::new(),
            endpoint: String::new(),
            timeout_ms: DEFAULT_PROXY_TIMEOUT_MS,
            binary_encoding: false,
            include_connection_meta: false,
            static_http_headers: HashMap::new(),
            status_to_code_transforms: Vec::new(),
            grpc_metadata: HashMap::new(),
            grpc_credentials_key: None,
            grpc_credentials_value: None,
            grpc_tls: GrpcTlsConfig::default(),
        }
    }
}

impl ProxyConfig {
    pub fn new(name: impl Into<String>, endpoint: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            endpoint: endpoint.into(),
            ..Self::default()
        }
    }

    pub fn timeout(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.timeout_ms)
    }

    pub fn is_configured(&self) -> bool {
        !self.endpoint.trim().is_empty()
    }

    pub fn find_transform(&self, status_code: u16) -> Option<&StatusToCodeTransform> {
        self.status_to_code_transforms
            .iter()
            .find(|item| item.status_code == status_code)
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
#[serde(default)]
pub struct GrpcTlsConfig {
    pub enabled: bool,
    pub ca_cert_path: Option<String>,
    pub server_name: Option<String>,
}

/// Maps an HTTP status answered by the backend to a domain error.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct StatusToCodeTransform {
    pub status_code: u16,
    pub to_error: TransformError,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct TransformError {
    pub code: u32,
    pub message: String,
    #[serde(default)]
    pub temporary: bool,
}
