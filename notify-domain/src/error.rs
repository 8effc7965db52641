use std::sync::Arc;

use thiserror::Error;

use crate::entities::TransformError;

/// Failure of a cache empty notification.
///
/// Cloneable so a leader can hand the very same error to every waiting follower.
#[derive(Debug, Clone, Error)]
pub enum NotifyError {
    /// The caller's own cancellation token fired.
    #[error("cache empty notification canceled")]
    Canceled,
    #[error("encode request: {0}")]
    Encode(String),
    #[error("decode response: {0}")]
    Decode(String),
    #[error("unexpected status code {0}")]
    Status(u16),
    #[error("backend error {code}: {message}")]
    Backend {
        code: u32,
        message: String,
        temporary: bool,
    },
    /// Network or RPC failure, kept as-is for inspection by the caller.
    #[error("transport error: {0}")]
    Transport(Arc<anyhow::Error>),
}

impl NotifyError {
    pub fn transport(err: impl Into<anyhow::Error>) -> Self {
        NotifyError::Transport(Arc::new(err.into()))
    }

    pub fn is_canceled(&self) -> bool {
        matches!(self, NotifyError::Canceled)
    }

    /// Borrow the underlying transport error as a concrete type, e.g. `tonic::Status`.
    pub fn transport_source<E>(&self) -> Option<&E>
    where
        E: std::fmt::Display + std::fmt::Debug + Send + Sync + 'static,
    {
        match self {
            NotifyError::Transport(err) => err.downcast_ref::<E>(),
            _ => None,
        }
    }
}

impl From<&TransformError> for NotifyError {
    fn from(value: &TransformError) -> Self {
        NotifyError::Backend {
            code: value.code,
            message: value.message.clone(),
            temporary: value.temporary,
        }
    }
}
