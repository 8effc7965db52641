use std::future::Future;

use tokio_util::sync::CancellationToken;

use crate::error::NotifyError;

/// Runs `fut` until it finishes or `ctx` is canceled, whichever comes first.
pub async fn cancellable<F, T>(ctx: &CancellationToken, fut: F) -> Result<T, NotifyError>
where
    F: Future<Output = Result<T, NotifyError>>,
{
    tokio::select! {
        biased;
        _ = ctx.cancelled() => Err(NotifyError::Canceled),
        result = fut => result,
    }
}
