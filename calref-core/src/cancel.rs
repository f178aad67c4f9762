//! Racing work against a caller-supplied cancellation token.

use std::future::Future;

use tokio_util::sync::CancellationToken;

use crate::error::{CalRefError, CalRefResult};

/// Run `fut` unless `cancel` fires first.
pub async fn cancellable<T, F>(cancel: &CancellationToken, fut: F) -> CalRefResult<T>
where
    F: Future<Output = CalRefResult<T>>,
{
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(CalRefError::Cancelled),
        result = fut => result,
    }
}
