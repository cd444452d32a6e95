//! Timeout helper for provider calls
//!
//! Every completion attempt runs under its own deadline so one stalled
//! request can't hold a reduce round open.

use std::future::Future;
use std::time::Duration;

use crate::types::{Result, ReviewError};

/// Execute an async operation with a timeout
///
/// Returns [`ReviewError::Timeout`] if the operation doesn't complete within
/// the specified duration.
///
/// ```ignore
/// let text = with_timeout(
///     Duration::from_secs(30),
///     client.analyze(&request),
///     "completion",
/// )
/// .await?;
/// ```
pub async fn with_timeout<T, F>(timeout: Duration, future: F, operation_name: &str) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout(timeout, future).await {
        Ok(result) => result,
        Err(_) => Err(ReviewError::timeout(operation_name, timeout)),
    }
}
