//! Fixed time limits on backend calls

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

/// Awaits `fut` for at most `limit`.
///
/// A failed call and an elapsed limit both come back as a message, which
/// the caller tags with its backend and the step that was running.
pub(crate) async fn within<F, T, E>(limit: Duration, fut: F) -> Result<T, String>
where
    F: Future<Output = Result<T, E>>,
    E: Display,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result.map_err(|e| e.to_string()),
        Err(_) => Err(format!("timed out after {:?}", limit)),
    }
}
