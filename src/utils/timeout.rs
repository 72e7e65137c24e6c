//! Timeout defaults and an async wrapper that maps elapsed deadlines to
//! [`ProtocolError::Timeout`].

use std::future::Future;
use std::time::Duration;
use tracing::warn;

use crate::error::{ProtocolError, Result};

/// Default timeout for connecting and completing the handshake
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default timeout for waiting on a reply transaction
pub const RESPONSE_TIMEOUT: Duration = Duration::from_secs(30);

/// Interval between keep-alive transactions; servers idle out quiet clients
pub const KEEPALIVE_INTERVAL: Duration = Duration::from_secs(180);

/// Run `fut` with a deadline
pub async fn with_timeout<F, T>(duration: Duration, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout(duration, fut).await {
        Ok(result) => result,
        Err(_) => {
            warn!(timeout_ms = duration.as_millis() as u64, "Operation timed out");
            Err(ProtocolError::Timeout)
        }
    }
}
