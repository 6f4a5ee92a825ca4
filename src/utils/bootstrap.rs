//! Bootstrap utilities for the roi-engine binary.

use std::future::Future;
use std::time::Duration;

use backon::{ExponentialBuilder, Retryable};
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::LOG_ENV_VAR;

/// Initialize tracing with the ROI_ENGINE_LOG environment variable.
///
/// Defaults to "info" level if ROI_ENGINE_LOG is not set.
pub fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_env(LOG_ENV_VAR)
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Backoff for database connection retries at startup.
///
/// - Min delay: 100ms
/// - Max delay: 5s
/// - Max attempts: 30
/// - Jitter enabled
pub fn connection_backoff() -> ExponentialBuilder {
    ExponentialBuilder::default()
        .with_min_delay(Duration::from_millis(100))
        .with_max_delay(Duration::from_secs(5))
        .with_max_times(30)
        .with_jitter()
}

/// Connect to a backing service with exponential backoff retry.
///
/// # Arguments
/// * `service_name` - Human-readable name for logging (e.g., "postgres")
/// * `connect` - Async function that attempts to establish a connection
///
/// # Returns
/// The connection on success, or the last error once the backoff is spent.
pub async fn connect_with_retry<T, E, F, Fut>(service_name: &str, connect: F) -> Result<T, E>
where
    E: std::fmt::Display,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    connect_with_backoff(service_name, connection_backoff(), connect).await
}

async fn connect_with_backoff<T, E, F, Fut>(
    service_name: &str,
    backoff: ExponentialBuilder,
    connect: F,
) -> Result<T, E>
where
    E: std::fmt::Display,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let result = connect
        .retry(backoff)
        .notify(|err: &E, dur: Duration| {
            warn!(service = %service_name, error = %err, delay = ?dur, "Connection failed, retrying");
        })
        .await;

    match &result {
        Ok(_) => info!(service = %service_name, "Connected"),
        Err(e) => error!(service = %service_name, error = %e, "Giving up on connection"),
    }
    result
}
