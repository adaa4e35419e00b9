use crate::config::AppConfig;

/// delay_if_slow
///
/// Startup hook for the `slower` flag: holds the startup phase for the configured
/// delay before the listener is bound. Configuration is already resolved and is not
/// read again afterwards.
pub async fn delay_if_slow(config: &AppConfig) {
    if !config.slower {
        return;
    }
    tracing::info!(
        wait_secs = config.startup_delay.as_secs(),
        "Waiting for {:?} before starting",
        config.startup_delay
    );
    tokio::time::sleep(config.startup_delay).await;
}
