use anyhow::Result;
use std::time::Duration;
use tracing::debug;

use crate::errors::HarnessError;
use crate::session::Session;
use crate::types::ReadinessCondition;

/// Interval between marker probes. Each probe is an awaited WebDriver
/// round-trip, so the gate suspends cooperatively rather than spinning.
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Wait until the page satisfies every condition, strictly in order.
///
/// A condition holds once its marker is present in the DOM *and* displayed;
/// an element parked off-screen or `display: none` while the application
/// boots does not count. The first condition to exhaust its budget aborts
/// the gate with `ReadinessTimeout`.
pub async fn await_ready(session: &Session, conditions: &[ReadinessCondition]) -> Result<()> {
    for condition in conditions {
        wait_for(session, condition).await?;
    }
    Ok(())
}

async fn wait_for(session: &Session, condition: &ReadinessCondition) -> Result<()> {
    debug!(
        "Waiting for {} (budget {}ms)",
        condition.marker,
        condition.timeout.as_millis()
    );
    let deadline = tokio::time::Instant::now() + condition.timeout;

    loop {
        if let Some(element) = session.find_first(&condition.marker).await? {
            // A probe that fails mid-layout reads as not displayed yet
            if element.is_displayed().await.unwrap_or(false) {
                debug!("Marker {} is ready", condition.marker);
                return Ok(());
            }
        }

        if tokio::time::Instant::now() >= deadline {
            return Err(HarnessError::ReadinessTimeout {
                selector: condition.marker.to_string(),
                timeout: condition.timeout,
            }
            .into());
        }

        tokio::time::sleep(POLL_INTERVAL).await;
    }
}
