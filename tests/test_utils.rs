// Shared helpers for tests that need a live WebDriver

use std::sync::Arc;
use tokio::sync::Mutex;

use phasecap::session::{BrowserKind, Session};
use phasecap::types::DeviceProfile;

// Global lock so tests never race each other starting WebDriver processes
lazy_static::lazy_static! {
    static ref WEBDRIVER_LOCK: Arc<Mutex<()>> = Arc::new(Mutex::new(()));
}

/// Open a headless session for tests, holding the global lock while the
/// driver starts. Tries Chrome first (more reliable against localhost),
/// then Firefox, with retries. Returns None when no engine is usable so
/// callers can skip instead of failing.
pub async fn open_test_session(profile: &DeviceProfile) -> Option<Session> {
    let _lock = WEBDRIVER_LOCK.lock().await;

    for kind in [BrowserKind::Chrome, BrowserKind::Firefox] {
        tokio::time::sleep(tokio::time::Duration::from_millis(200)).await;

        for attempt in 1..=3 {
            match Session::open(kind, profile, true).await {
                Ok(session) => {
                    eprintln!("Opened {} session on attempt {}", kind, attempt);
                    return Some(session);
                }
                Err(e) => {
                    eprintln!("Attempt {} failed for {}: {}", attempt, kind, e);
                    if attempt < 3 {
                        tokio::time::sleep(tokio::time::Duration::from_millis(500)).await;
                    }
                }
            }
        }
    }

    eprintln!("WARNING: Could not open a test session with any browser");
    None
}

/// Probe for a usable browser engine without keeping the session around.
/// E2E tests spawn the CLI binary and need to know which engine to pass it.
pub async fn probe_browser() -> Option<BrowserKind> {
    let profile = DeviceProfile::new(800, 600);
    let mut session = open_test_session(&profile).await?;
    let kind = session.kind();
    if let Err(e) = session.close().await {
        eprintln!("Probe session close failed: {}", e);
    }
    Some(kind)
}

/// Stop any WebDriver processes the test process started
pub fn cleanup_drivers() {
    phasecap::driver::GLOBAL_DRIVER_MANAGER.stop_all();
}
