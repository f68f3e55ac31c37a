use std::time::Duration;

/// Harness error taxonomy. Each variant carries a process exit code so
/// scripted callers can branch on the failure kind without parsing messages.
#[derive(Debug, thiserror::Error)]
pub enum HarnessError {
    /// Capture or measure selector resolved to zero elements (exit code 2)
    #[error("no element matches selector: {0}")]
    ElementNotFound(String),
    /// Click target is occluded by another element (exit code 3)
    #[error("element '{0}' is not interactable: another element intercepts the click")]
    NotInteractable(String),
    /// WebDriver process or session could not be started (exit code 4)
    #[error("cannot start browser session: {0}")]
    Launch(String),
    /// A readiness marker never appeared (exit code 5)
    #[error("readiness condition '{selector}' not satisfied within {}ms", timeout.as_millis())]
    ReadinessTimeout { selector: String, timeout: Duration },
    /// Entry URL unreachable or document load timed out (exit code 6)
    #[error("navigation failed: {0}")]
    Navigation(String),
    /// Operation attempted after teardown (exit code 7)
    #[error("session is closed")]
    SessionClosed,
    /// Generic error (exit code 1)
    #[error(transparent)]
    Other(anyhow::Error),
}

impl HarnessError {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            HarnessError::ElementNotFound(_) => 2,
            HarnessError::NotInteractable(_) => 3,
            HarnessError::Launch(_) => 4,
            HarnessError::ReadinessTimeout { .. } => 5,
            HarnessError::Navigation(_) => 6,
            HarnessError::SessionClosed => 7,
            HarnessError::Other(_) => 1,
        }
    }
}

impl From<anyhow::Error> for HarnessError {
    fn from(err: anyhow::Error) -> Self {
        // Typed errors travel through anyhow chains intact; recover them first.
        let err = match err.downcast::<HarnessError>() {
            Ok(typed) => return typed,
            Err(err) => err,
        };

        // Fall back to classifying by message for errors raised as plain
        // anyhow strings (for example by fantoccini or reqwest plumbing).
        let msg = err.to_string();

        if msg.contains("no element matches") || msg.contains("element not found") {
            HarnessError::ElementNotFound(msg)
        } else if msg.contains("click intercepted") || msg.contains("not interactable") {
            HarnessError::NotInteractable(msg)
        } else if msg.contains("WebDriver")
            || msg.contains("geckodriver")
            || msg.contains("chromedriver")
        {
            HarnessError::Launch(msg)
        } else if msg.contains("navigation") || msg.contains("net::") {
            HarnessError::Navigation(msg)
        } else {
            HarnessError::Other(err)
        }
    }
}

#[cfg(test)]
#[path = "errors_test.rs"]
mod errors_test;
