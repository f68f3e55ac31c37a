use anyhow::Result;
use std::time::Duration;

use crate::types::{CaptureTarget, DeviceProfile, Marker, NavigationPolicy, ReadinessCondition};

/// Resolve the effective profile from `--viewport` and `--device`.
/// An explicit viewport wins over a device name.
pub fn resolve_profile(
    viewport: Option<&str>,
    device: Option<&str>,
    fallback: DeviceProfile,
) -> Result<DeviceProfile> {
    match (viewport, device) {
        (Some(size), _) => DeviceProfile::parse(size),
        (None, Some(name)) => DeviceProfile::named(name),
        (None, None) => Ok(fallback),
    }
}

/// Parse `--ready` markers into gate conditions, keeping CLI order
pub fn ready_conditions(markers: &[String], timeout: Duration) -> Vec<ReadinessCondition> {
    markers
        .iter()
        .map(|m| ReadinessCondition::new(Marker::parse(m), timeout))
        .collect()
}

/// Parse a comma-separated viewport list, e.g. "390x844,1920x1080"
pub fn viewport_list(spec: &str) -> Result<Vec<DeviceProfile>> {
    spec.split(',')
        .map(|part| DeviceProfile::parse(part.trim()))
        .collect()
}

pub fn navigation_policy(timeout_ms: u64, no_retry: bool) -> NavigationPolicy {
    NavigationPolicy {
        timeout: Duration::from_millis(timeout_ms),
        retry_on_timeout: !no_retry,
    }
}

/// Capture target from `--element` and `--full-document`. An element scope
/// wins; full-document only applies to whole-page shots.
pub fn capture_target(element: Option<&str>, full_document: bool) -> CaptureTarget {
    match element {
        Some(selector) => CaptureTarget::element(selector),
        None if full_document => CaptureTarget::full_document(),
        None => CaptureTarget::viewport(),
    }
}
