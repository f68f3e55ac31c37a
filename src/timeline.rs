use anyhow::Result;
use serde::Serialize;
use std::path::PathBuf;
use std::time::Duration;

use crate::types::{AnimationPhase, CaptureTarget, PhaseCapture};

fn as_millis<S>(duration: &Duration, serializer: S) -> std::result::Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.serialize_u64(duration.as_millis() as u64)
}

/// One capture resolved against the phase sequence. Offsets are relative to
/// the interaction instant that starts the animation.
#[derive(Debug, Clone, Serialize)]
pub struct PlannedCapture {
    pub phase: String,
    pub phase_index: usize,
    /// Sum of the nominal durations of all earlier phases
    #[serde(rename = "phase_start_ms", serialize_with = "as_millis")]
    pub phase_start: Duration,
    /// Phase start plus the capture fraction of the phase's nominal duration
    #[serde(rename = "target_offset_ms", serialize_with = "as_millis")]
    pub target_offset: Duration,
    pub target: CaptureTarget,
    pub path: PathBuf,
}

/// Scheduling decision for one capture, given the measured elapsed time
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureSlot {
    /// Remaining time until the target offset, zero when already past it
    pub wait: Duration,
    /// The target offset was already behind us when this slot was computed
    pub late: bool,
}

/// The resolved capture schedule for one run.
///
/// Building the plan is pure arithmetic over the declared phases; executing
/// it is the caller's job, threading measured elapsed time through
/// [`CapturePlan::slot_for`] before every capture. Keeping the two apart is
/// what makes the timeline math testable without a browser.
#[derive(Debug, Clone, Serialize)]
pub struct CapturePlan {
    pub captures: Vec<PlannedCapture>,
}

impl CapturePlan {
    /// Resolve capture requests against the phase sequence.
    ///
    /// Every request must name a declared phase, requests must appear in
    /// ascending phase order (at most one per phase), and fractions must lie
    /// strictly inside (0, 1). Violations are configuration errors and fail
    /// the build; there is nothing to handle at runtime.
    pub fn build(phases: &[AnimationPhase], captures: &[PhaseCapture]) -> Result<Self> {
        let mut planned = Vec::with_capacity(captures.len());
        let mut last_index: Option<usize> = None;

        for capture in captures {
            let index = phases
                .iter()
                .position(|p| p.name == capture.phase)
                .ok_or_else(|| {
                    anyhow::anyhow!(
                        "capture references unknown phase '{}' (declared phases: {})",
                        capture.phase,
                        phases
                            .iter()
                            .map(|p| p.name.as_str())
                            .collect::<Vec<_>>()
                            .join(", ")
                    )
                })?;

            if let Some(last) = last_index {
                if index <= last {
                    anyhow::bail!(
                        "captures must be declared in ascending phase order, '{}' is out of order",
                        capture.phase
                    );
                }
            }
            last_index = Some(index);

            if !(capture.fraction > 0.0 && capture.fraction < 1.0) {
                anyhow::bail!(
                    "capture fraction for phase '{}' must be strictly between 0 and 1, got {}",
                    capture.phase,
                    capture.fraction
                );
            }

            // cumulative offset of the phase start, derived rather than
            // stored so it cannot drift out of sync with the phase list
            let phase_start: Duration = phases[..index].iter().map(|p| p.nominal).sum();
            let target_offset = phase_start + phases[index].nominal.mul_f64(capture.fraction);

            planned.push(PlannedCapture {
                phase: capture.phase.clone(),
                phase_index: index,
                phase_start,
                target_offset,
                target: capture.target.clone(),
                path: capture.path.clone(),
            });
        }

        Ok(CapturePlan { captures: planned })
    }

    /// Where one planned capture stands right now.
    ///
    /// `elapsed` is the measured time since the interaction instant, so the
    /// wait shrinks by however long earlier waits *and* earlier captures
    /// actually took; fixed sleeps would compound that drift instead. A
    /// target that is already behind us yields a zero wait and `late = true`:
    /// capturing immediately in the wrong part of a phase still beats
    /// silently shifting every later capture.
    pub fn slot_for(planned: &PlannedCapture, elapsed: Duration) -> CaptureSlot {
        CaptureSlot {
            wait: wait_before(planned.target_offset, elapsed),
            late: elapsed > planned.target_offset,
        }
    }
}

/// Remaining wait until a target offset, never negative
pub fn wait_before(target: Duration, elapsed: Duration) -> Duration {
    target.saturating_sub(elapsed)
}

#[cfg(test)]
#[path = "timeline_test.rs"]
mod timeline_test;
