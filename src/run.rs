//! Run executor: drives one verification run end to end and guarantees
//! that an opened session is closed exactly once on every exit path.

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use crate::capture;
use crate::errors::HarnessError;
use crate::readiness;
use crate::session::{BrowserKind, Session};
use crate::timeline::CapturePlan;
use crate::types::{
    AnimationPhase, CaptureTarget, DeviceProfile, Interaction, NavigationPolicy, PhaseCapture,
    ReadinessCondition,
};

/// One fully-described verification run, assembled before any browser work.
///
/// The run is a pure description; [`execute`] owns every side effect. Scenario
/// constructors in [`crate::scenarios`] build these with the tuned defaults of
/// the checks they correspond to, and the CLI overrides individual fields.
#[derive(Debug, Clone)]
pub struct VerificationRun {
    /// Short name used in the report and in log lines
    pub name: String,
    pub url: String,
    pub profile: DeviceProfile,
    pub browser: BrowserKind,
    pub headless: bool,
    /// Satisfied in order before any interaction
    pub ready: Vec<ReadinessCondition>,
    /// Executed in order; the first click starts the capture timeline
    pub interactions: Vec<Interaction>,
    pub phases: Vec<AnimationPhase>,
    pub captures: Vec<PhaseCapture>,
    pub navigation: NavigationPolicy,
    /// Where the best-effort diagnostic shot lands if the run fails
    pub diagnostic_path: PathBuf,
}

/// One completed capture, with the measured offset next to the planned one
#[derive(Debug, Clone, Serialize)]
pub struct CaptureRecord {
    pub phase: String,
    pub target_offset_ms: u64,
    pub actual_offset_ms: u64,
    /// The target instant was already behind us when this capture came up
    pub late: bool,
    pub path: PathBuf,
    pub bytes: u64,
}

/// What a completed run looked like. Serialized to stdout as the command
/// result; a failed run produces an error envelope instead, never a report.
#[derive(Debug, Serialize)]
pub struct RunReport {
    pub run: String,
    pub url: String,
    pub browser: BrowserKind,
    pub viewport: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub captures: Vec<CaptureRecord>,
}

/// Execute a verification run: open → navigate → readiness gate →
/// interactions → phase captures → close.
///
/// The capture plan and URL are validated before the session opens, so a
/// misconfigured run never launches a browser. Once a session is open, any
/// error takes the failure path: one best-effort diagnostic screenshot,
/// teardown, and the original error back to the caller.
pub async fn execute(run: &VerificationRun) -> Result<RunReport> {
    let plan = CapturePlan::build(&run.phases, &run.captures)?;
    url::Url::parse(&run.url)
        .map_err(|e| HarnessError::Navigation(format!("invalid URL '{}': {}", run.url, e)))?;
    let started_at = Utc::now();
    info!(
        "Starting run '{}' against {} ({}, {})",
        run.name, run.url, run.browser, run.profile
    );

    let mut session = Session::open(run.browser, &run.profile, run.headless).await?;
    match drive(&session, run, &plan).await {
        Ok(captures) => {
            session.close().await?;
            let report = RunReport {
                run: run.name.clone(),
                url: run.url.clone(),
                browser: run.browser,
                viewport: run.profile.to_string(),
                started_at,
                finished_at: Utc::now(),
                captures,
            };
            info!(
                "Run '{}' completed with {} capture(s)",
                report.run,
                report.captures.len()
            );
            Ok(report)
        }
        Err(err) => Err(fail_with_diagnostic(&mut session, &run.diagnostic_path, err).await),
    }
}

/// The guarded middle of a run. Everything here executes against an open
/// session; errors are handed to the fault path by [`execute`].
async fn drive(
    session: &Session,
    run: &VerificationRun,
    plan: &CapturePlan,
) -> Result<Vec<CaptureRecord>> {
    session.navigate(&run.url, &run.navigation).await?;
    readiness::await_ready(session, &run.ready).await?;

    // The animation is observable only through wall-clock time, so the
    // origin is taken the instant the first click lands. Pauses before it
    // do not start the clock.
    let mut origin: Option<Instant> = None;
    for interaction in &run.interactions {
        match interaction {
            Interaction::Click { marker, force } => {
                session.click(marker, *force).await?;
                if origin.is_none() {
                    origin = Some(Instant::now());
                    debug!("Timeline origin set by click on {}", marker);
                }
            }
            Interaction::Pause(gap) => {
                debug!("Pausing {}ms between interactions", gap.as_millis());
                tokio::time::sleep(*gap).await;
            }
        }
    }

    if plan.captures.is_empty() {
        return Ok(Vec::new());
    }
    // A capture-bearing run normally has a triggering click; without one the
    // timeline starts now.
    let origin = origin.unwrap_or_else(Instant::now);

    let mut records = Vec::with_capacity(plan.captures.len());
    for planned in &plan.captures {
        let slot = CapturePlan::slot_for(planned, origin.elapsed());
        if slot.late {
            warn!(
                "Phase '{}' target {}ms already passed at {}ms elapsed, capturing immediately",
                planned.phase,
                planned.target_offset.as_millis(),
                origin.elapsed().as_millis()
            );
        } else if !slot.wait.is_zero() {
            debug!(
                "Waiting {}ms for the '{}' capture",
                slot.wait.as_millis(),
                planned.phase
            );
            tokio::time::sleep(slot.wait).await;
        }

        let actual_offset = origin.elapsed();
        let bytes = capture::capture(session, &planned.target, &planned.path).await?;
        info!(
            "Captured '{}' at {}ms (target {}ms) -> {}",
            planned.phase,
            actual_offset.as_millis(),
            planned.target_offset.as_millis(),
            planned.path.display()
        );
        records.push(CaptureRecord {
            phase: planned.phase.clone(),
            target_offset_ms: planned.target_offset.as_millis() as u64,
            actual_offset_ms: actual_offset.as_millis() as u64,
            late: slot.late,
            path: planned.path.clone(),
            bytes,
        });
    }
    Ok(records)
}

/// The failure path: one best-effort diagnostic screenshot, unconditional
/// teardown, and the original error back out. A diagnostic or teardown
/// failure is logged and never masks `err`.
pub(crate) async fn fail_with_diagnostic(
    session: &mut Session,
    diagnostic_path: &Path,
    err: anyhow::Error,
) -> anyhow::Error {
    error!("Run failed: {:#}", err);
    match capture::capture(session, &CaptureTarget::viewport(), diagnostic_path).await {
        Ok(bytes) => info!(
            "Saved diagnostic screenshot to {} ({} bytes)",
            diagnostic_path.display(),
            bytes
        ),
        Err(diag_err) => warn!("Could not capture diagnostic screenshot: {}", diag_err),
    }
    if let Err(close_err) = session.close().await {
        warn!("Session teardown after failure also failed: {}", close_err);
    }
    err
}

#[cfg(test)]
#[path = "run_test.rs"]
mod run_test;
