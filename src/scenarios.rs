//! Built-in verification scenarios with the defaults they were tuned for.
//!
//! Each scenario descends from a hand-run check against the card game this
//! harness grew up around. The constants are defaults, not policy; every one
//! is overridable from the CLI. `shuffle` builds a [`VerificationRun`] for the
//! run executor; the others are straight-line drivers over the same session
//! primitives, sharing the executor's fault path.

use anyhow::Result;
use serde::Serialize;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, warn};

use crate::capture;
use crate::readiness;
use crate::run::{self, VerificationRun};
use crate::session::{BrowserKind, Session};
use crate::types::{
    AnimationPhase, CaptureTarget, DeviceProfile, Interaction, Marker, NavigationPolicy,
    PhaseCapture, ReadinessCondition, DEFAULT_READY_TIMEOUT,
};

/// Capture point inside each phase for the shuffle scenario
pub const DEFAULT_SHUFFLE_FRACTION: f64 = 0.75;
/// CLI spelling of the shuffle phase durations
pub const DEFAULT_SHUFFLE_PHASE_SPEC: &str = "split=1600,merge=1300,return=1000";
/// Deck element, the shuffle trigger and default readiness marker
pub const DEFAULT_DECK_SELECTOR: &str = "#slot-deck";
/// Board background, present once the game has rendered
pub const DEFAULT_BOARD_SELECTOR: &str = ".game-board-bg";
/// Start control matched by visible text
pub const DEFAULT_START_MARKER: &str = "text=Click to Shuffle";
/// Name of the best-effort screenshot written when a scenario fails
pub const DIAGNOSTIC_FILE: &str = "error_state.png";

/// Knobs every scenario shares, filled in by the CLI
#[derive(Debug, Clone)]
pub struct ScenarioContext {
    pub url: String,
    pub browser: BrowserKind,
    pub headless: bool,
    pub output_dir: PathBuf,
    pub navigation: NavigationPolicy,
}

impl ScenarioContext {
    fn diagnostic_path(&self) -> PathBuf {
        self.output_dir.join(DIAGNOSTIC_FILE)
    }
}

/// The split/merge/return nominal durations observed in the shuffle animation
pub fn shuffle_phases() -> Vec<AnimationPhase> {
    vec![
        AnimationPhase::new("split", Duration::from_millis(1600)),
        AnimationPhase::new("merge", Duration::from_millis(1300)),
        AnimationPhase::new("return", Duration::from_millis(1000)),
    ]
}

/// Shuffle: wait for the deck, click it, capture one frame inside each
/// animation phase as `shuffle_phase_<n>_<name>.png`.
pub fn shuffle(
    ctx: &ScenarioContext,
    profile: DeviceProfile,
    deck: Marker,
    phases: Vec<AnimationPhase>,
    fraction: f64,
    force: bool,
) -> VerificationRun {
    let captures = phases
        .iter()
        .enumerate()
        .map(|(index, phase)| PhaseCapture {
            phase: phase.name.clone(),
            fraction,
            target: CaptureTarget::viewport(),
            path: ctx
                .output_dir
                .join(format!("shuffle_phase_{}_{}.png", index + 1, phase.name)),
        })
        .collect();

    VerificationRun {
        name: "shuffle".to_string(),
        url: ctx.url.clone(),
        profile,
        browser: ctx.browser,
        headless: ctx.headless,
        ready: vec![ReadinessCondition::new(deck.clone(), DEFAULT_READY_TIMEOUT)],
        interactions: vec![Interaction::Click {
            marker: deck,
            force,
        }],
        phases,
        captures,
        navigation: ctx.navigation.clone(),
        diagnostic_path: ctx.diagnostic_path(),
    }
}

/// Snapshot: one capture per requested viewport, resizing the window between
/// them. No interaction, no phases.
#[derive(Debug, Clone)]
pub struct SnapshotScenario {
    pub ctx: ScenarioContext,
    pub ready: Vec<ReadinessCondition>,
    /// First entry sizes the session; later ones resize mid-run
    pub viewports: Vec<DeviceProfile>,
    pub target: CaptureTarget,
    /// Output files are named `<prefix>_<width>x<height>.png`
    pub prefix: String,
    /// Rendering settle time after a mid-run resize
    pub settle: Duration,
}

#[derive(Debug, Serialize)]
pub struct SnapshotRecord {
    pub viewport: String,
    pub path: PathBuf,
    pub bytes: u64,
}

#[derive(Debug, Serialize)]
pub struct SnapshotReport {
    pub url: String,
    pub browser: BrowserKind,
    pub captures: Vec<SnapshotRecord>,
}

pub async fn run_snapshot(scenario: &SnapshotScenario) -> Result<SnapshotReport> {
    anyhow::ensure!(
        !scenario.viewports.is_empty(),
        "snapshot needs at least one viewport"
    );
    let ctx = &scenario.ctx;
    let mut session = Session::open(ctx.browser, &scenario.viewports[0], ctx.headless).await?;
    match drive_snapshot(&session, scenario).await {
        Ok(captures) => {
            session.close().await?;
            Ok(SnapshotReport {
                url: ctx.url.clone(),
                browser: ctx.browser,
                captures,
            })
        }
        Err(err) => Err(run::fail_with_diagnostic(&mut session, &ctx.diagnostic_path(), err).await),
    }
}

async fn drive_snapshot(
    session: &Session,
    scenario: &SnapshotScenario,
) -> Result<Vec<SnapshotRecord>> {
    let ctx = &scenario.ctx;
    session.navigate(&ctx.url, &ctx.navigation).await?;
    readiness::await_ready(session, &scenario.ready).await?;

    let mut records = Vec::with_capacity(scenario.viewports.len());
    for (index, profile) in scenario.viewports.iter().enumerate() {
        if index > 0 {
            session.set_viewport(profile).await?;
            if !scenario.settle.is_zero() {
                tokio::time::sleep(scenario.settle).await;
            }
        }
        let path = ctx.output_dir.join(format!(
            "{}_{}x{}.png",
            scenario.prefix, profile.width, profile.height
        ));
        let bytes = capture::capture(session, &scenario.target, &path).await?;
        info!("Snapshot at {} -> {}", profile, path.display());
        records.push(SnapshotRecord {
            viewport: profile.to_string(),
            path,
            bytes,
        });
    }
    Ok(records)
}

/// Measure: resolve one element and report its bounding box, optionally
/// checking the width against an expected value. A mismatch is a warning in
/// the report, not a run failure.
#[derive(Debug, Clone)]
pub struct MeasureScenario {
    pub ctx: ScenarioContext,
    pub ready: Vec<ReadinessCondition>,
    pub profile: DeviceProfile,
    pub marker: Marker,
    pub expected_width: Option<f64>,
    pub tolerance: f64,
    /// Take a viewport shot of the settled layout before measuring
    pub capture_layout: bool,
}

#[derive(Debug, Serialize)]
pub struct MeasureReport {
    pub url: String,
    pub selector: String,
    pub viewport: String,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected_width: Option<f64>,
    pub tolerance_px: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub within_tolerance: Option<bool>,
    pub warnings: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub layout_capture: Option<PathBuf>,
}

pub async fn run_measure(scenario: &MeasureScenario) -> Result<MeasureReport> {
    let ctx = &scenario.ctx;
    let mut session = Session::open(ctx.browser, &scenario.profile, ctx.headless).await?;
    match drive_measure(&session, scenario).await {
        Ok(report) => {
            session.close().await?;
            Ok(report)
        }
        Err(err) => Err(run::fail_with_diagnostic(&mut session, &ctx.diagnostic_path(), err).await),
    }
}

async fn drive_measure(session: &Session, scenario: &MeasureScenario) -> Result<MeasureReport> {
    let ctx = &scenario.ctx;
    session.navigate(&ctx.url, &ctx.navigation).await?;
    readiness::await_ready(session, &scenario.ready).await?;

    let layout_capture = if scenario.capture_layout {
        let path = ctx.output_dir.join("measure_layout.png");
        capture::capture(session, &CaptureTarget::viewport(), &path).await?;
        Some(path)
    } else {
        None
    };

    let (x, y, width, height) = session.element_rect(&scenario.marker).await?;
    info!(
        "Element {} is {:.1}x{:.1} at ({:.1}, {:.1})",
        scenario.marker, width, height, x, y
    );

    let mut warnings = Vec::new();
    let within_tolerance = scenario.expected_width.map(|expected| {
        match check_width(width, expected, scenario.tolerance) {
            None => {
                info!(
                    "Width {:.1}px matches expected {:.1}px (tolerance {}px)",
                    width, expected, scenario.tolerance
                );
                true
            }
            Some(warning) => {
                warn!("{}", warning);
                warnings.push(warning);
                false
            }
        }
    });

    Ok(MeasureReport {
        url: ctx.url.clone(),
        selector: scenario.marker.to_string(),
        viewport: scenario.profile.to_string(),
        x,
        y,
        width,
        height,
        expected_width: scenario.expected_width,
        tolerance_px: scenario.tolerance,
        within_tolerance,
        warnings,
        layout_capture,
    })
}

/// A measured width passes when it is strictly within the tolerance of the
/// expected value; otherwise the returned warning goes into the report.
pub(crate) fn check_width(width: f64, expected: f64, tolerance: f64) -> Option<String> {
    let delta = (width - expected).abs();
    if delta < tolerance {
        None
    } else {
        Some(format!(
            "width {:.1}px differs from expected {:.1}px by {:.1}px (tolerance {}px)",
            width, expected, delta, tolerance
        ))
    }
}

/// Spacing: start the game through its text control, let the deal settle,
/// trigger the shuffle, then capture the settled layout. Both clicks are
/// forced; the start control sits under a decorative overlay.
#[derive(Debug, Clone)]
pub struct SpacingScenario {
    pub ctx: ScenarioContext,
    pub profile: DeviceProfile,
    pub start: Marker,
    pub deck: Marker,
    /// Gap between the start click and the deck becoming actionable
    pub start_pause: Duration,
    /// Settle time after the deck click before the capture
    pub settle: Duration,
}

#[derive(Debug, Serialize)]
pub struct SpacingReport {
    pub url: String,
    pub viewport: String,
    pub path: PathBuf,
    pub bytes: u64,
}

pub async fn run_spacing(scenario: &SpacingScenario) -> Result<SpacingReport> {
    let ctx = &scenario.ctx;
    let mut session = Session::open(ctx.browser, &scenario.profile, ctx.headless).await?;
    match drive_spacing(&session, scenario).await {
        Ok(report) => {
            session.close().await?;
            Ok(report)
        }
        Err(err) => Err(run::fail_with_diagnostic(&mut session, &ctx.diagnostic_path(), err).await),
    }
}

async fn drive_spacing(session: &Session, scenario: &SpacingScenario) -> Result<SpacingReport> {
    let ctx = &scenario.ctx;
    session.navigate(&ctx.url, &ctx.navigation).await?;

    readiness::await_ready(
        session,
        &[ReadinessCondition::new(
            scenario.start.clone(),
            DEFAULT_READY_TIMEOUT,
        )],
    )
    .await?;
    session.click(&scenario.start, true).await?;
    tokio::time::sleep(scenario.start_pause).await;

    // The deck only renders once the start click has been processed
    readiness::await_ready(
        session,
        &[ReadinessCondition::new(
            scenario.deck.clone(),
            DEFAULT_READY_TIMEOUT,
        )],
    )
    .await?;
    session.click(&scenario.deck, true).await?;
    tokio::time::sleep(scenario.settle).await;

    let path = ctx.output_dir.join("layout_spacing_final.png");
    let bytes = capture::capture(session, &CaptureTarget::viewport(), &path).await?;
    Ok(SpacingReport {
        url: ctx.url.clone(),
        viewport: scenario.profile.to_string(),
        path,
        bytes,
    })
}

#[cfg(test)]
#[path = "scenarios_test.rs"]
mod scenarios_test;
