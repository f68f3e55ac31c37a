use anyhow::Result;
use std::path::PathBuf;
use std::time::Duration;

use crate::commands::utils;
use crate::run::{self, RunReport, VerificationRun};
use crate::scenarios;
use crate::session::BrowserKind;
use crate::types::{AnimationPhase, DeviceProfile, Interaction, Marker, OutputFormat, PhaseCapture};

#[allow(clippy::too_many_arguments)]
pub async fn handle_run(
    url: String,
    ready: Vec<String>,
    ready_timeout: u64,
    clicks: Vec<String>,
    force: bool,
    settle: u64,
    phase_durations: Option<String>,
    fraction: f64,
    element: Option<String>,
    full_document: bool,
    viewport: Option<String>,
    device: Option<String>,
    browser: String,
    no_headless: bool,
    output_dir: PathBuf,
    navigation_timeout: u64,
    no_retry_nav: bool,
    format: OutputFormat,
) -> Result<()> {
    let browser: BrowserKind = browser.parse()?;
    let profile = utils::resolve_profile(
        viewport.as_deref(),
        device.as_deref(),
        DeviceProfile::new(1280, 720),
    )?;
    let phases = match &phase_durations {
        Some(spec) => AnimationPhase::parse_list(spec)?,
        None => Vec::new(),
    };

    let mut interactions = Vec::new();
    if settle > 0 {
        interactions.push(Interaction::Pause(Duration::from_millis(settle)));
    }
    for click in &clicks {
        interactions.push(Interaction::Click {
            marker: Marker::parse(click),
            force,
        });
    }

    let target = utils::capture_target(element.as_deref(), full_document);
    let captures = phases
        .iter()
        .enumerate()
        .map(|(index, phase)| PhaseCapture {
            phase: phase.name.clone(),
            fraction,
            target: target.clone(),
            path: output_dir.join(format!("phase_{}_{}.png", index + 1, phase.name)),
        })
        .collect();

    let run = VerificationRun {
        name: "run".to_string(),
        url,
        profile,
        browser,
        headless: !no_headless,
        ready: utils::ready_conditions(&ready, Duration::from_millis(ready_timeout)),
        interactions,
        phases,
        captures,
        navigation: utils::navigation_policy(navigation_timeout, no_retry_nav),
        diagnostic_path: output_dir.join(scenarios::DIAGNOSTIC_FILE),
    };

    let report = run::execute(&run).await?;
    print_report(&report, format)
}

pub(crate) fn print_report(report: &RunReport, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(report)?);
        }
        OutputFormat::Simple => {
            println!(
                "Run '{}' against {} completed with {} capture(s)",
                report.run,
                report.url,
                report.captures.len()
            );
            for capture in &report.captures {
                println!(
                    "  {}: {}ms (target {}ms){} -> {}",
                    capture.phase,
                    capture.actual_offset_ms,
                    capture.target_offset_ms,
                    if capture.late { " LATE" } else { "" },
                    capture.path.display()
                );
            }
        }
    }
    Ok(())
}
