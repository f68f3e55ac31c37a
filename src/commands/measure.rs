use anyhow::Result;
use std::path::PathBuf;

use crate::commands::utils;
use crate::scenarios::{self, MeasureReport, MeasureScenario};
use crate::types::{DeviceProfile, Marker, OutputFormat, DEFAULT_READY_TIMEOUT};

#[allow(clippy::too_many_arguments)]
pub async fn handle_measure(
    url: String,
    element: String,
    ready: Vec<String>,
    expected_width: Option<f64>,
    expected_vw: Option<f64>,
    tolerance: f64,
    no_layout_shot: bool,
    viewport: Option<String>,
    device: Option<String>,
    browser: String,
    no_headless: bool,
    output_dir: PathBuf,
    navigation_timeout: u64,
    no_retry_nav: bool,
    format: OutputFormat,
) -> Result<()> {
    let profile = utils::resolve_profile(
        viewport.as_deref(),
        device.as_deref(),
        DeviceProfile::new(390, 844),
    )?;
    let ready = if ready.is_empty() {
        vec![scenarios::DEFAULT_BOARD_SELECTOR.to_string()]
    } else {
        ready
    };
    // An explicit pixel expectation wins over a viewport-relative one
    let expected = match (expected_width, expected_vw) {
        (Some(px), _) => Some(px),
        (None, Some(vw)) => Some(f64::from(profile.width) * vw / 100.0),
        (None, None) => None,
    };

    let scenario = MeasureScenario {
        ctx: scenarios::ScenarioContext {
            url,
            browser: browser.parse()?,
            headless: !no_headless,
            output_dir,
            navigation: utils::navigation_policy(navigation_timeout, no_retry_nav),
        },
        ready: utils::ready_conditions(&ready, DEFAULT_READY_TIMEOUT),
        profile,
        marker: Marker::parse(&element),
        expected_width: expected,
        tolerance,
        capture_layout: !no_layout_shot,
    };

    let report = scenarios::run_measure(&scenario).await?;
    print_report(&report, format)
}

fn print_report(report: &MeasureReport, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(report)?);
        }
        OutputFormat::Simple => {
            println!(
                "Element {} is {:.1}x{:.1} at ({:.1}, {:.1}) in a {} viewport",
                report.selector, report.width, report.height, report.x, report.y, report.viewport
            );
            match (report.expected_width, report.within_tolerance) {
                (Some(expected), Some(true)) => {
                    println!(
                        "Width matches expected {:.1}px (tolerance {}px)",
                        expected, report.tolerance_px
                    );
                }
                (Some(expected), Some(false)) => {
                    println!("Width does not match expected {:.1}px:", expected);
                    for warning in &report.warnings {
                        println!("  WARNING: {}", warning);
                    }
                }
                _ => {}
            }
            if let Some(path) = &report.layout_capture {
                println!("Layout capture: {}", path.display());
            }
        }
    }
    Ok(())
}
