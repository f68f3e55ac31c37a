use anyhow::Result;
use std::path::PathBuf;
use std::time::Duration;

use crate::commands::utils;
use crate::scenarios::{self, SpacingReport, SpacingScenario};
use crate::types::{DeviceProfile, Marker, OutputFormat};

#[allow(clippy::too_many_arguments)]
pub async fn handle_spacing(
    url: String,
    start: String,
    deck: String,
    start_pause: u64,
    settle: u64,
    viewport: Option<String>,
    device: Option<String>,
    browser: String,
    no_headless: bool,
    output_dir: PathBuf,
    navigation_timeout: u64,
    no_retry_nav: bool,
    format: OutputFormat,
) -> Result<()> {
    let scenario = SpacingScenario {
        ctx: scenarios::ScenarioContext {
            url,
            browser: browser.parse()?,
            headless: !no_headless,
            output_dir,
            navigation: utils::navigation_policy(navigation_timeout, no_retry_nav),
        },
        profile: utils::resolve_profile(
            viewport.as_deref(),
            device.as_deref(),
            DeviceProfile::new(720, 1280),
        )?,
        start: Marker::parse(&start),
        deck: Marker::parse(&deck),
        start_pause: Duration::from_millis(start_pause),
        settle: Duration::from_millis(settle),
    };

    let report = scenarios::run_spacing(&scenario).await?;
    print_report(&report, format)
}

fn print_report(report: &SpacingReport, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(report)?);
        }
        OutputFormat::Simple => {
            println!(
                "Spacing capture of {} at {} -> {} ({} bytes)",
                report.url,
                report.viewport,
                report.path.display(),
                report.bytes
            );
        }
    }
    Ok(())
}
