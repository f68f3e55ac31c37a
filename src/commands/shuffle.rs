use anyhow::Result;
use std::path::PathBuf;

use crate::commands::utils;
use crate::run;
use crate::scenarios;
use crate::types::{AnimationPhase, DeviceProfile, Marker, OutputFormat};

#[allow(clippy::too_many_arguments)]
pub async fn handle_shuffle(
    url: String,
    deck: String,
    phase_durations: String,
    fraction: f64,
    force: bool,
    viewport: Option<String>,
    device: Option<String>,
    browser: String,
    no_headless: bool,
    output_dir: PathBuf,
    navigation_timeout: u64,
    no_retry_nav: bool,
    format: OutputFormat,
) -> Result<()> {
    let ctx = scenarios::ScenarioContext {
        url,
        browser: browser.parse()?,
        headless: !no_headless,
        output_dir,
        navigation: utils::navigation_policy(navigation_timeout, no_retry_nav),
    };
    let profile = utils::resolve_profile(
        viewport.as_deref(),
        device.as_deref(),
        DeviceProfile::new(1280, 720),
    )?;

    let run = scenarios::shuffle(
        &ctx,
        profile,
        Marker::parse(&deck),
        AnimationPhase::parse_list(&phase_durations)?,
        fraction,
        force,
    );
    let report = run::execute(&run).await?;
    super::run::print_report(&report, format)
}
