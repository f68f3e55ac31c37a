use anyhow::Result;
use std::path::PathBuf;
use std::time::Duration;

use crate::commands::utils;
use crate::scenarios::{self, SnapshotReport, SnapshotScenario};
use crate::types::{OutputFormat, DEFAULT_READY_TIMEOUT};

#[allow(clippy::too_many_arguments)]
pub async fn handle_snapshot(
    url: String,
    ready: Vec<String>,
    viewports: String,
    element: Option<String>,
    full_document: bool,
    prefix: String,
    settle: u64,
    browser: String,
    no_headless: bool,
    output_dir: PathBuf,
    navigation_timeout: u64,
    no_retry_nav: bool,
    format: OutputFormat,
) -> Result<()> {
    let ready = if ready.is_empty() {
        vec![scenarios::DEFAULT_BOARD_SELECTOR.to_string()]
    } else {
        ready
    };

    let scenario = SnapshotScenario {
        ctx: scenarios::ScenarioContext {
            url,
            browser: browser.parse()?,
            headless: !no_headless,
            output_dir,
            navigation: utils::navigation_policy(navigation_timeout, no_retry_nav),
        },
        ready: utils::ready_conditions(&ready, DEFAULT_READY_TIMEOUT),
        viewports: utils::viewport_list(&viewports)?,
        target: utils::capture_target(element.as_deref(), full_document),
        prefix,
        settle: Duration::from_millis(settle),
    };

    let report = scenarios::run_snapshot(&scenario).await?;
    print_report(&report, format)
}

fn print_report(report: &SnapshotReport, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(report)?);
        }
        OutputFormat::Simple => {
            println!("Snapshots of {}:", report.url);
            for capture in &report.captures {
                println!(
                    "  {} -> {} ({} bytes)",
                    capture.viewport,
                    capture.path.display(),
                    capture.bytes
                );
            }
        }
    }
    Ok(())
}
