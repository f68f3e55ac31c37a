#![allow(clippy::uninlined_format_args)]

use anyhow::Result;
use clap::{Parser, Subcommand};
use serde_json::json;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod capture;
mod commands;
mod driver;
mod errors;
mod readiness;
mod run;
mod scenarios;
mod session;
mod timeline;
mod types;

const EXIT_SUCCESS: i32 = 0;

use types::OutputFormat;

#[derive(Parser)]
#[command(name = "phasecap")]
#[command(about = "Timed, phase-aware screenshot harness for animated web UIs", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Execute a custom verification run: navigate, gate, click, capture
    Run {
        /// Entry URL of the application under test
        url: String,

        /// Readiness marker (CSS selector or "text=..."), repeatable, satisfied in order
        #[arg(long)]
        ready: Vec<String>,

        /// Readiness budget in ms per marker
        #[arg(long = "ready-timeout", default_value = "10000")]
        ready_timeout: u64,

        /// Marker to click after readiness, repeatable, clicked in order
        #[arg(long = "click")]
        clicks: Vec<String>,

        /// Dispatch clicks in page script, bypassing the occlusion check
        #[arg(long)]
        force: bool,

        /// Settle time in ms between readiness and the first click
        #[arg(long, default_value = "0")]
        settle: u64,

        /// Animation phases as "name=ms,name=ms,..." in play order
        #[arg(long = "phase-durations")]
        phase_durations: Option<String>,

        /// Capture point inside each phase, as a fraction of its duration
        #[arg(long, default_value_t = scenarios::DEFAULT_SHUFFLE_FRACTION)]
        fraction: f64,

        /// Scope captures to this CSS selector instead of the viewport
        #[arg(long)]
        element: Option<String>,

        /// Grow the window to the full document height for each capture
        #[arg(long = "full-document")]
        full_document: bool,

        /// Viewport size (WIDTHxHEIGHT, e.g. 390x844)
        #[arg(long)]
        viewport: Option<String>,

        /// Named device profile (e.g. iphone-13)
        #[arg(long, conflicts_with = "viewport")]
        device: Option<String>,

        /// Browser to use
        #[arg(short, long, default_value = "firefox")]
        browser: String,

        /// Run the browser in visible mode (disables headless)
        #[arg(long = "no-headless")]
        no_headless: bool,

        /// Directory for captures and the diagnostic screenshot
        #[arg(long = "output-dir", default_value = "verification")]
        output_dir: PathBuf,

        /// Navigation budget in ms
        #[arg(long = "navigation-timeout", default_value = "10000")]
        navigation_timeout: u64,

        /// Fail immediately on a navigation timeout instead of retrying once
        #[arg(long = "no-retry-nav")]
        no_retry_nav: bool,

        /// Output format
        #[arg(short, long, default_value = "json")]
        format: OutputFormat,
    },

    /// Capture one frame inside each phase of the deck shuffle animation
    Shuffle {
        /// Entry URL of the application under test
        #[arg(long, default_value = "http://localhost:3000/")]
        url: String,

        /// Deck marker: readiness gate and click target
        #[arg(long, default_value = scenarios::DEFAULT_DECK_SELECTOR)]
        deck: String,

        /// Animation phases as "name=ms,name=ms,..." in play order
        #[arg(long = "phase-durations", default_value = scenarios::DEFAULT_SHUFFLE_PHASE_SPEC)]
        phase_durations: String,

        /// Capture point inside each phase, as a fraction of its duration
        #[arg(long, default_value_t = scenarios::DEFAULT_SHUFFLE_FRACTION)]
        fraction: f64,

        /// Force the deck click past any occluding overlay
        #[arg(long)]
        force: bool,

        /// Viewport size (WIDTHxHEIGHT, e.g. 390x844)
        #[arg(long)]
        viewport: Option<String>,

        /// Named device profile (e.g. iphone-13)
        #[arg(long, conflicts_with = "viewport")]
        device: Option<String>,

        /// Browser to use
        #[arg(short, long, default_value = "firefox")]
        browser: String,

        /// Run the browser in visible mode (disables headless)
        #[arg(long = "no-headless")]
        no_headless: bool,

        /// Directory for captures and the diagnostic screenshot
        #[arg(long = "output-dir", default_value = "verification")]
        output_dir: PathBuf,

        /// Navigation budget in ms
        #[arg(long = "navigation-timeout", default_value = "10000")]
        navigation_timeout: u64,

        /// Fail immediately on a navigation timeout instead of retrying once
        #[arg(long = "no-retry-nav")]
        no_retry_nav: bool,

        /// Output format
        #[arg(short, long, default_value = "json")]
        format: OutputFormat,
    },

    /// Capture still layouts across one or more viewports
    Snapshot {
        /// Entry URL of the application under test
        #[arg(long, default_value = "http://localhost:3000/")]
        url: String,

        /// Readiness marker, repeatable (default: the board background)
        #[arg(long)]
        ready: Vec<String>,

        /// Comma-separated viewport list; later entries resize the open window
        #[arg(long, default_value = "390x844,1920x1080")]
        viewports: String,

        /// Scope captures to this CSS selector instead of the viewport
        #[arg(long)]
        element: Option<String>,

        /// Grow the window to the full document height for each capture
        #[arg(long = "full-document")]
        full_document: bool,

        /// Output file name prefix
        #[arg(long, default_value = "snapshot")]
        prefix: String,

        /// Settle time in ms after a viewport resize
        #[arg(long, default_value = "500")]
        settle: u64,

        /// Browser to use
        #[arg(short, long, default_value = "firefox")]
        browser: String,

        /// Run the browser in visible mode (disables headless)
        #[arg(long = "no-headless")]
        no_headless: bool,

        /// Directory for captures and the diagnostic screenshot
        #[arg(long = "output-dir", default_value = "verification")]
        output_dir: PathBuf,

        /// Navigation budget in ms
        #[arg(long = "navigation-timeout", default_value = "10000")]
        navigation_timeout: u64,

        /// Fail immediately on a navigation timeout instead of retrying once
        #[arg(long = "no-retry-nav")]
        no_retry_nav: bool,

        /// Output format
        #[arg(short, long, default_value = "json")]
        format: OutputFormat,
    },

    /// Measure an element's bounding box, optionally against an expected width
    Measure {
        /// Entry URL of the application under test
        #[arg(long, default_value = "http://localhost:3000/")]
        url: String,

        /// Element to measure
        #[arg(long, default_value = scenarios::DEFAULT_DECK_SELECTOR)]
        element: String,

        /// Readiness marker, repeatable (default: the board background)
        #[arg(long)]
        ready: Vec<String>,

        /// Expected element width in pixels
        #[arg(long = "expected-width")]
        expected_width: Option<f64>,

        /// Expected element width as a percentage of the viewport width
        #[arg(long = "expected-vw", conflicts_with = "expected_width")]
        expected_vw: Option<f64>,

        /// Width tolerance in pixels
        #[arg(long, default_value = "2.0")]
        tolerance: f64,

        /// Skip the settled-layout screenshot taken before measuring
        #[arg(long = "no-layout-shot")]
        no_layout_shot: bool,

        /// Viewport size (WIDTHxHEIGHT, e.g. 390x844)
        #[arg(long)]
        viewport: Option<String>,

        /// Named device profile (e.g. iphone-13)
        #[arg(long, conflicts_with = "viewport")]
        device: Option<String>,

        /// Browser to use
        #[arg(short, long, default_value = "firefox")]
        browser: String,

        /// Run the browser in visible mode (disables headless)
        #[arg(long = "no-headless")]
        no_headless: bool,

        /// Directory for the layout capture and the diagnostic screenshot
        #[arg(long = "output-dir", default_value = "verification")]
        output_dir: PathBuf,

        /// Navigation budget in ms
        #[arg(long = "navigation-timeout", default_value = "10000")]
        navigation_timeout: u64,

        /// Fail immediately on a navigation timeout instead of retrying once
        #[arg(long = "no-retry-nav")]
        no_retry_nav: bool,

        /// Output format
        #[arg(short, long, default_value = "json")]
        format: OutputFormat,
    },

    /// Start the game, trigger a shuffle, and capture the settled layout
    Spacing {
        /// Entry URL of the application under test
        #[arg(long, default_value = "http://localhost:3000/")]
        url: String,

        /// Start control marker, force-clicked first
        #[arg(long, default_value = scenarios::DEFAULT_START_MARKER)]
        start: String,

        /// Deck marker, force-clicked once it appears
        #[arg(long, default_value = scenarios::DEFAULT_DECK_SELECTOR)]
        deck: String,

        /// Pause in ms between the start click and waiting for the deck
        #[arg(long = "start-pause", default_value = "1000")]
        start_pause: u64,

        /// Settle time in ms after the deck click before the capture
        #[arg(long, default_value = "3000")]
        settle: u64,

        /// Viewport size (WIDTHxHEIGHT, e.g. 390x844)
        #[arg(long)]
        viewport: Option<String>,

        /// Named device profile (e.g. iphone-13)
        #[arg(long, conflicts_with = "viewport")]
        device: Option<String>,

        /// Browser to use
        #[arg(short, long, default_value = "firefox")]
        browser: String,

        /// Run the browser in visible mode (disables headless)
        #[arg(long = "no-headless")]
        no_headless: bool,

        /// Directory for the capture and the diagnostic screenshot
        #[arg(long = "output-dir", default_value = "verification")]
        output_dir: PathBuf,

        /// Navigation budget in ms
        #[arg(long = "navigation-timeout", default_value = "10000")]
        navigation_timeout: u64,

        /// Fail immediately on a navigation timeout instead of retrying once
        #[arg(long = "no-retry-nav")]
        no_retry_nav: bool,

        /// Output format
        #[arg(short, long, default_value = "json")]
        format: OutputFormat,
    },

    /// Show version information
    Version,
}

#[tokio::main]
async fn main() {
    let result = run_cli().await;

    // Always clean up WebDriver processes before exiting
    driver::GLOBAL_DRIVER_MANAGER.stop_all();

    match result {
        Ok(()) => std::process::exit(EXIT_SUCCESS),
        Err(err) => {
            // Convert to the harness error type to get the proper exit code
            let harness_err: errors::HarnessError = err.into();

            // JSON error to stdout for programmatic consumption
            let error_json = json!({
                "error": true,
                "message": harness_err.to_string(),
                "exit_code": harness_err.exit_code()
            });
            println!(
                "{}",
                serde_json::to_string(&error_json).unwrap_or_else(|_| "{}".to_string())
            );

            // Also log to stderr for human reading
            eprintln!("Error: {}", harness_err);
            std::process::exit(harness_err.exit_code());
        }
    }
}

async fn run_cli() -> Result<()> {
    // Logs go to stderr so JSON output on stdout remains clean
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "phasecap=info".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            url,
            ready,
            ready_timeout,
            clicks,
            force,
            settle,
            phase_durations,
            fraction,
            element,
            full_document,
            viewport,
            device,
            browser,
            no_headless,
            output_dir,
            navigation_timeout,
            no_retry_nav,
            format,
        } => {
            commands::run::handle_run(
                url,
                ready,
                ready_timeout,
                clicks,
                force,
                settle,
                phase_durations,
                fraction,
                element,
                full_document,
                viewport,
                device,
                browser,
                no_headless,
                output_dir,
                navigation_timeout,
                no_retry_nav,
                format,
            )
            .await?
        }

        Commands::Shuffle {
            url,
            deck,
            phase_durations,
            fraction,
            force,
            viewport,
            device,
            browser,
            no_headless,
            output_dir,
            navigation_timeout,
            no_retry_nav,
            format,
        } => {
            commands::shuffle::handle_shuffle(
                url,
                deck,
                phase_durations,
                fraction,
                force,
                viewport,
                device,
                browser,
                no_headless,
                output_dir,
                navigation_timeout,
                no_retry_nav,
                format,
            )
            .await?
        }

        Commands::Snapshot {
            url,
            ready,
            viewports,
            element,
            full_document,
            prefix,
            settle,
            browser,
            no_headless,
            output_dir,
            navigation_timeout,
            no_retry_nav,
            format,
        } => {
            commands::snapshot::handle_snapshot(
                url,
                ready,
                viewports,
                element,
                full_document,
                prefix,
                settle,
                browser,
                no_headless,
                output_dir,
                navigation_timeout,
                no_retry_nav,
                format,
            )
            .await?
        }

        Commands::Measure {
            url,
            element,
            ready,
            expected_width,
            expected_vw,
            tolerance,
            no_layout_shot,
            viewport,
            device,
            browser,
            no_headless,
            output_dir,
            navigation_timeout,
            no_retry_nav,
            format,
        } => {
            commands::measure::handle_measure(
                url,
                element,
                ready,
                expected_width,
                expected_vw,
                tolerance,
                no_layout_shot,
                viewport,
                device,
                browser,
                no_headless,
                output_dir,
                navigation_timeout,
                no_retry_nav,
                format,
            )
            .await?
        }

        Commands::Spacing {
            url,
            start,
            deck,
            start_pause,
            settle,
            viewport,
            device,
            browser,
            no_headless,
            output_dir,
            navigation_timeout,
            no_retry_nav,
            format,
        } => {
            commands::spacing::handle_spacing(
                url,
                start,
                deck,
                start_pause,
                settle,
                viewport,
                device,
                browser,
                no_headless,
                output_dir,
                navigation_timeout,
                no_retry_nav,
                format,
            )
            .await?
        }

        Commands::Version => commands::version::handle_version().await?,
    }

    Ok(())
}
