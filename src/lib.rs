//! # phasecap
#![allow(clippy::uninlined_format_args)]
//!
//! Timed, phase-aware screenshot harness for verifying client-side animations.
//!
//! A browser animation is usually invisible to test tooling: it is driven by
//! the page's own timers, and nothing in the DOM says which phase is active.
//! phasecap navigates to the application, waits for it to become ready,
//! triggers the animation with a click, and captures screenshots at instants
//! computed from the declared phase durations, measured from the moment the
//! click landed. Waits are cumulative, so a slow capture never pushes the
//! later ones into the wrong phase.
//!
//! ## Installation
//!
//! phasecap drives a real browser over WebDriver, so `geckodriver` (Firefox)
//! or `chromedriver` (Chrome) must be on the PATH. The driver process is
//! started and supervised automatically.
//!
//! ```bash
//! cargo install phasecap
//! ```
//!
//! ## CLI Usage
//!
//! ```bash
//! # Capture one frame inside each phase of the deck shuffle animation
//! phasecap shuffle --url http://localhost:3000/
//!
//! # The same run with explicit timings, one shot at 50% of each phase
//! phasecap run http://localhost:3000/ \
//!   --ready "#slot-deck" --click "#slot-deck" \
//!   --phase-durations "split=1600,merge=1300,return=1000" \
//!   --fraction 0.5
//!
//! # Layout stills at two viewport sizes
//! phasecap snapshot --viewports "390x844,1920x1080"
//!
//! # Check the deck renders at 19% of the viewport width on a phone
//! phasecap measure --element "#slot-deck" --viewport 390x844 --expected-vw 19
//!
//! # Click through the start control and capture the settled layout
//! phasecap spacing --viewport 720x1280
//! ```
//!
//! Reports are JSON on stdout; logs go to stderr. A failed run writes a
//! best-effort diagnostic screenshot next to the captures and exits with a
//! code identifying the failure class.
//!
//! ## Library Usage
//!
//! ```no_run
//! use phasecap::scenarios::{self, ScenarioContext};
//! use phasecap::{BrowserKind, DeviceProfile, Marker, NavigationPolicy};
//! use std::path::PathBuf;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let ctx = ScenarioContext {
//!     url: "http://localhost:3000/".to_string(),
//!     browser: BrowserKind::Firefox,
//!     headless: true,
//!     output_dir: PathBuf::from("verification"),
//!     navigation: NavigationPolicy::default(),
//! };
//! let verification = scenarios::shuffle(
//!     &ctx,
//!     DeviceProfile::new(1280, 720),
//!     Marker::parse("#slot-deck"),
//!     scenarios::shuffle_phases(),
//!     scenarios::DEFAULT_SHUFFLE_FRACTION,
//!     false, // Normal click
//! );
//! let report = phasecap::run::execute(&verification).await?;
//! println!("{} captures", report.captures.len());
//! # Ok(())
//! # }
//! ```

/// Screenshot capture and file output
pub mod capture;

/// Automatic WebDriver process management
pub mod driver;

/// Error taxonomy and exit codes
pub mod errors;

/// DOM readiness gate
pub mod readiness;

/// Run executor and fault reporting
pub mod run;

/// Built-in verification scenarios
pub mod scenarios;

/// Browser session control over WebDriver
pub mod session;

/// Capture timeline scheduling
pub mod timeline;

/// Type definitions for runs, markers, and capture targets
pub mod types;

pub use errors::HarnessError;
pub use run::{CaptureRecord, RunReport, VerificationRun};
pub use session::{BrowserKind, Session};
pub use timeline::{CapturePlan, CaptureSlot, PlannedCapture};
pub use types::{
    AnimationPhase, CaptureTarget, DeviceProfile, Interaction, Marker, NavigationPolicy,
    OutputFormat, PhaseCapture, ReadinessCondition,
};
