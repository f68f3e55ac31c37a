use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Output format for CLI results
#[derive(Clone, Copy, Debug, Deserialize, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// JSON format for programmatic consumption
    Json,
    /// Human-readable simple format
    Simple,
}

/// Viewport dimensions plus an optional device emulation label.
///
/// Immutable; selected once per run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceProfile {
    /// Viewport width in pixels
    pub width: u32,
    /// Viewport height in pixels
    pub height: u32,
    /// Named device this profile emulates, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device: Option<String>,
}

impl DeviceProfile {
    /// Parse a profile from "WIDTHxHEIGHT" format (e.g., "390x844")
    pub fn parse(s: &str) -> Result<Self> {
        let parts: Vec<&str> = s.split('x').collect();
        if parts.len() != 2 {
            anyhow::bail!("Invalid viewport format. Use WIDTHxHEIGHT (e.g., 390x844)");
        }

        let width = parts[0]
            .parse::<u32>()
            .map_err(|_| anyhow::anyhow!("Invalid width in viewport size"))?;
        let height = parts[1]
            .parse::<u32>()
            .map_err(|_| anyhow::anyhow!("Invalid height in viewport size"))?;

        if width == 0 || height == 0 {
            anyhow::bail!("Viewport dimensions must be greater than zero");
        }

        Ok(DeviceProfile {
            width,
            height,
            device: None,
        })
    }

    /// An anonymous profile with explicit dimensions
    pub fn new(width: u32, height: u32) -> Self {
        DeviceProfile {
            width,
            height,
            device: None,
        }
    }

    /// Look up a named device profile (e.g., "iphone-13")
    pub fn named(device: &str) -> Result<Self> {
        let (width, height) = match device.to_lowercase().as_str() {
            "iphone-13" => (390, 844),
            "galaxy-s24" => (412, 915),
            "laptop" => (1280, 720),
            "desktop" => (1920, 1080),
            _ => anyhow::bail!(
                "Unknown device '{}'. Known devices: iphone-13, galaxy-s24, laptop, desktop",
                device
            ),
        };

        Ok(DeviceProfile {
            width,
            height,
            device: Some(device.to_lowercase()),
        })
    }
}

impl std::fmt::Display for DeviceProfile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Locator for a DOM marker the application guarantees to render.
///
/// The harness depends on these markers and nothing else about the page
/// structure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Marker {
    /// CSS selector, e.g. "#slot-deck"
    Css(String),
    /// Visible text content, e.g. "Click to Shuffle"
    Text(String),
}

impl Marker {
    /// Parse a marker string. A "text=" prefix selects by visible text,
    /// anything else is treated as a CSS selector.
    pub fn parse(s: &str) -> Self {
        match s.strip_prefix("text=") {
            Some(text) => Marker::Text(text.to_string()),
            None => Marker::Css(s.to_string()),
        }
    }

    /// XPath probe for a text marker
    pub fn text_xpath(text: &str) -> String {
        format!(
            "//*[contains(normalize-space(text()), {})]",
            Self::xpath_literal(text)
        )
    }

    /// Quote arbitrary text as an XPath 1.0 string literal. XPath literals
    /// have no escape syntax, so the quote kind is switched to whichever the
    /// text does not contain; text carrying both kinds is assembled with
    /// concat().
    fn xpath_literal(text: &str) -> String {
        if !text.contains('\'') {
            format!("'{}'", text)
        } else if !text.contains('"') {
            format!("\"{}\"", text)
        } else {
            let parts: Vec<String> = text
                .split('\'')
                .map(|part| format!("'{}'", part))
                .collect();
            format!("concat({})", parts.join(", \"'\", "))
        }
    }
}

impl std::fmt::Display for Marker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Marker::Css(selector) => write!(f, "{}", selector),
            Marker::Text(text) => write!(f, "text={}", text),
        }
    }
}

/// A DOM condition that gates progression, with a bounded timeout
#[derive(Debug, Clone)]
pub struct ReadinessCondition {
    /// Marker that must become present and displayed
    pub marker: Marker,
    /// How long to wait before giving up on this condition
    pub timeout: Duration,
}

impl ReadinessCondition {
    pub fn new(marker: Marker, timeout: Duration) -> Self {
        Self { marker, timeout }
    }

    /// Condition on a CSS selector with the default 10s budget
    pub fn css(selector: &str) -> Self {
        Self::new(Marker::Css(selector.to_string()), DEFAULT_READY_TIMEOUT)
    }
}

/// Default per-condition readiness budget
pub const DEFAULT_READY_TIMEOUT: Duration = Duration::from_secs(10);

/// One stage of the application's animation, with its estimated duration.
///
/// The application exposes no signal for the currently active phase; these
/// nominal durations are the only timing information the harness has, and
/// they are supplied by the caller, never hardcoded.
#[derive(Debug, Clone, PartialEq)]
pub struct AnimationPhase {
    pub name: String,
    pub nominal: Duration,
}

impl AnimationPhase {
    pub fn new(name: &str, nominal: Duration) -> Self {
        Self {
            name: name.to_string(),
            nominal,
        }
    }

    /// Parse a phase list from "name=ms,name=ms,..." format
    /// (e.g., "split=1600,merge=1300,return=1000")
    pub fn parse_list(s: &str) -> Result<Vec<AnimationPhase>> {
        let mut phases = Vec::new();
        for entry in s.split(',') {
            let entry = entry.trim();
            if entry.is_empty() {
                continue;
            }
            let (name, ms) = entry.split_once('=').ok_or_else(|| {
                anyhow::anyhow!("Invalid phase entry '{}'. Use name=ms (e.g., split=1600)", entry)
            })?;
            let ms: u64 = ms
                .trim()
                .parse()
                .map_err(|_| anyhow::anyhow!("Invalid duration in phase entry '{}'", entry))?;
            if ms == 0 {
                anyhow::bail!("Phase '{}' must have a nonzero duration", name);
            }
            phases.push(AnimationPhase::new(name.trim(), Duration::from_millis(ms)));
        }
        if phases.is_empty() {
            anyhow::bail!("Phase list is empty");
        }
        Ok(phases)
    }
}

/// What a screenshot covers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", tag = "kind")]
pub enum CaptureTarget {
    /// The rendered viewport; with `full_document` the window is grown to the
    /// document scroll height for the shot and restored afterwards
    FullPage { full_document: bool },
    /// The bounding region of a single element
    Element { selector: String },
}

impl CaptureTarget {
    pub fn viewport() -> Self {
        CaptureTarget::FullPage {
            full_document: false,
        }
    }

    pub fn full_document() -> Self {
        CaptureTarget::FullPage {
            full_document: true,
        }
    }

    pub fn element(selector: &str) -> Self {
        CaptureTarget::Element {
            selector: selector.to_string(),
        }
    }
}

/// A capture request for one phase of the animation
#[derive(Debug, Clone)]
pub struct PhaseCapture {
    /// Name of the phase this capture lands in
    pub phase: String,
    /// Where inside the phase window to capture, as a fraction of the
    /// nominal duration (0 = phase start, 1 = phase end)
    pub fraction: f64,
    pub target: CaptureTarget,
    pub path: PathBuf,
}

/// UI action issued against the page once it is ready
#[derive(Debug, Clone)]
pub enum Interaction {
    /// Click a marker. With `force` the click is dispatched in page script
    /// directly to the element, bypassing the occlusion check.
    Click { marker: Marker, force: bool },
    /// Settle gap between chained interactions
    Pause(Duration),
}

/// How navigation timeouts are handled
#[derive(Debug, Clone)]
pub struct NavigationPolicy {
    /// Budget for the initial document load
    pub timeout: Duration,
    /// Retry the navigation exactly once on timeout before surfacing the error
    pub retry_on_timeout: bool,
}

impl Default for NavigationPolicy {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            retry_on_timeout: true,
        }
    }
}

#[cfg(test)]
#[path = "types_test.rs"]
mod types_test;
