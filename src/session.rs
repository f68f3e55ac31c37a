use anyhow::{Context, Result};
use fantoccini::elements::Element;
use fantoccini::{Client, ClientBuilder, Locator};
use serde_json::json;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::driver::GLOBAL_DRIVER_MANAGER;
use crate::errors::HarnessError;
use crate::types::{DeviceProfile, Marker, NavigationPolicy};

/// Supported browser engines
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BrowserKind {
    /// Mozilla Firefox
    Firefox,
    /// Google Chrome/Chromium
    Chrome,
}

impl std::str::FromStr for BrowserKind {
    type Err = anyhow::Error;

    /// Parse browser kind from string (case-insensitive)
    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "firefox" => Ok(BrowserKind::Firefox),
            "chrome" | "chromium" => Ok(BrowserKind::Chrome),
            _ => anyhow::bail!("Unsupported browser: {}", s),
        }
    }
}

impl BrowserKind {
    /// Name of the WebDriver binary for this engine
    pub fn driver_command(&self) -> &'static str {
        match self {
            BrowserKind::Firefox => "geckodriver",
            BrowserKind::Chrome => "chromedriver",
        }
    }
}

impl std::fmt::Display for BrowserKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BrowserKind::Firefox => write!(f, "firefox"),
            BrowserKind::Chrome => write!(f, "chrome"),
        }
    }
}

/// One WebDriver session: one browser process, one page context.
///
/// The client is taken by `close`; every operation after that fails with
/// `HarnessError::SessionClosed`. A closed session cannot be reused. There is
/// no `Drop` impl: ending a WebDriver session is async and fallible, so
/// teardown is an explicit call owned by the run executor, which decides
/// whether a teardown failure may mask an earlier error.
pub struct Session {
    client: Option<Client>,
    kind: BrowserKind,
    // Chrome refuses to share a user-data-dir between processes; each session
    // gets a throwaway one, removed when the session is dropped
    _scratch_dir: Option<tempfile::TempDir>,
}

impl Session {
    /// Open a browser session sized to the given device profile.
    ///
    /// Ensures a WebDriver process is available (auto-starting one if
    /// needed), connects with browser-specific capabilities, then sizes the
    /// window so the page viewport matches the profile exactly.
    pub async fn open(kind: BrowserKind, profile: &DeviceProfile, headless: bool) -> Result<Self> {
        info!("Connecting to {:?} WebDriver", kind);

        // Ensure WebDriver is running (will auto-start if needed)
        let webdriver_url = GLOBAL_DRIVER_MANAGER
            .ensure_driver(&kind)
            .await
            .map_err(|e| HarnessError::Launch(e.to_string()))?;

        // Double-check it's really running (should always be true now)
        if !Self::is_webdriver_running(&webdriver_url).await {
            let driver = kind.driver_command();
            return Err(HarnessError::Launch(format!(
                "cannot reach {} at {}.\n\
                Please ensure it is running:\n\
                  For Firefox: geckodriver --port 4444\n\
                  For Chrome: chromedriver --port 9515",
                driver, webdriver_url
            ))
            .into());
        }

        let scratch_dir = match kind {
            BrowserKind::Chrome => Some(
                tempfile::Builder::new()
                    .prefix("phasecap-chrome-")
                    .tempdir()
                    .context("Failed to create browser scratch directory")?,
            ),
            BrowserKind::Firefox => None,
        };

        let mut caps = serde_json::Map::new();

        match kind {
            BrowserKind::Firefox => {
                let mut firefox_opts = serde_json::Map::new();
                let mut args = Vec::new();

                if headless {
                    args.push("--headless".to_string());
                }
                args.push(format!("--width={}", profile.width));
                args.push(format!("--height={}", profile.height));

                firefox_opts.insert("args".to_string(), json!(args));
                caps.insert("moz:firefoxOptions".to_string(), json!(firefox_opts));
            }
            BrowserKind::Chrome => {
                let mut chrome_opts = serde_json::Map::new();
                let mut args = vec!["--no-sandbox".to_string()];

                if headless {
                    args.push("--headless=new".to_string());
                    args.push("--disable-gpu".to_string());
                    args.push("--disable-dev-shm-usage".to_string());
                }
                args.push(format!(
                    "--window-size={},{}",
                    profile.width, profile.height
                ));
                if let Some(dir) = &scratch_dir {
                    args.push(format!("--user-data-dir={}", dir.path().display()));
                }

                chrome_opts.insert("args".to_string(), json!(args));
                caps.insert("goog:chromeOptions".to_string(), json!(chrome_opts));
            }
        }

        debug!("Connecting to WebDriver at {}", webdriver_url);

        let client = match ClientBuilder::rustls()
            .capabilities(caps.clone())
            .connect(&webdriver_url)
            .await
        {
            Ok(client) => client,
            Err(e) => {
                let error_str = e.to_string();
                if error_str.contains("Session is already started")
                    || error_str.contains("session not created")
                {
                    // Driver is wedged on a leaked session, restart it once
                    info!("WebDriver appears to be in a bad state, attempting recovery...");

                    GLOBAL_DRIVER_MANAGER.kill_driver(&kind);
                    tokio::time::sleep(Duration::from_millis(500)).await;

                    let new_url = GLOBAL_DRIVER_MANAGER.ensure_driver(&kind).await.map_err(
                        |e| {
                            HarnessError::Launch(format!(
                                "failed to restart WebDriver after recovery: {}",
                                e
                            ))
                        },
                    )?;

                    ClientBuilder::rustls()
                        .capabilities(caps)
                        .connect(&new_url)
                        .await
                        .map_err(|e| {
                            HarnessError::Launch(format!(
                                "failed to connect to WebDriver after restart: {}",
                                e
                            ))
                        })?
                } else {
                    return Err(HarnessError::Launch(error_str).into());
                }
            }
        };

        let mut session = Session {
            client: Some(client),
            kind,
            _scratch_dir: scratch_dir,
        };

        // The headless launch args usually land the right size already; this
        // corrects for window chrome when they don't
        if let Err(e) = session.set_viewport(profile).await {
            if let Err(close_err) = session.close().await {
                debug!("Cleanup after failed viewport setup also failed: {}", close_err);
            }
            return Err(e);
        }

        Ok(session)
    }

    async fn is_webdriver_running(url: &str) -> bool {
        let status_url = format!("{}/status", url);

        match reqwest::get(&status_url).await {
            Ok(response) => response.status().is_success(),
            Err(_) => false,
        }
    }

    /// Live client handle; any operation on a closed session fails here
    fn client(&self) -> Result<&Client> {
        match &self.client {
            Some(client) => Ok(client),
            None => Err(HarnessError::SessionClosed.into()),
        }
    }

    pub fn kind(&self) -> BrowserKind {
        self.kind
    }

    /// Navigate to `url` and wait for the document to finish loading, within
    /// the policy's budget. A timed-out load is retried exactly once when the
    /// policy allows it; the retry is the only navigation recovery there is.
    pub async fn navigate(&self, url: &str, policy: &NavigationPolicy) -> Result<()> {
        url::Url::parse(url)
            .map_err(|e| HarnessError::Navigation(format!("invalid URL '{}': {}", url, e)))?;

        match tokio::time::timeout(policy.timeout, self.goto(url)).await {
            Ok(Ok(())) => return Ok(()),
            Ok(Err(e)) => return Err(HarnessError::Navigation(e.to_string()).into()),
            Err(_) if policy.retry_on_timeout => {
                warn!(
                    "Load of {} timed out after {}ms, retrying once",
                    url,
                    policy.timeout.as_millis()
                );
            }
            Err(_) => {
                return Err(HarnessError::Navigation(format!(
                    "load of {} timed out after {}ms",
                    url,
                    policy.timeout.as_millis()
                ))
                .into());
            }
        }

        match tokio::time::timeout(policy.timeout, self.goto(url)).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(HarnessError::Navigation(e.to_string()).into()),
            Err(_) => Err(HarnessError::Navigation(format!(
                "load of {} timed out after {}ms and once more on retry",
                url,
                policy.timeout.as_millis()
            ))
            .into()),
        }
    }

    async fn goto(&self, url: &str) -> Result<()> {
        info!("Navigating to {}", url);
        let client = self.client()?;
        client.goto(url).await?;

        // goto can return while the document is still streaming in; poll
        // readyState until the load settles. The caller's timeout bounds
        // this loop.
        let wait_script = "return document.readyState === 'complete';";
        loop {
            match client.execute(wait_script, vec![]).await {
                Ok(val) if val.as_bool().unwrap_or(false) => return Ok(()),
                // A transient script failure mid-navigation just means the
                // page is not there yet
                _ => tokio::time::sleep(Duration::from_millis(100)).await,
            }
        }
    }

    /// First element matching the marker, or None when nothing matches
    pub async fn find_first(&self, marker: &Marker) -> Result<Option<Element>> {
        let client = self.client()?;
        let elements = match marker {
            Marker::Css(selector) => client.find_all(Locator::Css(selector)).await?,
            Marker::Text(text) => {
                let xpath = Marker::text_xpath(text);
                client.find_all(Locator::XPath(&xpath)).await?
            }
        };
        Ok(elements.into_iter().next())
    }

    /// First element matching the marker; zero matches is an error
    pub async fn find(&self, marker: &Marker) -> Result<Element> {
        match self.find_first(marker).await? {
            Some(element) => Ok(element),
            None => Err(HarnessError::ElementNotFound(marker.to_string()).into()),
        }
    }

    /// Click a marker.
    ///
    /// Normal mode issues a WebDriver click, which fails when another element
    /// would receive it. Force mode dispatches the click in page script
    /// against the resolved element, bypassing the hit test; the application
    /// under test legitimately stacks transparent interactive layers over
    /// its click targets.
    pub async fn click(&self, marker: &Marker, force: bool) -> Result<()> {
        let element = self.find(marker).await?;

        if force {
            debug!("Force-clicking {}", marker);
            self.client()?
                .execute(
                    "arguments[0].click();",
                    vec![serde_json::to_value(&element)?],
                )
                .await
                .context(format!("Force click on '{}' failed", marker))?;
            return Ok(());
        }

        debug!("Clicking {}", marker);
        if let Err(e) = element.click().await {
            let msg = e.to_string();
            if msg.contains("intercept")
                || msg.contains("not clickable")
                || msg.contains("not interactable")
            {
                return Err(HarnessError::NotInteractable(marker.to_string()).into());
            }
            return Err(anyhow::Error::new(e).context(format!("Click on '{}' failed", marker)));
        }
        Ok(())
    }

    /// Run a script in the page and return its JSON result
    pub async fn execute(
        &self,
        script: &str,
        args: Vec<serde_json::Value>,
    ) -> Result<serde_json::Value> {
        self.client()?
            .execute(script, args)
            .await
            .context("Failed to execute script")
    }

    /// PNG of the current viewport
    pub async fn page_png(&self) -> Result<Vec<u8>> {
        self.client()?
            .screenshot()
            .await
            .context("Failed to capture page screenshot")
    }

    /// PNG of one element's bounding region
    pub async fn element_png(&self, marker: &Marker) -> Result<Vec<u8>> {
        let element = self.find(marker).await?;
        element
            .screenshot()
            .await
            .context(format!("Failed to capture screenshot of '{}'", marker))
    }

    /// Bounding box (x, y, width, height) of one element, in CSS pixels
    pub async fn element_rect(&self, marker: &Marker) -> Result<(f64, f64, f64, f64)> {
        let element = self.find(marker).await?;
        Ok(element.rectangle().await?)
    }

    /// Measured page viewport in CSS pixels
    pub async fn viewport(&self) -> Result<(u32, u32)> {
        let value = self
            .execute("return [window.innerWidth, window.innerHeight];", vec![])
            .await?;
        let dims: [u32; 2] =
            serde_json::from_value(value).context("Unexpected viewport measurement payload")?;
        Ok((dims[0], dims[1]))
    }

    /// Outer window size as reported by the driver
    pub async fn window_size(&self) -> Result<(u64, u64)> {
        Ok(self.client()?.get_window_size().await?)
    }

    pub async fn set_window_size(&self, width: u32, height: u32) -> Result<()> {
        self.client()?
            .set_window_size(width, height)
            .await
            .context("Failed to set window size")?;
        Ok(())
    }

    /// Size the window so the page viewport matches the profile exactly.
    ///
    /// `set_window_size` sets the outer window; in headed mode the browser
    /// chrome eats part of it. Measure the inner size and correct once for
    /// the delta.
    pub async fn set_viewport(&self, profile: &DeviceProfile) -> Result<()> {
        debug!("Setting viewport to {}", profile);
        self.set_window_size(profile.width, profile.height).await?;

        let (inner_w, inner_h) = self.viewport().await?;
        if (inner_w, inner_h) == (profile.width, profile.height) {
            return Ok(());
        }

        let dw = profile.width as i64 - inner_w as i64;
        let dh = profile.height as i64 - inner_h as i64;
        let outer_w = (profile.width as i64 + dw).max(1) as u32;
        let outer_h = (profile.height as i64 + dh).max(1) as u32;
        self.set_window_size(outer_w, outer_h).await?;

        let adjusted = self.viewport().await?;
        if adjusted != (profile.width, profile.height) {
            warn!(
                "Viewport is {}x{} after correction, wanted {}",
                adjusted.0, adjusted.1, profile
            );
        }
        Ok(())
    }

    /// End the WebDriver session. Exactly one close per opened session; a
    /// second close, like any other operation after the first, fails with
    /// `SessionClosed`.
    pub async fn close(&mut self) -> Result<()> {
        match self.client.take() {
            Some(client) => {
                debug!("Closing browser session");
                client
                    .close()
                    .await
                    .context("Failed to close browser session")?;
                Ok(())
            }
            None => Err(HarnessError::SessionClosed.into()),
        }
    }
}
