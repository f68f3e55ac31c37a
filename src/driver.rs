use anyhow::{Context, Result};
use std::process::{Child, Command, Stdio};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::session::BrowserKind;

/// Supervises geckodriver/chromedriver processes.
///
/// Sessions ask for a driver URL; the supervisor hands back a spawned driver
/// that still answers, falls back to an externally started one on its
/// conventional port, and spawns a fresh process otherwise. Everything it
/// spawned is killed by `stop_all` before the process exits.
pub struct DriverManager {
    spawned: Arc<Mutex<Vec<SpawnedDriver>>>,
}

struct SpawnedDriver {
    kind: BrowserKind,
    child: Child,
    port: u16,
    url: String,
    #[cfg(unix)]
    group: Option<i32>,
}

impl Default for DriverManager {
    fn default() -> Self {
        Self {
            spawned: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl DriverManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// WebDriver URL for the browser kind, spawning a driver if none answers
    pub async fn ensure_driver(&self, kind: &BrowserKind) -> Result<String> {
        for url in self.spawned_urls(kind) {
            if Self::status_ready(&url).await {
                debug!("Reusing managed {} at {}", kind.driver_command(), url);
                return Ok(url);
            }
        }

        // A driver someone started by hand sits on its conventional port
        let external = Self::standard_url(kind);
        if Self::status_ready(external).await {
            debug!("Found external {} at {}", kind.driver_command(), external);
            return Ok(external.to_string());
        }

        info!("No {} answering, spawning one", kind.driver_command());
        self.spawn_driver(kind).await
    }

    fn spawned_urls(&self, kind: &BrowserKind) -> Vec<String> {
        let spawned = self.spawned.lock().unwrap();
        spawned
            .iter()
            .filter(|d| d.kind == *kind)
            .map(|d| d.url.clone())
            .collect()
    }

    fn standard_url(kind: &BrowserKind) -> &'static str {
        match kind {
            BrowserKind::Firefox => "http://localhost:4444",
            BrowserKind::Chrome => "http://localhost:9515",
        }
    }

    /// Spawn a driver on a free port and wait until its /status reports ready
    async fn spawn_driver(&self, kind: &BrowserKind) -> Result<String> {
        let command = kind.driver_command();
        if !Self::command_exists(command) {
            anyhow::bail!(
                "{} not found in PATH. Install it (macOS: brew install {}) or \
                 start a WebDriver for {} on its standard port",
                command,
                command,
                kind
            );
        }

        let port = Self::find_free_port(kind)?;
        info!("Starting {} on port {}", command, port);
        let args = match kind {
            BrowserKind::Firefox => vec!["--port".to_string(), port.to_string()],
            BrowserKind::Chrome => vec![format!("--port={}", port)],
        };

        let mut cmd = Command::new(command);
        cmd.args(&args).stdout(Stdio::piped()).stderr(Stdio::piped());

        // Own process group, so the whole driver tree dies with one signal
        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            cmd.process_group(0);
        }

        let child = cmd
            .spawn()
            .context(format!("Failed to start {}", command))?;

        // With process_group(0) the group id equals the child pid
        #[cfg(unix)]
        let group = Some(child.id() as i32);

        let url = format!("http://localhost:{}", port);
        {
            let mut spawned = self.spawned.lock().unwrap();
            spawned.push(SpawnedDriver {
                kind: *kind,
                child,
                port,
                url: url.clone(),
                #[cfg(unix)]
                group,
            });
        }

        for _ in 0..30 {
            if Self::status_ready(&url).await {
                info!("{} ready on port {}", command, port);
                return Ok(url);
            }
            sleep(Duration::from_millis(100)).await;
        }

        self.reap_port(port);
        anyhow::bail!("{} did not answer /status within 3s", command)
    }

    /// True when `command` resolves on the PATH
    pub fn command_exists(command: &str) -> bool {
        #[cfg(unix)]
        let finder = "which";
        #[cfg(windows)]
        let finder = "where";

        Command::new(finder)
            .arg(command)
            .output()
            .map(|output| output.status.success())
            .unwrap_or(false)
    }

    /// Pick a listening port: the driver's conventional ports first, then
    /// whatever the OS hands out
    pub fn find_free_port(kind: &BrowserKind) -> Result<u16> {
        let preferred: [u16; 3] = match kind {
            BrowserKind::Firefox => [4444, 4445, 4446],
            BrowserKind::Chrome => [9515, 9516, 9517],
        };

        if let Some(port) = preferred.into_iter().find(|p| !Self::is_port_in_use(*p)) {
            debug!("Using conventional port {} for {}", port, kind);
            return Ok(port);
        }

        let listener = std::net::TcpListener::bind("127.0.0.1:0")?;
        let port = listener.local_addr()?.port();
        drop(listener);
        Ok(port)
    }

    pub fn is_port_in_use(port: u16) -> bool {
        std::net::TcpListener::bind(("127.0.0.1", port)).is_err()
    }

    /// GET /status and report whether the driver says it can take a session.
    /// Unreachable, slow, and session-wedged drivers all count as no.
    async fn status_ready(url: &str) -> bool {
        let response = reqwest::Client::new()
            .get(format!("{}/status", url))
            .timeout(Duration::from_secs(1))
            .send()
            .await;

        match response {
            Ok(response) => match response.json::<serde_json::Value>().await {
                Ok(body) => body
                    .pointer("/value/ready")
                    .and_then(|r| r.as_bool())
                    .unwrap_or(false),
                Err(_) => false,
            },
            Err(_) => false,
        }
    }

    /// Kill every driver of this kind, spawned or stray. Recovery path for a
    /// driver wedged on a leaked session.
    pub fn kill_driver(&self, kind: &BrowserKind) {
        {
            let mut spawned = self.spawned.lock().unwrap();
            spawned.retain_mut(|driver| {
                if driver.kind != *kind {
                    return true;
                }
                #[cfg(unix)]
                if let Some(pgid) = driver.group {
                    info!(
                        "Killing process group {} for {}",
                        pgid,
                        kind.driver_command()
                    );
                    Self::kill_group(pgid);
                }
                let _ = driver.child.kill();
                false
            });
        }

        // Strays from an earlier crashed run are outside the spawned list
        #[cfg(unix)]
        {
            let _ = Command::new("pkill")
                .arg("-f")
                .arg(kind.driver_command())
                .output();

            // A leftover Firefox keeps its profile locked and blocks the
            // next session even once geckodriver is gone
            if *kind == BrowserKind::Firefox {
                warn!("Cleaning up leftover Firefox processes");
                let _ = Command::new("pkill").arg("-f").arg("firefox").output();
            }
        }

        #[cfg(windows)]
        {
            let _ = Command::new("taskkill")
                .args(["/F", "/IM", &format!("{}.exe", kind.driver_command())])
                .output();

            if *kind == BrowserKind::Firefox {
                let _ = Command::new("taskkill")
                    .args(["/F", "/IM", "firefox.exe"])
                    .output();
            }
        }
    }

    /// TERM the group, give it a beat, then KILL whatever is left
    #[cfg(unix)]
    fn kill_group(pgid: i32) {
        if let Err(e) = Command::new("kill")
            .args(["-TERM", &format!("-{}", pgid)])
            .output()
        {
            debug!("SIGTERM to group {} failed: {}", pgid, e);
        }

        std::thread::sleep(Duration::from_millis(100));

        if let Err(e) = Command::new("kill")
            .args(["-KILL", &format!("-{}", pgid)])
            .output()
        {
            debug!("SIGKILL to group {} failed: {}", pgid, e);
        }
    }

    /// Drop a spawn that never became ready
    fn reap_port(&self, port: u16) {
        let mut spawned = self.spawned.lock().unwrap();
        if let Some(index) = spawned.iter().position(|d| d.port == port) {
            let mut driver = spawned.remove(index);

            #[cfg(unix)]
            if let Some(pgid) = driver.group {
                info!(
                    "Killing process group {} for dead spawn on port {}",
                    pgid, port
                );
                Self::kill_group(pgid);
            }

            let _ = driver.child.kill();
        }
    }

    /// Kill every driver this supervisor spawned
    pub fn stop_all(&self) {
        let mut spawned = self.spawned.lock().unwrap();
        for mut driver in spawned.drain(..) {
            debug!(
                "Stopping {} on port {}",
                driver.kind.driver_command(),
                driver.port
            );

            #[cfg(unix)]
            if let Some(pgid) = driver.group {
                Self::kill_group(pgid);
            }

            let _ = driver.child.kill();
        }
    }
}

impl Drop for DriverManager {
    fn drop(&mut self) {
        self.stop_all();
    }
}

lazy_static::lazy_static! {
    /// Process-wide supervisor; commands stop it before exiting
    pub static ref GLOBAL_DRIVER_MANAGER: DriverManager = DriverManager::new();
}

#[cfg(test)]
#[path = "driver_test.rs"]
mod driver_test;
