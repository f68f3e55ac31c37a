use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, warn};

use crate::session::Session;
use crate::types::{CaptureTarget, Marker};

/// Capture one PNG to `path` and return the number of bytes written.
///
/// Parent directories are created as needed and an existing file at `path`
/// is overwritten. An `Element` target whose selector matches nothing fails
/// with `ElementNotFound`; callers that want a non-fatal fallback check for
/// the element first and degrade to a full-page shot.
pub async fn capture(session: &Session, target: &CaptureTarget, path: &Path) -> Result<u64> {
    let png = match target {
        CaptureTarget::FullPage {
            full_document: false,
        } => session.page_png().await?,
        CaptureTarget::FullPage {
            full_document: true,
        } => full_document_png(session).await?,
        CaptureTarget::Element { selector } => {
            session.element_png(&Marker::Css(selector.clone())).await?
        }
    };

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .context(format!("Failed to create {}", parent.display()))?;
        }
    }
    fs::write(path, &png).context(format!("Failed to write {}", path.display()))?;

    debug!("Wrote {} bytes to {}", png.len(), path.display());
    Ok(png.len() as u64)
}

/// Screenshot of the whole scrollable document, not just the viewport.
///
/// WebDriver screenshots cover the viewport only, so grow the window to the
/// document's scroll height for the shot and restore the old size after.
async fn full_document_png(session: &Session) -> Result<Vec<u8>> {
    let value = session
        .execute(
            "return document.documentElement.scrollHeight;",
            vec![],
        )
        .await?;
    let doc_height: u64 =
        serde_json::from_value(value).context("Unexpected scroll height payload")?;

    let (win_w, win_h) = session.window_size().await?;
    let grown = doc_height > win_h;

    if grown {
        debug!(
            "Growing window from {}px to {}px tall for full-document capture",
            win_h, doc_height
        );
        session
            .set_window_size(win_w as u32, doc_height as u32)
            .await?;
        // Give the page a beat to relayout at the new height
        tokio::time::sleep(Duration::from_millis(100)).await;
    }

    let png = session.page_png().await;

    if grown {
        if let Err(e) = session.set_window_size(win_w as u32, win_h as u32).await {
            warn!(
                "Could not restore window size after full-document capture: {}",
                e
            );
        }
    }

    png
}
