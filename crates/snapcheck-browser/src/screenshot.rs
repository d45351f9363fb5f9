use std::path::Path;

use chromiumoxide::cdp::browser_protocol::page::CaptureScreenshotFormat;
use chromiumoxide::page::ScreenshotParams;
use chromiumoxide::Page;

use crate::{Error, Result};

/// Capture a full-page PNG and write it to `path`, overwriting any
/// previous capture. Parent directories are created as needed.
///
/// Returns the number of bytes written. The capture happens before any
/// filesystem work, so a failed capture leaves a stale file untouched.
pub async fn capture_full_page(page: &Page, path: &Path) -> Result<u64> {
    let params = ScreenshotParams::builder()
        .format(CaptureScreenshotFormat::Png)
        .full_page(true)
        .build();

    let bytes = page.screenshot(params).await?;

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|source| Error::ScreenshotWrite {
                    path: path.display().to_string(),
                    source,
                })?;
        }
    }

    tokio::fs::write(path, &bytes)
        .await
        .map_err(|source| Error::ScreenshotWrite {
            path: path.display().to_string(),
            source,
        })?;

    tracing::debug!("Wrote {} bytes to {}", bytes.len(), path.display());
    Ok(bytes.len() as u64)
}
