use crate::{ChromeFinder, EphemeralProfile, Error, Result};
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::Page;
use futures::StreamExt;
use std::path::PathBuf;
use tokio::task::JoinHandle;

/// Options for launching a verification session
#[derive(Debug, Default, Clone)]
pub struct LaunchOptions {
    /// Explicit browser binary; discovery runs when unset
    pub chrome_path: Option<PathBuf>,
}

/// Owns the headless browser process for one verification run.
///
/// Holds the chromiumoxide `Browser`, its CDP handler task, the ephemeral
/// profile, and the single page. `close` shuts everything down in order
/// and waits for the child process to exit; dropping the session without
/// closing still kills the child and removes the profile, so no Chrome
/// process outlives a failed run.
pub struct BrowserSession {
    browser: Browser,
    page: Page,
    handler_task: JoinHandle<()>,
    _profile: EphemeralProfile,
}

impl BrowserSession {
    /// Launch headless Chrome with a fresh profile and open a blank page
    pub async fn launch(options: &LaunchOptions) -> Result<Self> {
        let chrome_binary = ChromeFinder::new(options.chrome_path.clone()).find()?;
        tracing::info!("Using Chrome at {}", chrome_binary.display());

        let profile = EphemeralProfile::create()?;

        let config = BrowserConfig::builder()
            .chrome_executable(&chrome_binary)
            .user_data_dir(profile.path())
            .args(vec![
                "--no-first-run",
                "--no-default-browser-check",
                "--disable-gpu",
                "--disable-dev-shm-usage",
            ])
            .build()
            .map_err(Error::Browser)?;

        let (browser, mut handler) = Browser::launch(config).await?;
        tracing::debug!("Headless Chrome launched");

        // The handler stream must be polled for any CDP command to make
        // progress.
        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    // Log but don't stop - some CDP events may not be fully parseable
                    tracing::debug!("CDP handler event error (continuing): {}", e);
                }
            }
        });

        let page = browser.new_page("about:blank").await?;

        Ok(Self {
            browser,
            page,
            handler_task,
            _profile: profile,
        })
    }

    /// The single page owned by this session
    pub fn page(&self) -> &Page {
        &self.page
    }

    /// Navigate the page and wait for the load event
    pub async fn goto(&self, url: &str) -> Result<()> {
        tracing::debug!("Navigating to {}", url);
        self.page.goto(url).await.map_err(|e| Error::Navigation {
            url: url.to_string(),
            reason: e.to_string(),
        })?;
        Ok(())
    }

    /// Close the browser and wait for the child process to exit
    pub async fn close(mut self) -> Result<()> {
        self.browser.close().await?;
        self.browser.wait().await?;
        self.handler_task.abort();
        tracing::debug!("Browser closed");
        Ok(())
    }
}
