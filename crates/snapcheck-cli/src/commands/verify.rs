use anyhow::Result;
use snapcheck_browser::{
    capture_full_page, BrowserSession, ConsoleForwarder, LaunchOptions, NetworkIdleWatcher,
};
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

pub fn execute(
    url: Url,
    output: &Path,
    chrome_path: Option<PathBuf>,
    idle_deadline: Duration,
    idle_window: Duration,
) -> Result<()> {
    // Create tokio runtime for async operations
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    runtime.block_on(async {
        use console::style;

        println!("🚀 Launching headless Chrome...");
        let session = BrowserSession::launch(&LaunchOptions { chrome_path }).await?;

        // Observers go in place before navigation: console messages and
        // requests fired during the initial load must be counted.
        let console_log = ConsoleForwarder::attach(session.page()).await?;
        let idle = NetworkIdleWatcher::attach(session.page()).await?;

        println!("📍 Navigating to {}", url);
        session.goto(url.as_str()).await?;

        println!("⏳ Waiting for network idle...");
        idle.wait(idle_window, idle_deadline).await?;

        let messages = console_log.messages();
        if !messages.is_empty() {
            let errors = messages.iter().filter(|m| m.kind == "error").count();
            tracing::info!(
                "Forwarded {} console message(s), {} error(s)",
                messages.len(),
                errors
            );
        }

        println!("📸 Capturing full-page screenshot...");
        let bytes = capture_full_page(session.page(), output).await?;
        println!(
            "✅ Screenshot saved: {} ({} bytes)",
            style(output.display().to_string()).green(),
            bytes
        );

        console_log.detach();

        // Graceful shutdown; on the error paths above the session drop
        // kills the Chrome child so nothing is left running.
        session.close().await?;

        Ok(())
    })
}
