use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

mod commands;

#[derive(Parser)]
#[command(name = "snapcheck")]
#[command(author, version, about, long_about = None)]
#[command(
    about = "Verify a page loads in headless Chrome and capture a full-page screenshot",
    long_about = "Snapcheck drives a headless Chrome instance to a target page, forwards the \
                  page's console output to stdout, waits for the network to go idle, and saves \
                  a full-page screenshot as evidence. Any failure exits non-zero."
)]
struct Cli {
    /// Target page to verify
    #[arg(long, default_value = "http://localhost:5000/cars-for-sale")]
    url: String,

    /// Where to write the screenshot (overwritten on each run)
    #[arg(short, long, default_value = "jules-scratch/verification/cars_for_sale.png")]
    output: PathBuf,

    /// Path to the Chrome binary (skips discovery)
    #[arg(long)]
    chrome_path: Option<PathBuf>,

    /// Seconds to wait for the network to go idle
    #[arg(long, default_value_t = 30)]
    timeout: u64,

    /// Quiet window in milliseconds that counts as network idle
    #[arg(long, default_value_t = 500)]
    idle_ms: u64,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    init_logging(cli.verbose);

    let url = url::Url::parse(&cli.url)
        .map_err(|e| anyhow::anyhow!("Invalid URL '{}': {}", cli.url, e))?;
    if url.scheme() != "http" && url.scheme() != "https" {
        anyhow::bail!(
            "Unsupported URL scheme '{}': only http and https are supported",
            url.scheme()
        );
    }

    commands::verify::execute(
        url,
        &cli.output,
        cli.chrome_path,
        Duration::from_secs(cli.timeout),
        Duration::from_millis(cli.idle_ms),
    )
}

fn init_logging(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = if verbose {
        EnvFilter::new("snapcheck=debug,snapcheck_browser=debug")
    } else {
        EnvFilter::new("snapcheck=info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .init();
}
