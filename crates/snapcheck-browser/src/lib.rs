//! Browser-side building blocks for snapcheck.
//!
//! Wraps chromiumoxide with the small set of capabilities a verification
//! run needs: locating a Chrome binary, an isolated throwaway profile,
//! the browser session lifecycle, console forwarding, network-idle
//! detection, and full-page screenshots.

mod chrome_finder;
mod console;
mod error;
mod idle;
mod profile;
mod screenshot;
mod session;

pub use chrome_finder::ChromeFinder;
pub use console::{ConsoleForwarder, ConsoleMessage};
pub use error::{Error, Result};
pub use idle::NetworkIdleWatcher;
pub use profile::EphemeralProfile;
pub use screenshot::capture_full_page;
pub use session::{BrowserSession, LaunchOptions};
