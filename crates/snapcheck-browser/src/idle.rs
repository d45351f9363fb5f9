use std::collections::HashSet;
use std::time::Duration;

use chromiumoxide::cdp::browser_protocol::network::{
    EnableParams, EventLoadingFailed, EventLoadingFinished, EventRequestWillBeSent,
};
use chromiumoxide::Page;
use futures::stream::{self, BoxStream};
use futures::StreamExt;
use tokio::time::Instant;

use crate::{Error, Result};

/// Request lifecycle events, decoupled from the CDP types so the wait
/// loop can be driven by plain streams in tests.
#[derive(Debug, Clone)]
enum NetworkEvent {
    Started {
        request_id: String,
        method: String,
        url: String,
    },
    Finished {
        request_id: String,
    },
    Failed {
        request_id: String,
        error_text: String,
    },
}

/// Tracks which network requests are still in flight.
///
/// Pure bookkeeping, kept apart from the event stream so the idle
/// predicate can be tested without a browser.
#[derive(Debug, Default)]
struct InflightTracker {
    inflight: HashSet<String>,
}

impl InflightTracker {
    fn start(&mut self, request_id: String) {
        self.inflight.insert(request_id);
    }

    fn finish(&mut self, request_id: &str) {
        self.inflight.remove(request_id);
    }

    fn is_idle(&self) -> bool {
        self.inflight.is_empty()
    }

    fn pending(&self) -> usize {
        self.inflight.len()
    }
}

/// Watches page network traffic and resolves once it goes quiet.
///
/// Must be attached before navigation so requests fired during the
/// initial load are counted.
pub struct NetworkIdleWatcher {
    events: BoxStream<'static, NetworkEvent>,
    tracker: InflightTracker,
}

impl NetworkIdleWatcher {
    /// Enable the Network domain on the page and subscribe to request
    /// lifecycle events
    pub async fn attach(page: &Page) -> Result<Self> {
        // Network events only flow once the domain is enabled
        page.execute(EnableParams::default()).await?;

        let started = page
            .event_listener::<EventRequestWillBeSent>()
            .await?
            .map(|event| NetworkEvent::Started {
                request_id: event.request_id.inner().to_string(),
                method: event.request.method.clone(),
                url: event.request.url.clone(),
            });
        let finished = page
            .event_listener::<EventLoadingFinished>()
            .await?
            .map(|event| NetworkEvent::Finished {
                request_id: event.request_id.inner().to_string(),
            });
        let failed = page
            .event_listener::<EventLoadingFailed>()
            .await?
            .map(|event| NetworkEvent::Failed {
                request_id: event.request_id.inner().to_string(),
                error_text: event.error_text.clone(),
            });

        Ok(Self::from_events(
            stream::select(started, stream::select(finished, failed)).boxed(),
        ))
    }

    fn from_events(events: BoxStream<'static, NetworkEvent>) -> Self {
        Self {
            events,
            tracker: InflightTracker::default(),
        }
    }

    /// Block until no request has been in flight for `idle_window`.
    ///
    /// Returns `Error::IdleTimeout` if the network never settles before
    /// `deadline` elapses.
    pub async fn wait(mut self, idle_window: Duration, deadline: Duration) -> Result<()> {
        let hard_stop = Instant::now() + deadline;
        let mut last_activity = Instant::now();

        loop {
            let idle_at = last_activity + idle_window;
            let currently_idle = self.tracker.is_idle();

            tokio::select! {
                _ = tokio::time::sleep_until(idle_at), if currently_idle => {
                    tracing::debug!("Network idle after {:?} quiet window", idle_window);
                    return Ok(());
                }
                _ = tokio::time::sleep_until(hard_stop) => {
                    tracing::debug!(
                        "Idle deadline hit with {} request(s) still pending",
                        self.tracker.pending()
                    );
                    return Err(Error::IdleTimeout(deadline));
                }
                Some(event) = self.events.next() => {
                    match event {
                        NetworkEvent::Started { request_id, method, url } => {
                            // Data URLs resolve internally and never emit a
                            // loadingFinished, so they must not count as
                            // traffic.
                            if url.starts_with("data:") {
                                continue;
                            }
                            tracing::debug!("Request: {} {}", method, url);
                            self.tracker.start(request_id);
                        }
                        NetworkEvent::Finished { request_id } => {
                            tracing::debug!("Loading finished: {}", request_id);
                            self.tracker.finish(&request_id);
                        }
                        NetworkEvent::Failed { request_id, error_text } => {
                            tracing::debug!("Loading failed: {} ({})", request_id, error_text);
                            self.tracker.finish(&request_id);
                        }
                    }
                    last_activity = Instant::now();
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn started(request_id: &str, url: &str) -> NetworkEvent {
        NetworkEvent::Started {
            request_id: request_id.to_string(),
            method: "GET".to_string(),
            url: url.to_string(),
        }
    }

    fn finished(request_id: &str) -> NetworkEvent {
        NetworkEvent::Finished {
            request_id: request_id.to_string(),
        }
    }

    #[test]
    fn tracker_starts_idle() {
        let tracker = InflightTracker::default();
        assert!(tracker.is_idle());
        assert_eq!(tracker.pending(), 0);
    }

    #[test]
    fn tracker_counts_inflight_requests() {
        let mut tracker = InflightTracker::default();
        tracker.start("req-1".to_string());
        tracker.start("req-2".to_string());
        assert!(!tracker.is_idle());
        assert_eq!(tracker.pending(), 2);

        tracker.finish("req-1");
        assert!(!tracker.is_idle());

        tracker.finish("req-2");
        assert!(tracker.is_idle());
    }

    #[test]
    fn redirects_reuse_the_request_id() {
        // Chrome emits a second requestWillBeSent with the same id on
        // redirect; it must not be double-counted.
        let mut tracker = InflightTracker::default();
        tracker.start("req-1".to_string());
        tracker.start("req-1".to_string());
        assert_eq!(tracker.pending(), 1);

        tracker.finish("req-1");
        assert!(tracker.is_idle());
    }

    #[test]
    fn finishing_an_unknown_request_is_a_no_op() {
        let mut tracker = InflightTracker::default();
        tracker.finish("never-started");
        assert!(tracker.is_idle());
    }

    #[tokio::test(start_paused = true)]
    async fn quiet_network_resolves_after_the_idle_window() {
        let watcher = NetworkIdleWatcher::from_events(stream::pending().boxed());

        let begun = Instant::now();
        let result = watcher
            .wait(Duration::from_millis(500), Duration::from_secs(30))
            .await;

        assert!(result.is_ok());
        assert!(begun.elapsed() >= Duration::from_millis(500));
        assert!(begun.elapsed() < Duration::from_secs(30));
    }

    #[tokio::test(start_paused = true)]
    async fn a_request_that_never_finishes_times_out() {
        let events = stream::iter(vec![started("req-1", "http://localhost:5000/slow")])
            .chain(stream::pending())
            .boxed();
        let watcher = NetworkIdleWatcher::from_events(events);

        let result = watcher
            .wait(Duration::from_millis(500), Duration::from_secs(5))
            .await;

        assert!(matches!(result, Err(Error::IdleTimeout(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn a_finished_request_lets_the_network_go_idle() {
        let events = stream::iter(vec![
            started("req-1", "http://localhost:5000/cars-for-sale"),
            finished("req-1"),
        ])
        .chain(stream::pending())
        .boxed();
        let watcher = NetworkIdleWatcher::from_events(events);

        let result = watcher
            .wait(Duration::from_millis(500), Duration::from_secs(5))
            .await;

        assert!(result.is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn data_urls_do_not_hold_the_network_open() {
        let events = stream::iter(vec![started("req-1", "data:image/png;base64,AAAA")])
            .chain(stream::pending())
            .boxed();
        let watcher = NetworkIdleWatcher::from_events(events);

        let result = watcher
            .wait(Duration::from_millis(500), Duration::from_secs(5))
            .await;

        assert!(result.is_ok());
    }
}
