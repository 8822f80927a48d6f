//! Network-idle detection.
//!
//! A page is idle once no request has been in flight for the settling window.
//! Request lifecycles come from the DevTools `Network` domain.

use std::collections::HashSet;
use std::time::Duration;

use chromiumoxide::cdp::browser_protocol::network::{
    EnableParams, EventLoadingFailed, EventLoadingFinished, EventRequestWillBeSent,
};
use chromiumoxide::Page;
use futures::stream::{self, Stream, StreamExt};
use tokio::time::Instant;
use tracing::debug;

use crate::error::CaptureResult;

/// A request lifecycle change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NetworkEvent {
    Started(String),
    Finished(String),
}

/// Tracks in-flight requests and the time the page last went quiet.
#[derive(Debug, Clone)]
pub struct NetworkIdleTracker {
    in_flight: HashSet<String>,
    quiet_since: Option<Instant>,
    window: Duration,
}

impl NetworkIdleTracker {
    /// Start tracking with no requests in flight as of `now`.
    pub fn new(window: Duration, now: Instant) -> Self {
        Self {
            in_flight: HashSet::new(),
            quiet_since: Some(now),
            window,
        }
    }

    pub fn on_event(&mut self, event: NetworkEvent, now: Instant) {
        match event {
            NetworkEvent::Started(id) => {
                // redirects reuse the request id
                self.in_flight.insert(id);
                self.quiet_since = None;
            }
            NetworkEvent::Finished(id) => {
                if self.in_flight.remove(&id) && self.in_flight.is_empty() {
                    self.quiet_since = Some(now);
                }
            }
        }
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }

    /// Instant at which the page counts as idle, if nothing else starts.
    pub fn idle_at(&self) -> Option<Instant> {
        self.quiet_since.map(|since| since + self.window)
    }

    pub fn is_idle(&self, now: Instant) -> bool {
        self.idle_at().is_some_and(|at| now >= at)
    }
}

/// Subscribe to request lifecycle events on `page`.
///
/// Subscribe before navigating so the document request itself is seen.
pub async fn network_events(page: &Page) -> CaptureResult<impl Stream<Item = NetworkEvent>> {
    page.execute(EnableParams::default()).await?;

    let started = page
        .event_listener::<EventRequestWillBeSent>()
        .await?
        .map(|e| NetworkEvent::Started(e.request_id.inner().clone()));
    let finished = page
        .event_listener::<EventLoadingFinished>()
        .await?
        .map(|e| NetworkEvent::Finished(e.request_id.inner().clone()));
    let failed = page
        .event_listener::<EventLoadingFailed>()
        .await?
        .map(|e| NetworkEvent::Finished(e.request_id.inner().clone()));

    Ok(stream::select(started, stream::select(finished, failed)))
}

/// Wait until `events` shows no requests in flight for `window`.
///
/// Returns when the stream ends as well, since no further requests can be
/// observed. The caller bounds the wait.
pub async fn wait_for_idle<S>(events: S, window: Duration)
where
    S: Stream<Item = NetworkEvent>,
{
    let mut events = Box::pin(events);
    let mut tracker = NetworkIdleTracker::new(window, Instant::now());

    loop {
        let idle_at = tracker.idle_at();
        tokio::select! {
            event = events.next() => match event {
                Some(event) => tracker.on_event(event, Instant::now()),
                None => return,
            },
            _ = sleep_until(idle_at), if idle_at.is_some() => {
                debug!("Network idle for {:?}", window);
                return;
            }
        }
    }
}

async fn sleep_until(at: Option<Instant>) {
    if let Some(at) = at {
        tokio::time::sleep_until(at).await;
    }
}
