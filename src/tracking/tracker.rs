use std::cell::RefCell;
use std::time::Duration;

use super::board::{search_orders, SearchOutcome, TrackingBoard};
use super::classifier::DriverStatusClassifier;
use super::client::TrackApiClient;
use super::clock::{Clock, Sleeper, WorkerClock, WorkerSleeper};
use super::geocode::Geocoder;
use super::models::Order;
use super::session::{self, SessionPhase, TrackingContext, TrackingSession};
use super::POLL_INTERVAL_SECS;

/// Widget-side entry point wired against a deployed proxy.
///
/// Every method takes `&self` so one tracker can drive several sessions at
/// once on a single-threaded runtime.
pub struct Tracker {
    client: TrackApiClient,
    classifier: DriverStatusClassifier,
    geocoder: Geocoder,
    clock: Box<dyn Clock>,
    sleeper: Box<dyn Sleeper>,
    board: RefCell<TrackingBoard>,
    interval: Duration,
}

impl Tracker {
    pub fn new(proxy_base_url: &str) -> Self {
        Self::with_runtime(
            proxy_base_url,
            Box::new(WorkerClock),
            Box::new(WorkerSleeper),
            Duration::from_secs(POLL_INTERVAL_SECS),
        )
    }

    pub fn with_runtime(
        proxy_base_url: &str,
        clock: Box<dyn Clock>,
        sleeper: Box<dyn Sleeper>,
        interval: Duration,
    ) -> Self {
        let client = TrackApiClient::new(proxy_base_url);
        Self {
            classifier: DriverStatusClassifier::new(Box::new(client.clone())),
            geocoder: Geocoder::standard(client.base_url()),
            client,
            clock,
            sleeper,
            board: RefCell::new(TrackingBoard::new()),
            interval,
        }
    }

    pub async fn search(&self, raw_phone: &str) -> SearchOutcome {
        search_orders(&self.client, raw_phone).await
    }

    /// Cancels the previous search's sessions and opens one per trackable order.
    pub fn start(&self, orders: &[Order]) -> Vec<TrackingSession> {
        self.board.borrow_mut().start(orders)
    }

    /// Polls `session` until its token is cancelled.
    pub async fn follow(&self, session: &mut TrackingSession) -> SessionPhase {
        let ctx = TrackingContext {
            locations: &self.client,
            classifier: &self.classifier,
            geocoder: &self.geocoder,
            clock: self.clock.as_ref(),
        };
        session::run(session, &ctx, self.sleeper.as_ref(), self.interval).await
    }

    pub fn reset(&self) {
        self.board.borrow_mut().reset();
    }

    pub fn tracked_orders(&self) -> Vec<String> {
        self.board
            .borrow()
            .tracked_orders()
            .into_iter()
            .map(str::to_string)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracking::models::DisplayStatus;
    use crate::tracking::session::tests::{order, ManualClock};
    use async_trait::async_trait;
    use std::cell::Cell;

    struct NoSleep;

    #[async_trait(?Send)]
    impl Sleeper for NoSleep {
        async fn sleep(&self, _duration: Duration) {}
    }

    fn tracker() -> Tracker {
        Tracker::with_runtime(
            "http://127.0.0.1:9",
            Box::new(ManualClock(Cell::new(0))),
            Box::new(NoSleep),
            Duration::from_secs(POLL_INTERVAL_SECS),
        )
    }

    #[tokio::test]
    async fn test_invalid_phone_never_reaches_the_proxy() {
        assert_eq!(
            tracker().search("").await,
            SearchOutcome::Invalid("phone number is required")
        );
    }

    #[tokio::test]
    async fn test_reset_stops_started_sessions() {
        let tracker = tracker();
        let mut sessions = tracker.start(&[
            order("1", DisplayStatus::InTransit, Some("R-1")),
            order("2", DisplayStatus::Received, None),
        ]);
        assert_eq!(tracker.tracked_orders(), vec!["1".to_string()]);

        tracker.reset();
        assert!(tracker.tracked_orders().is_empty());

        // A cancelled session ends before any request is made.
        let phase = tracker.follow(&mut sessions[0]).await;
        assert_eq!(phase, SessionPhase::Cancelled);
    }
}
