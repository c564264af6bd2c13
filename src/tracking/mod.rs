//! Order tracking: search, per-order driver polling and marker state.
//!
//! A [`board::TrackingBoard`] owns the cancellation tokens of every session it
//! started, so a new search stops the previous polling loops. Each
//! [`session::TrackingSession`] holds the marker for one order and is driven by
//! [`session::run`] until its token is cancelled. [`tracker::Tracker`] wires
//! both against a deployed proxy.

pub mod board;
pub mod classifier;
pub mod client;
pub mod clock;
pub mod display;
pub mod geocode;
pub mod models;
pub mod session;
pub mod tracker;

use async_trait::async_trait;

use models::{DriverLocationSnapshot, PhoneNumber, TrackOrderResponse};

pub use classifier::{DriverIcon, DriverStatusClassifier};
pub use clock::{CancelToken, Clock, Sleeper};
pub use tracker::Tracker;

/// Polling interval for driver positions.
pub const POLL_INTERVAL_SECS: u64 = 30;

#[async_trait(?Send)]
pub trait DriverLocationSource {
    async fn driver_location(&self, route_id: &str) -> anyhow::Result<DriverLocationSnapshot>;
}

#[async_trait(?Send)]
pub trait OrderSource {
    async fn track_order(&self, phone: &PhoneNumber) -> anyhow::Result<TrackOrderResponse>;
}
