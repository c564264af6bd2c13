use serde::Serialize;
use std::time::Duration;

use super::classifier::{DriverIcon, DriverStatusClassifier};
use super::clock::{CancelToken, Clock, Sleeper};
use super::display;
use super::geocode::Geocoder;
use super::models::{DriverLocationSnapshot, Order};
use super::DriverLocationSource;
use crate::geo::{Coordinate, MapView};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    Loading,
    Displaying,
    Updating,
    /// No usable first fix. Nothing is polled.
    Unavailable,
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DriverMarker {
    pub position: Coordinate,
    pub icon: DriverIcon,
    pub popup: String,
    pub driver_name: Option<String>,
    pub last_location_update: Option<String>,
}

/// Collaborators shared by every session of a board.
pub struct TrackingContext<'a> {
    pub locations: &'a dyn DriverLocationSource,
    pub classifier: &'a DriverStatusClassifier,
    pub geocoder: &'a Geocoder,
    pub clock: &'a dyn Clock,
}

/// Live view of one order's driver.
#[derive(Debug, Clone)]
pub struct TrackingSession {
    order_id: String,
    route_id: String,
    destination_address: Option<String>,
    phase: SessionPhase,
    marker: Option<DriverMarker>,
    destination: Option<Coordinate>,
    view: Option<MapView>,
    refreshes: u32,
    token: CancelToken,
}

impl TrackingSession {
    /// `None` for orders without a live driver to follow.
    pub fn for_order(order: &Order, token: CancelToken) -> Option<Self> {
        let route_id = order.tracked_route()?.to_string();
        Some(Self {
            order_id: order.order_id.clone(),
            route_id,
            destination_address: order.recipient_address.clone(),
            phase: SessionPhase::Loading,
            marker: None,
            destination: None,
            view: None,
            refreshes: 0,
            token,
        })
    }

    pub fn order_id(&self) -> &str {
        &self.order_id
    }

    pub fn route_id(&self) -> &str {
        &self.route_id
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn marker(&self) -> Option<&DriverMarker> {
        self.marker.as_ref()
    }

    pub fn icon(&self) -> Option<DriverIcon> {
        self.marker.as_ref().map(|m| m.icon)
    }

    pub fn destination(&self) -> Option<Coordinate> {
        self.destination
    }

    pub fn view(&self) -> Option<MapView> {
        self.view
    }

    pub fn refreshes(&self) -> u32 {
        self.refreshes
    }

    pub fn token(&self) -> &CancelToken {
        &self.token
    }

    /// Line shown above the map.
    pub fn status_line(&self, now_ms: u64) -> String {
        match (self.phase, &self.marker) {
            (SessionPhase::Unavailable, _) => "Location temporarily unavailable".to_string(),
            (_, Some(marker)) => match marker.last_location_update.as_deref() {
                Some(ts) => format!("Location updated {}", display::time_ago(ts, now_ms)),
                None => "Location update time unknown".to_string(),
            },
            (_, None) => "Fetching location...".to_string(),
        }
    }

    fn observe_cancel(&mut self) -> bool {
        if self.token.is_cancelled() {
            self.phase = SessionPhase::Cancelled;
        }
        self.phase == SessionPhase::Cancelled
    }

    /// First fix: marker, destination and map framing.
    pub async fn load(&mut self, ctx: &TrackingContext<'_>) -> SessionPhase {
        if self.observe_cancel() {
            return self.phase;
        }
        self.phase = SessionPhase::Loading;

        let snapshot = match ctx.locations.driver_location(&self.route_id).await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                log_error!("Driver location for order {} failed: {:#}", self.order_id, e);
                self.phase = SessionPhase::Unavailable;
                return self.phase;
            }
        };

        if !self.apply(&snapshot, ctx).await {
            log_info!("No position yet for order {}", self.order_id);
            self.phase = SessionPhase::Unavailable;
            return self.phase;
        }

        if let Some(address) = self.destination_address.as_deref() {
            self.destination = ctx.geocoder.locate(address).await;
        }
        if let Some(marker) = &self.marker {
            self.view = Some(MapView::frame(marker.position, self.destination));
        }

        if !self.observe_cancel() {
            self.phase = SessionPhase::Displaying;
        }
        self.phase
    }

    /// One poll tick. Failures keep the previous marker. Returns whether it moved.
    pub async fn refresh(&mut self, ctx: &TrackingContext<'_>) -> bool {
        if self.observe_cancel() || self.phase != SessionPhase::Displaying {
            return false;
        }
        self.phase = SessionPhase::Updating;
        self.refreshes += 1;

        let updated = match ctx.locations.driver_location(&self.route_id).await {
            Ok(snapshot) => self.apply(&snapshot, ctx).await,
            Err(e) => {
                log_error!("Refreshing order {} failed: {:#}", self.order_id, e);
                false
            }
        };

        if !self.observe_cancel() {
            self.phase = SessionPhase::Displaying;
        }
        updated
    }

    async fn apply(&mut self, snapshot: &DriverLocationSnapshot, ctx: &TrackingContext<'_>) -> bool {
        let Some(position) = snapshot.position() else {
            return false;
        };

        let icon = ctx
            .classifier
            .classify(
                position,
                snapshot.recent_delivery_performance.as_ref(),
                ctx.clock.now_ms(),
            )
            .await;

        self.marker = Some(DriverMarker {
            position,
            icon,
            popup: display::popup_text(
                snapshot.driver_name.as_deref(),
                snapshot.last_location_update.as_deref(),
            ),
            driver_name: snapshot.driver_name.clone(),
            last_location_update: snapshot.last_location_update.clone(),
        });
        true
    }
}

/// Loads the session, then refreshes it every `interval` until its token is cancelled.
///
/// Ticks follow the wall clock: time spent refreshing is taken off the next
/// wait, and ticks missed during a slow refresh are skipped.
pub async fn run(
    session: &mut TrackingSession,
    ctx: &TrackingContext<'_>,
    sleeper: &dyn Sleeper,
    interval: Duration,
) -> SessionPhase {
    if session.load(ctx).await != SessionPhase::Displaying {
        return session.phase();
    }

    let interval_ms = (interval.as_millis() as u64).max(1);
    let mut next_tick = ctx.clock.now_ms() + interval_ms;

    loop {
        let wait = next_tick.saturating_sub(ctx.clock.now_ms());
        sleeper.sleep(Duration::from_millis(wait)).await;

        if session.observe_cancel() {
            log_info!("Stopped polling order {}", session.order_id());
            break;
        }

        session.refresh(ctx).await;

        let now = ctx.clock.now_ms();
        next_tick += interval_ms;
        while next_tick <= now {
            next_tick += interval_ms;
        }
    }

    session.phase()
}
