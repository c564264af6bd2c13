use super::clock::CancelToken;
use super::models::{Order, PhoneNumber};
use super::session::TrackingSession;
use super::OrderSource;
use crate::logger::phone_fingerprint;

const NO_RESULTS_MESSAGE: &str = "No matching orders found";
const NETWORK_ERROR_MESSAGE: &str = "Network error, please try again later";

#[derive(Debug, Clone, PartialEq)]
pub enum SearchOutcome {
    Found(Vec<Order>),
    NoResults(String),
    Invalid(&'static str),
    Failed(String),
}

/// Validates the phone number and looks up its orders.
pub async fn search_orders(orders: &dyn OrderSource, raw_phone: &str) -> SearchOutcome {
    let phone = match PhoneNumber::parse(raw_phone) {
        Ok(phone) => phone,
        Err(reason) => return SearchOutcome::Invalid(reason),
    };

    log_info!("Order lookup for phone {}", phone_fingerprint(phone.as_str()));

    match orders.track_order(&phone).await {
        Ok(response) if response.success && !response.orders.is_empty() => {
            SearchOutcome::Found(response.orders)
        }
        Ok(response) => SearchOutcome::NoResults(
            response
                .message
                .or(response.error)
                .unwrap_or_else(|| NO_RESULTS_MESSAGE.to_string()),
        ),
        Err(e) => {
            log_error!("Order lookup failed: {:#}", e);
            SearchOutcome::Failed(NETWORK_ERROR_MESSAGE.to_string())
        }
    }
}

/// Sessions started by the current search. Starting a new set, or resetting,
/// cancels every session of the previous one.
#[derive(Debug, Default)]
pub struct TrackingBoard {
    tokens: Vec<(String, CancelToken)>,
}

impl TrackingBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// One session per trackable order, each with a fresh token owned by this board.
    pub fn start(&mut self, orders: &[Order]) -> Vec<TrackingSession> {
        self.reset();

        orders
            .iter()
            .filter_map(|order| {
                let token = CancelToken::new();
                let session = TrackingSession::for_order(order, token.clone())?;
                self.tokens.push((order.order_id.clone(), token));
                Some(session)
            })
            .collect()
    }

    /// Cancels every running session ("new search").
    pub fn reset(&mut self) {
        for (order_id, token) in self.tokens.drain(..) {
            log_info!("Cancelling tracking for order {}", order_id);
            token.cancel();
        }
    }

    pub fn tracked_orders(&self) -> Vec<&str> {
        self.tokens.iter().map(|(id, _)| id.as_str()).collect()
    }
}

impl Drop for TrackingBoard {
    fn drop(&mut self) {
        self.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracking::models::{DisplayStatus, TrackOrderResponse};
    use crate::tracking::session::tests::order;
    use async_trait::async_trait;

    struct CannedOrders(Option<TrackOrderResponse>);

    #[async_trait(?Send)]
    impl OrderSource for CannedOrders {
        async fn track_order(&self, _phone: &PhoneNumber) -> anyhow::Result<TrackOrderResponse> {
            self.0.clone().ok_or_else(|| anyhow::anyhow!("connection reset"))
        }
    }

    fn orders() -> Vec<Order> {
        vec![
            order("1", DisplayStatus::InTransit, Some("R-1")),
            order("2", DisplayStatus::Delivered, Some("R-2")),
            order("3", DisplayStatus::Assigned, Some("R-3")),
        ]
    }

    #[test]
    fn test_start_tracks_live_orders_only() {
        let mut board = TrackingBoard::new();
        let sessions = board.start(&orders());
        let ids: Vec<&str> = sessions.iter().map(|s| s.order_id()).collect();
        assert_eq!(ids, vec!["1", "3"]);
        assert_eq!(board.tracked_orders(), vec!["1", "3"]);
    }

    #[test]
    fn test_new_start_cancels_previous_sessions() {
        let mut board = TrackingBoard::new();
        let first = board.start(&orders());
        assert!(first.iter().all(|s| !s.token().is_cancelled()));

        let second = board.start(&orders());
        assert!(first.iter().all(|s| s.token().is_cancelled()));
        assert!(second.iter().all(|s| !s.token().is_cancelled()));

        board.reset();
        assert!(second.iter().all(|s| s.token().is_cancelled()));
        assert!(board.tracked_orders().is_empty());
    }

    #[test]
    fn test_dropping_board_cancels_sessions() {
        let sessions = {
            let mut board = TrackingBoard::new();
            board.start(&orders())
        };
        assert!(sessions.iter().all(|s| s.token().is_cancelled()));
    }

    #[tokio::test]
    async fn test_search_outcomes() {
        assert_eq!(
            search_orders(&CannedOrders(None), "abc").await,
            SearchOutcome::Invalid("phone number contains invalid characters")
        );

        assert_eq!(
            search_orders(&CannedOrders(None), "0412 345 678").await,
            SearchOutcome::Failed(NETWORK_ERROR_MESSAGE.to_string())
        );

        let empty = TrackOrderResponse {
            success: true,
            orders: vec![],
            message: Some("No active deliveries".into()),
            error: None,
        };
        assert_eq!(
            search_orders(&CannedOrders(Some(empty)), "0412 345 678").await,
            SearchOutcome::NoResults("No active deliveries".into())
        );

        let found = TrackOrderResponse {
            success: true,
            orders: orders(),
            message: None,
            error: None,
        };
        match search_orders(&CannedOrders(Some(found)), "0412 345 678").await {
            SearchOutcome::Found(list) => assert_eq!(list.len(), 3),
            other => panic!("unexpected outcome {:?}", other),
        }
    }
}
