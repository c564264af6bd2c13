use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::geo::Coordinate;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DisplayStatus {
    Received,
    Processed,
    Assigned,
    Scheduled,
    InTransit,
    Delivered,
    Failed,
    Other(String),
}

impl DisplayStatus {
    pub fn from_label(label: &str) -> Self {
        match label {
            "订单已接收" => DisplayStatus::Received,
            "订单已处理" => DisplayStatus::Processed,
            "已分配配送" => DisplayStatus::Assigned,
            "配送已安排" => DisplayStatus::Scheduled,
            "正在配送" => DisplayStatus::InTransit,
            "配送完成" => DisplayStatus::Delivered,
            "配送失败" => DisplayStatus::Failed,
            other => DisplayStatus::Other(other.to_string()),
        }
    }

    /// The upstream string this status was read from.
    pub fn label(&self) -> &str {
        match self {
            DisplayStatus::Received => "订单已接收",
            DisplayStatus::Processed => "订单已处理",
            DisplayStatus::Assigned => "已分配配送",
            DisplayStatus::Scheduled => "配送已安排",
            DisplayStatus::InTransit => "正在配送",
            DisplayStatus::Delivered => "配送完成",
            DisplayStatus::Failed => "配送失败",
            DisplayStatus::Other(label) => label,
        }
    }

    pub fn badge(&self) -> StatusBadge {
        let (icon, color) = match self {
            DisplayStatus::Received => ("bi-clock", "secondary"),
            DisplayStatus::Processed => ("bi-gear", "success"),
            DisplayStatus::Assigned | DisplayStatus::Scheduled => ("bi-calendar-check", "warning"),
            DisplayStatus::InTransit => ("bi-truck", "primary"),
            DisplayStatus::Delivered => ("bi-check-circle", "success"),
            DisplayStatus::Failed => ("bi-x-circle", "danger"),
            DisplayStatus::Other(_) => ("bi-info-circle", "secondary"),
        };
        StatusBadge {
            text: self.label().to_string(),
            icon,
            color,
        }
    }

    /// A driver is on the road for this order, so its position is worth polling.
    pub fn has_live_driver(&self) -> bool {
        matches!(self, DisplayStatus::Assigned | DisplayStatus::InTransit)
    }
}

impl Serialize for DisplayStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

impl<'de> Deserialize<'de> for DisplayStatus {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s: String = Deserialize::deserialize(deserializer)?;
        Ok(DisplayStatus::from_label(&s))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusBadge {
    pub text: String,
    pub icon: &'static str,
    pub color: &'static str,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DriverInfo {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    #[serde(deserialize_with = "de_id")]
    pub order_id: String,
    #[serde(default)]
    pub recipient_name: Option<String>,
    #[serde(default)]
    pub recipient_address: Option<String>,
    #[serde(default)]
    pub recipient_suburb: Option<String>,
    pub display_status: DisplayStatus,
    #[serde(default)]
    pub estimated_arrival_time: Option<String>,
    #[serde(default)]
    pub actual_arrival_time: Option<String>,
    #[serde(default)]
    pub driver_info: Option<DriverInfo>,
    #[serde(default, deserialize_with = "de_opt_id")]
    pub route_id: Option<String>,
    #[serde(default)]
    pub order_note: Option<String>,
}

impl Order {
    /// Route to poll, when the order has a live driver and a route to ask about.
    pub fn tracked_route(&self) -> Option<&str> {
        if !self.display_status.has_live_driver() {
            return None;
        }
        self.route_id.as_deref().filter(|r| !r.is_empty())
    }

    /// Street address with the suburb appended, as shown on the order card.
    pub fn address_line(&self) -> Option<String> {
        let address = self.recipient_address.as_deref().filter(|a| !a.is_empty())?;
        Some(match self.recipient_suburb.as_deref().filter(|s| !s.is_empty()) {
            Some(suburb) => format!("{}, {}", address, suburb),
            None => address.to_string(),
        })
    }
}

/// Body of `POST /track-order`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackOrderResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub orders: Vec<Order>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct DeliveryPerformance {
    #[serde(default, deserialize_with = "de_opt_f64")]
    pub last_completed_order_delay_minutes: Option<f64>,
}

/// Body of `GET /driver-location/{routeId}`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DriverLocationSnapshot {
    #[serde(default, deserialize_with = "de_opt_f64")]
    pub current_latitude: Option<f64>,
    #[serde(default, deserialize_with = "de_opt_f64")]
    pub current_longitude: Option<f64>,
    #[serde(default)]
    pub driver_name: Option<String>,
    #[serde(default)]
    pub last_location_update: Option<String>,
    #[serde(default)]
    pub recent_delivery_performance: Option<DeliveryPerformance>,
}

impl DriverLocationSnapshot {
    /// Both coordinates present and finite, otherwise the location is unavailable.
    pub fn position(&self) -> Option<Coordinate> {
        match (self.current_latitude, self.current_longitude) {
            (Some(lat), Some(lng)) if lat.is_finite() && lng.is_finite() => {
                Some(Coordinate::new(lat, lng))
            }
            _ => None,
        }
    }

    pub fn delay_minutes(&self) -> Option<f64> {
        self.recent_delivery_performance
            .and_then(|p| p.last_completed_order_delay_minutes)
    }
}

/// Phone number as typed by the customer: digits, `-`, `+`, whitespace and parentheses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct PhoneNumber(String);

impl PhoneNumber {
    pub fn parse(raw: &str) -> Result<Self, &'static str> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err("phone number is required");
        }
        let valid = trimmed
            .chars()
            .all(|c| c.is_ascii_digit() || c.is_whitespace() || matches!(c, '-' | '+' | '(' | ')'));
        if !valid {
            return Err("phone number contains invalid characters");
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Flexible {
    Number(f64),
    Text(String),
}

fn de_opt_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<Flexible> = Option::deserialize(deserializer)?;
    Ok(match value {
        Some(Flexible::Number(n)) => Some(n),
        Some(Flexible::Text(s)) => s.trim().parse::<f64>().ok(),
        None => None,
    })
}

#[derive(Deserialize)]
#[serde(untagged)]
enum FlexibleId {
    Int(i64),
    Text(String),
}

impl From<FlexibleId> for String {
    fn from(id: FlexibleId) -> Self {
        match id {
            FlexibleId::Int(n) => n.to_string(),
            FlexibleId::Text(s) => s,
        }
    }
}

fn de_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    FlexibleId::deserialize(deserializer).map(String::from)
}

fn de_opt_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<FlexibleId> = Option::deserialize(deserializer)?;
    Ok(value.map(String::from))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_order_from_upstream_json() {
        let order: Order = serde_json::from_value(json!({
            "order_id": 1042,
            "recipient_name": "Li Wei",
            "recipient_address": "12 Queen St",
            "recipient_suburb": "Brisbane City",
            "display_status": "正在配送",
            "estimated_arrival_time": "2024-05-01T10:30:00+10:00",
            "driver_info": { "name": "Sam", "phone": "0400 000 000" },
            "route_id": 77
        }))
        .unwrap();

        assert_eq!(order.order_id, "1042");
        assert_eq!(order.route_id.as_deref(), Some("77"));
        assert_eq!(order.display_status, DisplayStatus::InTransit);
        assert_eq!(order.tracked_route(), Some("77"));
        assert_eq!(order.address_line().as_deref(), Some("12 Queen St, Brisbane City"));
    }

    #[test]
    fn test_untracked_orders() {
        let delivered: Order = serde_json::from_value(json!({
            "order_id": "A1", "display_status": "配送完成", "route_id": "R1"
        }))
        .unwrap();
        assert_eq!(delivered.tracked_route(), None);

        let no_route: Order = serde_json::from_value(json!({
            "order_id": "A2", "display_status": "已分配配送", "route_id": null
        }))
        .unwrap();
        assert_eq!(no_route.tracked_route(), None);
    }

    #[test]
    fn test_unknown_status_keeps_label() {
        let status = DisplayStatus::from_label("等待取货");
        assert_eq!(status, DisplayStatus::Other("等待取货".into()));
        let badge = status.badge();
        assert_eq!(badge.text, "等待取货");
        assert_eq!(badge.icon, "bi-info-circle");
        assert_eq!(badge.color, "secondary");

        assert_eq!(DisplayStatus::InTransit.badge().icon, "bi-truck");
        assert_eq!(serde_json::to_value(DisplayStatus::Failed).unwrap(), json!("配送失败"));
    }

    #[test]
    fn test_location_accepts_string_coordinates() {
        let snapshot: DriverLocationSnapshot = serde_json::from_value(json!({
            "current_latitude": "-27.4698",
            "current_longitude": 153.0251,
            "driver_name": "Sam",
            "last_location_update": "2024-05-01T10:00:00Z",
            "recent_delivery_performance": { "last_completed_order_delay_minutes": 22 }
        }))
        .unwrap();

        assert_eq!(snapshot.position(), Some(Coordinate::new(-27.4698, 153.0251)));
        assert_eq!(snapshot.delay_minutes(), Some(22.0));
    }

    #[test]
    fn test_location_unavailable() {
        let snapshot: DriverLocationSnapshot =
            serde_json::from_value(json!({ "current_latitude": null, "driver_name": "Sam" })).unwrap();
        assert_eq!(snapshot.position(), None);
        assert_eq!(snapshot.delay_minutes(), None);

        let garbage: DriverLocationSnapshot = serde_json::from_value(json!({
            "current_latitude": "n/a", "current_longitude": "153.0"
        }))
        .unwrap();
        assert_eq!(garbage.position(), None);
    }

    #[test]
    fn test_phone_validation() {
        assert_eq!(PhoneNumber::parse(" +61 (04) 1234-5678 ").unwrap().as_str(), "+61 (04) 1234-5678");
        assert!(PhoneNumber::parse("   ").is_err());
        assert!(PhoneNumber::parse("0412abc").is_err());
        assert_eq!(PhoneNumber::parse("0412\t345\u{a0}678").unwrap().as_str(), "0412\t345\u{a0}678");
        assert!(PhoneNumber::parse("()-+").is_ok());
    }
}
