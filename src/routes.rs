use worker::Method;

pub const PUBLIC_ENDPOINTS: &[&str] = &[
    "GET /",
    "POST /track-order",
    "GET /driver-location/{route_id}",
    "GET /driver-status/{route_id}",
    "GET /weather/{lat}/{lng}",
    "GET /maps/js-api-url",
    "GET /maps/geocoding",
    "GET /maps/staticmap",
];

#[derive(Debug, Clone, PartialEq)]
pub enum Route {
    Preflight,
    Status,
    TrackOrder,
    /// Route id, empty when the path segment is missing.
    DriverLocation(String),
    DriverStatus(String),
    /// Raw path segments; validated by the weather handler.
    Weather(Option<(String, String)>),
    MapsScriptUrl,
    MapsService(String),
    NotFound,
}

impl Route {
    pub fn parse(method: &Method, path: &str) -> Self {
        if *method == Method::Options {
            return Route::Preflight;
        }

        let segments: Vec<&str> = path.split('/').skip(1).collect();

        match (method, segments.as_slice()) {
            (_, [""]) | (_, []) => Route::Status,
            (Method::Post, ["track-order"]) => Route::TrackOrder,
            (Method::Get, ["driver-location", rest @ ..]) => {
                Route::DriverLocation(first_segment(rest))
            }
            (Method::Get, ["driver-status", rest @ ..]) => Route::DriverStatus(first_segment(rest)),
            (Method::Get, ["weather", lat, lng, ..]) => {
                Route::Weather(Some((lat.to_string(), lng.to_string())))
            }
            (Method::Get, ["weather", ..]) => Route::Weather(None),
            (Method::Get, ["maps", "js-api-url"]) => Route::MapsScriptUrl,
            (Method::Get, ["maps", service, ..]) => Route::MapsService(service.to_string()),
            _ => Route::NotFound,
        }
    }
}

fn first_segment(rest: &[&str]) -> String {
    rest.first().map(|s| s.trim().to_string()).unwrap_or_default()
}
