use worker::*;

#[macro_use]
pub mod logger;

pub mod auth;
pub mod config;
pub mod cors;
pub mod error;
pub mod geo;
pub mod handlers;
pub mod objects;
pub mod routes;
pub mod tracking;
pub mod weather;

// Re-export the durable object so it's accessible to the worker runtime
pub use objects::driver_status::DriverStatusObject;

use config::Config;
use error::ApiError;
use routes::Route;

#[event(start)]
fn start() {
    console_error_panic_hook::set_once();
}

#[event(fetch)]
async fn fetch(
    req: HttpRequest,
    env: Env,
    _ctx: Context,
) -> Result<HttpResponse> {
    // Convert HttpRequest to worker::Request using try_from
    let mut worker_req = Request::try_from(req)?;

    let config = Config::from_env(&env);

    // X-Log-Level header overrides the configured level for this request
    let log_level = logger::LogLevel::resolve(
        worker_req.headers().get("X-Log-Level")?.as_deref(),
        config.log_level,
    );

    let url = worker_req.url()?;
    let path = url.path().to_string();
    let method = worker_req.method();
    log_info!("{:?} {}", method, path);

    let route = Route::parse(&method, &path);
    log_debug!(log_level, "Resolved route: {:?}", route);

    let response = match route {
        Route::Preflight => cors::preflight(),
        Route::Status => {
            let timestamp = chrono::DateTime::from_timestamp_millis(Date::now().as_millis() as i64)
                .map(|now| now.to_rfc3339())
                .unwrap_or_default();
            cors::json(&handlers::process_status(&config, log_level, &timestamp), 200)
        }
        Route::TrackOrder => {
            let body = worker_req.text().await?;
            respond(handlers::process_track_order(&config, &body, log_level).await)
        }
        Route::DriverLocation(route_id) => {
            respond(handlers::process_driver_location(&config, &route_id, log_level).await)
        }
        Route::DriverStatus(_) => route_to_driver_status(&env, &path, log_level).await,
        Route::Weather(segments) => {
            match handlers::process_weather(&config, segments.as_ref(), log_level).await {
                Ok(report) => cors::json_cached(&report, 200, report.cache_control()),
                Err(e) => cors::error(&e),
            }
        }
        Route::MapsScriptUrl => respond(handlers::process_maps_script_url(&config)),
        Route::MapsService(service) => {
            let params: Vec<(String, String)> = url
                .query_pairs()
                .map(|(k, v)| (k.into_owned(), v.into_owned()))
                .collect();
            respond(handlers::process_maps_service(&config, &service, &params, log_level).await)
        }
        Route::NotFound => {
            log_info!("No route for {:?} {}", method, path);
            cors::error(&ApiError::NotFound(path.clone()))
        }
    };

    response?.try_into()
}

fn respond(outcome: std::result::Result<serde_json::Value, ApiError>) -> Result<Response> {
    match outcome {
        Ok(body) => cors::json(&body, 200),
        Err(e) => {
            log_error!("Request failed ({}): {}", e.status(), e);
            cors::error(&e)
        }
    }
}

/// Forward a driver status lookup to the durable object that owns the weather cache
async fn route_to_driver_status(
    env: &Env,
    path: &str,
    log_level: logger::LogLevel,
) -> Result<Response> {
    use objects::driver_status::{BINDING, INSTANCE};

    log_debug!(log_level, "Routing {} to {} ({})", path, BINDING, INSTANCE);

    // Get the Durable Object namespace and the single named instance
    let namespace = env.durable_object(BINDING)?;
    let stub = namespace.id_from_name(INSTANCE)?.get_stub()?;

    // Create internal request URL preserving the path
    let internal_url = format!("http://internal{}", path);

    let headers = Headers::new();
    headers.set("X-Log-Level", log_level.as_header())?;

    let mut init = RequestInit::new();
    init.method = Method::Get;
    init.headers = headers;

    let do_request = Request::new_with_init(&internal_url, &init)?;

    stub.fetch_with_request(do_request).await
}
