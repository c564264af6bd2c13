use serde::Serialize;
use worker::*;

pub const CORS_HEADERS: [(&str, &str); 3] = [
    ("Access-Control-Allow-Origin", "*"),
    ("Access-Control-Allow-Methods", "GET, POST, OPTIONS"),
    ("Access-Control-Allow-Headers", "Content-Type"),
];

pub const CACHE_FALLBACK: &str = "public, max-age=300";
pub const CACHE_WEATHER: &str = "public, max-age=1800";

fn cors_headers() -> Result<Headers> {
    let headers = Headers::new();
    for (name, value) in CORS_HEADERS {
        headers.set(name, value)?;
    }
    Ok(headers)
}

/// Empty 200 answer for `OPTIONS`.
pub fn preflight() -> Result<Response> {
    Ok(Response::empty()?.with_headers(cors_headers()?))
}

/// JSON response with CORS headers attached.
pub fn json<T: Serialize>(body: &T, status: u16) -> Result<Response> {
    let headers = cors_headers()?;
    headers.set("Content-Type", "application/json")?;
    Ok(Response::from_json(body)?
        .with_status(status)
        .with_headers(headers))
}

/// JSON response with CORS headers and an explicit `Cache-Control`.
pub fn json_cached<T: Serialize>(body: &T, status: u16, cache_control: &str) -> Result<Response> {
    let mut response = json(body, status)?;
    response.headers_mut().set("Cache-Control", cache_control)?;
    Ok(response)
}

pub fn error(err: &crate::error::ApiError) -> Result<Response> {
    json(&err.body(), err.status())
}
