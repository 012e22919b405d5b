// CORS: one allowed origin, credentialed requests, GET/POST/OPTIONS.
// Allow-methods and allow-headers are also stamped on ordinary responses,
// not only on preflights.

use anyhow::{Context, Result};
use axum::{
    http::{
        header::{
            ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS, AUTHORIZATION, CONTENT_TYPE,
        },
        HeaderValue, Method,
    },
    Router,
};
use std::time::Duration;
use tower_http::{cors::CorsLayer, set_header::SetResponseHeaderLayer};

const ALLOWED_METHODS: &str = "GET, POST, OPTIONS";
const ALLOWED_HEADERS: &str = "Content-Type, Authorization";
const PREFLIGHT_MAX_AGE: Duration = Duration::from_secs(86_400);

pub fn cors_layer(allowed_origin: &str) -> Result<CorsLayer> {
    let origin = HeaderValue::from_str(allowed_origin)
        .with_context(|| format!("invalid CORS origin {allowed_origin:?}"))?;

    Ok(CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
        .allow_credentials(true)
        .max_age(PREFLIGHT_MAX_AGE))
}

pub fn apply_cors<S>(router: Router<S>, allowed_origin: &str) -> Result<Router<S>>
where
    S: Clone + Send + Sync + 'static,
{
    Ok(router
        .layer(SetResponseHeaderLayer::if_not_present(
            ACCESS_CONTROL_ALLOW_METHODS,
            HeaderValue::from_static(ALLOWED_METHODS),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            ACCESS_CONTROL_ALLOW_HEADERS,
            HeaderValue::from_static(ALLOWED_HEADERS),
        ))
        .layer(cors_layer(allowed_origin)?))
}
