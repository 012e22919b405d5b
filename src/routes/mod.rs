//! API Routes
//!
//! Every endpoint is declared once in [`ROUTES`] with its visibility.
//! Protected entries get the [`require_auth`] route layer, so an
//! unauthenticated request is rejected before the handler (and any
//! collaborator it would call) runs.
//!
//! - `GET  /api/health`   - Health check (public)
//! - `POST /api/register` - Create an account (public)
//! - `POST /api/login`    - Exchange credentials for a token (public)
//! - `POST /api/upload`   - Upload an image (protected)
//! - `GET  /api/images`   - List own images (protected)
//! - `GET  /api/search`   - Search own images by tag (protected)
//! - `GET  /api/cart`     - List cart (protected)
//! - `POST /api/cart`     - Add an image to the cart (protected)

pub mod account;
pub mod cart;
pub mod health;
pub mod images;

use anyhow::Result;
use axum::{
    extract::DefaultBodyLimit,
    http::Method,
    middleware::from_fn_with_state,
    response::IntoResponse,
    routing::{on, MethodFilter, MethodRouter},
    Router,
};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::middleware::{apply_cors, require_auth};
use crate::models::AppState;
use crate::types::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Public,
    Protected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteMethod {
    Get,
    Post,
}

impl RouteMethod {
    fn filter(self) -> MethodFilter {
        match self {
            RouteMethod::Get => MethodFilter::GET,
            RouteMethod::Post => MethodFilter::POST,
        }
    }

    pub fn matches(self, method: &Method) -> bool {
        match self {
            RouteMethod::Get => *method == Method::GET || *method == Method::HEAD,
            RouteMethod::Post => *method == Method::POST,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Health,
    Register,
    Login,
    Upload,
    ListImages,
    Search,
    ListCart,
    AddToCart,
}

#[derive(Debug, Clone, Copy)]
pub struct RouteSpec {
    pub path: &'static str,
    pub method: RouteMethod,
    pub visibility: Visibility,
    pub endpoint: Endpoint,
}

const fn route(
    method: RouteMethod,
    path: &'static str,
    visibility: Visibility,
    endpoint: Endpoint,
) -> RouteSpec {
    RouteSpec {
        path,
        method,
        visibility,
        endpoint,
    }
}

pub const ROUTES: &[RouteSpec] = &[
    route(RouteMethod::Get, "/api/health", Visibility::Public, Endpoint::Health),
    route(RouteMethod::Post, "/api/register", Visibility::Public, Endpoint::Register),
    route(RouteMethod::Post, "/api/login", Visibility::Public, Endpoint::Login),
    route(RouteMethod::Post, "/api/upload", Visibility::Protected, Endpoint::Upload),
    route(RouteMethod::Get, "/api/images", Visibility::Protected, Endpoint::ListImages),
    route(RouteMethod::Get, "/api/search", Visibility::Protected, Endpoint::Search),
    route(RouteMethod::Get, "/api/cart", Visibility::Protected, Endpoint::ListCart),
    route(RouteMethod::Post, "/api/cart", Visibility::Protected, Endpoint::AddToCart),
];

/// Visibility of the route serving `method path`, if any.
pub fn visibility_of(method: &Method, path: &str) -> Option<Visibility> {
    ROUTES
        .iter()
        .find(|r| r.path == path && r.method.matches(method))
        .map(|r| r.visibility)
}

impl RouteSpec {
    fn method_router(&self) -> MethodRouter<AppState> {
        let filter = self.method.filter();
        match self.endpoint {
            Endpoint::Health => on(filter, health::health_check),
            Endpoint::Register => on(filter, account::register),
            Endpoint::Login => on(filter, account::login),
            Endpoint::Upload => on(filter, images::upload_image),
            Endpoint::ListImages => on(filter, images::list_images),
            Endpoint::Search => on(filter, images::search_images),
            Endpoint::ListCart => on(filter, cart::list_cart),
            Endpoint::AddToCart => on(filter, cart::add_to_cart),
        }
    }
}

async fn not_found() -> impl IntoResponse {
    AppError::NotFound("route".to_string())
}

/// Create the main application router
pub fn create_router(state: AppState) -> Result<Router> {
    info!("Creating application router");

    let mut router = Router::new();
    for spec in ROUTES {
        let mut method_router = spec.method_router();
        if spec.visibility == Visibility::Protected {
            method_router = method_router.route_layer(from_fn_with_state(state.clone(), require_auth));
        }
        router = router.route(spec.path, method_router);
    }

    let router = router
        .fallback(not_found)
        .layer(DefaultBodyLimit::max(state.config.server.max_upload_bytes))
        .layer(TraceLayer::new_for_http());
    let router = apply_cors(router, &state.config.server.cors_allowed_origin)?;

    Ok(router.with_state(state))
}
