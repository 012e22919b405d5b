// Gallery Gate - authenticated image gallery API with stateless bearer tokens

pub mod cli;
pub mod config;
pub mod db;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod storage;
pub mod tagging;
pub mod token;
pub mod types;
pub mod utils;

#[cfg(test)]
pub mod test_utils;

// Re-exports for convenience
pub use config::Config;
pub use models::AppState;

pub fn create_router(state: AppState) -> anyhow::Result<axum::Router> {
    routes::create_router(state)
}
