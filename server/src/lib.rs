//! treeline HTTP server.
//!
//! A thin axum layer over `treeline-learning`: it decodes a multipart upload,
//! runs the training on a blocking worker and returns the training result as
//! JSON.
//!
//! # Routes
//!
//! | Method | Path      | Description                                        |
//! |--------|-----------|----------------------------------------------------|
//! | POST   | `/train`  | `file` + `config` multipart parts, `?client=typescript` |
//! | GET    | `/health` | Liveness check with the server version             |
//!
//! # Layers
//!
//! ```text
//! request ─► TraceLayer ─► CorsLayer ─► RequestBodyLimitLayer ─► handler
//! ```
//!
//! All infrastructure settings come from [`AppConfig`]; the router holds no
//! shared mutable state.

pub mod error;
pub mod handlers;
pub mod state;
mod upload;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::http::{HeaderValue, Method};
use axum::routing::{get, post};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use tracing::warn;

pub use error::ApiError;
pub use state::AppConfig;
pub use upload::{CONFIG_PART, FILE_PART, TrainUpload};

/// Build the application router.
pub fn build_router(config: &AppConfig) -> Router {
    Router::new()
        .route("/train", post(handlers::train))
        .route("/health", get(handlers::health_check))
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(config.max_upload_bytes))
        .layer(cors_layer(config))
        .layer(TraceLayer::new_for_http())
}

fn cors_layer(config: &AppConfig) -> CorsLayer {
    let origins = if config.allows_any_origin() {
        AllowOrigin::any()
    } else {
        let parsed: Vec<HeaderValue> = config
            .allowed_origins
            .iter()
            .filter_map(|origin| match HeaderValue::from_str(origin) {
                Ok(value) => Some(value),
                Err(_) => {
                    warn!("Ignoring invalid CORS origin '{}'", origin);
                    None
                }
            })
            .collect();
        AllowOrigin::list(parsed)
    };

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any)
}
