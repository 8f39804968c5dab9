//! Router construction

use crate::config::ServerConfig;
use crate::handlers::{self, AppState, CURSOR_HEADER};
use axum::http::HeaderName;
use axum::routing::{delete, get, put};
use axum::Router;
use kvbridge_store::KvStore;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Build the bridge router over `store`
///
/// CORS is fully open and exposes the `cursor` header to browsers.
pub fn create_bridge_app(store: Arc<dyn KvStore>, config: &ServerConfig) -> Router {
    let state = AppState {
        store,
        page_size: config.page_size,
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
        .expose_headers([HeaderName::from_static(CURSOR_HEADER)]);

    Router::new()
        .route("/browse", get(handlers::browse))
        .route("/get/{key}", get(handlers::get_entry))
        .route("/set", put(handlers::set_entry))
        .route("/delete", delete(handlers::delete_entry))
        .route("/check", get(handlers::check))
        .route("/watch", get(handlers::watch_entry))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}
