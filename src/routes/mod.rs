pub mod admin;
pub mod api;
pub mod public;

use axum::Router;
use tower::ServiceBuilder;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::state::AppState;

pub fn create_router(state: AppState) -> Router {
    let request_timeout = state.config.request_timeout;
    Router::new()
        .merge(public::router())
        .nest("/api", api::router())
        .nest("/admin", admin::router())
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(TimeoutLayer::new(request_timeout)),
        )
        .with_state(state)
}
