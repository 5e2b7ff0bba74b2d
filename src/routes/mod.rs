use axum::{
    Router, middleware,
    routing::{any, get},
};

use crate::{metrics::track, state::AppState};

pub mod doc;
pub mod metrics;
pub mod shop;

/// Build the application router. Shop routes are wrapped by the request
/// metrics middleware; `/metrics` and `/docs` are not counted.
pub fn create_app(state: AppState) -> Router {
    let shop = Router::new()
        .route("/", get(shop::home))
        .route("/checkout", any(shop::checkout))
        .route("/success", get(shop::success))
        .layer(middleware::from_fn_with_state(state.clone(), track));

    Router::new()
        .merge(shop)
        .route("/metrics", get(metrics::render))
        .merge(doc::scalar_docs())
        .with_state(state)
}
