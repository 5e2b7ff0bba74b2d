use anyhow::Context;
use axum::http::{HeaderName, Request, Response};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

use std::{sync::Arc, time::Duration};

use storefront::{
    config::AppConfig,
    routes::create_app,
    state::AppState,
    store::{PgStore, Store, Traced},
    telemetry,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = AppConfig::from_env()?;
    let telemetry = telemetry::init(&config.telemetry);

    let store = PgStore::connect(&config.database_dsn)
        .await
        .context("database init failed")?;
    let store: Arc<dyn Store> = Arc::new(Traced::new(store));
    let state = AppState::new(store.clone())?;

    let request_id_header = HeaderName::from_static("x-request-id");
    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(|request: &Request<_>| {
            let request_id = request
                .headers()
                .get("x-request-id")
                .and_then(|value| value.to_str().ok())
                .unwrap_or("-");
            tracing::info_span!(
                "http_request",
                otel.name = %format!("{} {}", request.method(), request.uri().path()),
                otel.kind = "server",
                method = %request.method(),
                uri = %request.uri(),
                request_id = %request_id
            )
        })
        .on_request(|request: &Request<_>, _span: &tracing::Span| {
            tracing::debug!(
                method = %request.method(),
                uri = %request.uri(),
                "request started"
            );
        })
        .on_response(|response: &Response<_>, latency: Duration, _span: &tracing::Span| {
            tracing::debug!(
                status = %response.status(),
                ms = %latency.as_millis(),
                "request finished"
            );
        });

    let app = create_app(state)
        .layer(trace_layer)
        .layer(PropagateRequestIdLayer::new(request_id_header.clone()))
        .layer(SetRequestIdLayer::new(request_id_header, MakeRequestUuid))
        .layer(RequestBodyLimitLayer::new(1024 * 1024));

    let addr = config.socket_addr();
    tracing::info!(service = %config.telemetry.service_name, "e-commerce app starting on {}", addr);

    axum::serve(tokio::net::TcpListener::bind(addr).await?, app).await?;

    store.shutdown().await;
    telemetry.shutdown();
    Ok(())
}
