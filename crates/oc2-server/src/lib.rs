pub mod error;
pub mod headers;
pub mod routes;
pub mod state;

use axum::routing::{any, get};
use axum::Router;
use oc2_core::config::RelayConfig;
use oc2_core::Relay;
use std::sync::Arc;
use tower_http::propagate_header::PropagateHeaderLayer;
use tower_http::request_id::PropagateRequestIdLayer;
use tower_http::trace::TraceLayer;

/// Build the axum Router for the relay endpoint and its middleware.
/// Used by `serve()` and available for integration testing.
pub fn build_router(relay: Arc<Relay>, config: &RelayConfig) -> Router {
    let app_state = state::AppState::new(relay, config.body_limit);

    let mut router = Router::new().route(&config.path, any(routes::oc2::relay_endpoint));
    if config.debug_endpoint {
        router = router.route("/debug", get(routes::debug::snapshot));
    }

    router
        .layer(PropagateRequestIdLayer::new(headers::REQUEST_ID))
        .layer(PropagateHeaderLayer::new(headers::CORRELATION_ID))
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}

/// Bind `config.listen` and serve the relay until the future is dropped.
pub async fn serve(relay: Arc<Relay>, config: &RelayConfig) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(&config.listen).await?;
    serve_on(relay, config, listener).await
}

/// Serve the relay on a pre-bound listener.
///
/// Unlike `serve`, this accepts a `TcpListener` that was already bound so the
/// caller can read the actual port before starting (useful when the port is 0
/// and the OS picks a free one).
pub async fn serve_on(
    relay: Arc<Relay>,
    config: &RelayConfig,
    listener: tokio::net::TcpListener,
) -> anyhow::Result<()> {
    let addr = listener.local_addr()?;
    let app = build_router(relay, config);

    tracing::info!("OpenC2 relay listening on http://{addr}{}", config.path);

    axum::serve(listener, app).await?;
    Ok(())
}
