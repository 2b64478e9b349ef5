mod handlers;
mod state;

use axum::routing::get;
use axum::Router;
use state::AppState;
use std::sync::{Arc, Mutex};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::error::Result;
use crate::geocode::CoordinateLookup;
use crate::join::JoinResult;
use crate::render::RenderRequest;

/// Render once and build the router around the result.
pub fn build_router(request: &RenderRequest<'_>, lookup: CoordinateLookup) -> Result<Router> {
    let state = Arc::new(AppState {
        page: request.to_html()?,
        geometry: serde_json::to_value(request.joined_geojson()?)?,
        join: JoinResult::clone(request.join),
        lookup: Mutex::new(lookup),
    });

    Ok(Router::new()
        .route("/", get(handlers::index))
        .route("/api/geometry", get(handlers::geometry))
        .route("/api/join", get(handlers::join))
        .route("/api/locate", get(handlers::locate))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state))
}

pub async fn start(app: Router, host: &str, port: u16) -> std::io::Result<()> {
    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("map server listening on http://{}", addr);
    tracing::info!("press Ctrl+C to stop");

    axum::serve(listener, app).await
}
