use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Json, Response};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, PoisonError};
use std::time::Instant;

use crate::geocode::{GeocodeError, Point};
use crate::join::JoinResult;

use super::state::AppState;

// ─── Error response ──────────────────────────────────────────────

#[derive(Serialize)]
struct ApiErrorBody {
    error: String,
    code: u16,
}

pub struct ApiError(StatusCode, String);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ApiErrorBody {
            error: self.1,
            code: self.0.as_u16(),
        };
        (self.0, Json(body)).into_response()
    }
}

fn api_error(status: StatusCode, msg: impl Into<String>) -> ApiError {
    ApiError(status, msg.into())
}

impl From<GeocodeError> for ApiError {
    fn from(e: GeocodeError) -> Self {
        let status = match e {
            GeocodeError::NotFound(_) => StatusCode::NOT_FOUND,
            GeocodeError::Service { .. } | GeocodeError::Parse(_) => StatusCode::BAD_GATEWAY,
        };
        api_error(status, e.to_string())
    }
}

// ─── Static content ──────────────────────────────────────────────

pub async fn index(State(state): State<Arc<AppState>>) -> Html<String> {
    Html(state.page.clone())
}

pub async fn geometry(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    Json(state.geometry.clone())
}

pub async fn join(State(state): State<Arc<AppState>>) -> Json<JoinResult> {
    Json(state.join.clone())
}

// ─── GET /api/locate ─────────────────────────────────────────────

#[derive(Deserialize)]
pub struct LocateQuery {
    pub query: Option<String>,
}

#[derive(Serialize)]
pub struct LocateResponse {
    pub query: String,
    pub lat: f64,
    pub lon: f64,
    pub formatted: String,
}

pub async fn locate(
    State(state): State<Arc<AppState>>,
    Query(params): Query<LocateQuery>,
) -> Result<Json<LocateResponse>, ApiError> {
    let start = Instant::now();

    let query = params.query.as_deref().unwrap_or("").trim().to_string();
    if query.is_empty() {
        return Err(api_error(StatusCode::BAD_REQUEST, "Missing 'query' parameter"));
    }

    // Blocking HTTP plus the limiter's sleep: keep it off the async workers.
    let task_state = Arc::clone(&state);
    let task_query = query.clone();
    let point: Point = tokio::task::spawn_blocking(move || {
        let mut lookup = task_state.lookup.lock().unwrap_or_else(PoisonError::into_inner);
        lookup.locate(&task_query)
    })
    .await
    .map_err(|e| api_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))??;

    tracing::info!(
        query = %query,
        %point,
        elapsed_ms = start.elapsed().as_secs_f64() * 1000.0,
        "GET /api/locate"
    );

    Ok(Json(LocateResponse {
        query,
        lat: point.lat,
        lon: point.lon,
        formatted: point.to_string(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_geocode_error_status() {
        let status = |e: GeocodeError| ApiError::from(e).0;
        assert_eq!(status(GeocodeError::NotFound("x".into())), StatusCode::NOT_FOUND);
        assert_eq!(status(GeocodeError::service("HTTP 503", true)), StatusCode::BAD_GATEWAY);
        assert_eq!(status(GeocodeError::parse("bad")), StatusCode::BAD_GATEWAY);
    }
}
