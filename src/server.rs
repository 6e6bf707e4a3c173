//! The read API: a thin query passthrough over the record store.
//!
//! One endpoint, `GET /data`, returns the whole stored series (optionally
//! bounded by `from`/`until` timestamps) ascending by date, serialized as
//! [`PublicRecord`]s so internal storage markers never leave the process.
//! The dashboard frontend polls this; a failed scrape cycle just means it
//! keeps seeing the last successfully persisted series.

use crate::error::StorageError;
use crate::models::PublicRecord;
use crate::store::{RecordFilter, RecordStore, SledStore};
use anyhow::{Context, Result};
use axum::extract::{Query, State};
use axum::http::{Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info};

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<SledStore>,
}

/// Optional inclusive date bounds on `/data`.
#[derive(Debug, Default, Deserialize)]
pub struct DataQuery {
    pub from: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
}

#[derive(Debug)]
struct ApiError(StorageError);

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        error!(error = %self.0, "read API storage failure");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "storage unavailable" })),
        )
            .into_response()
    }
}

async fn get_data(
    State(state): State<AppState>,
    Query(query): Query<DataQuery>,
) -> Result<Json<Vec<PublicRecord>>, ApiError> {
    let filter = RecordFilter {
        from: query.from,
        until: query.until,
    };

    let records = state.store.find_all(&filter)?;
    Ok(Json(records.into_iter().map(PublicRecord::from).collect()))
}

async fn not_found() -> (StatusCode, &'static str) {
    (StatusCode::NOT_FOUND, "not found")
}

/// Build the API router. Split out of [`run`] so tests can drive handlers
/// without binding a socket.
pub fn build_router(state: AppState) -> Router {
    // The API is read-only and public; reflect any origin.
    let cors = CorsLayer::new()
        .allow_methods([Method::GET])
        .allow_headers(Any)
        .allow_origin(Any);

    Router::new()
        .route("/data", get(get_data))
        .fallback(not_found)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind and serve the read API until the process exits.
pub async fn run(listen_addr: &str, state: AppState) -> Result<()> {
    let addr: SocketAddr = listen_addr.parse().context("invalid listen address")?;
    let app = build_router(state);

    let listener = TcpListener::bind(&addr)
        .await
        .context("failed to bind the read API")?;
    info!("read API listening on http://{addr}");

    axum::serve(listener, app).await.context("read API error")?;
    Ok(())
}
