//! Benchmark endpoints.
//!
//! | Path | Handler | Response |
//! |---|---|---|
//! | `/json` | [`json`] | `{"message":"Hello, World!"}` |
//! | `/plaintext` | [`plaintext`] | `Hello, World!` |
//! | `/db` | [`db`] | one random row |
//! | `/dbs?queries=N` | [`dbs`] | N random rows, fetched concurrently |
//! | `/updates?queries=N` | [`updates`] | N rows rewritten one after another |
//! | `/fortunes` | [`fortunes`] | sorted HTML table |
//! | `/healthz`, `/readyz` | [`health`](crate::health) | probes |

use http::StatusCode;
use serde::Serialize;
use tracing::error;

use crate::bench;
use crate::fortunes as page;
use crate::health;
use crate::queries::QueryCount;
use crate::response::{Html, IntoResponse, Json, Response};
use crate::router::Router;
use crate::state::AppState;
use crate::store::StoreError;
use crate::Request;

pub const HELLO: &str = "Hello, World!";

/// Every endpoint, ready for [`Router::with_state`].
pub fn router() -> Router {
    Router::new()
        .get("/json", json)
        .get("/plaintext", plaintext)
        .get("/db", db)
        .get("/dbs", dbs)
        .get("/updates", updates)
        .get("/fortunes", fortunes)
        .get("/healthz", health::liveness)
        .get("/readyz", health::readiness)
}

/// Body of `/json`.
#[derive(Serialize)]
pub struct Message {
    pub message: &'static str,
}

/// A store failure on its way to the client as `{"error": ...}`.
pub struct ApiError {
    status: StatusCode,
    error: StoreError,
}

impl ApiError {
    /// `500` whatever the store reported. `/updates` answers only 200 or 500.
    pub fn internal(error: StoreError) -> Self {
        Self { status: StatusCode::INTERNAL_SERVER_ERROR, error }
    }
}

impl From<StoreError> for ApiError {
    fn from(error: StoreError) -> Self {
        let status = match error {
            StoreError::NotFound { .. } => StatusCode::NOT_FOUND,
            StoreError::WriteFailure(_) | StoreError::Unavailable(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        Self { status, error }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        Response::error(self.status, self.error)
    }
}

fn queries(req: &Request) -> QueryCount {
    QueryCount::from_param(req.query("queries").as_deref())
}

pub async fn json(_state: AppState, _req: Request) -> Json<Message> {
    Json(Message { message: HELLO })
}

pub async fn plaintext(_state: AppState, _req: Request) -> &'static str {
    HELLO
}

pub async fn db(state: AppState, _req: Request) -> Result<Response, ApiError> {
    let world = bench::fetch_random(&state).await?;
    Ok(Json(world).into_response())
}

pub async fn dbs(state: AppState, req: Request) -> Result<Response, ApiError> {
    let worlds = bench::fetch_many(&state, queries(&req)).await?;
    Ok(Json(worlds).into_response())
}

pub async fn updates(state: AppState, req: Request) -> Result<Response, ApiError> {
    let worlds = bench::update_many(&state, queries(&req))
        .await
        .map_err(ApiError::internal)?;
    Ok(Json(worlds).into_response())
}

pub async fn fortunes(state: AppState, _req: Request) -> Result<Html, ApiError> {
    let rows = state.store().fortunes().await.map_err(|e| {
        error!(error = %e, "fortune listing failed");
        e
    })?;
    Ok(Html(page::render(&page::prepare(rows))))
}
