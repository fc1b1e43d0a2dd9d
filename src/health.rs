//! Health-check handlers.
//!
//! | Probe | Path | Question |
//! |---|---|---|
//! | **Liveness** | `/healthz` | Is the process alive? Failure → restart. |
//! | **Readiness** | `/readyz` | Can the database be reached? Failure → pulled from load-balancer. |

use http::StatusCode;
use tracing::warn;

use crate::{AppState, Request, Response};

/// Liveness probe handler.
///
/// Always returns `200 OK` with body `"ok"`. It touches nothing but the
/// socket, so a slow or absent database never gets the process restarted.
pub async fn liveness(_state: AppState, _req: Request) -> Response {
    Response::text("ok")
}

/// Readiness probe handler.
///
/// `200 ready` when one round-trip to the store succeeds, otherwise `503`
/// with the store error.
pub async fn readiness(state: AppState, _req: Request) -> Response {
    match state.store().ping().await {
        Ok(()) => Response::text("ready"),
        Err(e) => {
            warn!(error = %e, "readiness check failed");
            Response::error(StatusCode::SERVICE_UNAVAILABLE, e)
        }
    }
}
