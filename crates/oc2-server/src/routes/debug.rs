use axum::extract::State;
use axum::Json;
use oc2_core::relay::Snapshot;

use crate::state::AppState;

/// GET /debug — every queued command and every known asset with its cursor.
pub async fn snapshot(State(app): State<AppState>) -> Json<Snapshot> {
    Json(app.relay.snapshot())
}
