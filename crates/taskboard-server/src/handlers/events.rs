use axum::{extract::State, Json};
use serde_json::json;

use crate::error::AppError;
use crate::routes::AppState;
use crate::sync::{self, EventEnvelope};

/// POST /api/events
///
/// Intake for identity-provider lifecycle events. A handler failure is
/// surfaced as an error status so the delivering infrastructure registers a
/// failed delivery; unrecognized event names are acknowledged and skipped.
pub async fn receive_event(
    State(state): State<AppState>,
    Json(envelope): Json<EventEnvelope>,
) -> Result<Json<serde_json::Value>, AppError> {
    let handled = sync::dispatch(&state.db, &envelope).await?;

    if !handled {
        tracing::warn!(event = %envelope.name, "Ignoring unrecognized event");
    }

    Ok(Json(json!({ "handled": handled })))
}
