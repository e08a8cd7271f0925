use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;

use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/slots/availability", get(get_availability))
}

/* ---------- SLOTS ---------- */

#[derive(Debug, Deserialize)]
struct AvailabilityQuery {
    #[serde(rename = "slotId")]
    slot_id: i64,
}

// GET /api/slots/availability?slotId=...
async fn get_availability(
    State(state): State<Arc<AppState>>,
    Query(params): Query<AvailabilityQuery>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    if params.slot_id <= 0 {
        return Err((StatusCode::BAD_REQUEST, "slotId должен быть > 0".to_string()));
    }

    match state.cache.get_availability(params.slot_id).await {
        Ok(Some(availability)) => Ok((StatusCode::OK, Json(availability))),
        Ok(None) => Err((StatusCode::NOT_FOUND, format!("Слот {} не найден", params.slot_id))),
        Err(e) => {
            tracing::error!("get_availability sql error: {:?}", e);
            Err((StatusCode::INTERNAL_SERVER_ERROR, "Не удалось получить доступность".to_string()))
        }
    }
}
