use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{patch, post},
    Json, Router,
};
use serde::Deserialize;
use std::collections::BTreeSet;
use std::sync::Arc;

use crate::models::ReservationRequest;
use crate::services::reservation::ReservationService;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/bookings", post(create_booking))
        .route("/bookings/cancel", patch(cancel_booking))
}

fn reservation_service(state: &Arc<AppState>) -> ReservationService {
    ReservationService::new(state.db.clone(), state.config.reservation.clone())
        .with_notifier(state.notifier.clone())
}

/* ---------- BOOKINGS ---------- */

// POST /api/bookings
async fn create_booking(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ReservationRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    if req.slot_id <= 0 || req.activity_id <= 0 {
        return Err((StatusCode::BAD_REQUEST, "slotId и activityId должны быть > 0".to_string()));
    }

    let slot_id = req.slot_id;
    let booking = reservation_service(&state)
        .reserve(&req)
        .await
        .map_err(super::error_response)?;

    // Кеш доступности слота больше не актуален
    state.cache.invalidate_availability(slot_id).await;

    Ok((StatusCode::CREATED, Json(booking)))
}

// PATCH /api/bookings/cancel
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CancelBookingRequest {
    booking_id: i64,
}

async fn cancel_booking(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CancelBookingRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    if req.booking_id <= 0 {
        return Err((StatusCode::BAD_REQUEST, "bookingId должен быть > 0".to_string()));
    }

    let booking = reservation_service(&state)
        .cancel(req.booking_id)
        .await
        .map_err(super::error_response)?;

    // Отмена освобождает места во всех слотах брони
    let slot_ids: BTreeSet<i64> = booking.items.iter().map(|i| i.slot_id).collect();
    for slot_id in slot_ids {
        state.cache.invalidate_availability(slot_id).await;
    }

    Ok((StatusCode::OK, Json(booking)))
}
