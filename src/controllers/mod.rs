pub mod bookings;
pub mod slots;

use axum::http::StatusCode;
use axum::Router;
use std::sync::Arc;

use crate::error::BookingError;

pub fn routes() -> Router<Arc<crate::AppState>> {
    Router::new()
        .merge(bookings::routes())
        .merge(slots::routes())
}

/* ---------- helpers ---------- */

// Маппинг типизированных ошибок ядра на статусы внешней границы
pub(crate) fn error_response(err: BookingError) -> (StatusCode, String) {
    let status = match &err {
        BookingError::NotFound { .. } => StatusCode::NOT_FOUND,
        BookingError::UnknownCategory { .. } | BookingError::InvalidQuantity { .. } => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        BookingError::CapacityExceeded { .. } => StatusCode::CONFLICT,
        // транзиентный сбой, клиенту безопасно повторить запрос
        BookingError::RetryExhausted { .. } => StatusCode::SERVICE_UNAVAILABLE,
        BookingError::Persistence(e) => {
            tracing::error!("reservation storage error: {:?}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    (status, err.to_string())
}
