use thiserror::Error;

/// Типизированные ошибки ядра бронирования.
///
/// Все ошибки пары Capacity Guard / Booking Writer гарантируют, что хранилище
/// осталось ровно в том состоянии, в котором было до попытки.
#[derive(Debug, Error)]
pub enum BookingError {
    #[error("{what} {id} not found")]
    NotFound { what: &'static str, id: i64 },

    #[error("ticket category {category_id} does not belong to activity {activity_id}")]
    UnknownCategory { category_id: i64, activity_id: i64 },

    #[error("requested {requested} seats but only {remaining} remaining")]
    CapacityExceeded { requested: i64, remaining: i64 },

    #[error("quantity must be a positive integer, got {quantity}")]
    InvalidQuantity { quantity: i32 },

    #[error("reservation conflict not resolved after {attempts} attempts")]
    RetryExhausted { attempts: u32 },

    #[error("storage error: {0}")]
    Persistence(#[from] sqlx::Error),
}

impl BookingError {
    /// Клиентская ошибка (повторная отправка без изменений не поможет).
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            BookingError::NotFound { .. }
                | BookingError::UnknownCategory { .. }
                | BookingError::CapacityExceeded { .. }
                | BookingError::InvalidQuantity { .. }
        )
    }
}

/// Транзиентный конфликт сериализации, который можно повторить.
///
/// 40001 = serialization_failure, 40P01 = deadlock_detected.
pub fn is_serialization_conflict(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => {
            matches!(db_err.code().as_deref(), Some("40001") | Some("40P01"))
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_errors_are_not_retryable() {
        assert!(BookingError::CapacityExceeded { requested: 6, remaining: 4 }.is_client_error());
        assert!(BookingError::NotFound { what: "slot", id: 1 }.is_client_error());
        assert!(!BookingError::RetryExhausted { attempts: 3 }.is_client_error());
    }

    #[test]
    fn capacity_error_carries_remaining_seats() {
        let err = BookingError::CapacityExceeded { requested: 6, remaining: 4 };
        assert_eq!(err.to_string(), "requested 6 seats but only 4 remaining");
    }
}
