use std::sync::Arc;
use tracing::{error, info};

use crate::AppState;

/// Фоновая очистка просроченных броней.
///
/// Политика истечения - явный параметр конфигурации: PENDING-бронь старше
/// `pending_ttl_minutes` отменяется и ее места возвращаются в слот.
pub struct CleanupService {
    state: Arc<AppState>,
}

impl CleanupService {
    pub fn new(state: Arc<AppState>) -> Self {
        Self { state }
    }

    /// Запускает полный проход очистки.
    pub async fn run_full_cleanup(&self) {
        let stats = self.get_cleanup_stats().await;
        info!(
            "🧹 Starting cleanup pass ({} pending, {} expired)",
            stats.pending_total, stats.pending_expired
        );

        self.cancel_expired_pending().await;

        info!("✅ Cleanup pass completed");
    }

    /// Отменяет PENDING-брони старше настроенного TTL.
    async fn cancel_expired_pending(&self) {
        let ttl_minutes = self.state.config.reservation.pending_ttl_minutes;

        let cancelled: Vec<i64> = match sqlx::query_scalar(
            r#"
            UPDATE bookings
            SET status = 'CANCELLED'
            WHERE status = 'PENDING'
              AND created_at < NOW() - make_interval(mins => $1)
            RETURNING id
            "#,
        )
        .bind(ttl_minutes as i32)
        .fetch_all(&self.state.db.pool)
        .await
        {
            Ok(ids) => ids,
            Err(e) => {
                error!("Failed to cancel expired pending bookings: {:?}", e);
                return;
            }
        };

        if cancelled.is_empty() {
            info!("🎫 No expired pending bookings to cleanup");
            return;
        }

        info!("🎫 Cancelled {} expired pending bookings", cancelled.len());

        // Кеш доступности затронутых слотов больше не актуален
        let slots: Vec<i64> = sqlx::query_scalar(
            "SELECT DISTINCT slot_id FROM line_items WHERE booking_id = ANY($1)",
        )
        .bind(&cancelled)
        .fetch_all(&self.state.db.pool)
        .await
        .unwrap_or_default();

        for slot_id in slots {
            self.state.cache.invalidate_availability(slot_id).await;
        }
    }

    /// Статистика для мониторинга.
    pub async fn get_cleanup_stats(&self) -> CleanupStats {
        let ttl_minutes = self.state.config.reservation.pending_ttl_minutes;

        let pending_total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM bookings WHERE status = 'PENDING'",
        )
        .fetch_one(&self.state.db.pool)
        .await
        .unwrap_or(0);

        let pending_expired: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM bookings
            WHERE status = 'PENDING'
              AND created_at < NOW() - make_interval(mins => $1)
            "#,
        )
        .bind(ttl_minutes as i32)
        .fetch_one(&self.state.db.pool)
        .await
        .unwrap_or(0);

        CleanupStats { pending_total, pending_expired }
    }
}

#[derive(Debug)]
pub struct CleanupStats {
    pub pending_total: i64,
    pub pending_expired: i64,
}
