//! reservation.rs
//!
//! Ядро резервирования: атомарная проверка вместимости и запись брони.
//!
//! Выбранная схема - сериализующая транзакция: строка слота блокируется
//! через `SELECT ... FOR UPDATE`, поэтому проверка занятости и вставка брони
//! выполняются неделимо относительно конкурирующих попыток на тот же слот.
//! Разные слоты друг друга не блокируют. Победителя при одновременных
//! запросах определяет порядок захвата блокировки, а не порядок прихода.
//!
//! Транзиентные конфликты сериализации повторяются с экспоненциальной
//! задержкой до настроенного лимита, после чего вызывающий получает
//! `RetryExhausted` вместо зависания.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::ReservationConfig;
use crate::database::Database;
use crate::error::{is_serialization_conflict, BookingError};
use crate::models::{Booking, BookingStatus, Contact, LineItem, ReservationRequest};
use crate::services::catalog::{self, CatalogSnapshot};
use crate::services::notify::{ConfirmationEvent, NotificationService};
use crate::services::pricing;

pub struct ReservationService {
    db: Database,
    cfg: ReservationConfig,
    notifier: Option<NotificationService>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotAvailability {
    pub slot_id: i64,
    pub capacity: i32,
    pub occupied: i64,
    pub remaining: i64,
}

// Внутренняя проекция строки bookings
#[derive(sqlx::FromRow)]
struct BookingRow {
    id: i64,
    status: String,
    total_price: Decimal,
    contact_name: String,
    contact_email: String,
    contact_phone: Option<String>,
    user_id: Option<i64>,
    created_at: DateTime<Utc>,
}

impl ReservationService {
    pub fn new(db: Database, cfg: ReservationConfig) -> Self {
        Self { db, cfg, notifier: None }
    }

    pub fn with_notifier(mut self, notifier: NotificationService) -> Self {
        self.notifier = Some(notifier);
        self
    }

    /// Атомарно проверяет вместимость слота и записывает бронь с позициями.
    ///
    /// Либо бронь и все ее позиции записаны целиком, либо не записано ничего.
    pub async fn reserve(&self, req: &ReservationRequest) -> Result<Booking, BookingError> {
        let attempt_id = Uuid::new_v4();
        let mut attempt: u32 = 0;

        loop {
            match self.try_reserve(req).await {
                Err(BookingError::Persistence(e)) if is_serialization_conflict(&e) => {
                    if attempt >= self.cfg.max_retries {
                        warn!(%attempt_id, slot_id = req.slot_id, attempts = attempt + 1,
                            "reservation retry budget exhausted");
                        return Err(BookingError::RetryExhausted { attempts: attempt + 1 });
                    }
                    let backoff = Duration::from_millis(self.cfg.retry_backoff_ms << attempt);
                    warn!(%attempt_id, slot_id = req.slot_id, backoff_ms = backoff.as_millis() as u64,
                        "serialization conflict, retrying");
                    tokio::time::sleep(backoff).await;
                    attempt += 1;
                }
                Ok(booking) => {
                    info!(%attempt_id, booking_id = booking.id, slot_id = req.slot_id,
                        total = %booking.total_price, "booking committed");
                    // Уведомление - best effort: сбой доставки бронь не откатывает
                    if let Some(notifier) = &self.notifier {
                        notifier.send_background(ConfirmationEvent::for_booking(&booking, req.slot_id));
                    }
                    return Ok(booking);
                }
                Err(e) => {
                    if e.is_client_error() {
                        info!(%attempt_id, slot_id = req.slot_id, "reservation rejected: {e}");
                    }
                    return Err(e);
                }
            }
        }
    }

    /// Одна транзакционная попытка: блокировка слота, снимок каталога,
    /// расчет цены, проверка занятости, запись. Любая ошибка до commit
    /// откатывает транзакцию целиком (drop транзакции = rollback), в том
    /// числе при отмене future, если вызывающий отключился.
    async fn try_reserve(&self, req: &ReservationRequest) -> Result<Booking, BookingError> {
        let mut tx = self.db.pool.begin().await?;

        // 1) Эксклюзивная блокировка строки слота сериализует попытки по слоту
        let slot = catalog::lock_slot(&mut tx, req.slot_id)
            .await?
            .ok_or(BookingError::NotFound { what: "slot", id: req.slot_id })?;

        if slot.activity_id != req.activity_id {
            return Err(BookingError::NotFound { what: "activity", id: req.activity_id });
        }

        // 2) Снимок цен и расчет позиций (чистая функция)
        let snapshot = CatalogSnapshot::load(&mut tx, slot).await?;
        let priced = pricing::price(&snapshot, &req.items)?;

        // 3) Занятость читается под блокировкой: между проверкой и записью
        //    никто не вклинится
        let occupied = slot_occupancy(&mut *tx, req.slot_id).await?;
        let capacity = i64::from(snapshot.slot.capacity);
        if occupied + priced.total_quantity > capacity {
            return Err(BookingError::CapacityExceeded {
                requested: priced.total_quantity,
                remaining: capacity - occupied,
            });
        }

        // 4) Запись брони и позиций одним атомарным блоком
        let status = if self.cfg.require_payment {
            BookingStatus::Pending
        } else {
            BookingStatus::Confirmed
        };

        let (booking_id, created_at): (i64, DateTime<Utc>) = sqlx::query_as(
            r#"
            INSERT INTO bookings (status, total_price, contact_name, contact_email, contact_phone, user_id)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, created_at
            "#,
        )
        .bind(status.as_str())
        .bind(priced.total)
        .bind(&req.contact.name)
        .bind(&req.contact.email)
        .bind(&req.contact.phone)
        .bind(req.user_id)
        .fetch_one(&mut *tx)
        .await?;

        let mut items = Vec::with_capacity(priced.lines.len());
        for line in &priced.lines {
            let item = sqlx::query_as::<_, LineItem>(
                r#"
                INSERT INTO line_items (booking_id, category_id, slot_id, quantity, unit_price)
                VALUES ($1, $2, $3, $4, $5)
                RETURNING id, booking_id, category_id, slot_id, quantity, unit_price
                "#,
            )
            .bind(booking_id)
            .bind(line.category_id)
            .bind(req.slot_id)
            .bind(line.quantity)
            .bind(line.unit_price)
            .fetch_one(&mut *tx)
            .await?;
            items.push(item);
        }

        tx.commit().await?;

        Ok(Booking {
            id: booking_id,
            status,
            total_price: priced.total,
            contact: req.contact.clone(),
            user_id: req.user_id,
            created_at,
            items,
        })
    }

    /// Текущая доступность слота (чтение вне транзакции резервирования).
    pub async fn availability(&self, slot_id: i64) -> Result<SlotAvailability, BookingError> {
        let slot = catalog::find_slot(&self.db.pool, slot_id)
            .await?
            .ok_or(BookingError::NotFound { what: "slot", id: slot_id })?;
        let occupied = slot_occupancy(&self.db.pool, slot_id).await?;

        Ok(SlotAvailability {
            slot_id,
            capacity: slot.capacity,
            occupied,
            remaining: i64::from(slot.capacity) - occupied,
        })
    }

    /// Отмена брони. Вместимость освобождается сразу: предикат занятости -
    /// "статус не CANCELLED". Повторная отмена - no-op.
    pub async fn cancel(&self, booking_id: i64) -> Result<Booking, BookingError> {
        let updated = sqlx::query(
            "UPDATE bookings SET status = 'CANCELLED' WHERE id = $1 AND status <> 'CANCELLED'",
        )
        .bind(booking_id)
        .execute(&self.db.pool)
        .await?;

        let booking = self
            .find_booking(booking_id)
            .await?
            .ok_or(BookingError::NotFound { what: "booking", id: booking_id })?;

        if updated.rows_affected() > 0 {
            info!(booking_id, "booking cancelled, capacity released");
        }

        Ok(booking)
    }

    pub async fn find_booking(&self, booking_id: i64) -> Result<Option<Booking>, BookingError> {
        let row = sqlx::query_as::<_, BookingRow>(
            r#"
            SELECT id, status, total_price, contact_name, contact_email, contact_phone, user_id, created_at
            FROM bookings
            WHERE id = $1
            "#,
        )
        .bind(booking_id)
        .fetch_optional(&self.db.pool)
        .await?;

        let Some(row) = row else { return Ok(None) };

        let items = sqlx::query_as::<_, LineItem>(
            r#"
            SELECT id, booking_id, category_id, slot_id, quantity, unit_price
            FROM line_items
            WHERE booking_id = $1
            ORDER BY id
            "#,
        )
        .bind(booking_id)
        .fetch_all(&self.db.pool)
        .await?;

        Ok(Some(Booking {
            id: row.id,
            status: BookingStatus::from_db(&row.status)?,
            total_price: row.total_price,
            contact: Contact {
                name: row.contact_name,
                email: row.contact_email,
                phone: row.contact_phone,
            },
            user_id: row.user_id,
            created_at: row.created_at,
            items,
        }))
    }
}

/// Суммарное количество мест в не-отмененных бронях слота.
///
/// Внутри транзакции резервирования вызывается под блокировкой слота и видит
/// то же состояние, что и последующая запись.
pub async fn slot_occupancy<'e, E>(executor: E, slot_id: i64) -> Result<i64, sqlx::Error>
where
    E: sqlx::PgExecutor<'e>,
{
    sqlx::query_scalar::<_, i64>(
        r#"
        SELECT COALESCE(SUM(li.quantity), 0)::BIGINT
        FROM line_items li
        JOIN bookings b ON b.id = li.booking_id
        WHERE li.slot_id = $1 AND b.status <> 'CANCELLED'
        "#,
    )
    .bind(slot_id)
    .fetch_one(executor)
    .await
}
