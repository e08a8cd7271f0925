use rust_decimal::Decimal;
use sqlx::PgConnection;
use std::collections::HashMap;

use crate::error::BookingError;
use crate::models::TicketCategory;

/// Слот вместе с владеющей активностью (через расписание).
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SlotRef {
    pub id: i64,
    pub capacity: i32,
    pub activity_id: i64,
}

/// Консистентный снимок каталога для одной попытки бронирования.
///
/// Читается один раз внутри транзакции резервирования; движок цен работает
/// только с этим снимком и не трогает глобальное состояние каталога.
pub struct CatalogSnapshot {
    pub slot: SlotRef,
    categories: HashMap<i64, TicketCategory>,
}

impl CatalogSnapshot {
    /// Загружает цены категорий активности внутри текущей транзакции.
    pub async fn load(conn: &mut PgConnection, slot: SlotRef) -> Result<Self, sqlx::Error> {
        let categories = sqlx::query_as::<_, TicketCategory>(
            "SELECT id, activity_id, name, price FROM ticket_categories WHERE activity_id = $1",
        )
        .bind(slot.activity_id)
        .fetch_all(conn)
        .await?
        .into_iter()
        .map(|c| (c.id, c))
        .collect();

        Ok(Self { slot, categories })
    }

    pub fn from_parts(slot: SlotRef, categories: Vec<TicketCategory>) -> Self {
        Self {
            slot,
            categories: categories.into_iter().map(|c| (c.id, c)).collect(),
        }
    }

    /// Цена категории. Категория чужой активности в снимке отсутствует
    /// и отклоняется - это защита от кросс-активити запросов.
    pub fn unit_price(&self, category_id: i64) -> Result<Decimal, BookingError> {
        self.categories
            .get(&category_id)
            .map(|c| c.price)
            .ok_or(BookingError::UnknownCategory {
                category_id,
                activity_id: self.slot.activity_id,
            })
    }
}

/// Захватывает эксклюзивную блокировку строки слота (`FOR UPDATE`).
///
/// Блокировка держится до конца транзакции и сериализует все попытки
/// бронирования этого слота между собой.
pub async fn lock_slot(
    conn: &mut PgConnection,
    slot_id: i64,
) -> Result<Option<SlotRef>, sqlx::Error> {
    sqlx::query_as::<_, SlotRef>(
        r#"
        SELECT s.id, s.capacity, sc.activity_id
        FROM slots s
        JOIN schedules sc ON sc.id = s.schedule_id
        WHERE s.id = $1
        FOR UPDATE OF s
        "#,
    )
    .bind(slot_id)
    .fetch_optional(conn)
    .await
}

/// Читает слот без блокировки (публичное чтение доступности).
pub async fn find_slot<'e, E>(executor: E, slot_id: i64) -> Result<Option<SlotRef>, sqlx::Error>
where
    E: sqlx::PgExecutor<'e>,
{
    sqlx::query_as::<_, SlotRef>(
        r#"
        SELECT s.id, s.capacity, sc.activity_id
        FROM slots s
        JOIN schedules sc ON sc.id = s.schedule_id
        WHERE s.id = $1
        "#,
    )
    .bind(slot_id)
    .fetch_optional(executor)
    .await
}
