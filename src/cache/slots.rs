use redis::AsyncCommands;

use crate::cache::CacheService;
use crate::services::catalog;
use crate::services::reservation::{self, SlotAvailability};

const AVAILABILITY_TTL_SECONDS: u64 = 60;

fn availability_key(slot_id: i64) -> String {
    format!("slot:{slot_id}:availability")
}

impl CacheService {
    /// Доступность слота: сначала кеш, потом БД.
    ///
    /// Кеш только ускоряет публичные чтения; Capacity Guard всегда считает
    /// занятость внутри своей транзакции и сюда не смотрит.
    pub async fn get_availability(
        &self,
        slot_id: i64,
    ) -> Result<Option<SlotAvailability>, sqlx::Error> {
        if let Ok(availability) = self.get_availability_from_cache(slot_id).await {
            return Ok(Some(availability));
        }

        let loaded = self.load_availability_from_db(slot_id).await?;
        if let Some(availability) = &loaded {
            let _ = self.save_availability_to_cache(availability).await;
        }
        Ok(loaded)
    }

    /// Сбрасывает кеш после изменения занятости слота.
    pub async fn invalidate_availability(&self, slot_id: i64) {
        let mut conn = self.redis.conn.clone();
        let _: Result<i64, _> = conn.del(availability_key(slot_id)).await;
    }

    async fn load_availability_from_db(
        &self,
        slot_id: i64,
    ) -> Result<Option<SlotAvailability>, sqlx::Error> {
        let Some(slot) = catalog::find_slot(&self.db.pool, slot_id).await? else {
            return Ok(None);
        };
        let occupied = reservation::slot_occupancy(&self.db.pool, slot_id).await?;

        Ok(Some(SlotAvailability {
            slot_id,
            capacity: slot.capacity,
            occupied,
            remaining: i64::from(slot.capacity) - occupied,
        }))
    }

    // === Работа с кешем ===
    async fn get_availability_from_cache(
        &self,
        slot_id: i64,
    ) -> Result<SlotAvailability, redis::RedisError> {
        let mut conn = self.redis.conn.clone();
        let data: String = conn.get(availability_key(slot_id)).await?;
        serde_json::from_str(&data).map_err(|_| {
            redis::RedisError::from((redis::ErrorKind::TypeError, "Parse error"))
        })
    }

    async fn save_availability_to_cache(
        &self,
        availability: &SlotAvailability,
    ) -> Result<(), redis::RedisError> {
        let data = serde_json::to_string(availability).map_err(|_| {
            redis::RedisError::from((redis::ErrorKind::TypeError, "Serialize error"))
        })?;
        let mut conn = self.redis.conn.clone();
        conn.set_ex(availability_key(availability.slot_id), data, AVAILABILITY_TTL_SECONDS)
            .await
    }
}
