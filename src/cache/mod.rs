use crate::{database::Database, redis_client::RedisClient};
use tracing::info;

pub mod slots;

#[derive(Clone)]
pub struct CacheService {
    redis: RedisClient,
    db: Database,
}

impl CacheService {
    pub fn new(redis: RedisClient, db: Database) -> Self {
        Self { redis, db }
    }

    // Прогрев кеша при старте
    pub async fn warmup_cache(&self) {
        info!("Starting cache warmup...");

        let _ = self.get_availability(1).await;

        info!("Cache warmup done");
    }
}
