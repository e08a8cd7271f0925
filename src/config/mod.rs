use serde::Deserialize;
use std::env;

// Главная структура конфигурации - контейнер для всех настроек
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub app: AppConfig,
    pub database: DatabaseConfig,
    pub redis: RedisConfig,
    pub reservation: ReservationConfig,
    pub notifier: NotifierConfig,
}

// Настройки приложения
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub rust_log: String,
}

// Настройки базы данных
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub pool_size: u32,
}

// Настройки Redis
#[derive(Debug, Clone, Deserialize)]
pub struct RedisConfig {
    pub url: String,
}

// Настройки ядра бронирования
#[derive(Debug, Clone, Deserialize)]
pub struct ReservationConfig {
    /// Сколько раз повторять транзакцию после транзиентного конфликта.
    pub max_retries: u32,
    /// Базовая задержка между повторами (удваивается на каждой попытке).
    pub retry_backoff_ms: u64,
    /// Создавать брони в статусе PENDING до подтверждения оплаты.
    pub require_payment: bool,
    /// Через сколько минут PENDING-бронь считается просроченной.
    pub pending_ttl_minutes: i64,
    /// Интервал фоновой очистки просроченных броней.
    pub cleanup_interval_seconds: u64,
}

impl Default for ReservationConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            retry_backoff_ms: 25,
            require_payment: false,
            pending_ttl_minutes: 30,
            cleanup_interval_seconds: 300,
        }
    }
}

// Настройки исходящих уведомлений о подтвержденных бронях
#[derive(Debug, Clone, Deserialize)]
pub struct NotifierConfig {
    pub webhook_url: Option<String>,
    pub timeout_seconds: u64,
}

impl Config {
    pub fn from_env() -> Self {
        Config {
            app: AppConfig {
                host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: env::var("PORT")
                    .unwrap_or_else(|_| "8000".to_string())
                    .parse()
                    .expect("PORT must be a valid number"),
                rust_log: env::var("RUST_LOG")
                    .unwrap_or_else(|_| "booking_system=debug,tower_http=debug".to_string()),
            },
            database: DatabaseConfig {
                url: env::var("DATABASE_URL").expect("DATABASE_URL must be set"),
                pool_size: env::var("DB_POOL_SIZE")
                    .unwrap_or_else(|_| "20".to_string())
                    .parse()
                    .expect("DB_POOL_SIZE must be a valid number"),
            },
            redis: RedisConfig {
                url: env::var("REDIS_URL").expect("REDIS_URL must be set"),
            },
            reservation: ReservationConfig {
                max_retries: env::var("RESERVE_MAX_RETRIES")
                    .unwrap_or_else(|_| "3".to_string())
                    .parse()
                    .expect("RESERVE_MAX_RETRIES must be a valid number"),
                retry_backoff_ms: env::var("RESERVE_RETRY_BACKOFF_MS")
                    .unwrap_or_else(|_| "25".to_string())
                    .parse()
                    .expect("RESERVE_RETRY_BACKOFF_MS must be a valid number"),
                require_payment: env::var("REQUIRE_PAYMENT")
                    .unwrap_or_else(|_| "false".to_string())
                    .parse()
                    .expect("REQUIRE_PAYMENT must be true or false"),
                pending_ttl_minutes: env::var("PENDING_TTL_MINUTES")
                    .unwrap_or_else(|_| "30".to_string())
                    .parse()
                    .expect("PENDING_TTL_MINUTES must be a valid number"),
                cleanup_interval_seconds: env::var("CLEANUP_INTERVAL_SECONDS")
                    .unwrap_or_else(|_| "300".to_string())
                    .parse()
                    .expect("CLEANUP_INTERVAL_SECONDS must be a valid number"),
            },
            notifier: NotifierConfig {
                webhook_url: env::var("BOOKING_WEBHOOK_URL").ok(),
                timeout_seconds: env::var("WEBHOOK_TIMEOUT_SECONDS")
                    .unwrap_or_else(|_| "5".to_string())
                    .parse()
                    .expect("WEBHOOK_TIMEOUT_SECONDS must be a valid number"),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reservation_defaults_are_bounded() {
        let cfg = ReservationConfig::default();
        assert!(cfg.max_retries > 0);
        assert!(cfg.retry_backoff_ms > 0);
        assert!(!cfg.require_payment);
        assert_eq!(cfg.pending_ttl_minutes, 30);
    }
}
