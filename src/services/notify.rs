//! notify.rs
//!
//! Исходящие события о подтвержденных бронях.
//!
//! Доставка писем - ответственность внешнего сервиса уведомлений; ядро лишь
//! отправляет событие на настроенный webhook. Отправка идет в фоне и никогда
//! не откатывает уже закоммиченную бронь: сбой доставки только логируется.

use rust_decimal::Decimal;
use serde::Serialize;
use std::time::Duration;
use tracing::warn;

use crate::config::NotifierConfig;
use crate::models::Booking;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmationEvent {
    pub booking_id: i64,
    pub contact_email: String,
    pub slot_id: i64,
    pub items: Vec<EventItem>,
    pub total_price: Decimal,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventItem {
    pub category_id: i64,
    pub quantity: i32,
    pub unit_price: Decimal,
}

impl ConfirmationEvent {
    pub fn for_booking(booking: &Booking, slot_id: i64) -> Self {
        Self {
            booking_id: booking.id,
            contact_email: booking.contact.email.clone(),
            slot_id,
            items: booking
                .items
                .iter()
                .map(|i| EventItem {
                    category_id: i.category_id,
                    quantity: i.quantity,
                    unit_price: i.unit_price,
                })
                .collect(),
            total_price: booking.total_price,
        }
    }
}

#[derive(Clone)]
pub struct NotificationService {
    client: reqwest::Client,
    webhook_url: Option<String>,
}

impl NotificationService {
    pub fn from_config(cfg: &NotifierConfig) -> Self {
        Self::new(cfg.webhook_url.clone(), Duration::from_secs(cfg.timeout_seconds))
    }

    pub fn new(webhook_url: Option<String>, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .expect("failed to build HTTP client");
        Self { client, webhook_url }
    }

    /// Отправляет событие в фоне: вызывающий не ждет результата.
    pub fn send_background(&self, event: ConfirmationEvent) {
        let Some(url) = self.webhook_url.clone() else { return };
        let client = self.client.clone();
        tokio::spawn(async move {
            if let Err(e) = deliver(&client, &url, &event).await {
                warn!(booking_id = event.booking_id,
                    "confirmation webhook delivery failed: {e}");
            }
        });
    }
}

/// Один POST события на webhook; не-2xx считается сбоем доставки.
pub async fn deliver(
    client: &reqwest::Client,
    url: &str,
    event: &ConfirmationEvent,
) -> reqwest::Result<()> {
    client
        .post(url)
        .json(event)
        .send()
        .await?
        .error_for_status()?;
    Ok(())
}
