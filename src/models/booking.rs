use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BookingStatus {
    #[serde(rename = "PENDING")]
    Pending,
    #[serde(rename = "CONFIRMED")]
    Confirmed,
    #[serde(rename = "CANCELLED")]
    Cancelled,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "PENDING",
            BookingStatus::Confirmed => "CONFIRMED",
            BookingStatus::Cancelled => "CANCELLED",
        }
    }

    /// Статусы пишем только мы, поэтому незнакомое значение - ошибка декодирования.
    pub fn from_db(s: &str) -> Result<Self, sqlx::Error> {
        match s {
            "PENDING" => Ok(BookingStatus::Pending),
            "CONFIRMED" => Ok(BookingStatus::Confirmed),
            "CANCELLED" => Ok(BookingStatus::Cancelled),
            other => Err(sqlx::Error::Decode(
                format!("unknown booking status: {other}").into(),
            )),
        }
    }
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    pub id: i64,
    pub booking_id: i64,
    pub category_id: i64,
    pub slot_id: i64,
    pub quantity: i32,
    /// Снимок цены на момент бронирования, из категории не перечитывается.
    pub unit_price: Decimal,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    pub id: i64,
    pub status: BookingStatus,
    pub total_price: Decimal,
    pub contact: Contact,
    pub user_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub items: Vec<LineItem>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Contact {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
}

/// Входящий запрос на бронирование. Приходит с внешней границы уже
/// прошедшим структурную валидацию.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReservationRequest {
    pub slot_id: i64,
    pub activity_id: i64,
    pub items: Vec<ItemRequest>,
    pub contact: Contact,
    #[serde(default)]
    pub user_id: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemRequest {
    pub category_id: i64,
    pub quantity: i32,
}
