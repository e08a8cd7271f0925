use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct TicketCategory {
    pub id: i64,
    pub activity_id: i64,
    pub name: String,
    pub price: Decimal,
}
