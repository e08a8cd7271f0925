//! Движок цен: чистая функция над снимком каталога.
//!
//! Цена каждой позиции фиксируется в момент бронирования; последующие правки
//! каталога уже сохраненные брони не затрагивают.

use rust_decimal::{Decimal, RoundingStrategy};

use crate::error::BookingError;
use crate::models::ItemRequest;
use crate::services::catalog::CatalogSnapshot;

#[derive(Debug, Clone)]
pub struct PricedLine {
    pub category_id: i64,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub subtotal: Decimal,
}

#[derive(Debug, Clone)]
pub struct PricedOrder {
    pub lines: Vec<PricedLine>,
    pub total: Decimal,
    pub total_quantity: i64,
}

/// Округление до минорной единицы валюты: половина всегда от нуля
/// (0.125 -> 0.13), не банковское.
pub fn round_to_minor_unit(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Превращает запрошенный набор билетов в приценённые позиции.
///
/// Итог = сумма округленных подитогов, поэтому он всегда сходится с суммой
/// сохраненных line_items. Побочных эффектов нет.
pub fn price(snapshot: &CatalogSnapshot, items: &[ItemRequest]) -> Result<PricedOrder, BookingError> {
    if items.is_empty() {
        return Err(BookingError::InvalidQuantity { quantity: 0 });
    }

    let mut lines = Vec::with_capacity(items.len());
    let mut total = Decimal::ZERO;
    let mut total_quantity: i64 = 0;

    for item in items {
        if item.quantity < 1 {
            return Err(BookingError::InvalidQuantity { quantity: item.quantity });
        }

        let unit_price = snapshot.unit_price(item.category_id)?;
        let subtotal = round_to_minor_unit(unit_price * Decimal::from(item.quantity));

        total += subtotal;
        total_quantity += i64::from(item.quantity);
        lines.push(PricedLine {
            category_id: item.category_id,
            quantity: item.quantity,
            unit_price,
            subtotal,
        });
    }

    Ok(PricedOrder { lines, total, total_quantity })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TicketCategory;
    use crate::services::catalog::SlotRef;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    fn snapshot(prices: &[(i64, Decimal)]) -> CatalogSnapshot {
        let categories = prices
            .iter()
            .map(|(id, price)| TicketCategory {
                id: *id,
                activity_id: 7,
                name: format!("category-{id}"),
                price: *price,
            })
            .collect();
        CatalogSnapshot::from_parts(SlotRef { id: 1, capacity: 10, activity_id: 7 }, categories)
    }

    #[test]
    fn prices_adult_and_child_tickets() {
        let snap = snapshot(&[(1, dec!(1000.00)), (2, dec!(600.00))]);
        let order = price(
            &snap,
            &[
                ItemRequest { category_id: 1, quantity: 2 },
                ItemRequest { category_id: 2, quantity: 1 },
            ],
        )
        .unwrap();

        assert_eq!(order.total, dec!(2600.00));
        assert_eq!(order.total_quantity, 3);
        assert_eq!(order.lines[0].unit_price, dec!(1000.00));
        assert_eq!(order.lines[1].unit_price, dec!(600.00));
    }

    #[test]
    fn rejects_category_from_another_activity() {
        let snap = snapshot(&[(1, dec!(100.00))]);
        let err = price(&snap, &[ItemRequest { category_id: 99, quantity: 1 }]).unwrap_err();
        assert!(matches!(err, BookingError::UnknownCategory { category_id: 99, .. }));
    }

    #[test]
    fn rejects_non_positive_quantity() {
        let snap = snapshot(&[(1, dec!(100.00))]);
        for quantity in [0, -3] {
            let err = price(&snap, &[ItemRequest { category_id: 1, quantity }]).unwrap_err();
            assert!(matches!(err, BookingError::InvalidQuantity { .. }));
        }
    }

    #[test]
    fn rejects_empty_order() {
        let snap = snapshot(&[(1, dec!(100.00))]);
        assert!(matches!(
            price(&snap, &[]),
            Err(BookingError::InvalidQuantity { quantity: 0 })
        ));
    }

    #[test]
    fn rounds_half_away_from_zero_not_bankers() {
        // банковское округление дало бы 0.12
        assert_eq!(round_to_minor_unit(dec!(0.125)), dec!(0.13));
        assert_eq!(round_to_minor_unit(dec!(0.135)), dec!(0.14));

        let snap = snapshot(&[(1, dec!(10.005))]);
        let order = price(&snap, &[ItemRequest { category_id: 1, quantity: 1 }]).unwrap();
        assert_eq!(order.total, dec!(10.01));
    }

    proptest! {
        // Итог всегда сходится с пересчетом по сохраненным позициям
        #[test]
        fn total_reconciles_with_line_items(
            items in proptest::collection::vec((0u32..10_000u32, 1i32..20i32), 1..8)
        ) {
            let prices: Vec<(i64, Decimal)> = items
                .iter()
                .enumerate()
                .map(|(i, (cents, _))| (i as i64 + 1, Decimal::new(i64::from(*cents), 2)))
                .collect();
            let snap = snapshot(&prices);

            let req: Vec<ItemRequest> = items
                .iter()
                .enumerate()
                .map(|(i, (_, quantity))| ItemRequest { category_id: i as i64 + 1, quantity: *quantity })
                .collect();

            let order = price(&snap, &req).unwrap();
            let recomputed: Decimal = order
                .lines
                .iter()
                .map(|l| round_to_minor_unit(l.unit_price * Decimal::from(l.quantity)))
                .sum();
            prop_assert_eq!(order.total, recomputed);
        }
    }
}
