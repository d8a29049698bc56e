//! Cart totals
//!
//! Totals are derived from the lines and the coupon on every read and never
//! stored. Arithmetic is exact; rounding happens when amounts are displayed.

use super::types::CartItem;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use ticketplus_api::{Coupon, DiscountType, Money};

/// Service fee, percent of the discounted subtotal
pub const SERVICE_FEE_PERCENT: Decimal = Decimal::from_parts(5, 0, 0, false, 0);

/// Derived amounts of a cart
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartTotals {
    /// Tickets plus merchandise
    pub subtotal: Money,
    /// Coupon discount, at most `subtotal`
    pub discount: Money,
    /// Service fee on `subtotal - discount`
    pub fees: Money,
    /// `subtotal - discount + fees`
    pub total: Money,
}

/// Sum of every line's tickets and merchandise
#[must_use]
pub fn subtotal(items: &[CartItem]) -> Money {
    items.iter().map(CartItem::line_total).sum()
}

/// Discount granted by `coupon` on `subtotal`
///
/// Never negative and never more than the subtotal.
#[must_use]
pub fn discount(coupon: Option<&Coupon>, subtotal: Money) -> Money {
    let Some(coupon) = coupon else {
        return Money::ZERO;
    };

    let raw = match coupon.discount_type {
        DiscountType::Percentage => subtotal.percent(coupon.discount_value),
        DiscountType::Fixed => Money::new(coupon.discount_value),
    };

    raw.clamp(Money::ZERO, subtotal.max(Money::ZERO))
}

/// Compute `{subtotal, discount, fees, total}` for a cart
#[must_use]
pub fn cart_total(items: &[CartItem], coupon: Option<&Coupon>) -> CartTotals {
    let subtotal = subtotal(items);
    let discount = discount(coupon, subtotal);
    let discounted = subtotal - discount;
    let fees = discounted.percent(SERVICE_FEE_PERCENT);

    CartTotals {
        subtotal,
        discount,
        fees,
        total: discounted + fees,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ticketplus_api::TicketId;
    use ticketplus_core::environment::Clock;
    use ticketplus_testing::{fixtures, test_clock};

    fn ticket_line(quantity: u32) -> CartItem {
        let event = fixtures::event("e1", "Nigeria", test_clock().now());
        CartItem::new(&event, &TicketId::new("e1-regular"), quantity)
            .unwrap_or_else(|| unreachable!("fixture sells e1-regular"))
    }

    fn coupon(discount_type: DiscountType, value: i64) -> Coupon {
        Coupon {
            code: "SAVE".to_string(),
            discount_type,
            discount_value: Decimal::from(value),
        }
    }

    #[test]
    fn test_empty_cart_is_all_zero() {
        assert_eq!(cart_total(&[], None), CartTotals::default());
    }

    #[test]
    fn test_single_ticket_without_coupon() {
        let totals = cart_total(&[ticket_line(1)], None);

        assert_eq!(totals.subtotal, Money::from_cents(5000));
        assert_eq!(totals.discount, Money::ZERO);
        assert_eq!(totals.fees, Money::from_cents(250));
        assert_eq!(totals.total, Money::from_cents(5250));
    }

    #[test]
    fn test_single_ticket_with_percentage_coupon() {
        let coupon = coupon(DiscountType::Percentage, 10);
        let totals = cart_total(&[ticket_line(1)], Some(&coupon));

        assert_eq!(totals.discount, Money::from_cents(500));
        assert_eq!(totals.fees, Money::from_cents(225));
        assert_eq!(totals.total, Money::from_cents(4725));
    }

    #[test]
    fn test_fixed_coupon_is_capped_at_subtotal() {
        let coupon = coupon(DiscountType::Fixed, 80);
        let totals = cart_total(&[ticket_line(1)], Some(&coupon));

        assert_eq!(totals.discount, Money::from_major(50));
        assert_eq!(totals.fees, Money::ZERO);
        assert_eq!(totals.total, Money::ZERO);
    }

    #[test]
    fn test_merchandise_counts_towards_subtotal() {
        let event = fixtures::event("e1", "Nigeria", test_clock().now());
        let mut line = ticket_line(2).with_merchandise(&event.merchandise[0]);
        line.merchandise[0].quantity = 3;

        // 2 x 50 + 3 x 15
        assert_eq!(subtotal(&[line]), Money::from_major(145));
    }

    #[test]
    fn test_fee_keeps_fractions_until_display() {
        let mut line = ticket_line(1);
        line.sale_price = Money::from_cents(1999);
        let totals = cart_total(&[line], None);

        assert_eq!(totals.fees.amount(), Decimal::new(9995, 4));
        assert_eq!(totals.fees.to_string(), "1.00");
        assert_eq!(totals.total.to_string(), "20.99");
    }
}
