//! Order snapshot taken when checkout starts, and the payloads built from it

use super::regional::{self, DEFAULT_COUNTRY};
use super::validation::ContactInfo;
use crate::cart::{cart_total, CartItem, CartTotals};
use serde::{Deserialize, Serialize};
use ticketplus_api::{
    Coupon, HostedCheckoutRequest, MerchandiseLine, OrderContact, OrderCoupon, OrderDetails,
    OrderTicketLine, PaymentIntentRequest, PaymentMetadata, PaymentType, RequestToPay,
};

/// What is being bought
///
/// Frozen at the start of checkout so the amount charged cannot drift while
/// the buyer fills in the form.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderDraft {
    /// Cart lines
    pub items: Vec<CartItem>,
    /// Totals of `items` with the coupon applied
    pub totals: CartTotals,
    /// Country of the first line
    pub country: String,
    /// Currency charged for `country`
    pub currency: String,
    /// Coupon applied to the order
    pub coupon_code: Option<String>,
}

impl OrderDraft {
    /// Snapshot a cart
    #[must_use]
    pub fn from_cart(items: &[CartItem], coupon: Option<&Coupon>) -> Self {
        let country = items
            .first()
            .map_or_else(|| DEFAULT_COUNTRY.to_string(), |item| item.country.clone());

        Self {
            items: items.to_vec(),
            totals: cart_total(items, coupon),
            currency: regional::currency_code(&country).to_string(),
            country,
            coupon_code: coupon.map(|c| c.code.clone()),
        }
    }

    /// Nothing to pay for
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Order details shared by every provider request
    #[must_use]
    pub fn details(&self, contact: &ContactInfo) -> OrderDetails {
        OrderDetails {
            tickets: self.items.iter().map(ticket_line).collect(),
            contact_info: OrderContact {
                email: contact.email.clone(),
                phone: contact.phone.clone(),
                name: contact.full_name(),
                country: self.country.clone(),
            },
            coupon: self
                .coupon_code
                .as_ref()
                .map(|code| OrderCoupon { code: code.clone() }),
        }
    }

    /// Mobile-money collection request for `phone`
    #[must_use]
    pub fn request_to_pay(&self, contact: &ContactInfo, phone: &str) -> RequestToPay {
        RequestToPay {
            total: self.totals.total,
            phone: phone.to_string(),
            payment_type: PaymentType::TicketPurchase,
            currency: self.currency.clone(),
            metadata: PaymentMetadata::order_only(self.details(contact)),
        }
    }

    /// Card payment intent request
    #[must_use]
    pub fn payment_intent(&self, contact: &ContactInfo) -> PaymentIntentRequest {
        PaymentIntentRequest {
            amount: self.totals.total,
            currency: self.currency.to_lowercase(),
            metadata: PaymentMetadata {
                email: Some(contact.email.clone()),
                name: Some(contact.full_name()),
                phone: Some(contact.phone.clone()),
                country: Some(self.country.clone()),
                currency: None,
                order_details: self.details(contact),
            },
        }
    }

    /// Hosted checkout initialization request
    #[must_use]
    pub fn hosted_checkout(&self, contact: &ContactInfo) -> HostedCheckoutRequest {
        HostedCheckoutRequest {
            amount: self.totals.total,
            email: contact.email.clone(),
            name: contact.full_name(),
            phone: contact.phone.clone(),
            metadata: PaymentMetadata {
                email: None,
                name: None,
                phone: None,
                country: Some(self.country.clone()),
                currency: Some(self.currency.clone()),
                order_details: self.details(contact),
            },
        }
    }
}

fn ticket_line(item: &CartItem) -> OrderTicketLine {
    OrderTicketLine {
        ticket_id: item.ticket_id.clone(),
        ticket_name: item.ticket_name.clone(),
        ticket_price: item.sale_price,
        owner: item.event.owner.clone(),
        event: item.event.id.clone(),
        event_name: item.event.name.clone(),
        event_category: item.event.category.clone(),
        quantity: item.quantity,
        total_amount: item.ticket_total(),
        starting_time: item.event.starting_time,
        ending_time: item.event.ending_time,
        merchandise: item
            .merchandise
            .iter()
            .map(|m| MerchandiseLine {
                id: m.id.clone(),
                item_name: m.item_name.clone(),
                price: m.price,
                qty: m.quantity,
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use ticketplus_api::{DiscountType, Money, TicketId};
    use ticketplus_core::environment::Clock;
    use ticketplus_testing::{fixtures, test_clock};

    fn contact() -> ContactInfo {
        ContactInfo {
            first_name: "Ada".to_string(),
            last_name: "Obi".to_string(),
            email: "ada@example.com".to_string(),
            phone: "+256700000000".to_string(),
        }
    }

    fn uganda_order() -> OrderDraft {
        let event = fixtures::event("e1", "Uganda", test_clock().now());
        let item = CartItem::new(&event, &TicketId::new("e1-regular"), 2)
            .map(|item| item.with_merchandise(&event.merchandise[0]))
            .into_iter()
            .collect::<Vec<_>>();
        let coupon = Coupon {
            code: "SAVE10".to_string(),
            discount_type: DiscountType::Percentage,
            discount_value: Decimal::from(10),
        };
        OrderDraft::from_cart(&item, Some(&coupon))
    }

    #[test]
    fn test_country_and_currency_follow_first_item() {
        let order = uganda_order();
        assert_eq!(order.country, "Uganda");
        assert_eq!(order.currency, "UGX");
        assert_eq!(order.coupon_code.as_deref(), Some("SAVE10"));

        let empty = OrderDraft::from_cart(&[], None);
        assert_eq!(empty.country, "Nigeria");
        assert_eq!(empty.currency, "NGN");
        assert!(empty.is_empty());
    }

    #[test]
    fn test_order_details_lines() {
        let details = uganda_order().details(&contact());

        assert_eq!(details.tickets.len(), 1);
        assert_eq!(details.tickets[0].quantity, 2);
        assert_eq!(details.tickets[0].total_amount, Money::from_major(100));
        assert_eq!(details.tickets[0].merchandise[0].qty, 1);
        assert_eq!(details.contact_info.name, "Ada Obi");
        assert_eq!(details.coupon, Some(OrderCoupon { code: "SAVE10".to_string() }));
    }

    #[test]
    fn test_provider_payloads() {
        let order = uganda_order();
        let contact = contact();

        let momo = order.request_to_pay(&contact, "256700000000");
        assert_eq!(momo.total, order.totals.total);
        assert_eq!(momo.currency, "UGX");
        assert!(momo.metadata.email.is_none());

        let intent = order.payment_intent(&contact);
        assert_eq!(intent.currency, "ugx");
        assert_eq!(intent.metadata.country.as_deref(), Some("Uganda"));

        let hosted = order.hosted_checkout(&contact);
        assert_eq!(hosted.name, "Ada Obi");
        assert_eq!(hosted.metadata.currency.as_deref(), Some("UGX"));
    }
}
