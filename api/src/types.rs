//! Wire types for the TicketPlus REST API.
//!
//! Field names follow the API's JSON (camelCase, `_id` for identifiers).

use crate::money::Money;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Identifiers
// ============================================================================

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create an id from its string form
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// The id as a string slice
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self::new(id)
            }
        }
    };
}

string_id!(
    /// Identifier of an event
    EventId
);
string_id!(
    /// Identifier of a ticket type within an event
    TicketId
);
string_id!(
    /// Identifier of a merchandise item within an event
    MerchandiseId
);

// ============================================================================
// Catalog
// ============================================================================

/// An event listed on the storefront
///
/// Fetched from the API and never mutated locally.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    /// Event id
    #[serde(rename = "_id")]
    pub id: EventId,
    /// Display name
    pub name: String,
    /// Long description
    #[serde(default)]
    pub description: String,
    /// Organizer blurb
    #[serde(default)]
    pub about_organizer: String,
    /// Poster image
    #[serde(default)]
    pub image_url: String,
    /// Venue
    #[serde(default)]
    pub location: String,
    /// Country the event takes place in
    pub country: String,
    /// Start time
    pub starting_time: DateTime<Utc>,
    /// End time
    pub ending_time: DateTime<Utc>,
    /// Category label
    #[serde(default)]
    pub category: String,
    /// Remaining ticket quantity
    #[serde(default)]
    pub quantity: i64,
    /// Organizer account id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    /// Ticket types on sale
    #[serde(default)]
    pub tickets: Vec<Ticket>,
    /// Merchandise sold alongside tickets
    #[serde(default)]
    pub merchandise: Vec<MerchandiseItem>,
}

impl Event {
    /// No tickets left
    #[must_use]
    pub const fn is_sold_out(&self) -> bool {
        self.quantity < 1
    }

    /// Look up a ticket type by id
    #[must_use]
    pub fn ticket(&self, id: &TicketId) -> Option<&Ticket> {
        self.tickets.iter().find(|t| &t.id == id)
    }
}

/// A ticket type of an event
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ticket {
    /// Ticket id
    #[serde(rename = "_id")]
    pub id: TicketId,
    /// Display name ("VIP", "Regular", ...)
    pub name: String,
    /// Unit price
    pub price: Money,
    /// QR identifier, present on issued tickets
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub qr_identifier: Option<String>,
}

/// Merchandise sold with an event
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MerchandiseItem {
    /// Item id
    #[serde(rename = "_id")]
    pub id: MerchandiseId,
    /// Display name
    pub item_name: String,
    /// Image url
    #[serde(default)]
    pub item_image: String,
    /// Unit price
    pub price: Money,
}

/// `GET /events` returns either `{events: [...]}` or a bare array
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum EventsEnvelope {
    Wrapped { events: Vec<Event> },
    Bare(Vec<Event>),
}

impl From<EventsEnvelope> for Vec<Event> {
    fn from(envelope: EventsEnvelope) -> Self {
        match envelope {
            EventsEnvelope::Wrapped { events } | EventsEnvelope::Bare(events) => events,
        }
    }
}

/// `GET /events/{id}` returns either `{event: {...}}` or a bare event
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum EventEnvelope {
    Wrapped { event: Box<Event> },
    Bare(Box<Event>),
}

impl From<EventEnvelope> for Event {
    fn from(envelope: EventEnvelope) -> Self {
        match envelope {
            EventEnvelope::Wrapped { event } | EventEnvelope::Bare(event) => *event,
        }
    }
}

// ============================================================================
// Coupons
// ============================================================================

/// How a coupon's value is applied
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiscountType {
    /// `value` percent of the subtotal
    Percentage,
    /// Flat `value` off the subtotal
    #[serde(other)]
    Fixed,
}

/// A validated discount coupon
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Coupon {
    /// Code the customer entered
    pub code: String,
    /// Percentage or fixed amount
    pub discount_type: DiscountType,
    /// Percent or amount, depending on `discount_type`
    #[serde(with = "rust_decimal::serde::float")]
    pub discount_value: Decimal,
}

/// Body of `POST /coupons/validate`
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CouponValidationRequest {
    /// Code to validate
    pub code: String,
    /// Event of the first cart line
    pub event_id: EventId,
    /// Always `"guest"` for storefront purchases
    pub user_id: String,
}

impl CouponValidationRequest {
    /// Guest validation for `code` against `event_id`
    #[must_use]
    pub fn guest(code: impl Into<String>, event_id: EventId) -> Self {
        Self {
            code: code.into(),
            event_id,
            user_id: "guest".to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct CouponValidationResponse {
    #[serde(default)]
    pub success: bool,
    pub coupon: Option<Coupon>,
    pub message: Option<String>,
}

// ============================================================================
// Orders and payments
// ============================================================================

/// A merchandise selection inside an order line
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MerchandiseLine {
    /// Merchandise id
    #[serde(rename = "_id")]
    pub id: MerchandiseId,
    /// Display name
    pub item_name: String,
    /// Unit price captured when the item was added
    pub price: Money,
    /// Quantity (at least 1)
    pub qty: u32,
}

/// One ticket line of the order details sent to payment providers
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderTicketLine {
    pub ticket_id: TicketId,
    pub ticket_name: String,
    pub ticket_price: Money,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    pub event: EventId,
    pub event_name: String,
    pub event_category: String,
    pub quantity: u32,
    /// Ticket price times quantity (merchandise excluded)
    pub total_amount: Money,
    pub starting_time: DateTime<Utc>,
    pub ending_time: DateTime<Utc>,
    pub merchandise: Vec<MerchandiseLine>,
}

/// Buyer contact block of the order details
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderContact {
    pub email: String,
    pub phone: String,
    /// First and last name joined by a space
    pub name: String,
    pub country: String,
}

/// Coupon reference attached to an order
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderCoupon {
    pub code: String,
}

/// Order details shared by every payment provider request
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderDetails {
    pub tickets: Vec<OrderTicketLine>,
    pub contact_info: OrderContact,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coupon: Option<OrderCoupon>,
}

/// Metadata envelope around [`OrderDetails`]
///
/// Each provider expects a slightly different set of top-level keys;
/// absent keys are omitted from the JSON.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    pub order_details: OrderDetails,
}

impl PaymentMetadata {
    /// Metadata carrying only the order details
    #[must_use]
    pub const fn order_only(order_details: OrderDetails) -> Self {
        Self {
            email: None,
            name: None,
            phone: None,
            country: None,
            currency: None,
            order_details,
        }
    }
}

/// Purpose of a mobile-money collection
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentType {
    /// Storefront ticket purchase
    TicketPurchase,
}

/// Body of `POST /payments/request-to-pay`
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestToPay {
    pub total: Money,
    /// Mobile-money number including country code
    pub phone: String,
    pub payment_type: PaymentType,
    pub currency: String,
    pub metadata: PaymentMetadata,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RequestToPayData {
    pub reference_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RequestToPayResponse {
    #[serde(default)]
    pub success: bool,
    pub data: Option<RequestToPayData>,
    pub error: Option<String>,
}

/// Status of a mobile-money collection
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum PaymentStatus {
    /// Paid
    Completed,
    /// Provider timed out waiting for the customer
    Timeout,
    /// Customer or provider cancelled
    Canceled,
    /// Payment failed
    Failed,
    /// Request expired
    Expired,
    /// Any non-terminal status (`PENDING`, `PROCESSING`, ...)
    Pending(String),
}

impl PaymentStatus {
    /// Wire form of the status
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Completed => "COMPLETED",
            Self::Timeout => "TIMEOUT",
            Self::Canceled => "CANCELED",
            Self::Failed => "FAILED",
            Self::Expired => "EXPIRED",
            Self::Pending(status) => status,
        }
    }

    /// Whether polling should stop
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending(_))
    }
}

impl From<String> for PaymentStatus {
    fn from(status: String) -> Self {
        match status.as_str() {
            "COMPLETED" => Self::Completed,
            "TIMEOUT" => Self::Timeout,
            "CANCELED" => Self::Canceled,
            "FAILED" => Self::Failed,
            "EXPIRED" => Self::Expired,
            _ => Self::Pending(status),
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct PaymentStatusResponse {
    pub status: PaymentStatus,
}

/// Body of `POST /payments/stripe/intent`
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PaymentIntentRequest {
    pub amount: Money,
    /// Lowercase ISO currency code
    pub currency: String,
    pub metadata: PaymentMetadata,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PaymentIntentData {
    pub client_secret: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PaymentIntentResponse {
    #[serde(default)]
    pub success: bool,
    pub data: Option<PaymentIntentData>,
    pub message: Option<String>,
}

/// Body of `POST /payments/flutterwave/initialize`
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HostedCheckoutRequest {
    pub amount: Money,
    pub email: String,
    pub name: String,
    pub phone: String,
    pub metadata: PaymentMetadata,
}

/// Customer block of a hosted checkout session
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostedCustomer {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone_number: String,
    #[serde(default)]
    pub name: String,
}

/// Branding shown in the hosted checkout modal
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostedCustomizations {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub logo: String,
}

/// Hosted checkout session returned by the initialize call
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostedCheckoutSession {
    pub public_key: String,
    pub tx_ref: String,
    pub currency: String,
    #[serde(default)]
    pub payment_options: String,
    #[serde(default)]
    pub customer: HostedCustomer,
    #[serde(default)]
    pub customizations: HostedCustomizations,
}

#[derive(Debug, Deserialize)]
pub(crate) struct HostedCheckoutResponse {
    #[serde(default)]
    pub success: bool,
    pub data: Option<HostedCheckoutSession>,
    pub message: Option<String>,
}

/// Body of `POST /payments/flutterwave/verify`
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HostedVerificationRequest {
    pub transaction_id: String,
    pub tx_ref: String,
}

/// Result of verifying a hosted checkout transaction
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HostedVerification {
    /// The API confirmed the payment
    pub verified: bool,
    /// Order created for the payment, when verified
    pub order_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct HostedVerificationData {
    pub order_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct HostedVerificationResponse {
    #[serde(default)]
    pub success: bool,
    pub data: Option<HostedVerificationData>,
}

// ============================================================================
// Ticket lookup
// ============================================================================

/// Body of `POST /tickets/find`
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketLookupRequest {
    pub email: String,
    pub order_reference: String,
}

/// Merchandise attached to an issued ticket
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssuedMerchandise {
    pub item_name: String,
    pub qty: u32,
}

/// A ticket issued for a past order
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssuedTicket {
    pub event_name: String,
    pub ticket_name: String,
    pub quantity: u32,
    pub starting_time: DateTime<Utc>,
    #[serde(default)]
    pub ending_time: Option<DateTime<Utc>>,
    pub order_id: String,
    #[serde(default)]
    pub qr_identifier: Option<String>,
    #[serde(default)]
    pub pdf_url: Option<String>,
    #[serde(default)]
    pub event_location: Option<String>,
    #[serde(default)]
    pub merchandise: Vec<IssuedMerchandise>,
    #[serde(default)]
    pub is_user_order: bool,
}

/// Tickets found for an email or order reference
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TicketLookup {
    pub tickets: Vec<IssuedTicket>,
    /// The buyer has a TicketPlus app account
    pub has_app_access: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct TicketLookupResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub tickets: Vec<IssuedTicket>,
    #[serde(default)]
    pub has_app_access: bool,
    pub message: Option<String>,
}

/// Error body shape used by the API for non-2xx responses
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    pub message: Option<String>,
}
