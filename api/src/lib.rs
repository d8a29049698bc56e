//! # TicketPlus API
//!
//! Typed client for the TicketPlus REST API: event catalog, coupon
//! validation, payment providers (payment intent, hosted checkout,
//! mobile money) and ticket lookup.
//!
//! The storefront never talks to `reqwest` directly. Reducers receive an
//! `Arc<dyn TicketPlusApi>` through their environment so tests can script
//! responses.
//!
//! ## Example
//!
//! ```no_run
//! use ticketplus_api::{TicketPlusApi, TicketPlusClient};
//!
//! # async fn example() -> Result<(), ticketplus_api::ApiError> {
//! let client = TicketPlusClient::new("https://api.ticketplus.app/api");
//! let events = client.list_events().await?;
//! println!("{} events", events.len());
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod error;
pub mod money;
pub mod types;

pub use client::TicketPlusClient;
pub use error::{ApiError, ApiResult};
pub use money::Money;
pub use types::*;

use futures::future::BoxFuture;

/// Boxed future returned by [`TicketPlusApi`] methods
pub type ApiFuture<'a, T> = BoxFuture<'a, ApiResult<T>>;

/// The REST operations the storefront consumes
///
/// Implemented by [`TicketPlusClient`] for production and by scripted mocks
/// in tests.
pub trait TicketPlusApi: Send + Sync {
    /// `GET /events`
    fn list_events(&self) -> ApiFuture<'_, Vec<Event>>;

    /// `GET /events/{id}`
    fn get_event(&self, id: EventId) -> ApiFuture<'_, Event>;

    /// `POST /coupons/validate`
    ///
    /// A `success: false` answer is returned as [`ApiError::Rejected`].
    fn validate_coupon(&self, request: CouponValidationRequest) -> ApiFuture<'_, Coupon>;

    /// `POST /payments/request-to-pay`, returning the provider reference id
    fn request_to_pay(&self, request: RequestToPay) -> ApiFuture<'_, String>;

    /// `GET /payments/payment-status/{referenceId}`
    fn payment_status(&self, reference_id: String) -> ApiFuture<'_, PaymentStatus>;

    /// `POST /payments/stripe/intent`, returning the client secret
    fn create_payment_intent(&self, request: PaymentIntentRequest) -> ApiFuture<'_, String>;

    /// `POST /payments/flutterwave/initialize`
    fn initialize_hosted_checkout(
        &self,
        request: HostedCheckoutRequest,
    ) -> ApiFuture<'_, HostedCheckoutSession>;

    /// `POST /payments/flutterwave/verify`
    ///
    /// `success: false` is a normal answer (`verified == false`), not an error.
    fn verify_hosted_checkout(
        &self,
        request: HostedVerificationRequest,
    ) -> ApiFuture<'_, HostedVerification>;

    /// `POST /tickets/find`
    fn find_tickets(&self, request: TicketLookupRequest) -> ApiFuture<'_, TicketLookup>;

    /// `GET /tickets/download/{qrIdentifier}`
    fn download_ticket(&self, qr_identifier: String) -> ApiFuture<'_, Vec<u8>>;
}
