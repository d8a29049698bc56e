//! `ScriptedApi`: a `TicketPlusApi` that replays queued responses.
//!
//! Each endpoint has its own queue. Responses are consumed in order and the
//! last one repeats, so a single `Pending` status keeps a poll loop pending
//! forever. An endpoint with nothing queued fails with
//! `ApiError::RequestFailed`. Every call is recorded for assertions.

use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};
use ticketplus_api::{
    ApiError, ApiFuture, ApiResult, Coupon, CouponValidationRequest, Event, EventId,
    HostedCheckoutRequest, HostedCheckoutSession, HostedVerification,
    HostedVerificationRequest, PaymentIntentRequest, PaymentStatus, RequestToPay, TicketLookup,
    TicketLookupRequest, TicketPlusApi,
};

/// A request received by [`ScriptedApi`]
#[derive(Clone, Debug, PartialEq)]
pub enum ApiCall {
    /// `GET /events`
    ListEvents,
    /// `GET /events/{id}`
    GetEvent(EventId),
    /// `POST /coupons/validate`
    ValidateCoupon(CouponValidationRequest),
    /// `POST /payments/request-to-pay`
    RequestToPay(RequestToPay),
    /// `GET /payments/payment-status/{id}`
    PaymentStatus(String),
    /// `POST /payments/stripe/intent`
    CreatePaymentIntent(PaymentIntentRequest),
    /// `POST /payments/flutterwave/initialize`
    InitializeHostedCheckout(HostedCheckoutRequest),
    /// `POST /payments/flutterwave/verify`
    VerifyHostedCheckout(HostedVerificationRequest),
    /// `POST /tickets/find`
    FindTickets(TicketLookupRequest),
    /// `GET /tickets/download/{qr}`
    DownloadTicket(String),
}

/// Queue of responses for one endpoint
#[derive(Debug)]
pub struct Script<T> {
    name: &'static str,
    responses: Mutex<VecDeque<ApiResult<T>>>,
}

impl<T: Clone> Script<T> {
    const fn new(name: &'static str) -> Self {
        Self {
            name,
            responses: Mutex::new(VecDeque::new()),
        }
    }

    /// Queue a response
    pub fn push(&self, response: ApiResult<T>) {
        self.responses
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(response);
    }

    /// Queue a successful response
    pub fn ok(&self, value: T) {
        self.push(Ok(value));
    }

    fn next(&self) -> ApiResult<T> {
        let mut responses = self.responses.lock().unwrap_or_else(PoisonError::into_inner);
        if responses.len() > 1 {
            return responses
                .pop_front()
                .unwrap_or_else(|| Err(self.unscripted()));
        }
        responses
            .front()
            .cloned()
            .unwrap_or_else(|| Err(self.unscripted()))
    }

    fn unscripted(&self) -> ApiError {
        ApiError::RequestFailed(format!("no scripted response for {}", self.name))
    }
}

/// Scripted `TicketPlusApi` implementation
#[derive(Debug)]
pub struct ScriptedApi {
    /// Responses for `list_events`
    pub events: Script<Vec<Event>>,
    /// Responses for `get_event`
    pub event: Script<Event>,
    /// Responses for `validate_coupon`
    pub coupon: Script<Coupon>,
    /// Responses for `request_to_pay`
    pub request_to_pay: Script<String>,
    /// Responses for `payment_status`
    pub payment_status: Script<PaymentStatus>,
    /// Responses for `create_payment_intent`
    pub payment_intent: Script<String>,
    /// Responses for `initialize_hosted_checkout`
    pub hosted_checkout: Script<HostedCheckoutSession>,
    /// Responses for `verify_hosted_checkout`
    pub hosted_verification: Script<HostedVerification>,
    /// Responses for `find_tickets`
    pub tickets: Script<TicketLookup>,
    /// Responses for `download_ticket`
    pub download: Script<Vec<u8>>,
    calls: Mutex<Vec<ApiCall>>,
}

impl ScriptedApi {
    /// An API with nothing scripted
    #[must_use]
    pub const fn new() -> Self {
        Self {
            events: Script::new("list_events"),
            event: Script::new("get_event"),
            coupon: Script::new("validate_coupon"),
            request_to_pay: Script::new("request_to_pay"),
            payment_status: Script::new("payment_status"),
            payment_intent: Script::new("create_payment_intent"),
            hosted_checkout: Script::new("initialize_hosted_checkout"),
            hosted_verification: Script::new("verify_hosted_checkout"),
            tickets: Script::new("find_tickets"),
            download: Script::new("download_ticket"),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Every call received so far, in order
    #[must_use]
    pub fn calls(&self) -> Vec<ApiCall> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of calls matching `predicate`
    #[must_use]
    pub fn count(&self, predicate: impl Fn(&ApiCall) -> bool) -> usize {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|call| predicate(call))
            .count()
    }

    fn record(&self, call: ApiCall) {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(call);
    }

    fn respond<T: Clone + Send + 'static>(&self, call: ApiCall, script: &Script<T>) -> ApiFuture<'_, T> {
        self.record(call);
        let response = script.next();
        Box::pin(async move { response })
    }
}

impl Default for ScriptedApi {
    fn default() -> Self {
        Self::new()
    }
}

impl TicketPlusApi for ScriptedApi {
    fn list_events(&self) -> ApiFuture<'_, Vec<Event>> {
        self.respond(ApiCall::ListEvents, &self.events)
    }

    fn get_event(&self, id: EventId) -> ApiFuture<'_, Event> {
        self.respond(ApiCall::GetEvent(id), &self.event)
    }

    fn validate_coupon(&self, request: CouponValidationRequest) -> ApiFuture<'_, Coupon> {
        self.respond(ApiCall::ValidateCoupon(request), &self.coupon)
    }

    fn request_to_pay(&self, request: RequestToPay) -> ApiFuture<'_, String> {
        self.respond(ApiCall::RequestToPay(request), &self.request_to_pay)
    }

    fn payment_status(&self, reference_id: String) -> ApiFuture<'_, PaymentStatus> {
        self.respond(ApiCall::PaymentStatus(reference_id), &self.payment_status)
    }

    fn create_payment_intent(&self, request: PaymentIntentRequest) -> ApiFuture<'_, String> {
        self.respond(ApiCall::CreatePaymentIntent(request), &self.payment_intent)
    }

    fn initialize_hosted_checkout(
        &self,
        request: HostedCheckoutRequest,
    ) -> ApiFuture<'_, HostedCheckoutSession> {
        self.respond(ApiCall::InitializeHostedCheckout(request), &self.hosted_checkout)
    }

    fn verify_hosted_checkout(
        &self,
        request: HostedVerificationRequest,
    ) -> ApiFuture<'_, HostedVerification> {
        self.respond(ApiCall::VerifyHostedCheckout(request), &self.hosted_verification)
    }

    fn find_tickets(&self, request: TicketLookupRequest) -> ApiFuture<'_, TicketLookup> {
        self.respond(ApiCall::FindTickets(request), &self.tickets)
    }

    fn download_ticket(&self, qr_identifier: String) -> ApiFuture<'_, Vec<u8>> {
        self.respond(ApiCall::DownloadTicket(qr_identifier), &self.download)
    }
}
