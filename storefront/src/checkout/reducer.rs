//! Checkout Flow Controller
//!
//! A step machine: contact details, then payment method, then confirmation.
//! Mobile-money payments add a pending step that polls the provider until
//! the payment settles, the attempt budget runs out or the deadline fires.
//!
//! The poll schedule and the deadline are cancellable effects registered
//! under [`MOBILE_MONEY_POLL`] and [`MOBILE_MONEY_DEADLINE`]. Every way out
//! of the pending step cancels both.

use super::order::OrderDraft;
use super::regional::{payment_methods, PaymentMethod};
use super::validation::{validate_contact, validate_payment, ContactInfo, FieldErrors};
use crate::config::PollPolicy;
use crate::notification::Notifications;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use ticketplus_api::{
    ApiError, HostedCheckoutSession, HostedVerification, HostedVerificationRequest,
    PaymentStatus, TicketPlusApi,
};
use ticketplus_core::{
    effect::{Effect, EffectId},
    environment::Clock,
    reducer::Reducer,
    smallvec, SmallVec,
};

/// Id of the request-to-pay call and the status poll schedule
pub const MOBILE_MONEY_POLL: EffectId = EffectId::new("mobile-money-poll");

/// Id of the mobile-money payment deadline
pub const MOBILE_MONEY_DEADLINE: EffectId = EffectId::new("mobile-money-deadline");

type Effects = SmallVec<[Effect<CheckoutAction>; 4]>;

// ============================================================================
// State
// ============================================================================

/// A mobile-money payment waiting for the buyer to approve it
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MobileMoneyPayment {
    /// Wallet charged
    pub phone: String,
    /// Provider reference, once the request was accepted
    pub reference_id: Option<String>,
    /// When the request was accepted
    pub started_at: Option<DateTime<Utc>>,
    /// Status requests made so far
    pub attempts: u32,
}

/// Where the buyer is in checkout
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum CheckoutStep {
    /// Entering contact details
    #[default]
    ContactInfo,
    /// Choosing and running a payment method
    PaymentMethod,
    /// Waiting for a mobile-money payment to settle
    MobileMoneyPending(MobileMoneyPayment),
    /// Paid
    Confirmation {
        /// Order or provider reference shown to the buyer
        order_reference: String,
    },
}

/// Checkout state
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CheckoutState {
    /// Current step
    pub step: CheckoutStep,
    /// Buyer details
    pub contact: ContactInfo,
    /// Errors of the last validated step
    pub errors: FieldErrors,
    /// Order being paid, set by `Start`
    pub order: Option<OrderDraft>,
    /// Selected payment method
    pub payment_method: Option<PaymentMethod>,
    /// Wallet number for mobile-money methods
    pub mobile_money_number: String,
    /// A provider call is in flight
    pub processing: bool,
    /// Card payment intent secret for the card element
    pub card_client_secret: Option<String>,
    /// Open hosted checkout session
    pub hosted_session: Option<HostedCheckoutSession>,
    /// Messages for the buyer
    pub notifications: Notifications,
}

impl CheckoutState {
    /// Methods offered for the order's country
    #[must_use]
    pub fn available_methods(&self) -> &'static [PaymentMethod] {
        self.order
            .as_ref()
            .map_or(&[], |order| payment_methods(&order.country))
    }

    /// Whether checkout reached `Confirmation`
    #[must_use]
    pub const fn is_confirmed(&self) -> bool {
        matches!(self.step, CheckoutStep::Confirmation { .. })
    }

    /// Reference of the confirmed order
    #[must_use]
    pub fn order_reference(&self) -> Option<&str> {
        match &self.step {
            CheckoutStep::Confirmation { order_reference } => Some(order_reference),
            _ => None,
        }
    }

    /// The pending mobile-money payment, if any
    #[must_use]
    pub const fn mobile_money(&self) -> Option<&MobileMoneyPayment> {
        match &self.step {
            CheckoutStep::MobileMoneyPending(payment) => Some(payment),
            _ => None,
        }
    }

    fn is_current_reference(&self, reference_id: &str) -> bool {
        self.mobile_money()
            .and_then(|payment| payment.reference_id.as_deref())
            == Some(reference_id)
    }
}

// ============================================================================
// Actions
// ============================================================================

/// Inputs of the checkout controller
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CheckoutAction {
    /// Begin checkout for `order`
    Start {
        /// Snapshot of the cart
        order: OrderDraft,
    },
    /// Replace the contact details
    SetContactInfo(ContactInfo),
    /// Validate contact details and move to payment
    ContinueToPayment,
    /// Return to contact details
    BackToContactInfo,
    /// Choose a payment method
    SelectPaymentMethod(PaymentMethod),
    /// Replace the wallet number
    SetMobileMoneyNumber(String),
    /// Validate the payment step and call the provider
    ProcessPayment,

    /// Card payment intent created
    CardIntentCreated {
        /// Secret handed to the card element
        client_secret: String,
    },
    /// Card payment intent could not be created
    CardIntentFailed {
        /// Message for the buyer
        message: String,
    },
    /// The card element confirmed the payment
    CardPaymentConfirmed {
        /// Provider payment intent id
        payment_intent_id: String,
    },
    /// The card element reported a failure
    CardPaymentFailed {
        /// Provider message
        message: String,
    },

    /// Hosted checkout session initialized
    HostedCheckoutReady(HostedCheckoutSession),
    /// Hosted checkout could not be initialized
    HostedCheckoutFailed {
        /// Message for the buyer
        message: String,
    },
    /// The hosted checkout reported a result
    HostedCheckoutCallback {
        /// Provider status, `successful` or `completed` when paid
        status: String,
        /// Provider transaction id
        transaction_id: String,
        /// Transaction reference of the session
        tx_ref: String,
    },
    /// Verification answer for a hosted checkout transaction
    HostedCheckoutVerified {
        /// Transaction that was verified
        transaction_id: String,
        /// API answer
        verification: HostedVerification,
    },
    /// Verification request failed
    HostedCheckoutVerificationFailed,
    /// The buyer closed the hosted checkout
    HostedCheckoutClosed,

    /// The provider accepted the request-to-pay
    MobileMoneyRequested {
        /// Provider reference to poll
        reference_id: String,
    },
    /// The request-to-pay was refused or failed
    MobileMoneyRequestFailed {
        /// Message for the buyer
        message: String,
    },
    /// Time to ask for the payment status
    PollMobileMoney {
        /// Payment to poll
        reference_id: String,
    },
    /// Status answer
    MobileMoneyStatus {
        /// Payment polled
        reference_id: String,
        /// Provider status
        status: PaymentStatus,
    },
    /// Status request failed
    MobileMoneyStatusFailed {
        /// Payment polled
        reference_id: String,
    },
    /// The payment deadline passed
    MobileMoneyDeadlineReached {
        /// Payment that expired
        reference_id: String,
    },
    /// The buyer closed the pending dialog
    CancelMobileMoney,

    /// Abandon checkout
    Reset,
}

// ============================================================================
// Environment
// ============================================================================

/// Dependencies of the checkout controller
#[derive(Clone)]
pub struct CheckoutEnvironment {
    /// REST API
    pub api: Arc<dyn TicketPlusApi>,
    /// Time source for the payment deadline
    pub clock: Arc<dyn Clock>,
    /// Mobile-money polling budget
    pub poll: PollPolicy,
}

impl CheckoutEnvironment {
    /// Creates a new `CheckoutEnvironment`
    #[must_use]
    pub fn new(api: Arc<dyn TicketPlusApi>, clock: Arc<dyn Clock>, poll: PollPolicy) -> Self {
        Self { api, clock, poll }
    }
}

// ============================================================================
// Reducer
// ============================================================================

/// Reducer for the checkout flow
#[derive(Clone, Debug, Default)]
pub struct CheckoutReducer;

fn failure_message(error: &ApiError, fallback: &str) -> String {
    error.server_message().unwrap_or(fallback).to_string()
}

fn cancel_mobile_money() -> Effects {
    smallvec![
        Effect::Cancel(MOBILE_MONEY_POLL),
        Effect::Cancel(MOBILE_MONEY_DEADLINE),
    ]
}

impl CheckoutReducer {
    /// Creates a new `CheckoutReducer`
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    fn start(state: &mut CheckoutState, order: OrderDraft) -> Effects {
        if order.is_empty() {
            state.notifications.error("Your cart is empty");
            return smallvec![Effect::None];
        }

        tracing::info!(
            country = %order.country,
            currency = %order.currency,
            total = %order.totals.total,
            "Checkout started"
        );

        *state = CheckoutState {
            contact: std::mem::take(&mut state.contact),
            notifications: std::mem::take(&mut state.notifications),
            order: Some(order),
            ..CheckoutState::default()
        };
        cancel_mobile_money()
    }

    fn continue_to_payment(state: &mut CheckoutState) {
        if state.step != CheckoutStep::ContactInfo {
            return;
        }

        state.errors = validate_contact(&state.contact);
        if state.errors.is_empty() {
            state.step = CheckoutStep::PaymentMethod;
        } else {
            tracing::debug!(fields = state.errors.len(), "Contact details rejected");
            state.notifications.error("Please correct the errors in the form");
        }
    }

    fn select_payment_method(state: &mut CheckoutState, method: PaymentMethod) {
        if state.step != CheckoutStep::PaymentMethod {
            return;
        }
        if !state.available_methods().contains(&method) {
            tracing::warn!(%method, "Payment method not offered for this order");
            return;
        }

        state.payment_method = Some(method);
        state.processing = false;
        state.card_client_secret = None;
        state.hosted_session = None;
        state.errors = FieldErrors::default();
    }

    fn process_payment(state: &mut CheckoutState, env: &CheckoutEnvironment) -> Effects {
        if state.step != CheckoutStep::PaymentMethod || state.processing {
            return smallvec![Effect::None];
        }
        let Some(order) = state.order.clone() else {
            return smallvec![Effect::None];
        };

        state.errors = validate_payment(state.payment_method, &state.mobile_money_number);
        if !state.errors.is_empty() {
            state.notifications.error("Please correct the payment information");
            return smallvec![Effect::None];
        }
        let Some(method) = state.payment_method else {
            return smallvec![Effect::None];
        };

        state.processing = true;
        let api = Arc::clone(&env.api);
        tracing::info!(%method, total = %order.totals.total, "Processing payment");

        match method {
            PaymentMethod::Card => {
                let request = order.payment_intent(&state.contact);
                smallvec![Effect::future(async move {
                    Some(match api.create_payment_intent(request).await {
                        Ok(client_secret) => CheckoutAction::CardIntentCreated { client_secret },
                        Err(error) => {
                            tracing::warn!(%error, "Payment intent failed");
                            CheckoutAction::CardIntentFailed {
                                message: failure_message(
                                    &error,
                                    "Failed to set up payment. Please try again.",
                                ),
                            }
                        },
                    })
                })]
            },
            PaymentMethod::HostedCard => {
                let request = order.hosted_checkout(&state.contact);
                smallvec![Effect::future(async move {
                    Some(match api.initialize_hosted_checkout(request).await {
                        Ok(session) => CheckoutAction::HostedCheckoutReady(session),
                        Err(error) => {
                            tracing::warn!(%error, "Hosted checkout initialization failed");
                            CheckoutAction::HostedCheckoutFailed {
                                message: failure_message(
                                    &error,
                                    "Failed to initialize Flutterwave payment",
                                ),
                            }
                        },
                    })
                })]
            },
            PaymentMethod::MtnMomo | PaymentMethod::OrangeMoney | PaymentMethod::AirtelMoney => {
                let phone: String = state
                    .mobile_money_number
                    .chars()
                    .filter(char::is_ascii_digit)
                    .collect();
                let request = order.request_to_pay(&state.contact, &phone);
                state.step = CheckoutStep::MobileMoneyPending(MobileMoneyPayment {
                    phone,
                    reference_id: None,
                    started_at: None,
                    attempts: 0,
                });

                smallvec![Effect::future(async move {
                    Some(match api.request_to_pay(request).await {
                        Ok(reference_id) => CheckoutAction::MobileMoneyRequested { reference_id },
                        Err(error) => {
                            tracing::warn!(%error, "Request to pay failed");
                            CheckoutAction::MobileMoneyRequestFailed {
                                message: failure_message(
                                    &error,
                                    "Mobile Money payment failed. Please try again.",
                                ),
                            }
                        },
                    })
                })
                .cancellable(MOBILE_MONEY_POLL)]
            },
        }
    }

    fn confirm(state: &mut CheckoutState, order_reference: String) {
        tracing::info!(%order_reference, "Payment confirmed");
        state.step = CheckoutStep::Confirmation { order_reference };
        state.processing = false;
        state.card_client_secret = None;
        state.hosted_session = None;
        state.notifications.success("Payment successful!");
    }

    /// Leave the pending step with an error
    fn fail_mobile_money(state: &mut CheckoutState, message: &str) -> Effects {
        state.step = CheckoutStep::PaymentMethod;
        state.processing = false;
        state.notifications.error(message);
        cancel_mobile_money()
    }

    // ------------------------------------------------------------------------
    // Card
    // ------------------------------------------------------------------------

    fn awaiting(state: &CheckoutState, method: PaymentMethod) -> bool {
        state.step == CheckoutStep::PaymentMethod && state.payment_method == Some(method)
    }

    // ------------------------------------------------------------------------
    // Mobile money
    // ------------------------------------------------------------------------

    fn mobile_money_requested(
        state: &mut CheckoutState,
        reference_id: String,
        env: &CheckoutEnvironment,
    ) -> Effects {
        let now = env.clock.now();
        let CheckoutStep::MobileMoneyPending(payment) = &mut state.step else {
            tracing::debug!(%reference_id, "Request accepted after checkout moved on");
            return smallvec![Effect::None];
        };
        if payment.reference_id.is_some() {
            return smallvec![Effect::None];
        }

        tracing::info!(%reference_id, "Mobile money request accepted");
        payment.reference_id = Some(reference_id.clone());
        payment.started_at = Some(now);
        state
            .notifications
            .success("Payment request sent. Check your mobile money app");

        let deadline = Effect::Delay {
            duration: env.poll.max_payment_time,
            action: Box::new(CheckoutAction::MobileMoneyDeadlineReached {
                reference_id: reference_id.clone(),
            }),
        }
        .cancellable(MOBILE_MONEY_DEADLINE);

        let mut effects = smallvec![deadline];
        effects.extend(Self::poll(state, reference_id, env));
        effects
    }

    fn poll(state: &mut CheckoutState, reference_id: String, env: &CheckoutEnvironment) -> Effects {
        if !state.is_current_reference(&reference_id) {
            return smallvec![Effect::None];
        }
        let now = env.clock.now();
        let CheckoutStep::MobileMoneyPending(payment) = &mut state.step else {
            return smallvec![Effect::None];
        };

        let elapsed = payment
            .started_at
            .and_then(|started| (now - started).to_std().ok())
            .unwrap_or_default();

        if payment.attempts >= env.poll.max_attempts || elapsed >= env.poll.max_payment_time {
            tracing::warn!(
                %reference_id,
                attempts = payment.attempts,
                elapsed_secs = elapsed.as_secs(),
                "Mobile money polling budget exhausted"
            );
            return Self::fail_mobile_money(state, "Payment verification timed out.");
        }

        payment.attempts += 1;
        tracing::debug!(%reference_id, attempt = payment.attempts, "Polling payment status");

        let api = Arc::clone(&env.api);
        smallvec![Effect::future(async move {
            Some(match api.payment_status(reference_id.clone()).await {
                Ok(status) => CheckoutAction::MobileMoneyStatus {
                    reference_id,
                    status,
                },
                Err(error) => {
                    tracing::warn!(%reference_id, %error, "Payment status request failed");
                    CheckoutAction::MobileMoneyStatusFailed { reference_id }
                },
            })
        })
        .cancellable(MOBILE_MONEY_POLL)]
    }

    fn mobile_money_status(
        state: &mut CheckoutState,
        reference_id: String,
        status: PaymentStatus,
        env: &CheckoutEnvironment,
    ) -> Effects {
        if !state.is_current_reference(&reference_id) {
            tracing::debug!(%reference_id, %status, "Ignoring status for stale payment");
            return smallvec![Effect::None];
        }

        match status {
            PaymentStatus::Completed => {
                Self::confirm(state, reference_id);
                cancel_mobile_money()
            },
            PaymentStatus::Pending(_) => smallvec![Effect::Delay {
                duration: env.poll.interval,
                action: Box::new(CheckoutAction::PollMobileMoney { reference_id }),
            }
            .cancellable(MOBILE_MONEY_POLL)],
            terminal => {
                let message = format!("Payment {}.", terminal.as_str().to_lowercase());
                Self::fail_mobile_money(state, &message)
            },
        }
    }
}

impl Reducer for CheckoutReducer {
    type State = CheckoutState;
    type Action = CheckoutAction;
    type Environment = CheckoutEnvironment;

    #[allow(clippy::too_many_lines)] // One arm per action
    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        match action {
            CheckoutAction::Start { order } => return Self::start(state, order),
            CheckoutAction::SetContactInfo(contact) => state.contact = contact,
            CheckoutAction::ContinueToPayment => Self::continue_to_payment(state),
            CheckoutAction::BackToContactInfo => {
                if state.step == CheckoutStep::PaymentMethod {
                    state.step = CheckoutStep::ContactInfo;
                    state.processing = false;
                }
            },
            CheckoutAction::SelectPaymentMethod(method) => {
                Self::select_payment_method(state, method);
            },
            CheckoutAction::SetMobileMoneyNumber(number) => state.mobile_money_number = number,
            CheckoutAction::ProcessPayment => return Self::process_payment(state, env),

            CheckoutAction::CardIntentCreated { client_secret } => {
                if Self::awaiting(state, PaymentMethod::Card) && state.processing {
                    state.card_client_secret = Some(client_secret);
                    state.processing = false;
                }
            },
            CheckoutAction::CardIntentFailed { message } => {
                if Self::awaiting(state, PaymentMethod::Card) && state.processing {
                    state.processing = false;
                    state.notifications.error(message);
                }
            },
            CheckoutAction::CardPaymentConfirmed { payment_intent_id } => {
                if Self::awaiting(state, PaymentMethod::Card) && state.card_client_secret.is_some()
                {
                    Self::confirm(state, payment_intent_id);
                }
            },
            CheckoutAction::CardPaymentFailed { message } => {
                if Self::awaiting(state, PaymentMethod::Card) {
                    state.processing = false;
                    state.notifications.error(message);
                }
            },

            CheckoutAction::HostedCheckoutReady(session) => {
                if Self::awaiting(state, PaymentMethod::HostedCard) && state.processing {
                    tracing::debug!(tx_ref = %session.tx_ref, "Hosted checkout ready");
                    state.hosted_session = Some(session);
                }
            },
            CheckoutAction::HostedCheckoutFailed { message } => {
                if Self::awaiting(state, PaymentMethod::HostedCard) && state.processing {
                    state.processing = false;
                    state.notifications.error(message);
                }
            },
            CheckoutAction::HostedCheckoutCallback {
                status,
                transaction_id,
                tx_ref,
            } => {
                if !Self::awaiting(state, PaymentMethod::HostedCard)
                    || state.hosted_session.is_none()
                {
                    return smallvec![Effect::None];
                }
                if !matches!(status.as_str(), "successful" | "completed") {
                    tracing::info!(%status, %tx_ref, "Hosted checkout not successful");
                    state.hosted_session = None;
                    state.processing = false;
                    state.notifications.error("Payment was not successful.");
                    return smallvec![Effect::None];
                }

                let api = Arc::clone(&env.api);
                return smallvec![Effect::future(async move {
                    let request = HostedVerificationRequest {
                        transaction_id: transaction_id.clone(),
                        tx_ref,
                    };
                    Some(match api.verify_hosted_checkout(request).await {
                        Ok(verification) => CheckoutAction::HostedCheckoutVerified {
                            transaction_id,
                            verification,
                        },
                        Err(error) => {
                            tracing::warn!(%transaction_id, %error, "Hosted checkout verification failed");
                            CheckoutAction::HostedCheckoutVerificationFailed
                        },
                    })
                })];
            },
            CheckoutAction::HostedCheckoutVerified {
                transaction_id,
                verification,
            } => {
                if !Self::awaiting(state, PaymentMethod::HostedCard) {
                    return smallvec![Effect::None];
                }
                if verification.verified {
                    Self::confirm(state, verification.order_id.unwrap_or(transaction_id));
                } else {
                    state.hosted_session = None;
                    state.processing = false;
                    state.notifications.error("Payment verification failed.");
                }
            },
            CheckoutAction::HostedCheckoutVerificationFailed => {
                if Self::awaiting(state, PaymentMethod::HostedCard) {
                    state.hosted_session = None;
                    state.processing = false;
                    state.notifications.error("Payment verification failed.");
                }
            },
            CheckoutAction::HostedCheckoutClosed => {
                if Self::awaiting(state, PaymentMethod::HostedCard) {
                    state.hosted_session = None;
                    state.processing = false;
                }
            },

            CheckoutAction::MobileMoneyRequested { reference_id } => {
                return Self::mobile_money_requested(state, reference_id, env);
            },
            CheckoutAction::MobileMoneyRequestFailed { message } => {
                let awaiting_request = state
                    .mobile_money()
                    .is_some_and(|payment| payment.reference_id.is_none());
                if awaiting_request {
                    return Self::fail_mobile_money(state, &message);
                }
            },
            CheckoutAction::PollMobileMoney { reference_id } => {
                return Self::poll(state, reference_id, env);
            },
            CheckoutAction::MobileMoneyStatus {
                reference_id,
                status,
            } => return Self::mobile_money_status(state, reference_id, status, env),
            CheckoutAction::MobileMoneyStatusFailed { reference_id } => {
                if state.is_current_reference(&reference_id) {
                    return Self::fail_mobile_money(
                        state,
                        "Error verifying payment status. Please try again.",
                    );
                }
            },
            CheckoutAction::MobileMoneyDeadlineReached { reference_id } => {
                if state.is_current_reference(&reference_id) {
                    tracing::warn!(%reference_id, "Mobile money payment expired");
                    return Self::fail_mobile_money(
                        state,
                        "Payment request has expired. Please try again.",
                    );
                }
            },
            CheckoutAction::CancelMobileMoney => {
                if state.mobile_money().is_some() {
                    tracing::info!("Mobile money payment cancelled by buyer");
                    state.step = CheckoutStep::PaymentMethod;
                    state.processing = false;
                    return cancel_mobile_money();
                }
            },

            CheckoutAction::Reset => {
                let was_pending = state.mobile_money().is_some();
                *state = CheckoutState::default();
                if was_pending {
                    return cancel_mobile_money();
                }
            },
        }

        smallvec![Effect::None]
    }
}
