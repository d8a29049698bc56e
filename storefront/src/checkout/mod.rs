//! Checkout: contact details, payment method selection and payment
//! completion through the regional providers.

mod order;
mod reducer;
pub mod regional;
pub mod validation;

pub use order::OrderDraft;
pub use reducer::{
    CheckoutAction, CheckoutEnvironment, CheckoutReducer, CheckoutState, CheckoutStep,
    MobileMoneyPayment, MOBILE_MONEY_DEADLINE, MOBILE_MONEY_POLL,
};
pub use regional::{currency_code, currency_symbol, payment_methods, PaymentMethod};
pub use validation::{ContactInfo, Field, FieldErrors};
