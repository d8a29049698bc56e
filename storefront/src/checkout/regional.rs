//! Per-country payment methods and currencies

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Country used when the cart is empty
pub const DEFAULT_COUNTRY: &str = "Nigeria";

/// A payment provider offered at checkout
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Card payment through a payment intent
    #[serde(rename = "stripe")]
    Card,
    /// Card payment through the hosted checkout modal
    #[serde(rename = "flutterwave")]
    HostedCard,
    /// MTN Mobile Money
    MtnMomo,
    /// Orange Money
    OrangeMoney,
    /// Airtel Money
    AirtelMoney,
}

impl PaymentMethod {
    /// Every known method
    pub const ALL: [Self; 5] = [
        Self::Card,
        Self::HostedCard,
        Self::MtnMomo,
        Self::OrangeMoney,
        Self::AirtelMoney,
    ];

    /// Stable identifier
    #[must_use]
    pub const fn id(self) -> &'static str {
        match self {
            Self::Card => "stripe",
            Self::HostedCard => "flutterwave",
            Self::MtnMomo => "mtn_momo",
            Self::OrangeMoney => "orange_money",
            Self::AirtelMoney => "airtel_money",
        }
    }

    /// Name shown to the buyer
    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Card => "Credit/Debit Card",
            Self::HostedCard => "Flutterwave",
            Self::MtnMomo => "MTN Mobile Money",
            Self::OrangeMoney => "Orange Money",
            Self::AirtelMoney => "Airtel Money",
        }
    }

    /// Paid from a mobile-money wallet (needs a wallet number and polling)
    #[must_use]
    pub const fn is_mobile_money(self) -> bool {
        matches!(self, Self::MtnMomo | Self::OrangeMoney | Self::AirtelMoney)
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// Unknown payment method id
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown payment method: {0}")]
pub struct UnknownPaymentMethod(pub String);

impl FromStr for PaymentMethod {
    type Err = UnknownPaymentMethod;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|m| m.id() == s)
            .ok_or_else(|| UnknownPaymentMethod(s.to_string()))
    }
}

/// Methods offered for orders in `country`
#[must_use]
pub fn payment_methods(country: &str) -> &'static [PaymentMethod] {
    match country {
        "Nigeria" => &[PaymentMethod::HostedCard],
        "Liberia" => &[PaymentMethod::Card, PaymentMethod::MtnMomo],
        "Rwanda" | "Uganda" => &[
            PaymentMethod::Card,
            PaymentMethod::MtnMomo,
            PaymentMethod::AirtelMoney,
        ],
        _ => &[PaymentMethod::Card],
    }
}

/// ISO currency code charged for orders in `country`
#[must_use]
pub fn currency_code(country: &str) -> &'static str {
    match country {
        "Nigeria" => "NGN",
        "Rwanda" => "RWF",
        "Uganda" => "UGX",
        _ => "USD",
    }
}

/// Symbol prices are displayed with
#[must_use]
pub fn currency_symbol(country: &str) -> &'static str {
    match country {
        "Uganda" => "UGX",
        "Nigeria" => "₦",
        "Rwanda" => "FRw",
        _ => "$",
    }
}
