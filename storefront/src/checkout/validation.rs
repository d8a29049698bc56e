//! Checkout form validation
//!
//! Validation never talks to the API. Errors are keyed by form field so the
//! form can show them next to the input.

use super::regional::PaymentMethod;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::LazyLock;

/// Mobile-money number prefixes accepted (Liberia, Uganda, Rwanda)
pub const MOBILE_MONEY_PREFIXES: [&str; 3] = ["231", "256", "250"];

/// Digits in a mobile-money number including the country code
pub const MOBILE_MONEY_DIGITS: usize = 12;

#[allow(clippy::expect_used)] // Literal pattern
static EMAIL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is valid"));

#[allow(clippy::expect_used)] // Literal pattern
static PHONE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\+?[0-9]{10,15}$").expect("phone pattern is valid"));

/// Buyer details collected in the first checkout step
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactInfo {
    /// Given name
    pub first_name: String,
    /// Family name
    pub last_name: String,
    /// Email the tickets are sent to
    pub email: String,
    /// Phone number
    pub phone: String,
}

impl ContactInfo {
    /// First and last name joined by a space
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// A form input that can carry an error
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Field {
    /// First name
    FirstName,
    /// Last name
    LastName,
    /// Email
    Email,
    /// Phone
    Phone,
    /// Payment method selector
    PaymentMethod,
    /// Mobile-money wallet number
    MobileMoneyNumber,
}

/// Field-level validation errors
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldErrors(BTreeMap<Field, String>);

impl FieldErrors {
    /// No errors
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of fields with an error
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Error for `field`
    #[must_use]
    pub fn get(&self, field: Field) -> Option<&str> {
        self.0.get(&field).map(String::as_str)
    }

    /// Fields with an error
    pub fn fields(&self) -> impl Iterator<Item = Field> + '_ {
        self.0.keys().copied()
    }

    fn insert(&mut self, field: Field, message: &str) {
        self.0.insert(field, message.to_string());
    }
}

/// Validate the contact step
#[must_use]
pub fn validate_contact(contact: &ContactInfo) -> FieldErrors {
    let mut errors = FieldErrors::default();

    if contact.first_name.trim().is_empty() {
        errors.insert(Field::FirstName, "First name is required");
    }
    if contact.last_name.trim().is_empty() {
        errors.insert(Field::LastName, "Last name is required");
    }

    if contact.email.trim().is_empty() {
        errors.insert(Field::Email, "Email is required");
    } else if !EMAIL.is_match(&contact.email) {
        errors.insert(Field::Email, "Please enter a valid email address");
    }

    if contact.phone.trim().is_empty() {
        errors.insert(Field::Phone, "Phone number is required");
    } else {
        let compact: String = contact.phone.chars().filter(|c| !c.is_whitespace()).collect();
        if !PHONE.is_match(&compact) {
            errors.insert(Field::Phone, "Please enter a valid phone number");
        }
    }

    errors
}

/// Whether `number` is a 12-digit mobile-money number with a known prefix
///
/// Formatting characters are ignored.
#[must_use]
pub fn is_valid_mobile_money_number(number: &str) -> bool {
    let digits: String = number.chars().filter(char::is_ascii_digit).collect();
    digits.len() == MOBILE_MONEY_DIGITS
        && MOBILE_MONEY_PREFIXES
            .iter()
            .any(|prefix| digits.starts_with(prefix))
}

/// Validate the payment step
#[must_use]
pub fn validate_payment(method: Option<PaymentMethod>, mobile_money_number: &str) -> FieldErrors {
    let mut errors = FieldErrors::default();

    let Some(method) = method else {
        errors.insert(Field::PaymentMethod, "Please select a payment method");
        return errors;
    };

    if method.is_mobile_money() {
        if mobile_money_number.trim().is_empty() {
            errors.insert(Field::MobileMoneyNumber, "Mobile money number is required");
        } else if !is_valid_mobile_money_number(mobile_money_number) {
            errors.insert(
                Field::MobileMoneyNumber,
                "Please enter a valid mobile money number with country code",
            );
        }
    }

    errors
}
