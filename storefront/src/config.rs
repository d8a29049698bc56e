//! Configuration management for the storefront.
//!
//! Loads configuration from environment variables with sensible defaults.
//! A `.env` file in the working directory is honored when present.

use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Invalid configuration value
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// A variable was set but could not be parsed
    #[error("{name}: invalid value {value:?} ({reason})")]
    Invalid {
        /// Environment variable name
        name: &'static str,
        /// Raw value
        value: String,
        /// What was expected
        reason: &'static str,
    },
}

/// What `clearCart` does with the active coupon
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CouponClearPolicy {
    /// The coupon survives clearing the cart
    #[default]
    Keep,
    /// The coupon is removed together with the cart lines
    Clear,
}

/// Mobile-money status polling budget
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollPolicy {
    /// Delay between two status requests
    pub interval: Duration,
    /// Maximum number of status requests
    pub max_attempts: u32,
    /// Maximum time from the payment request to a final status
    pub max_payment_time: Duration,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(6),
            max_attempts: 20,
            max_payment_time: Duration::from_secs(120),
        }
    }
}

/// Storefront configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Base URL of the TicketPlus REST API
    pub api_url: String,
    /// HTTP request timeout
    pub http_timeout: Duration,
    /// File the cart snapshot is persisted to
    pub storage_path: PathBuf,
    /// Country selected before anything was persisted
    pub default_country: String,
    /// Coupon behavior of `clearCart`
    pub coupon_clear_policy: CouponClearPolicy,
    /// Mobile-money polling budget
    pub poll: PollPolicy,
    /// Fallback log filter when `RUST_LOG` is unset
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: "http://localhost:5000/api".to_string(),
            http_timeout: Duration::from_secs(30),
            storage_path: PathBuf::from("event-storage.json"),
            default_country: "Nigeria".to_string(),
            coupon_clear_policy: CouponClearPolicy::Keep,
            poll: PollPolicy::default(),
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from the process environment
    ///
    /// Reads `.env` first if it exists; variables already set win.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when a variable is set to a value
    /// that cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        if let Ok(path) = dotenvy::dotenv() {
            tracing::debug!(path = %path.display(), "Loaded .env");
        }
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build configuration from an arbitrary variable source
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when a variable cannot be parsed.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let coupon_clear_policy = match lookup("TICKETPLUS_COUPON_CLEAR_POLICY") {
            None => defaults.coupon_clear_policy,
            Some(value) => match value.trim().to_ascii_lowercase().as_str() {
                "keep" => CouponClearPolicy::Keep,
                "clear" => CouponClearPolicy::Clear,
                _ => {
                    return Err(ConfigError::Invalid {
                        name: "TICKETPLUS_COUPON_CLEAR_POLICY",
                        value,
                        reason: "expected keep or clear",
                    });
                },
            },
        };

        let max_attempts = parse_u64(&lookup, "TICKETPLUS_MOMO_MAX_ATTEMPTS")?
            .map(|n| {
                u32::try_from(n).map_err(|_| ConfigError::Invalid {
                    name: "TICKETPLUS_MOMO_MAX_ATTEMPTS",
                    value: n.to_string(),
                    reason: "too large",
                })
            })
            .transpose()?
            .unwrap_or(defaults.poll.max_attempts);

        let poll = PollPolicy {
            interval: parse_secs(&lookup, "TICKETPLUS_MOMO_POLL_INTERVAL_SECS")?
                .unwrap_or(defaults.poll.interval),
            max_attempts,
            max_payment_time: parse_secs(&lookup, "TICKETPLUS_MOMO_MAX_PAYMENT_SECS")?
                .unwrap_or(defaults.poll.max_payment_time),
        };

        Ok(Self {
            api_url: lookup("TICKETPLUS_API_URL").unwrap_or(defaults.api_url),
            http_timeout: parse_secs(&lookup, "TICKETPLUS_HTTP_TIMEOUT_SECS")?
                .unwrap_or(defaults.http_timeout),
            storage_path: lookup("TICKETPLUS_STORAGE_PATH")
                .map_or(defaults.storage_path, PathBuf::from),
            default_country: lookup("TICKETPLUS_DEFAULT_COUNTRY")
                .filter(|c| !c.trim().is_empty())
                .unwrap_or(defaults.default_country),
            coupon_clear_policy,
            poll,
            log_level: lookup("TICKETPLUS_LOG_LEVEL").unwrap_or(defaults.log_level),
        })
    }
}

fn parse_u64(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
) -> Result<Option<u64>, ConfigError> {
    lookup(name)
        .map(|value| {
            value.trim().parse::<u64>().map_err(|_| ConfigError::Invalid {
                name,
                value,
                reason: "expected a non-negative integer",
            })
        })
        .transpose()
}

fn parse_secs(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
) -> Result<Option<Duration>, ConfigError> {
    Ok(parse_u64(lookup, name)?.map(Duration::from_secs))
}
