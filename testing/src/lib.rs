//! # TicketPlus Testing
//!
//! Testing utilities and helpers for the storefront.
//!
//! This crate provides:
//! - Deterministic clocks (`FixedClock`, `ManualClock`, `TokioClock`)
//! - A scripted implementation of the `TicketPlusApi` trait
//! - The `ReducerTest` Given-When-Then harness and effect assertions
//! - Catalog fixtures
//!
//! ## Example
//!
//! ```ignore
//! use ticketplus_testing::{ManualClock, ScriptedApi};
//!
//! let api = ScriptedApi::new();
//! api.payment_status.push(Ok(PaymentStatus::Completed));
//!
//! let clock = ManualClock::default();
//! clock.advance(Duration::from_secs(6));
//! ```

use chrono::{DateTime, TimeDelta, Utc};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use ticketplus_core::environment::Clock;

/// Scripted API responses for reducer and store tests
pub mod api;


/// Mock implementations for testing.
pub mod mocks {
    use super::{Arc, Clock, DateTime, Duration, Mutex, PoisonError, TimeDelta, Utc};

    /// Fixed clock for deterministic tests
    ///
    /// Always returns the same time, making tests reproducible.
    ///
    /// # Example
    ///
    /// ```
    /// use ticketplus_testing::mocks::FixedClock;
    /// use ticketplus_core::environment::Clock;
    /// use chrono::Utc;
    ///
    /// let clock = FixedClock::new(Utc::now());
    /// assert_eq!(clock.now(), clock.now());
    /// ```
    #[derive(Debug, Clone)]
    pub struct FixedClock {
        time: DateTime<Utc>,
    }

    impl FixedClock {
        /// Create a new fixed clock with the given time
        #[must_use]
        pub const fn new(time: DateTime<Utc>) -> Self {
            Self { time }
        }
    }

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.time
        }
    }

    /// Clock that only moves when told to
    ///
    /// Clones share the same time, so a test can keep one handle and give
    /// another to the environment.
    #[derive(Debug, Clone)]
    pub struct ManualClock {
        time: Arc<Mutex<DateTime<Utc>>>,
    }

    impl ManualClock {
        /// Create a clock starting at `time`
        #[must_use]
        pub fn new(time: DateTime<Utc>) -> Self {
            Self {
                time: Arc::new(Mutex::new(time)),
            }
        }

        /// Move the clock forward
        pub fn advance(&self, by: Duration) {
            let delta = TimeDelta::from_std(by).unwrap_or(TimeDelta::MAX);
            let mut time = self.time.lock().unwrap_or_else(PoisonError::into_inner);
            *time = time.checked_add_signed(delta).unwrap_or(*time);
        }

        /// Jump to an absolute time
        pub fn set(&self, to: DateTime<Utc>) {
            *self.time.lock().unwrap_or_else(PoisonError::into_inner) = to;
        }
    }

    impl Default for ManualClock {
        fn default() -> Self {
            Self::new(test_clock().now())
        }
    }

    impl Clock for ManualClock {
        fn now(&self) -> DateTime<Utc> {
            *self.time.lock().unwrap_or_else(PoisonError::into_inner)
        }
    }

    /// Clock driven by tokio's timer
    ///
    /// Under `#[tokio::test(start_paused = true)]` it advances together
    /// with `tokio::time::sleep` and scheduled effects, which keeps
    /// elapsed-time checks in reducers consistent with the Store's timers.
    #[derive(Debug, Clone)]
    pub struct TokioClock {
        origin: DateTime<Utc>,
        start: tokio::time::Instant,
    }

    impl TokioClock {
        /// Start counting from `origin` at the current tokio instant
        #[must_use]
        pub fn starting_at(origin: DateTime<Utc>) -> Self {
            Self {
                origin,
                start: tokio::time::Instant::now(),
            }
        }
    }

    impl Clock for TokioClock {
        fn now(&self) -> DateTime<Utc> {
            let elapsed = TimeDelta::from_std(self.start.elapsed()).unwrap_or_else(|_| TimeDelta::zero());
            self.origin.checked_add_signed(elapsed).unwrap_or(self.origin)
        }
    }

    /// Create a default fixed clock for tests (2025-01-01 00:00:00 UTC)
    ///
    /// # Panics
    ///
    /// This function will panic if the hardcoded timestamp fails to parse,
    /// which should never happen in practice.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn test_clock() -> FixedClock {
        FixedClock::new(
            DateTime::parse_from_rfc3339("2025-01-01T00:00:00Z")
                .expect("hardcoded timestamp should always parse")
                .with_timezone(&Utc),
        )
    }
}

/// Catalog fixtures
pub mod fixtures {
    use super::{DateTime, TimeDelta, Utc};
    use ticketplus_api::{Event, EventId, MerchandiseId, MerchandiseItem, Money, Ticket, TicketId};

    /// An event in `country` starting at `starting_time`
    ///
    /// Carries one ticket type `"{id}-regular"` priced at 50.00 and one
    /// merchandise item `"{id}-shirt"` priced at 15.00.
    #[must_use]
    pub fn event(id: &str, country: &str, starting_time: DateTime<Utc>) -> Event {
        Event {
            id: EventId::new(id),
            name: format!("Event {id}"),
            description: String::new(),
            about_organizer: String::new(),
            image_url: String::new(),
            location: "Main Hall".to_string(),
            country: country.to_string(),
            starting_time,
            ending_time: starting_time + TimeDelta::hours(4),
            category: "Music".to_string(),
            quantity: 100,
            owner: Some("organizer-1".to_string()),
            tickets: vec![Ticket {
                id: TicketId::new(format!("{id}-regular")),
                name: "Regular".to_string(),
                price: Money::from_major(50),
                qr_identifier: None,
            }],
            merchandise: vec![MerchandiseItem {
                id: MerchandiseId::new(format!("{id}-shirt")),
                item_name: "Shirt".to_string(),
                item_image: String::new(),
                price: Money::from_major(15),
            }],
        }
    }

    /// Same as [`event`] with a category
    #[must_use]
    pub fn event_in_category(
        id: &str,
        country: &str,
        category: &str,
        starting_time: DateTime<Utc>,
    ) -> Event {
        Event {
            category: category.to_string(),
            ..event(id, country, starting_time)
        }
    }
}

/// Install a `tracing` subscriber for tests (`RUST_LOG` controls the level)
///
/// Safe to call from every test; only the first call installs.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub use api::{ApiCall, ScriptedApi};
pub use mocks::{test_clock, FixedClock, ManualClock, TokioClock};
pub use reducer_test::{assertions, collect_actions, ReducerTest};
