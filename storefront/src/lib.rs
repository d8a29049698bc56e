//! # TicketPlus Storefront
//!
//! Client-side state of the TicketPlus event storefront, built as reducers
//! running in a [`ticketplus_runtime::Store`]:
//!
//! - [`catalog`]: event list, country filter, upcoming events and categories
//! - [`cart`]: cart lines, coupon and derived totals
//! - [`checkout`]: contact details, payment method and payment completion,
//!   including mobile-money status polling
//! - [`tickets`]: lookup and download of issued tickets
//! - [`persistence`]: cart snapshot storage
//! - [`app`]: composition of the features above into one store
//!
//! All backend work happens behind the REST API in [`ticketplus_api`].

pub mod app;
pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod config;
pub mod notification;
pub mod persistence;
pub mod tickets;

pub use app::{AppAction, AppEnvironment, AppReducer, AppState, AppStore};
pub use config::{Config, ConfigError, CouponClearPolicy, PollPolicy};
pub use notification::{Level, Notification, Notifications};
pub use persistence::{CartStorage, FileStorage, MemoryStorage, PersistedCart, StorageError};
