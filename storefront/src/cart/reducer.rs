//! Cart Store reducer

use super::pricing::{cart_total, CartTotals};
use super::types::{CartItem, Direction};
use crate::config::CouponClearPolicy;
use crate::notification::Notifications;
use std::sync::Arc;
use ticketplus_api::{Coupon, CouponValidationRequest, TicketPlusApi};
use ticketplus_core::{effect::Effect, reducer::Reducer, smallvec, SmallVec};

// ============================================================================
// State
// ============================================================================

/// Cart lines and the active coupon
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CartState {
    /// Lines in insertion order
    pub items: Vec<CartItem>,
    /// At most one coupon
    pub coupon: Option<Coupon>,
    /// A coupon validation request is in flight
    pub applying_coupon: bool,
    /// Why the last coupon was refused
    pub coupon_error: Option<String>,
    /// Messages for the user
    pub notifications: Notifications,
}

impl CartState {
    /// Cart restored from persisted lines
    #[must_use]
    pub fn with_items(items: Vec<CartItem>) -> Self {
        Self {
            items,
            ..Self::default()
        }
    }

    /// `{subtotal, discount, fees, total}`, derived on every call
    #[must_use]
    pub fn totals(&self) -> CartTotals {
        cart_total(&self.items, self.coupon.as_ref())
    }

    /// No lines
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Tickets across all lines
    #[must_use]
    pub fn ticket_count(&self) -> u32 {
        self.items.iter().map(|item| item.quantity).sum()
    }
}

// ============================================================================
// Actions
// ============================================================================

/// Inputs of the Cart Store
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CartAction {
    /// Add a line, merging with an existing line for the same event and ticket
    AddItem(CartItem),
    /// Remove the line at `index`
    RemoveItem {
        /// Line position
        index: usize,
    },
    /// Step a line's ticket quantity
    UpdateQuantity {
        /// Line position
        index: usize,
        /// Up or down
        direction: Direction,
        /// Upper bound, unbounded when `None`
        max_quantity: Option<u32>,
    },
    /// Step a merchandise quantity inside a line
    UpdateMerchandiseQuantity {
        /// Line position
        cart_index: usize,
        /// Merchandise position within the line
        merch_index: usize,
        /// Up or down
        direction: Direction,
    },
    /// Remove every line
    Clear,
    /// Set the active coupon
    ApplyCoupon(Coupon),
    /// Drop the active coupon
    RemoveCoupon,
    /// Ask the API whether `code` is valid for this cart
    ValidateCoupon {
        /// Code the buyer typed
        code: String,
    },
    /// The API accepted the coupon
    CouponValidated(Coupon),
    /// The API refused the coupon or could not be reached
    CouponRejected {
        /// Message for the buyer
        message: String,
    },
}

// ============================================================================
// Environment
// ============================================================================

/// Dependencies of the Cart Store
#[derive(Clone)]
pub struct CartEnvironment {
    /// REST API used for coupon validation
    pub api: Arc<dyn TicketPlusApi>,
    /// What `Clear` does with the coupon
    pub coupon_clear_policy: CouponClearPolicy,
}

impl CartEnvironment {
    /// Creates a new `CartEnvironment`
    #[must_use]
    pub fn new(api: Arc<dyn TicketPlusApi>, coupon_clear_policy: CouponClearPolicy) -> Self {
        Self {
            api,
            coupon_clear_policy,
        }
    }
}

// ============================================================================
// Reducer
// ============================================================================

/// Reducer for the Cart Store
#[derive(Clone, Debug, Default)]
pub struct CartReducer;

impl CartReducer {
    /// Creates a new `CartReducer`
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    fn add_item(state: &mut CartState, item: CartItem) {
        if let Some(existing) = state.items.iter_mut().find(|line| line.is_same_line(&item)) {
            existing.quantity = existing.quantity.saturating_add(item.quantity);
        } else {
            state.items.push(item);
        }
    }

    fn update_quantity(
        state: &mut CartState,
        index: usize,
        direction: Direction,
        max_quantity: Option<u32>,
    ) {
        let Some(item) = state.items.get_mut(index) else {
            tracing::debug!(index, "Quantity update for missing cart line");
            return;
        };

        match direction {
            Direction::More if max_quantity.is_none_or(|max| item.quantity < max) => {
                item.quantity = item.quantity.saturating_add(1);
            },
            Direction::Less if item.quantity > 1 => item.quantity -= 1,
            _ => {},
        }
    }

    fn update_merchandise_quantity(
        state: &mut CartState,
        cart_index: usize,
        merch_index: usize,
        direction: Direction,
    ) {
        let Some(merch) = state
            .items
            .get_mut(cart_index)
            .and_then(|item| item.merchandise.get_mut(merch_index))
        else {
            tracing::debug!(cart_index, merch_index, "Quantity update for missing merchandise");
            return;
        };

        match direction {
            Direction::More => merch.quantity = merch.quantity.saturating_add(1),
            Direction::Less if merch.quantity > 1 => merch.quantity -= 1,
            Direction::Less => {},
        }
    }

    fn validate_coupon(
        state: &mut CartState,
        code: String,
        env: &CartEnvironment,
    ) -> SmallVec<[Effect<CartAction>; 4]> {
        let code = code.trim().to_string();
        if code.is_empty() {
            state.notifications.error("Please enter a coupon code");
            return smallvec![Effect::None];
        }

        let Some(first) = state.items.first() else {
            state.notifications.error("Your cart is empty");
            return smallvec![Effect::None];
        };

        state.applying_coupon = true;
        state.coupon_error = None;

        let request = CouponValidationRequest::guest(code, first.event.id.clone());
        let api = Arc::clone(&env.api);

        smallvec![Effect::future(async move {
            let code = request.code.clone();
            match api.validate_coupon(request).await {
                Ok(coupon) => Some(CartAction::CouponValidated(coupon)),
                Err(error) => {
                    tracing::warn!(%code, %error, "Coupon validation failed");
                    let fallback = if error.is_rejection() {
                        "Invalid coupon code"
                    } else {
                        "Failed to validate coupon"
                    };
                    Some(CartAction::CouponRejected {
                        message: error.server_message().unwrap_or(fallback).to_string(),
                    })
                },
            }
        })]
    }
}

impl Reducer for CartReducer {
    type State = CartState;
    type Action = CartAction;
    type Environment = CartEnvironment;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        match action {
            CartAction::AddItem(item) => Self::add_item(state, item),
            CartAction::RemoveItem { index } => {
                if index < state.items.len() {
                    state.items.remove(index);
                }
            },
            CartAction::UpdateQuantity {
                index,
                direction,
                max_quantity,
            } => Self::update_quantity(state, index, direction, max_quantity),
            CartAction::UpdateMerchandiseQuantity {
                cart_index,
                merch_index,
                direction,
            } => Self::update_merchandise_quantity(state, cart_index, merch_index, direction),
            CartAction::Clear => {
                state.items.clear();
                if env.coupon_clear_policy == CouponClearPolicy::Clear {
                    state.coupon = None;
                }
            },
            CartAction::ApplyCoupon(coupon) => {
                state.coupon = Some(coupon);
                state.coupon_error = None;
            },
            CartAction::RemoveCoupon => {
                state.coupon = None;
                state.coupon_error = None;
                state.notifications.success("Coupon removed");
            },
            CartAction::ValidateCoupon { code } => return Self::validate_coupon(state, code, env),
            CartAction::CouponValidated(coupon) => {
                state.applying_coupon = false;
                state.coupon = Some(coupon);
                state.coupon_error = None;
                state.notifications.success("Coupon applied successfully!");
            },
            CartAction::CouponRejected { message } => {
                state.applying_coupon = false;
                state.notifications.error(message.clone());
                state.coupon_error = Some(message);
            },
        }

        smallvec![Effect::None]
    }
}
