//! Storefront composition
//!
//! [`AppReducer`] embeds the catalog, cart, checkout and ticket reducers into
//! one state tree and adds the cross-feature rules:
//!
//! - starting checkout snapshots the cart into an [`OrderDraft`]
//! - entering `Confirmation` clears the cart, once
//! - any change to the cart lines or the selected country writes a new
//!   [`PersistedCart`] revision through the storage adapter

use crate::cart::{CartAction, CartEnvironment, CartReducer, CartState};
use crate::catalog::{CatalogAction, CatalogEnvironment, CatalogReducer, CatalogState};
use crate::checkout::{
    CheckoutAction, CheckoutEnvironment, CheckoutReducer, CheckoutState, OrderDraft,
};
use crate::config::Config;
use crate::persistence::{CartStorage, PersistedCart};
use crate::tickets::{TicketsAction, TicketsEnvironment, TicketsReducer, TicketsState};
use std::sync::Arc;
use ticketplus_api::TicketPlusApi;
use ticketplus_core::{
    composition::{scope_reducer, ScopedReducer},
    effect::Effect,
    environment::Clock,
    reducer::Reducer,
    smallvec, SmallVec,
};
use ticketplus_runtime::Store;

// ============================================================================
// State
// ============================================================================

/// Whole storefront state
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AppState {
    /// Event catalog
    pub catalog: CatalogState,
    /// Shopping cart
    pub cart: CartState,
    /// Checkout flow
    pub checkout: CheckoutState,
    /// Ticket lookup
    pub tickets: TicketsState,
    /// Revision of the last persisted snapshot
    pub revision: u64,
}

impl AppState {
    /// Initial state for `config`
    #[must_use]
    pub fn new(config: &Config) -> Self {
        Self {
            catalog: CatalogState::new(config.default_country.clone()),
            ..Self::default()
        }
    }

    /// What gets persisted at the current revision
    #[must_use]
    pub fn persisted(&self) -> PersistedCart {
        PersistedCart {
            revision: self.revision,
            cart: self.cart.items.clone(),
            selected_country: Some(self.catalog.selected_country.clone()),
        }
    }
}

// ============================================================================
// Actions
// ============================================================================

/// Storefront actions
#[derive(Clone, Debug, PartialEq)]
pub enum AppAction {
    /// Catalog action
    Catalog(CatalogAction),
    /// Cart action
    Cart(CartAction),
    /// Checkout action
    Checkout(CheckoutAction),
    /// Ticket lookup action
    Tickets(TicketsAction),
    /// Start checkout for the current cart
    BeginCheckout,
    /// Load a snapshot read from storage
    Restore(PersistedCart),
    /// A snapshot write finished
    Persisted {
        /// Revision written
        revision: u64,
        /// `false` when the adapter dropped it as stale
        written: bool,
    },
}

// ============================================================================
// Environment
// ============================================================================

/// Storefront dependencies
#[derive(Clone)]
pub struct AppEnvironment {
    /// Catalog dependencies
    pub catalog: CatalogEnvironment,
    /// Cart dependencies
    pub cart: CartEnvironment,
    /// Checkout dependencies
    pub checkout: CheckoutEnvironment,
    /// Ticket lookup dependencies
    pub tickets: TicketsEnvironment,
    /// Cart snapshot storage
    pub storage: Arc<dyn CartStorage>,
}

impl AppEnvironment {
    /// Wire every feature to the same API, clock and storage
    #[must_use]
    pub fn new(
        api: Arc<dyn TicketPlusApi>,
        clock: Arc<dyn Clock>,
        storage: Arc<dyn CartStorage>,
        config: &Config,
    ) -> Self {
        Self {
            catalog: CatalogEnvironment {
                api: Arc::clone(&api),
            },
            cart: CartEnvironment::new(Arc::clone(&api), config.coupon_clear_policy),
            checkout: CheckoutEnvironment::new(Arc::clone(&api), clock, config.poll),
            tickets: TicketsEnvironment { api },
            storage,
        }
    }
}

// ============================================================================
// Reducer
// ============================================================================

/// Store type of the storefront
pub type AppStore = Store<AppState, AppAction, AppEnvironment, AppReducer>;

/// Root reducer
#[derive(Clone)]
pub struct AppReducer {
    catalog: ScopedReducer<AppState, AppAction, AppEnvironment, CatalogReducer>,
    cart: ScopedReducer<AppState, AppAction, AppEnvironment, CartReducer>,
    checkout: ScopedReducer<AppState, AppAction, AppEnvironment, CheckoutReducer>,
    tickets: ScopedReducer<AppState, AppAction, AppEnvironment, TicketsReducer>,
}

impl Default for AppReducer {
    fn default() -> Self {
        Self::new()
    }
}

impl AppReducer {
    /// Creates a new `AppReducer`
    #[must_use]
    pub fn new() -> Self {
        Self {
            catalog: scope_reducer(
                CatalogReducer::new(),
                |state: &mut AppState| &mut state.catalog,
                |action: AppAction| match action {
                    AppAction::Catalog(action) => Some(action),
                    _ => None,
                },
                AppAction::Catalog,
                |env: &AppEnvironment| &env.catalog,
            ),
            cart: scope_reducer(
                CartReducer::new(),
                |state: &mut AppState| &mut state.cart,
                |action: AppAction| match action {
                    AppAction::Cart(action) => Some(action),
                    _ => None,
                },
                AppAction::Cart,
                |env: &AppEnvironment| &env.cart,
            ),
            checkout: scope_reducer(
                CheckoutReducer::new(),
                |state: &mut AppState| &mut state.checkout,
                |action: AppAction| match action {
                    AppAction::Checkout(action) => Some(action),
                    _ => None,
                },
                AppAction::Checkout,
                |env: &AppEnvironment| &env.checkout,
            ),
            tickets: scope_reducer(
                TicketsReducer::new(),
                |state: &mut AppState| &mut state.tickets,
                |action: AppAction| match action {
                    AppAction::Tickets(action) => Some(action),
                    _ => None,
                },
                AppAction::Tickets,
                |env: &AppEnvironment| &env.tickets,
            ),
        }
    }

    fn restore(&self, state: &mut AppState, snapshot: PersistedCart, env: &AppEnvironment) {
        tracing::info!(
            revision = snapshot.revision,
            items = snapshot.cart.len(),
            "Restoring persisted cart"
        );
        state.revision = snapshot.revision;
        state.cart.items = snapshot.cart;
        if let Some(country) = snapshot.selected_country {
            let _ = self.catalog.reduce(
                state,
                AppAction::Catalog(CatalogAction::FilterByCountry(country)),
                env,
            );
        }
    }
}

fn save(storage: Arc<dyn CartStorage>, snapshot: PersistedCart) -> Effect<AppAction> {
    Effect::future(async move {
        let revision = snapshot.revision;
        match storage.save(snapshot).await {
            Ok(written) => Some(AppAction::Persisted { revision, written }),
            Err(error) => {
                tracing::warn!(%error, revision, "Persisting cart failed");
                None
            },
        }
    })
}

impl Reducer for AppReducer {
    type State = AppState;
    type Action = AppAction;
    type Environment = AppEnvironment;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        let was_confirmed = state.checkout.is_confirmed();
        let before = (
            state.cart.items.clone(),
            state.catalog.selected_country.clone(),
        );

        let mut effects = match action {
            action @ AppAction::Catalog(_) => self.catalog.reduce(state, action, env),
            action @ AppAction::Cart(_) => self.cart.reduce(state, action, env),
            action @ AppAction::Checkout(_) => self.checkout.reduce(state, action, env),
            action @ AppAction::Tickets(_) => self.tickets.reduce(state, action, env),
            AppAction::BeginCheckout => {
                let order = OrderDraft::from_cart(&state.cart.items, state.cart.coupon.as_ref());
                self.checkout.reduce(
                    state,
                    AppAction::Checkout(CheckoutAction::Start { order }),
                    env,
                )
            },
            AppAction::Restore(snapshot) => {
                self.restore(state, snapshot, env);
                return smallvec![Effect::None];
            },
            AppAction::Persisted { revision, written } => {
                tracing::trace!(revision, written, "Cart snapshot persisted");
                return smallvec![Effect::None];
            },
        };

        if !was_confirmed && state.checkout.is_confirmed() {
            tracing::info!(order_reference = ?state.checkout.order_reference(), "Order confirmed, clearing cart");
            effects.extend(self.cart.reduce(state, AppAction::Cart(CartAction::Clear), env));
        }

        if state.cart.items != before.0 || state.catalog.selected_country != before.1 {
            state.revision += 1;
            effects.push(save(Arc::clone(&env.storage), state.persisted()));
        }

        effects
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cart::CartItem;
    use crate::checkout::{CheckoutStep, MobileMoneyPayment};
    use crate::persistence::MemoryStorage;
    use ticketplus_api::{PaymentStatus, TicketId};
    use ticketplus_testing::{
        assertions, collect_actions, fixtures, test_clock, ManualClock, ReducerTest, ScriptedApi,
    };

    fn env_with(storage: Arc<MemoryStorage>) -> AppEnvironment {
        AppEnvironment::new(
            Arc::new(ScriptedApi::new()),
            Arc::new(ManualClock::default()),
            storage,
            &Config::default(),
        )
    }

    fn env() -> AppEnvironment {
        env_with(Arc::new(MemoryStorage::new()))
    }

    fn line(event_id: &str) -> CartItem {
        let event = fixtures::event(event_id, "Uganda", test_clock().now());
        CartItem::new(&event, &TicketId::new(format!("{event_id}-regular")), 1)
            .unwrap_or_else(|| unreachable!("fixture sells the regular ticket"))
    }

    #[test]
    fn test_cart_mutation_bumps_revision_and_saves() {
        ReducerTest::new(AppReducer::new())
            .with_env(env())
            .given_state(AppState::default())
            .when_action(AppAction::Cart(CartAction::AddItem(line("e1"))))
            .then_state(|state| assert_eq!(state.revision, 1))
            .then_effects(|effects| {
                assertions::assert_effects_count(effects, 2);
                assertions::assert_has_future_effect(effects);
            })
            .run();
    }

    #[test]
    fn test_unchanged_cart_is_not_saved() {
        ReducerTest::new(AppReducer::new())
            .with_env(env())
            .given_state(AppState::default())
            .when_action(AppAction::Cart(CartAction::RemoveItem { index: 3 }))
            .then_state(|state| assert_eq!(state.revision, 0))
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[tokio::test]
    async fn test_country_filter_is_persisted() {
        let storage = Arc::new(MemoryStorage::new());
        let env = env_with(Arc::clone(&storage));
        let reducer = AppReducer::new();
        let mut state = AppState::default();

        let effects = reducer.reduce(
            &mut state,
            AppAction::Catalog(CatalogAction::FilterByCountry("Rwanda".to_string())),
            &env,
        );
        let actions = collect_actions(effects.into_vec()).await;

        assert_eq!(
            actions,
            vec![AppAction::Persisted {
                revision: 1,
                written: true
            }]
        );
        assert_eq!(
            storage.snapshot().and_then(|s| s.selected_country),
            Some("Rwanda".to_string())
        );
    }

    #[test]
    fn test_restore_does_not_write_back() {
        let snapshot = PersistedCart {
            revision: 7,
            cart: vec![line("e1")],
            selected_country: Some("Liberia".to_string()),
        };

        ReducerTest::new(AppReducer::new())
            .with_env(env())
            .given_state(AppState::default())
            .when_action(AppAction::Restore(snapshot))
            .then_state(|state| {
                assert_eq!(state.revision, 7);
                assert_eq!(state.cart.items.len(), 1);
                assert_eq!(state.catalog.selected_country, "Liberia");
            })
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[test]
    fn test_begin_checkout_snapshots_cart() {
        ReducerTest::new(AppReducer::new())
            .with_env(env())
            .given_state(AppState {
                cart: CartState::with_items(vec![line("e1")]),
                ..AppState::default()
            })
            .when_action(AppAction::BeginCheckout)
            .then_state(|state| {
                let order = state.checkout.order.clone().unwrap_or_else(|| unreachable!());
                assert_eq!(order.country, "Uganda");
                assert_eq!(order.items.len(), 1);
                assert_eq!(state.checkout.step, CheckoutStep::ContactInfo);
            })
            .run();
    }

    #[test]
    fn test_confirmation_clears_cart_once() {
        let clock = ManualClock::default();
        let pending = CheckoutState {
            step: CheckoutStep::MobileMoneyPending(MobileMoneyPayment {
                phone: "256700000000".to_string(),
                reference_id: Some("ref-1".to_string()),
                started_at: Some(clock.now()),
                attempts: 1,
            }),
            ..CheckoutState::default()
        };
        let completed = || {
            AppAction::Checkout(CheckoutAction::MobileMoneyStatus {
                reference_id: "ref-1".to_string(),
                status: PaymentStatus::Completed,
            })
        };

        ReducerTest::new(AppReducer::new())
            .with_env(env())
            .given_state(AppState {
                cart: CartState::with_items(vec![line("e1")]),
                checkout: pending,
                ..AppState::default()
            })
            .when_action(completed())
            .when_action(AppAction::Cart(CartAction::AddItem(line("e2"))))
            .when_action(completed())
            .then_state(|state| {
                assert_eq!(state.checkout.order_reference(), Some("ref-1"));
                assert_eq!(state.cart.items.len(), 1);
                assert_eq!(state.cart.items[0].event.id.as_str(), "e2");
                assert_eq!(state.revision, 2);
            })
            .run();
    }
}
