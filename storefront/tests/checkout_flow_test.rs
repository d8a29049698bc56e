//! Card and hosted-checkout purchases through the Store, coupon included.
//!
//! Run with: `cargo test --test checkout_flow_test`

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)] // Test code can use unwrap/expect/panic

use rust_decimal::Decimal;
use std::sync::Arc;
use std::time::Duration;
use ticketplus_api::{
    Coupon, DiscountType, HostedCheckoutSession, HostedCustomer, HostedCustomizations,
    HostedVerification, Money, TicketId,
};
use ticketplus_core::environment::Clock;
use ticketplus_runtime::Store;
use ticketplus_storefront::cart::{CartAction, CartItem};
use ticketplus_storefront::checkout::{CheckoutAction, CheckoutStep, ContactInfo, PaymentMethod};
use ticketplus_storefront::{
    AppAction, AppEnvironment, AppReducer, AppState, AppStore, Config, CouponClearPolicy,
    MemoryStorage,
};
use ticketplus_testing::{fixtures, test_clock, ApiCall, FixedClock, ScriptedApi};

fn store(api: &Arc<ScriptedApi>, policy: CouponClearPolicy) -> AppStore {
    let config = Config {
        coupon_clear_policy: policy,
        ..Config::default()
    };
    let env = AppEnvironment::new(
        api.clone(),
        Arc::new(FixedClock::new(test_clock().now())),
        Arc::new(MemoryStorage::new()),
        &config,
    );
    Store::new(AppState::new(&config), AppReducer::new(), env)
}

fn contact() -> ContactInfo {
    ContactInfo {
        first_name: "Ada".to_string(),
        last_name: "Obi".to_string(),
        email: "ada@example.com".to_string(),
        phone: "+231770000000".to_string(),
    }
}

async fn send_all(store: &AppStore, actions: Vec<AppAction>) {
    for action in actions {
        store.send(action).await.unwrap();
    }
}

async fn wait_for<F>(store: &AppStore, action: AppAction, predicate: F) -> AppAction
where
    F: Fn(&AppAction) -> bool,
{
    store
        .send_and_wait_for(action, predicate, Duration::from_secs(5))
        .await
        .unwrap()
}

#[tokio::test]
async fn test_card_purchase_with_coupon() {
    let api = Arc::new(ScriptedApi::new());
    api.coupon.ok(Coupon {
        code: "SAVE10".to_string(),
        discount_type: DiscountType::Percentage,
        discount_value: Decimal::from(10),
    });
    api.payment_intent.ok("pi_secret".to_string());
    let store = store(&api, CouponClearPolicy::Keep);

    let event = fixtures::event("e1", "Liberia", test_clock().now());
    let item = CartItem::new(&event, &TicketId::new("e1-regular"), 1).unwrap();
    store.send(AppAction::Cart(CartAction::AddItem(item))).await.unwrap();

    wait_for(
        &store,
        AppAction::Cart(CartAction::ValidateCoupon {
            code: "SAVE10".to_string(),
        }),
        |a| matches!(a, AppAction::Cart(CartAction::CouponValidated(_))),
    )
    .await;
    tokio::time::sleep(Duration::from_millis(10)).await;

    let totals = store.state(|s| s.cart.totals()).await;
    assert_eq!(totals.discount, Money::from_major(5));
    assert_eq!(totals.total, Money::from_cents(4725));

    send_all(
        &store,
        vec![
            AppAction::BeginCheckout,
            AppAction::Checkout(CheckoutAction::SetContactInfo(contact())),
            AppAction::Checkout(CheckoutAction::ContinueToPayment),
            AppAction::Checkout(CheckoutAction::SelectPaymentMethod(PaymentMethod::Card)),
        ],
    )
    .await;

    wait_for(
        &store,
        AppAction::Checkout(CheckoutAction::ProcessPayment),
        |a| matches!(a, AppAction::Checkout(CheckoutAction::CardIntentCreated { .. })),
    )
    .await;
    tokio::time::sleep(Duration::from_millis(10)).await;

    let intent = api
        .calls()
        .into_iter()
        .find_map(|call| match call {
            ApiCall::CreatePaymentIntent(request) => Some(request),
            _ => None,
        })
        .unwrap();
    assert_eq!(intent.amount, Money::from_cents(4725));
    assert_eq!(intent.currency, "usd");
    assert_eq!(
        intent.metadata.order_details.coupon.map(|c| c.code),
        Some("SAVE10".to_string())
    );

    store
        .send(AppAction::Checkout(CheckoutAction::CardPaymentConfirmed {
            payment_intent_id: "pi_1".to_string(),
        }))
        .await
        .unwrap();

    let (reference, items, coupon) = store
        .state(|s| {
            (
                s.checkout.order_reference().map(str::to_string),
                s.cart.items.len(),
                s.cart.coupon.clone(),
            )
        })
        .await;
    assert_eq!(reference.as_deref(), Some("pi_1"));
    assert_eq!(items, 0);
    assert!(coupon.is_some());
}

#[tokio::test]
async fn test_hosted_checkout_purchase_clears_coupon_when_configured() {
    let api = Arc::new(ScriptedApi::new());
    api.hosted_checkout.ok(HostedCheckoutSession {
        public_key: "FLWPUBK-test".to_string(),
        tx_ref: "tx-1".to_string(),
        currency: "NGN".to_string(),
        payment_options: "card,ussd".to_string(),
        customer: HostedCustomer::default(),
        customizations: HostedCustomizations::default(),
    });
    api.hosted_verification.ok(HostedVerification {
        verified: true,
        order_id: Some("order-77".to_string()),
    });
    let store = store(&api, CouponClearPolicy::Clear);

    let event = fixtures::event("e1", "Nigeria", test_clock().now());
    let item = CartItem::new(&event, &TicketId::new("e1-regular"), 2).unwrap();
    send_all(
        &store,
        vec![
            AppAction::Cart(CartAction::AddItem(item)),
            AppAction::Cart(CartAction::ApplyCoupon(Coupon {
                code: "FLAT".to_string(),
                discount_type: DiscountType::Fixed,
                discount_value: Decimal::from(20),
            })),
            AppAction::BeginCheckout,
            AppAction::Checkout(CheckoutAction::SetContactInfo(contact())),
            AppAction::Checkout(CheckoutAction::ContinueToPayment),
            AppAction::Checkout(CheckoutAction::SelectPaymentMethod(PaymentMethod::HostedCard)),
        ],
    )
    .await;

    wait_for(
        &store,
        AppAction::Checkout(CheckoutAction::ProcessPayment),
        |a| matches!(a, AppAction::Checkout(CheckoutAction::HostedCheckoutReady(_))),
    )
    .await;
    tokio::time::sleep(Duration::from_millis(10)).await;

    wait_for(
        &store,
        AppAction::Checkout(CheckoutAction::HostedCheckoutCallback {
            status: "completed".to_string(),
            transaction_id: "9001".to_string(),
            tx_ref: "tx-1".to_string(),
        }),
        |a| matches!(a, AppAction::Checkout(CheckoutAction::HostedCheckoutVerified { .. })),
    )
    .await;
    tokio::time::sleep(Duration::from_millis(10)).await;

    let (step, items, coupon) = store
        .state(|s| (s.checkout.step.clone(), s.cart.items.len(), s.cart.coupon.clone()))
        .await;
    assert_eq!(
        step,
        CheckoutStep::Confirmation {
            order_reference: "order-77".to_string()
        }
    );
    assert_eq!(items, 0);
    assert!(coupon.is_none());

    let hosted = api
        .calls()
        .into_iter()
        .find_map(|call| match call {
            ApiCall::InitializeHostedCheckout(request) => Some(request),
            _ => None,
        })
        .unwrap();
    // 2 x 50 - 20 = 80, plus 5% fee
    assert_eq!(hosted.amount, Money::from_major(84));
    assert_eq!(hosted.metadata.currency.as_deref(), Some("NGN"));
}

#[tokio::test]
async fn test_empty_cart_cannot_check_out() {
    let api = Arc::new(ScriptedApi::new());
    let store = store(&api, CouponClearPolicy::Keep);

    store.send(AppAction::BeginCheckout).await.unwrap();

    let (order, message) = store
        .state(|s| {
            (
                s.checkout.order.clone(),
                s.checkout.notifications.latest_message().map(str::to_string),
            )
        })
        .await;
    assert!(order.is_none());
    assert_eq!(message.as_deref(), Some("Your cart is empty"));
    assert!(api.calls().is_empty());
}
