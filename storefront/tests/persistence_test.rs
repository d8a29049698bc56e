//! Cart snapshot persistence: the JSON file adapter and restoring a store
//! from what a previous one wrote.
//!
//! Run with: `cargo test --test persistence_test`

#![allow(clippy::unwrap_used, clippy::expect_used)] // Test code can use unwrap/expect

use std::sync::Arc;
use std::time::Duration;
use ticketplus_api::TicketId;
use ticketplus_core::environment::{Clock, SystemClock};
use ticketplus_runtime::Store;
use ticketplus_storefront::cart::{CartAction, CartItem, Direction};
use ticketplus_storefront::catalog::CatalogAction;
use ticketplus_storefront::{
    AppAction, AppEnvironment, AppReducer, AppState, AppStore, CartStorage, Config, FileStorage,
    PersistedCart,
};
use ticketplus_testing::{fixtures, test_clock, ScriptedApi};

fn item(event_id: &str, quantity: u32) -> CartItem {
    let event = fixtures::event(event_id, "Rwanda", test_clock().now());
    CartItem::new(&event, &TicketId::new(format!("{event_id}-regular")), quantity).unwrap()
}

fn snapshot(revision: u64) -> PersistedCart {
    PersistedCart {
        revision,
        cart: vec![item("e1", revision as u32 + 1)],
        selected_country: Some("Rwanda".to_string()),
    }
}

fn store(storage: Arc<FileStorage>) -> AppStore {
    let config = Config::default();
    let env = AppEnvironment::new(
        Arc::new(ScriptedApi::new()),
        Arc::new(SystemClock),
        storage,
        &config,
    );
    Store::new(AppState::new(&config), AppReducer::new(), env)
}

async fn wait_for_revision(store: &AppStore, revision: u64) {
    let mut actions = store.subscribe_actions();
    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            if let Ok(AppAction::Persisted { revision: r, .. }) = actions.recv().await {
                if r >= revision {
                    return;
                }
            }
        }
    })
    .await
    .expect("snapshot was not persisted");
}

#[tokio::test]
async fn test_missing_file_loads_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let storage = FileStorage::new(dir.path().join("cart.json"));

    assert_eq!(storage.load().await.unwrap(), None);
}

#[tokio::test]
async fn test_save_then_load() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("cart.json");
    let storage = FileStorage::new(&path);

    assert!(storage.save(snapshot(1)).await.unwrap());

    let reopened = FileStorage::new(&path);
    assert_eq!(reopened.load().await.unwrap(), Some(snapshot(1)));
    assert!(!path.with_file_name("cart.json.tmp").exists());
}

#[tokio::test]
async fn test_stale_revision_is_dropped() {
    let dir = tempfile::tempdir().unwrap();
    let storage = FileStorage::new(dir.path().join("cart.json"));

    assert!(storage.save(snapshot(3)).await.unwrap());
    assert!(!storage.save(snapshot(2)).await.unwrap());
    assert!(storage.save(snapshot(4)).await.unwrap());

    assert_eq!(storage.load().await.unwrap().map(|s| s.revision), Some(4));
}

#[tokio::test]
async fn test_revision_floor_comes_from_loaded_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cart.json");
    FileStorage::new(&path).save(snapshot(5)).await.unwrap();

    let storage = FileStorage::new(&path);
    storage.load().await.unwrap();

    assert!(!storage.save(snapshot(4)).await.unwrap());
}

#[tokio::test]
async fn test_corrupt_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cart.json");
    tokio::fs::write(&path, b"{ not json").await.unwrap();

    assert!(FileStorage::new(&path).load().await.is_err());
}

#[tokio::test]
async fn test_store_mutations_are_restorable() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cart.json");

    let first = store(Arc::new(FileStorage::new(&path)));
    let actions = [
        AppAction::Catalog(CatalogAction::FilterByCountry("Rwanda".to_string())),
        AppAction::Cart(CartAction::AddItem(item("e1", 1))),
        AppAction::Cart(CartAction::AddItem(item("e2", 1))),
        AppAction::Cart(CartAction::UpdateQuantity {
            index: 0,
            direction: Direction::More,
            max_quantity: Some(10),
        }),
    ];
    let waiter = wait_for_revision(&first, 4);
    let send_all = async {
        for action in actions {
            first.send(action).await.unwrap();
        }
    };
    tokio::join!(waiter, send_all);
    first.shutdown(Duration::from_secs(1)).await.unwrap();

    let storage = Arc::new(FileStorage::new(&path));
    let snapshot = storage.load().await.unwrap().expect("snapshot written");
    assert_eq!(snapshot.revision, 4);

    let second = store(storage);
    second.send(AppAction::Restore(snapshot)).await.unwrap();

    let (items, country, revision) = second
        .state(|s| {
            (
                s.cart.items.iter().map(|i| i.quantity).collect::<Vec<_>>(),
                s.catalog.selected_country.clone(),
                s.revision,
            )
        })
        .await;
    assert_eq!(items, vec![2, 1]);
    assert_eq!(country, "Rwanda");
    assert_eq!(revision, 4);

    second
        .send(AppAction::Cart(CartAction::RemoveItem { index: 1 }))
        .await
        .unwrap();
    second.shutdown(Duration::from_secs(1)).await.unwrap();

    let latest = FileStorage::new(&path).load().await.unwrap().unwrap();
    assert_eq!(latest.revision, 5);
    assert_eq!(latest.cart.len(), 1);
}
