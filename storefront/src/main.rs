//! TicketPlus storefront demo.
//!
//! Loads configuration, restores the persisted cart, fetches the catalog and
//! prints a summary of what a buyer would see.
//!
//! # Usage
//!
//! ```bash
//! TICKETPLUS_API_URL=https://api.example.com/api \
//!   cargo run --bin ticketplus-storefront
//! ```

use anyhow::Context;
use std::sync::Arc;
use std::time::Duration;
use ticketplus_api::TicketPlusClient;
use ticketplus_core::environment::SystemClock;
use ticketplus_runtime::Store;
use ticketplus_storefront::cart::subtotal;
use ticketplus_storefront::catalog::CatalogAction;
use ticketplus_storefront::checkout::{currency_symbol, payment_methods};
use ticketplus_storefront::{
    AppAction, AppEnvironment, AppReducer, AppState, CartStorage, Config, FileStorage,
};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env().context("invalid configuration")?;

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .context("invalid log filter")?;
    tracing_subscriber::fmt().with_env_filter(filter).init();

    tracing::info!(api_url = %config.api_url, "=== TicketPlus Storefront ===");

    let api = Arc::new(
        TicketPlusClient::with_timeout(config.api_url.clone(), config.http_timeout)
            .context("failed to build HTTP client")?,
    );
    let storage = Arc::new(FileStorage::new(config.storage_path.clone()));
    let snapshot = match storage.load().await {
        Ok(snapshot) => snapshot,
        Err(error) => {
            tracing::warn!(%error, path = %storage.path().display(), "Ignoring unreadable cart snapshot");
            None
        },
    };

    let env = AppEnvironment::new(api, Arc::new(SystemClock), storage, &config);
    let store = Store::new(AppState::new(&config), AppReducer::new(), env);

    if let Some(snapshot) = snapshot {
        store.send(AppAction::Restore(snapshot)).await?;
    }

    let outcome = store
        .send_and_wait_for(
            AppAction::Catalog(CatalogAction::FetchAll),
            |action| {
                matches!(
                    action,
                    AppAction::Catalog(
                        CatalogAction::EventsLoaded(_) | CatalogAction::EventsFailed { .. }
                    )
                )
            },
            config.http_timeout + Duration::from_secs(1),
        )
        .await;
    if let Err(error) = outcome {
        tracing::warn!(%error, "No catalog response");
    }

    let summary = store
        .state(|state| {
            let country = state.catalog.selected_country.clone();
            let symbol = currency_symbol(&country);
            let events: Vec<String> = state
                .catalog
                .filtered
                .iter()
                .map(|event| {
                    let status = if event.is_sold_out() { " (sold out)" } else { "" };
                    format!(
                        "  {} | {} | {}{status}",
                        event.starting_time.format("%Y-%m-%d %H:%M"),
                        event.name,
                        event.location
                    )
                })
                .collect();
            let methods: Vec<&str> = payment_methods(&country)
                .iter()
                .map(|method| method.display_name())
                .collect();
            let totals = state.cart.totals();

            format!(
                "Country: {country}\nEvents ({}):\n{}\nCart: {} line(s), subtotal {symbol}{}, total {symbol}{}\nPayment methods: {}",
                events.len(),
                events.join("\n"),
                state.cart.items.len(),
                subtotal(&state.cart.items),
                totals.total,
                methods.join(", ")
            )
        })
        .await;
    println!("{summary}");

    store.shutdown(Duration::from_secs(5)).await?;
    Ok(())
}
