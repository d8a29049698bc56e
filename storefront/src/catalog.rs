//! Event catalog: fetch, filter by country and per-event lookup.

use crate::checkout::regional::DEFAULT_COUNTRY;
use crate::notification::Notifications;
use chrono::{DateTime, TimeDelta, Utc};
use std::sync::Arc;
use ticketplus_api::{Event, EventId, TicketPlusApi};
use ticketplus_core::{effect::Effect, reducer::Reducer, smallvec, SmallVec};

/// Category that matches every event
pub const ALL_CATEGORIES: &str = "All";

/// Catalog state
#[derive(Clone, Debug, PartialEq)]
pub struct CatalogState {
    /// Every fetched event
    pub events: Vec<Event>,
    /// Events in `selected_country`
    pub filtered: Vec<Event>,
    /// Country the catalog is filtered by
    pub selected_country: String,
    /// Event opened by `LoadEvent`
    pub current_event: Option<Event>,
    /// A request is in flight
    pub loading: bool,
    /// Last fetch error
    pub error: Option<String>,
    /// Messages for the user
    pub notifications: Notifications,
}

impl Default for CatalogState {
    fn default() -> Self {
        Self::new(DEFAULT_COUNTRY)
    }
}

impl CatalogState {
    /// Empty catalog filtered by `country`
    #[must_use]
    pub fn new(country: impl Into<String>) -> Self {
        Self {
            events: Vec::new(),
            filtered: Vec::new(),
            selected_country: country.into(),
            current_event: None,
            loading: false,
            error: None,
            notifications: Notifications::default(),
        }
    }

    /// Cached event by id
    #[must_use]
    pub fn event(&self, id: &EventId) -> Option<&Event> {
        self.events.iter().find(|event| &event.id == id)
    }

    /// Events in `country` starting within `days` of `now`, soonest first
    #[must_use]
    pub fn upcoming_events(&self, country: &str, days: i64, now: DateTime<Utc>) -> Vec<&Event> {
        let until = TimeDelta::try_days(days)
            .and_then(|window| now.checked_add_signed(window))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        let mut upcoming: Vec<&Event> = self
            .events
            .iter()
            .filter(|event| event.country == country)
            .filter(|event| event.starting_time >= now && event.starting_time <= until)
            .collect();
        upcoming.sort_by_key(|event| event.starting_time);
        upcoming
    }

    /// `"All"` followed by the categories of the filtered events, first seen first
    #[must_use]
    pub fn categories(&self) -> Vec<&str> {
        let mut categories = vec![ALL_CATEGORIES];
        for event in &self.filtered {
            let category = event.category.as_str();
            if !category.is_empty() && !categories.contains(&category) {
                categories.push(category);
            }
        }
        categories
    }

    /// Filtered events in `category`
    #[must_use]
    pub fn events_in_category(&self, category: &str) -> Vec<&Event> {
        self.filtered
            .iter()
            .filter(|event| category == ALL_CATEGORIES || event.category == category)
            .collect()
    }

    fn apply_filter(&mut self) {
        self.filtered = self
            .events
            .iter()
            .filter(|event| event.country == self.selected_country)
            .cloned()
            .collect();
    }
}

/// Catalog actions
#[derive(Clone, Debug, PartialEq)]
pub enum CatalogAction {
    /// Fetch every event
    FetchAll,
    /// Events fetched
    EventsLoaded(Vec<Event>),
    /// Fetch failed
    EventsFailed {
        /// Message for the user
        message: String,
    },
    /// Filter by country
    FilterByCountry(String),
    /// Open an event, from the cache or the API
    LoadEvent {
        /// Event to open
        id: EventId,
    },
    /// Event fetched
    EventLoaded(Event),
    /// Event could not be fetched
    EventNotFound {
        /// Event requested
        id: EventId,
    },
}

/// Catalog dependencies
#[derive(Clone)]
pub struct CatalogEnvironment {
    /// REST API
    pub api: Arc<dyn TicketPlusApi>,
}

/// Catalog reducer
#[derive(Clone, Debug, Default)]
pub struct CatalogReducer;

impl CatalogReducer {
    /// Creates a new `CatalogReducer`
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Reducer for CatalogReducer {
    type State = CatalogState;
    type Action = CatalogAction;
    type Environment = CatalogEnvironment;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        match action {
            CatalogAction::FetchAll => {
                state.loading = true;
                state.error = None;
                let api = Arc::clone(&env.api);
                return smallvec![Effect::future(async move {
                    Some(match api.list_events().await {
                        Ok(events) => CatalogAction::EventsLoaded(events),
                        Err(error) => {
                            tracing::warn!(%error, "Fetching events failed");
                            CatalogAction::EventsFailed {
                                message: "Failed to fetch events".to_string(),
                            }
                        },
                    })
                })];
            },
            CatalogAction::EventsLoaded(events) => {
                tracing::debug!(count = events.len(), "Events loaded");
                state.loading = false;
                state.events = events;
                state.apply_filter();
            },
            CatalogAction::EventsFailed { message } => {
                state.loading = false;
                state.apply_filter();
                state.notifications.error(message.clone());
                state.error = Some(message);
            },
            CatalogAction::FilterByCountry(country) => {
                state.selected_country = country;
                state.apply_filter();
            },
            CatalogAction::LoadEvent { id } => {
                if let Some(event) = state.event(&id).cloned() {
                    state.current_event = Some(event);
                    return smallvec![Effect::None];
                }

                state.loading = true;
                let api = Arc::clone(&env.api);
                return smallvec![Effect::future(async move {
                    Some(match api.get_event(id.clone()).await {
                        Ok(event) => CatalogAction::EventLoaded(event),
                        Err(error) => {
                            tracing::debug!(%id, %error, "Event lookup failed");
                            CatalogAction::EventNotFound { id }
                        },
                    })
                })];
            },
            CatalogAction::EventLoaded(event) => {
                state.loading = false;
                state.current_event = Some(event);
            },
            CatalogAction::EventNotFound { id } => {
                state.loading = false;
                state.current_event = None;
                state.notifications.error(format!("Event {id} not found"));
            },
        }

        smallvec![Effect::None]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ticketplus_api::ApiError;
    use ticketplus_core::environment::Clock;
    use ticketplus_testing::{collect_actions, fixtures, test_clock, ApiCall, ScriptedApi};

    fn env(api: Arc<ScriptedApi>) -> CatalogEnvironment {
        CatalogEnvironment { api }
    }

    fn catalog(events: Vec<Event>) -> CatalogState {
        let mut state = CatalogState::new("Uganda");
        state.events = events;
        state.apply_filter();
        state
    }

    async fn run(
        state: &mut CatalogState,
        action: CatalogAction,
        env: &CatalogEnvironment,
    ) {
        let reducer = CatalogReducer::new();
        let effects = reducer.reduce(state, action, env);
        for action in collect_actions(effects.into_vec()).await {
            reducer.reduce(state, action, env);
        }
    }

    #[tokio::test]
    async fn test_fetch_filters_by_selected_country() {
        let now = test_clock().now();
        let api = Arc::new(ScriptedApi::new());
        api.events.ok(vec![
            fixtures::event("e1", "Uganda", now),
            fixtures::event("e2", "Rwanda", now),
        ]);
        let env = env(api);
        let mut state = CatalogState::new("Uganda");

        run(&mut state, CatalogAction::FetchAll, &env).await;

        assert!(!state.loading);
        assert_eq!(state.events.len(), 2);
        assert_eq!(state.filtered.len(), 1);

        run(&mut state, CatalogAction::FilterByCountry("Rwanda".to_string()), &env).await;
        assert_eq!(state.filtered[0].id.as_str(), "e2");
    }

    #[tokio::test]
    async fn test_fetch_failure_keeps_previous_events() {
        let now = test_clock().now();
        let api = Arc::new(ScriptedApi::new());
        api.events.push(Err(ApiError::RequestFailed("offline".to_string())));
        let env = env(api);
        let mut state = catalog(vec![fixtures::event("e1", "Uganda", now)]);

        run(&mut state, CatalogAction::FetchAll, &env).await;

        assert_eq!(state.error.as_deref(), Some("Failed to fetch events"));
        assert_eq!(state.filtered.len(), 1);
        assert!(!state.loading);
    }

    #[tokio::test]
    async fn test_load_event_prefers_cache() {
        let now = test_clock().now();
        let api = Arc::new(ScriptedApi::new());
        api.event.push(Err(ApiError::Status {
            status: 404,
            message: None,
        }));
        let env = env(Arc::clone(&api));
        let mut state = catalog(vec![fixtures::event("e1", "Uganda", now)]);

        run(&mut state, CatalogAction::LoadEvent { id: "e1".into() }, &env).await;
        assert!(state.current_event.is_some());
        assert!(api.calls().is_empty());

        run(&mut state, CatalogAction::LoadEvent { id: "missing".into() }, &env).await;
        assert!(state.current_event.is_none());
        assert_eq!(api.calls(), vec![ApiCall::GetEvent("missing".into())]);
        assert_eq!(state.notifications.latest_message(), Some("Event missing not found"));
    }

    #[test]
    fn test_upcoming_events_window_and_order() {
        let now = test_clock().now();
        let state = catalog(vec![
            fixtures::event("later", "Uganda", now + TimeDelta::days(5)),
            fixtures::event("past", "Uganda", now - TimeDelta::days(1)),
            fixtures::event("soon", "Uganda", now + TimeDelta::days(1)),
            fixtures::event("far", "Uganda", now + TimeDelta::days(40)),
            fixtures::event("abroad", "Rwanda", now + TimeDelta::days(1)),
        ]);

        let ids: Vec<&str> = state
            .upcoming_events("Uganda", 30, now)
            .into_iter()
            .map(|event| event.id.as_str())
            .collect();
        assert_eq!(ids, vec!["soon", "later"]);
    }

    #[test]
    fn test_upcoming_events_with_huge_window() {
        let now = test_clock().now();
        let state = catalog(vec![
            fixtures::event("far", "Uganda", now + TimeDelta::days(4000)),
            fixtures::event("past", "Uganda", now - TimeDelta::days(1)),
        ]);

        for days in [100_000_000, i64::MAX] {
            let ids: Vec<&str> = state
                .upcoming_events("Uganda", days, now)
                .into_iter()
                .map(|event| event.id.as_str())
                .collect();
            assert_eq!(ids, vec!["far"]);
        }
        assert!(state.upcoming_events("Uganda", -1, now).is_empty());
    }

    #[test]
    fn test_categories() {
        let now = test_clock().now();
        let state = catalog(vec![
            fixtures::event_in_category("e1", "Uganda", "Music", now),
            fixtures::event_in_category("e2", "Uganda", "Comedy", now),
            fixtures::event_in_category("e3", "Uganda", "Music", now),
            fixtures::event_in_category("e4", "Rwanda", "Sports", now),
        ]);

        assert_eq!(state.categories(), vec!["All", "Music", "Comedy"]);
        assert_eq!(state.events_in_category("Music").len(), 2);
        assert_eq!(state.events_in_category(ALL_CATEGORIES).len(), 3);
    }

    #[test]
    fn test_sold_out() {
        let mut event = fixtures::event("e1", "Uganda", test_clock().now());
        assert!(!event.is_sold_out());
        event.quantity = 0;
        assert!(event.is_sold_out());
    }
}
