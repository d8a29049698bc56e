//! Cart line items

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ticketplus_api::{Event, EventId, MerchandiseId, MerchandiseItem, Money, TicketId};

/// The parts of an [`Event`] a cart line keeps
///
/// Captured when the line is added so the cart can be priced and turned into
/// an order without refetching the catalog.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventSnapshot {
    /// Event id
    pub id: EventId,
    /// Display name
    pub name: String,
    /// Category label
    pub category: String,
    /// Organizer account id
    #[serde(default)]
    pub owner: Option<String>,
    /// Start time
    pub starting_time: DateTime<Utc>,
    /// End time
    pub ending_time: DateTime<Utc>,
    /// Tickets left when the line was added
    pub quantity: i64,
}

impl From<&Event> for EventSnapshot {
    fn from(event: &Event) -> Self {
        Self {
            id: event.id.clone(),
            name: event.name.clone(),
            category: event.category.clone(),
            owner: event.owner.clone(),
            starting_time: event.starting_time,
            ending_time: event.ending_time,
            quantity: event.quantity,
        }
    }
}

/// Merchandise chosen on a cart line
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MerchandiseSelection {
    /// Merchandise id
    #[serde(rename = "_id")]
    pub id: MerchandiseId,
    /// Display name
    pub item_name: String,
    /// Unit price when added
    pub price: Money,
    /// Quantity, at least 1
    #[serde(rename = "qty")]
    pub quantity: u32,
}

impl MerchandiseSelection {
    /// One unit of `item`
    #[must_use]
    pub fn single(item: &MerchandiseItem) -> Self {
        Self {
            id: item.id.clone(),
            item_name: item.item_name.clone(),
            price: item.price,
            quantity: 1,
        }
    }

    /// Price times quantity
    #[must_use]
    pub fn total(&self) -> Money {
        self.price * self.quantity
    }
}

/// One ticket type of one event, with optional merchandise
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    /// Event the ticket belongs to
    pub event: EventSnapshot,
    /// Ticket type
    pub ticket_id: TicketId,
    /// Ticket display name
    pub ticket_name: String,
    /// Unit price when added
    pub sale_price: Money,
    /// Number of tickets, at least 1
    #[serde(rename = "qty")]
    pub quantity: u32,
    /// Country of the event when added
    pub country: String,
    /// Merchandise on this line
    #[serde(default)]
    pub merchandise: Vec<MerchandiseSelection>,
}

impl CartItem {
    /// A line for `quantity` tickets of `ticket_id`
    ///
    /// Returns `None` if the event does not sell that ticket type. A zero
    /// quantity is raised to 1.
    #[must_use]
    pub fn new(event: &Event, ticket_id: &TicketId, quantity: u32) -> Option<Self> {
        let ticket = event.ticket(ticket_id)?;
        Some(Self {
            event: EventSnapshot::from(event),
            ticket_id: ticket.id.clone(),
            ticket_name: ticket.name.clone(),
            sale_price: ticket.price,
            quantity: quantity.max(1),
            country: event.country.clone(),
            merchandise: Vec::new(),
        })
    }

    /// Add one unit of `item` to this line
    #[must_use]
    pub fn with_merchandise(mut self, item: &MerchandiseItem) -> Self {
        self.merchandise.push(MerchandiseSelection::single(item));
        self
    }

    /// Lines for the same event and ticket type are merged
    #[must_use]
    pub fn is_same_line(&self, other: &Self) -> bool {
        self.event.id == other.event.id && self.ticket_id == other.ticket_id
    }

    /// Ticket price times quantity
    #[must_use]
    pub fn ticket_total(&self) -> Money {
        self.sale_price * self.quantity
    }

    /// Sum of the merchandise on this line
    #[must_use]
    pub fn merchandise_total(&self) -> Money {
        self.merchandise.iter().map(MerchandiseSelection::total).sum()
    }

    /// Tickets plus merchandise
    #[must_use]
    pub fn line_total(&self) -> Money {
        self.ticket_total() + self.merchandise_total()
    }
}

/// Quantity step
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// One more
    More,
    /// One less
    Less,
}
