//! Ticket lookup for past orders and ticket downloads.

use crate::notification::Notifications;
use std::sync::Arc;
use ticketplus_api::{IssuedTicket, TicketLookup, TicketLookupRequest, TicketPlusApi};
use ticketplus_core::{effect::Effect, reducer::Reducer, smallvec, SmallVec};

/// A downloaded ticket document
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TicketDownload {
    /// QR identifier of the ticket
    pub qr_identifier: String,
    /// Document bytes
    pub bytes: Vec<u8>,
}

/// Ticket lookup state
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TicketsState {
    /// Tickets of the last successful lookup
    pub tickets: Vec<IssuedTicket>,
    /// The buyer has an app account
    pub has_app_access: bool,
    /// A request is in flight
    pub loading: bool,
    /// Last downloaded ticket
    pub download: Option<TicketDownload>,
    /// Messages for the user
    pub notifications: Notifications,
}

/// Ticket lookup actions
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TicketsAction {
    /// Look up tickets by email or order reference
    FindTickets {
        /// Buyer email
        email: String,
        /// Order reference
        order_reference: String,
    },
    /// Lookup answered
    TicketsFound(TicketLookup),
    /// Lookup failed
    LookupFailed {
        /// Message for the user
        message: String,
    },
    /// Fetch a ticket document
    DownloadTicket {
        /// QR identifier of the ticket
        qr_identifier: String,
    },
    /// Document fetched
    TicketDownloaded(TicketDownload),
    /// Document could not be fetched
    DownloadFailed {
        /// QR identifier of the ticket
        qr_identifier: String,
    },
}

/// Ticket lookup dependencies
#[derive(Clone)]
pub struct TicketsEnvironment {
    /// REST API
    pub api: Arc<dyn TicketPlusApi>,
}

/// Ticket lookup reducer
#[derive(Clone, Debug, Default)]
pub struct TicketsReducer;

impl TicketsReducer {
    /// Creates a new `TicketsReducer`
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Reducer for TicketsReducer {
    type State = TicketsState;
    type Action = TicketsAction;
    type Environment = TicketsEnvironment;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        match action {
            TicketsAction::FindTickets {
                email,
                order_reference,
            } => {
                let request = TicketLookupRequest {
                    email: email.trim().to_string(),
                    order_reference: order_reference.trim().to_string(),
                };
                if request.email.is_empty() && request.order_reference.is_empty() {
                    state
                        .notifications
                        .error("Please enter your email or order reference");
                    return smallvec![Effect::None];
                }

                state.loading = true;
                let api = Arc::clone(&env.api);
                return smallvec![Effect::future(async move {
                    Some(match api.find_tickets(request).await {
                        Ok(lookup) => TicketsAction::TicketsFound(lookup),
                        Err(error) if error.is_rejection() => TicketsAction::LookupFailed {
                            message: error
                                .server_message()
                                .unwrap_or("Failed to find tickets")
                                .to_string(),
                        },
                        Err(error) => {
                            tracing::warn!(%error, "Ticket lookup failed");
                            TicketsAction::LookupFailed {
                                message: "Error finding tickets. Please try again.".to_string(),
                            }
                        },
                    })
                })];
            },
            TicketsAction::TicketsFound(lookup) => {
                state.loading = false;
                state.has_app_access = lookup.has_app_access;
                state.tickets = lookup.tickets;
                match state.tickets.len() {
                    0 => state.notifications.error("No tickets found"),
                    n => state.notifications.success(format!("Found {n} ticket(s)")),
                }
            },
            TicketsAction::LookupFailed { message } => {
                state.loading = false;
                state.tickets.clear();
                state.notifications.error(message);
            },
            TicketsAction::DownloadTicket { qr_identifier } => {
                let api = Arc::clone(&env.api);
                return smallvec![Effect::future(async move {
                    Some(match api.download_ticket(qr_identifier.clone()).await {
                        Ok(bytes) => TicketsAction::TicketDownloaded(TicketDownload {
                            qr_identifier,
                            bytes,
                        }),
                        Err(error) => {
                            tracing::warn!(%qr_identifier, %error, "Ticket download failed");
                            TicketsAction::DownloadFailed { qr_identifier }
                        },
                    })
                })];
            },
            TicketsAction::TicketDownloaded(download) => state.download = Some(download),
            TicketsAction::DownloadFailed { .. } => {
                state.notifications.error("Failed to download ticket");
            },
        }

        smallvec![Effect::None]
    }
}
