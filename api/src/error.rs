//! Error types for the TicketPlus API client

use thiserror::Error;

/// Errors that can occur when talking to the TicketPlus API
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// HTTP request could not be sent or the connection failed
    #[error("Request failed: {0}")]
    RequestFailed(String),

    /// Response body could not be parsed
    #[error("Response parsing failed: {0}")]
    ResponseParseFailed(String),

    /// API answered with a non-success status code
    #[error("API error (status {status}): {}", message.as_deref().unwrap_or("no message"))]
    Status {
        /// HTTP status code
        status: u16,
        /// `message` field of the error body, if any
        message: Option<String>,
    },

    /// API answered 2xx but reported `success: false`
    #[error("Request rejected: {}", message.as_deref().unwrap_or("no message"))]
    Rejected {
        /// Server-provided reason, if any
        message: Option<String>,
    },

    /// A success response was missing a required field
    #[error("Response missing field: {0}")]
    MissingField(&'static str),
}

impl ApiError {
    /// Message supplied by the server, if the failure carried one
    #[must_use]
    pub fn server_message(&self) -> Option<&str> {
        match self {
            Self::Status { message, .. } | Self::Rejected { message } => message
                .as_deref()
                .filter(|m| !m.trim().is_empty()),
            _ => None,
        }
    }

    /// Whether the API explicitly refused the request (as opposed to a transport failure)
    #[must_use]
    pub const fn is_rejection(&self) -> bool {
        matches!(self, Self::Rejected { .. })
    }
}

/// Result alias for API calls
pub type ApiResult<T> = Result<T, ApiError>;
