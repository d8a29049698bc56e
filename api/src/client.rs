//! TicketPlus REST client implementation

use crate::error::{ApiError, ApiResult};
use crate::types::{
    Coupon, CouponValidationRequest, CouponValidationResponse, ErrorBody, Event, EventEnvelope,
    EventId, EventsEnvelope, HostedCheckoutRequest, HostedCheckoutResponse,
    HostedCheckoutSession, HostedVerification, HostedVerificationRequest,
    HostedVerificationResponse, PaymentIntentRequest, PaymentIntentResponse, PaymentStatus,
    PaymentStatusResponse, RequestToPay, RequestToPayResponse, TicketLookup,
    TicketLookupRequest, TicketLookupResponse,
};
use crate::{ApiFuture, TicketPlusApi};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;

/// TicketPlus API client
#[derive(Clone, Debug)]
pub struct TicketPlusClient {
    client: Client,
    api_url: String,
}

impl TicketPlusClient {
    /// Create a client for `api_url` with reqwest defaults
    #[must_use]
    pub fn new(api_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_url: normalize(api_url.into()),
        }
    }

    /// Create a client whose requests time out after `timeout`
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::RequestFailed`] if the HTTP client cannot be built
    pub fn with_timeout(api_url: impl Into<String>, timeout: Duration) -> ApiResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ApiError::RequestFailed(e.to_string()))?;

        Ok(Self {
            client,
            api_url: normalize(api_url.into()),
        })
    }

    /// Base URL requests are sent to
    #[must_use]
    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    /// Direct download link for an issued ticket
    #[must_use]
    pub fn ticket_download_url(&self, qr_identifier: &str) -> String {
        format!("{}/tickets/download/{qr_identifier}", self.api_url)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> ApiResult<T> {
        tracing::debug!(path, "GET");
        let response = self
            .client
            .get(format!("{}{path}", self.api_url))
            .send()
            .await
            .map_err(|e| ApiError::RequestFailed(e.to_string()))?;

        read_json(response).await
    }

    async fn post_json<B, T>(&self, path: &str, body: &B) -> ApiResult<T>
    where
        B: Serialize + Sync,
        T: DeserializeOwned,
    {
        tracing::debug!(path, "POST");
        let response = self
            .client
            .post(format!("{}{path}", self.api_url))
            .json(body)
            .send()
            .await
            .map_err(|e| ApiError::RequestFailed(e.to_string()))?;

        read_json(response).await
    }
}

fn normalize(mut api_url: String) -> String {
    while api_url.ends_with('/') {
        api_url.pop();
    }
    api_url
}

/// Turn a non-2xx response into [`ApiError::Status`], reading `message` from the body
async fn check_status(response: Response) -> ApiResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorBody>(&body)
        .ok()
        .and_then(|b| b.message);

    tracing::warn!(status = status.as_u16(), message = ?message, "API returned error status");
    Err(ApiError::Status {
        status: status.as_u16(),
        message,
    })
}

async fn read_json<T: DeserializeOwned>(response: Response) -> ApiResult<T> {
    check_status(response)
        .await?
        .json::<T>()
        .await
        .map_err(|e| ApiError::ResponseParseFailed(e.to_string()))
}

impl TicketPlusApi for TicketPlusClient {
    fn list_events(&self) -> ApiFuture<'_, Vec<Event>> {
        Box::pin(async move {
            let envelope: EventsEnvelope = self.get_json("/events").await?;
            Ok(envelope.into())
        })
    }

    fn get_event(&self, id: EventId) -> ApiFuture<'_, Event> {
        Box::pin(async move {
            let envelope: EventEnvelope = self.get_json(&format!("/events/{id}")).await?;
            Ok(envelope.into())
        })
    }

    fn validate_coupon(&self, request: CouponValidationRequest) -> ApiFuture<'_, Coupon> {
        Box::pin(async move {
            let response: CouponValidationResponse =
                self.post_json("/coupons/validate", &request).await?;

            match (response.success, response.coupon) {
                (true, Some(coupon)) => Ok(coupon),
                (true, None) => Err(ApiError::MissingField("coupon")),
                (false, _) => Err(ApiError::Rejected {
                    message: response.message,
                }),
            }
        })
    }

    fn request_to_pay(&self, request: RequestToPay) -> ApiFuture<'_, String> {
        Box::pin(async move {
            let response: RequestToPayResponse =
                self.post_json("/payments/request-to-pay", &request).await?;

            if !response.success {
                return Err(ApiError::Rejected {
                    message: response.error,
                });
            }

            response
                .data
                .and_then(|d| d.reference_id)
                .filter(|id| !id.is_empty())
                .ok_or(ApiError::MissingField("data.referenceId"))
        })
    }

    fn payment_status(&self, reference_id: String) -> ApiFuture<'_, PaymentStatus> {
        Box::pin(async move {
            let response: PaymentStatusResponse = self
                .get_json(&format!("/payments/payment-status/{reference_id}"))
                .await?;
            Ok(response.status)
        })
    }

    fn create_payment_intent(&self, request: PaymentIntentRequest) -> ApiFuture<'_, String> {
        Box::pin(async move {
            let response: PaymentIntentResponse =
                self.post_json("/payments/stripe/intent", &request).await?;

            if !response.success {
                return Err(ApiError::Rejected {
                    message: response.message,
                });
            }

            response
                .data
                .and_then(|d| d.client_secret)
                .ok_or(ApiError::MissingField("data.clientSecret"))
        })
    }

    fn initialize_hosted_checkout(
        &self,
        request: HostedCheckoutRequest,
    ) -> ApiFuture<'_, HostedCheckoutSession> {
        Box::pin(async move {
            let response: HostedCheckoutResponse = self
                .post_json("/payments/flutterwave/initialize", &request)
                .await?;

            if !response.success {
                return Err(ApiError::Rejected {
                    message: response.message,
                });
            }

            response.data.ok_or(ApiError::MissingField("data"))
        })
    }

    fn verify_hosted_checkout(
        &self,
        request: HostedVerificationRequest,
    ) -> ApiFuture<'_, HostedVerification> {
        Box::pin(async move {
            let response: HostedVerificationResponse = self
                .post_json("/payments/flutterwave/verify", &request)
                .await?;

            Ok(HostedVerification {
                verified: response.success,
                order_id: response.data.and_then(|d| d.order_id),
            })
        })
    }

    fn find_tickets(&self, request: TicketLookupRequest) -> ApiFuture<'_, TicketLookup> {
        Box::pin(async move {
            let response: TicketLookupResponse = self.post_json("/tickets/find", &request).await?;

            if !response.success {
                return Err(ApiError::Rejected {
                    message: response.message,
                });
            }

            Ok(TicketLookup {
                tickets: response.tickets,
                has_app_access: response.has_app_access,
            })
        })
    }

    fn download_ticket(&self, qr_identifier: String) -> ApiFuture<'_, Vec<u8>> {
        Box::pin(async move {
            let url = self.ticket_download_url(&qr_identifier);
            tracing::debug!(%url, "Downloading ticket");

            let response = self
                .client
                .get(url)
                .send()
                .await
                .map_err(|e| ApiError::RequestFailed(e.to_string()))?;

            let bytes = check_status(response)
                .await?
                .bytes()
                .await
                .map_err(|e| ApiError::ResponseParseFailed(e.to_string()))?;

            Ok(bytes.to_vec())
        })
    }
}
