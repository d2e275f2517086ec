//! HTTP client for the external fulfillment factory.
//!
//! Wraps a single bounded call to the factory endpoint with the configured
//! shared secret as a bearer credential. The tri-state [`FactoryOutcome`]
//! distinguishes transport failure from a reachable-but-rejecting factory;
//! the rejection body passes through opaquely (the orchestrator only needs
//! the report reference, not the factory's error vocabulary). No retries at
//! this layer.

use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use sliceworks_core::{Email, UserId};

use crate::config::FactoryConfig;
use crate::models::{Order, User};

/// Errors constructing the factory client.
#[derive(Debug, Error)]
pub enum FactoryError {
    /// HTTP client failed to build.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The configured API key is not a valid header value.
    #[error("invalid factory API key: {0}")]
    InvalidApiKey(String),
}

/// Result of contacting the factory.
#[derive(Debug, Clone)]
pub enum FactoryOutcome {
    /// The factory fulfilled the order and returned a receipt.
    Fulfilled {
        receipt: String,
        report_url: Option<String>,
    },
    /// The factory was reachable but declined the order.
    Rejected {
        message: Option<String>,
        report_url: Option<String>,
    },
    /// Transport-level failure: timeout, connection refused, or a malformed
    /// success body.
    Unreachable,
}

/// Diner summary sent alongside the order.
#[derive(Debug, Clone, Serialize)]
pub struct DinerSummary {
    pub id: UserId,
    pub name: String,
    pub email: Email,
}

impl From<&User> for DinerSummary {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
        }
    }
}

/// Factory submission payload.
#[derive(Debug, Serialize)]
struct SubmitPayload<'a> {
    diner: &'a DinerSummary,
    order: &'a Order,
}

/// Success response body from the factory.
#[derive(Debug, Deserialize)]
struct FulfillmentReceipt {
    /// The receipt token.
    jwt: String,
    #[serde(rename = "reportUrl")]
    report_url: Option<String>,
}

/// Failure response body from the factory; passed through opaquely.
#[derive(Debug, Default, Deserialize)]
struct FactoryRejection {
    message: Option<String>,
    #[serde(rename = "reportUrl")]
    report_url: Option<String>,
}

/// Client for the external fulfillment factory.
#[derive(Clone)]
pub struct FactoryClient {
    client: reqwest::Client,
    url: String,
}

impl FactoryClient {
    /// Create a new factory client.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build or the API key is not
    /// a valid header value.
    pub fn new(config: &FactoryConfig) -> Result<Self, FactoryError> {
        let mut headers = HeaderMap::new();

        let auth_value = format!("Bearer {}", config.api_key.expose_secret());
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&auth_value)
                .map_err(|e| FactoryError::InvalidApiKey(e.to_string()))?,
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()?;

        Ok(Self {
            client,
            url: config.url.trim_end_matches('/').to_owned(),
        })
    }

    /// Submit an order for fulfillment.
    ///
    /// Never fails: every error condition maps to one of the three outcomes.
    pub async fn submit(&self, diner: &DinerSummary, order: &Order) -> FactoryOutcome {
        let payload = SubmitPayload { diner, order };

        let response = match self
            .client
            .post(format!("{}/order", self.url))
            .json(&payload)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(error = %e, order_id = %order.id, "factory unreachable");
                return FactoryOutcome::Unreachable;
            }
        };

        let status = response.status();
        if status.is_success() {
            match response.json::<FulfillmentReceipt>().await {
                Ok(receipt) => FactoryOutcome::Fulfilled {
                    receipt: receipt.jwt,
                    report_url: receipt.report_url,
                },
                Err(e) => {
                    tracing::warn!(
                        error = %e,
                        order_id = %order.id,
                        "malformed factory success body"
                    );
                    FactoryOutcome::Unreachable
                }
            }
        } else {
            // A failure body is optional and opaque beyond the report reference.
            let rejection = response
                .json::<FactoryRejection>()
                .await
                .unwrap_or_default();
            tracing::warn!(
                status = status.as_u16(),
                order_id = %order.id,
                "factory rejected order"
            );
            FactoryOutcome::Rejected {
                message: rejection.message,
                report_url: rejection.report_url,
            }
        }
    }
}
