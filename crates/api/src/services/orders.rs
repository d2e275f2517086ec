//! Order orchestration: persist first, fulfill best-effort.
//!
//! The order row is written before the factory is contacted, so an order
//! exists even when fulfillment fails; no outcome rolls it back. Duplicate
//! submissions are not deduplicated (no idempotency key) — retrying an
//! identical request places a second order.

use std::time::Instant;

use serde::Serialize;
use sqlx::SqlitePool;

use crate::db::orders::OrderRepository;
use crate::error::{ApiError, Result};
use crate::factory::{DinerSummary, FactoryClient, FactoryOutcome};
use crate::models::{FulfillmentStatus, NewOrder, Order, User};
use crate::telemetry::{OrderFailure, Telemetry};

/// Latency telemetry key for a successful fulfillment round-trip.
const LATENCY_OP: &str = "order_fulfillment";

/// A successfully fulfilled order.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlacedOrder {
    pub order: Order,
    pub fulfillment_token: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report_url: Option<String>,
}

/// Order orchestrator.
pub struct OrderService<'a> {
    orders: OrderRepository<'a>,
    factory: &'a FactoryClient,
    telemetry: &'a Telemetry,
}

impl<'a> OrderService<'a> {
    /// Create a new order service.
    #[must_use]
    pub const fn new(
        pool: &'a SqlitePool,
        factory: &'a FactoryClient,
        telemetry: &'a Telemetry,
    ) -> Self {
        Self {
            orders: OrderRepository::new(pool),
            factory,
            telemetry,
        }
    }

    /// Place an order for a diner.
    ///
    /// The order row persists regardless of the factory outcome; only the
    /// terminal fulfillment status differs. A telemetry event fires on every
    /// path before the response is produced.
    ///
    /// # Errors
    ///
    /// - `ApiError::Validation` if the item list is empty (nothing is
    ///   persisted and the factory is not contacted).
    /// - `ApiError::Dependency` if the factory rejects the order or is
    ///   unreachable (the order row is retained in a terminal failure state).
    /// - `ApiError::Storage` if persistence fails.
    pub async fn place(&self, diner: &User, request: NewOrder) -> Result<PlacedOrder> {
        if request.items.is_empty() {
            return Err(ApiError::Validation(
                "order must contain at least one item".to_string(),
            ));
        }

        let started = Instant::now();

        let order = self
            .orders
            .create(
                diner.id,
                request.franchise_id,
                request.store_id,
                request.items,
            )
            .await?;

        tracing::info!(
            order_id = %order.id,
            diner_id = %diner.id,
            items = order.items.len(),
            "order created"
        );

        let total = order.total();
        let outcome = self.factory.submit(&DinerSummary::from(diner), &order).await;

        match outcome {
            FactoryOutcome::Fulfilled {
                receipt,
                report_url,
            } => {
                self.orders
                    .set_outcome(
                        order.id,
                        FulfillmentStatus::Fulfilled,
                        Some(&receipt),
                        report_url.as_deref(),
                    )
                    .await?;

                let elapsed = started.elapsed();
                self.telemetry.record_sale(total);
                self.telemetry.record_latency(LATENCY_OP, elapsed);

                tracing::info!(
                    order_id = %order.id,
                    diner_id = %diner.id,
                    total = %total,
                    latency_ms = elapsed.as_millis(),
                    "order fulfilled"
                );

                Ok(PlacedOrder {
                    order,
                    fulfillment_token: receipt,
                    report_url,
                })
            }
            FactoryOutcome::Rejected {
                message,
                report_url,
            } => {
                self.orders
                    .set_outcome(
                        order.id,
                        FulfillmentStatus::Rejected,
                        None,
                        report_url.as_deref(),
                    )
                    .await?;

                self.telemetry.record_order_failure(OrderFailure::Rejected);

                tracing::error!(
                    order_id = %order.id,
                    diner_id = %diner.id,
                    factory_message = message.as_deref().unwrap_or(""),
                    "factory rejected order"
                );

                // The caller still gets the report reference so it can see
                // why fulfillment failed.
                Err(ApiError::Dependency {
                    message: "failed to fulfill order at factory".to_string(),
                    report_url,
                })
            }
            FactoryOutcome::Unreachable => {
                self.orders
                    .set_outcome(order.id, FulfillmentStatus::Unreachable, None, None)
                    .await?;

                self.telemetry
                    .record_order_failure(OrderFailure::Unreachable);

                tracing::error!(
                    order_id = %order.id,
                    diner_id = %diner.id,
                    "factory unreachable"
                );

                Err(ApiError::Dependency {
                    message: "order fulfillment is currently unavailable".to_string(),
                    report_url: None,
                })
            }
        }
    }
}
