//! Process telemetry: counters flushed periodically to an external collector.
//!
//! The emitter is an injectable component with an explicit lifecycle
//! ([`Telemetry::start`] / [`Telemetry::flush`] / [`TelemetryHandle::stop`])
//! rather than a process-wide singleton, so tests can substitute a
//! [`RecordingSink`] or [`NoopSink`].
//!
//! Rate counters reset to zero on every flush ("rate over interval"
//! semantics); the active-session count is a gauge and survives flushes.
//! Sink failures are swallowed: telemetry must never fail a user request.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use axum::http::Method;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use sliceworks_core::Price;

use crate::config::TelemetryConfig;

/// Errors publishing metric lines to the collector.
#[derive(Debug, Error)]
pub enum SinkError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Collector returned a non-success status.
    #[error("collector returned status {0}")]
    Status(u16),
}

/// Destination for flushed metric lines.
#[async_trait]
pub trait TelemetrySink: Send + Sync {
    /// Publish a batch of collector line-protocol entries.
    async fn publish(&self, lines: &[String]) -> std::result::Result<(), SinkError>;
}

/// Sink that pushes lines to an HTTP collector endpoint.
pub struct HttpSink {
    client: reqwest::Client,
    url: String,
}

impl HttpSink {
    /// Create a sink for the given collector endpoint.
    ///
    /// # Errors
    ///
    /// Returns `SinkError` if the HTTP client fails to build.
    pub fn new(url: String, api_key: Option<&SecretString>) -> std::result::Result<Self, SinkError> {
        let mut builder = reqwest::Client::builder().timeout(Duration::from_secs(5));

        if let Some(key) = api_key {
            let mut headers = reqwest::header::HeaderMap::new();
            if let Ok(value) = reqwest::header::HeaderValue::from_str(&format!(
                "Bearer {}",
                key.expose_secret()
            )) {
                headers.insert(reqwest::header::AUTHORIZATION, value);
            }
            builder = builder.default_headers(headers);
        }

        Ok(Self {
            client: builder.build()?,
            url,
        })
    }
}

#[async_trait]
impl TelemetrySink for HttpSink {
    async fn publish(&self, lines: &[String]) -> std::result::Result<(), SinkError> {
        let response = self
            .client
            .post(&self.url)
            .body(lines.join("\n"))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(SinkError::Status(status.as_u16()));
        }

        Ok(())
    }
}

/// Sink that drops everything.
pub struct NoopSink;

#[async_trait]
impl TelemetrySink for NoopSink {
    async fn publish(&self, _lines: &[String]) -> std::result::Result<(), SinkError> {
        Ok(())
    }
}

/// Sink that records published lines in memory, for tests.
#[derive(Default)]
pub struct RecordingSink {
    lines: Mutex<Vec<String>>,
}

impl RecordingSink {
    /// Create an empty recording sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// All lines published so far.
    #[must_use]
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().map(|l| l.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl TelemetrySink for RecordingSink {
    async fn publish(&self, lines: &[String]) -> std::result::Result<(), SinkError> {
        if let Ok(mut stored) = self.lines.lock() {
            stored.extend_from_slice(lines);
        }
        Ok(())
    }
}

/// Revenue is accumulated in fixed-point micro-units so the counter can be a
/// plain atomic.
const MICROS_PER_UNIT: i64 = 1_000_000;

#[derive(Default)]
struct LatencyAgg {
    count: u64,
    total_ms: u64,
}

/// Process-wide counters, updated atomically by request handlers and drained
/// by the periodic flush.
pub struct Telemetry {
    source: String,
    sink: Arc<dyn TelemetrySink>,

    requests_get: AtomicU64,
    requests_post: AtomicU64,
    requests_put: AtomicU64,
    requests_delete: AtomicU64,
    requests_other: AtomicU64,

    auth_success: AtomicU64,
    auth_failure: AtomicU64,
    active_sessions: AtomicI64,

    orders_sold: AtomicU64,
    order_failures_rejected: AtomicU64,
    order_failures_unreachable: AtomicU64,
    revenue_micros: AtomicU64,

    latency: Mutex<HashMap<&'static str, LatencyAgg>>,
}

/// Reason tag for a failed order, distinguishing a factory rejection from an
/// unreachable factory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderFailure {
    Rejected,
    Unreachable,
}

impl Telemetry {
    /// Create a telemetry component publishing to `sink`.
    #[must_use]
    pub fn new(source: impl Into<String>, sink: Arc<dyn TelemetrySink>) -> Self {
        Self {
            source: source.into(),
            sink,
            requests_get: AtomicU64::new(0),
            requests_post: AtomicU64::new(0),
            requests_put: AtomicU64::new(0),
            requests_delete: AtomicU64::new(0),
            requests_other: AtomicU64::new(0),
            auth_success: AtomicU64::new(0),
            auth_failure: AtomicU64::new(0),
            active_sessions: AtomicI64::new(0),
            orders_sold: AtomicU64::new(0),
            order_failures_rejected: AtomicU64::new(0),
            order_failures_unreachable: AtomicU64::new(0),
            revenue_micros: AtomicU64::new(0),
            latency: Mutex::new(HashMap::new()),
        }
    }

    /// Create a telemetry component from configuration.
    ///
    /// With no collector URL configured, metrics are counted but dropped at
    /// flush time.
    #[must_use]
    pub fn from_config(config: &TelemetryConfig) -> Self {
        let sink: Arc<dyn TelemetrySink> = match &config.url {
            Some(url) => match HttpSink::new(url.clone(), config.api_key.as_ref()) {
                Ok(sink) => Arc::new(sink),
                Err(e) => {
                    tracing::warn!(error = %e, "failed to build telemetry sink, dropping metrics");
                    Arc::new(NoopSink)
                }
            },
            None => Arc::new(NoopSink),
        };

        Self::new(config.source.clone(), sink)
    }

    /// Count one handled request.
    pub fn record_request(&self, method: &Method) {
        let counter = match *method {
            Method::GET => &self.requests_get,
            Method::POST => &self.requests_post,
            Method::PUT => &self.requests_put,
            Method::DELETE => &self.requests_delete,
            _ => &self.requests_other,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Count one authentication attempt.
    pub fn record_auth(&self, success: bool) {
        let counter = if success {
            &self.auth_success
        } else {
            &self.auth_failure
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// A session was issued.
    pub fn session_opened(&self) {
        self.active_sessions.fetch_add(1, Ordering::Relaxed);
    }

    /// A session was revoked.
    pub fn session_closed(&self) {
        self.active_sessions.fetch_sub(1, Ordering::Relaxed);
    }

    /// Count a fulfilled order and its revenue.
    pub fn record_sale(&self, total: Price) {
        self.orders_sold.fetch_add(1, Ordering::Relaxed);
        let micros = (total.amount() * Decimal::from(MICROS_PER_UNIT))
            .to_u64()
            .unwrap_or_default();
        self.revenue_micros.fetch_add(micros, Ordering::Relaxed);
    }

    /// Count a failed order with its reason tag.
    pub fn record_order_failure(&self, reason: OrderFailure) {
        let counter = match reason {
            OrderFailure::Rejected => &self.order_failures_rejected,
            OrderFailure::Unreachable => &self.order_failures_unreachable,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a latency sample for a logical operation.
    pub fn record_latency(&self, op: &'static str, elapsed: Duration) {
        if let Ok(mut latency) = self.latency.lock() {
            let agg = latency.entry(op).or_default();
            agg.count += 1;
            agg.total_ms += u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX);
        }
    }

    /// Drain all counters and publish them to the sink.
    ///
    /// Rate counters are reset by the drain; the active-session gauge is
    /// reported as-is. Publish failures are swallowed.
    pub async fn flush(&self) {
        let lines = self.drain();
        if lines.is_empty() {
            return;
        }

        if let Err(e) = self.sink.publish(&lines).await {
            tracing::debug!(error = %e, "telemetry flush failed");
        }
    }

    /// Spawn the periodic flush task.
    #[must_use]
    pub fn start(self: Arc<Self>, interval: Duration) -> TelemetryHandle {
        let telemetry = self;
        let (shutdown_tx, mut shutdown_rx) = oneshot::channel();

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            // The first tick completes immediately; skip it.
            ticker.tick().await;

            loop {
                tokio::select! {
                    _ = ticker.tick() => telemetry.flush().await,
                    _ = &mut shutdown_rx => {
                        // Final flush so shutdown doesn't drop a partial interval.
                        telemetry.flush().await;
                        break;
                    }
                }
            }
        });

        TelemetryHandle {
            shutdown: shutdown_tx,
            task,
        }
    }

    fn drain(&self) -> Vec<String> {
        let mut lines = Vec::new();

        for (method, counter) in [
            ("GET", &self.requests_get),
            ("POST", &self.requests_post),
            ("PUT", &self.requests_put),
            ("DELETE", &self.requests_delete),
            ("OTHER", &self.requests_other),
        ] {
            let n = counter.swap(0, Ordering::Relaxed);
            if n > 0 {
                lines.push(format!(
                    "request,source={},method={method} total={n}",
                    self.source
                ));
            }
        }

        let success = self.auth_success.swap(0, Ordering::Relaxed);
        if success > 0 {
            lines.push(format!("auth,source={} success={success}", self.source));
        }
        let failure = self.auth_failure.swap(0, Ordering::Relaxed);
        if failure > 0 {
            lines.push(format!("auth,source={} failure={failure}", self.source));
        }

        // Gauge: reported, never reset.
        let active = self.active_sessions.load(Ordering::Relaxed);
        lines.push(format!("session,source={} active={active}", self.source));

        let sold = self.orders_sold.swap(0, Ordering::Relaxed);
        if sold > 0 {
            lines.push(format!("order,source={} sold={sold}", self.source));
        }
        for (reason, counter) in [
            ("rejected", &self.order_failures_rejected),
            ("unreachable", &self.order_failures_unreachable),
        ] {
            let n = counter.swap(0, Ordering::Relaxed);
            if n > 0 {
                lines.push(format!(
                    "order,source={},reason={reason} failures={n}",
                    self.source
                ));
            }
        }

        let micros = self.revenue_micros.swap(0, Ordering::Relaxed);
        if micros > 0 {
            let revenue = Decimal::new(i64::try_from(micros).unwrap_or(i64::MAX), 6).normalize();
            lines.push(format!("order,source={} revenue={revenue}", self.source));
        }

        if let Ok(mut latency) = self.latency.lock() {
            for (op, agg) in latency.drain() {
                if agg.count > 0 {
                    let mean = agg.total_ms / agg.count;
                    lines.push(format!(
                        "latency,source={},op={op} mean_ms={mean}",
                        self.source
                    ));
                }
            }
        }

        lines
    }
}

/// Handle to a running flush task.
pub struct TelemetryHandle {
    shutdown: oneshot::Sender<()>,
    task: JoinHandle<()>,
}

impl TelemetryHandle {
    /// Stop the flush task, performing a final flush.
    pub async fn stop(self) {
        let _ = self.shutdown.send(());
        let _ = self.task.await;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn price(s: &str) -> Price {
        serde_json::from_str(s).unwrap()
    }

    #[tokio::test]
    async fn test_flush_publishes_and_resets_rate_counters() {
        let sink = Arc::new(RecordingSink::new());
        let telemetry = Telemetry::new("test", Arc::clone(&sink) as Arc<dyn TelemetrySink>);

        telemetry.record_request(&Method::GET);
        telemetry.record_request(&Method::GET);
        telemetry.record_request(&Method::POST);
        telemetry.record_auth(true);

        telemetry.flush().await;

        let lines = sink.lines();
        assert!(lines.contains(&"request,source=test,method=GET total=2".to_string()));
        assert!(lines.contains(&"request,source=test,method=POST total=1".to_string()));
        assert!(lines.contains(&"auth,source=test success=1".to_string()));

        // Second flush sees zeroed rate counters.
        telemetry.flush().await;
        let lines = sink.lines();
        assert_eq!(
            lines
                .iter()
                .filter(|l| l.starts_with("request,"))
                .count(),
            2
        );
    }

    #[tokio::test]
    async fn test_revenue_is_exact() {
        let sink = Arc::new(RecordingSink::new());
        let telemetry = Telemetry::new("test", Arc::clone(&sink) as Arc<dyn TelemetrySink>);

        telemetry.record_sale(price("0.0538"));
        telemetry.flush().await;

        let lines = sink.lines();
        assert!(lines.contains(&"order,source=test sold=1".to_string()));
        assert!(lines.contains(&"order,source=test revenue=0.0538".to_string()));
    }

    #[tokio::test]
    async fn test_active_sessions_is_a_gauge() {
        let sink = Arc::new(RecordingSink::new());
        let telemetry = Telemetry::new("test", Arc::clone(&sink) as Arc<dyn TelemetrySink>);

        telemetry.session_opened();
        telemetry.session_opened();
        telemetry.session_closed();

        telemetry.flush().await;
        telemetry.flush().await;

        // The gauge survives flushes.
        let lines = sink.lines();
        assert_eq!(
            lines
                .iter()
                .filter(|l| *l == "session,source=test active=1")
                .count(),
            2
        );
    }

    #[tokio::test]
    async fn test_failure_reasons_are_distinct() {
        let sink = Arc::new(RecordingSink::new());
        let telemetry = Telemetry::new("test", Arc::clone(&sink) as Arc<dyn TelemetrySink>);

        telemetry.record_order_failure(OrderFailure::Rejected);
        telemetry.record_order_failure(OrderFailure::Unreachable);
        telemetry.record_order_failure(OrderFailure::Unreachable);

        telemetry.flush().await;

        let lines = sink.lines();
        assert!(lines.contains(&"order,source=test,reason=rejected failures=1".to_string()));
        assert!(lines.contains(&"order,source=test,reason=unreachable failures=2".to_string()));
    }
}
