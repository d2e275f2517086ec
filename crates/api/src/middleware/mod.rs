//! Request middleware: authentication extractors and request metrics.

pub mod auth;
pub mod metrics;

pub use auth::{BearerToken, OptionalIdentity, RequireAuth};
pub use metrics::track_requests;
