//! Error types shared across the crate.
//!
//! Two layers: `ApiError` covers everything that can go wrong talking to the
//! remote assistant service, `ReviewError` is what an orchestration surfaces
//! to the host. Context-lookup failures never appear here; they degrade to
//! empty tool output inside the servicer (see `context::locator`).

use std::time::Duration;

use thiserror::Error;

/// Error type for the assistant service transport layer.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Authentication with the assistant service failed")]
    AuthFailed,

    #[error("Rate limited by the assistant service, retry after {retry_after:?}")]
    RateLimited { retry_after: Option<Duration> },

    #[error("Request to the assistant service failed: {reason}")]
    RequestFailed { reason: String },

    #[error("Invalid response from the assistant service: {reason}")]
    InvalidResponse { reason: String },

    #[error("Run still pending after {waited:?} (budget {budget:?})")]
    PollTimeout { waited: Duration, budget: Duration },
}

/// Error type surfaced by a review orchestration.
///
/// Transport failures and poll timeouts both collapse into
/// `ConnectionFailed`; the host renders it as a generic "service
/// unavailable" review message.
#[derive(Debug, Error)]
pub enum ReviewError {
    #[error("Connection to the assistant service failed: {0}")]
    ConnectionFailed(#[from] ApiError),
}
