//! Delivery error types.

use std::time::Duration;

use thiserror::Error;

/// Errors raised while delivering a message.
///
/// These never leave the dispatcher; they are logged and counted there.
#[derive(Debug, Error)]
pub enum DeliveryError {
    /// The HTTP request could not be made.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The messaging API answered with a non-success status.
    #[error("Rejected with status {status}: {body}")]
    Rejected { status: u16, body: String },

    /// The send did not finish in time and was abandoned.
    #[error("Timed out after {0:?}")]
    Timeout(Duration),

    /// The transport is not usable with the given settings.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The recipient could not be resolved.
    #[error("Directory error: {0}")]
    Directory(String),

    /// A test transport was told to fail.
    #[error("Transport failure: {0}")]
    Transport(String),
}
