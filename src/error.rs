//! Error types shared by the data-access layer and the webhook handler.

use std::fmt;

/// Failure talking to a directory or message-log backend.
///
/// A store that *reports* a failed write does so through
/// [`LogResult`](crate::message_log::LogResult); this type covers faults where
/// no answer could be obtained at all.
#[derive(Debug)]
pub enum StoreError {
    Database(diesel::result::Error),
    Pool(r2d2::Error),
    Serialization(serde_json::Error),
    Unavailable(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Database(e) => write!(f, "Database error: {}", e),
            StoreError::Pool(e) => write!(f, "Database pool error: {}", e),
            StoreError::Serialization(e) => write!(f, "Serialization error: {}", e),
            StoreError::Unavailable(msg) => write!(f, "Store unavailable: {}", msg),
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StoreError::Database(e) => Some(e),
            StoreError::Pool(e) => Some(e),
            StoreError::Serialization(e) => Some(e),
            StoreError::Unavailable(_) => None,
        }
    }
}

impl From<diesel::result::Error> for StoreError {
    fn from(e: diesel::result::Error) -> Self {
        StoreError::Database(e)
    }
}

impl From<r2d2::Error> for StoreError {
    fn from(e: r2d2::Error) -> Self {
        StoreError::Pool(e)
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::Serialization(e)
    }
}

/// Fault that aborts a webhook invocation.
///
/// Never leaves the handler: it is rendered as the internal-error
/// acknowledgement.
#[derive(Debug)]
pub enum HandlerError {
    Directory(StoreError),
    MessageLog(StoreError),
    Panic(String),
}

impl fmt::Display for HandlerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HandlerError::Directory(e) => write!(f, "Directory lookup failed: {}", e),
            HandlerError::MessageLog(e) => write!(f, "Message log write failed: {}", e),
            HandlerError::Panic(msg) => write!(f, "Handler panicked: {}", msg),
        }
    }
}

impl std::error::Error for HandlerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            HandlerError::Directory(e) | HandlerError::MessageLog(e) => Some(e),
            HandlerError::Panic(_) => None,
        }
    }
}
