//! Message log records and the store that persists them.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use crate::error::StoreError;

/// Delivery status of a logged message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MessageStatus {
    Queued,
    Sent,
    Delivered,
    Received,
    Failed,
}

impl MessageStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageStatus::Queued => "Queued",
            MessageStatus::Sent => "Sent",
            MessageStatus::Delivered => "Delivered",
            MessageStatus::Received => "Received",
            MessageStatus::Failed => "Failed",
        }
    }
}

impl fmt::Display for MessageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MessageDirection {
    Inbound,
    Outbound,
}

impl MessageDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageDirection::Inbound => "INBOUND",
            MessageDirection::Outbound => "OUTBOUND",
        }
    }
}

impl fmt::Display for MessageDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Channel-specific metadata attached to a log entry.
///
/// Keys keep insertion order so the stored JSON reads the same way it was
/// built.
pub type ExtraData = IndexMap<String, Value>;

/// A message log entry to be appended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewMessageLog {
    pub business: String,
    /// Gateway number owned by the business.
    pub channel_number: String,
    /// The external party's number.
    pub phone_number: String,
    /// Display content, prefixed with the channel tag.
    pub content: String,
    /// Message body exactly as received.
    pub actual_content: String,
    pub status: MessageStatus,
    pub direction: MessageDirection,
    pub call_id: Option<String>,
    pub fail_reason: String,
    pub provider_message_id: String,
    pub extra_data: ExtraData,
}

/// Outcome reported by a [`MessageLogStore`].
///
/// Serialized verbatim into the persistence-failure response, so field names
/// are part of the webhook contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogResult {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl LogResult {
    pub fn ok(name: impl Into<String>) -> Self {
        Self {
            success: true,
            name: Some(name.into()),
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            name: None,
            error: Some(error.into()),
        }
    }

    /// Error text, or `"Unknown error"` when the store gave none.
    pub fn error_message(&self) -> &str {
        self.error.as_deref().unwrap_or("Unknown error")
    }
}

/// Persists message log entries, keyed by provider message id.
///
/// Write failures the store can describe come back as
/// `Ok(LogResult { success: false, .. })`; `Err` is reserved for faults where
/// the store could not be reached.
pub trait MessageLogStore: Send + Sync {
    fn append(&self, entry: &NewMessageLog) -> Result<LogResult, StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_status_serializes_as_stored_text() {
        assert_eq!(serde_json::to_value(MessageStatus::Received).unwrap(), json!("Received"));
        assert_eq!(MessageStatus::Received.to_string(), MessageStatus::Received.as_str());
    }

    #[test]
    fn test_direction_serializes_uppercase() {
        assert_eq!(serde_json::to_value(MessageDirection::Inbound).unwrap(), json!("INBOUND"));
        assert_eq!(MessageDirection::Outbound.to_string(), "OUTBOUND");
    }

    #[test]
    fn test_log_result_serialization_skips_empty_fields() {
        let failed = LogResult::failed("duplicate MessageSid");
        assert_eq!(
            serde_json::to_value(&failed).unwrap(),
            json!({"success": false, "error": "duplicate MessageSid"})
        );

        let ok = LogResult::ok("MSG-0001");
        assert_eq!(
            serde_json::to_value(&ok).unwrap(),
            json!({"success": true, "name": "MSG-0001"})
        );
    }

    #[test]
    fn test_error_message_fallback() {
        let result = LogResult {
            success: false,
            name: None,
            error: None,
        };
        assert_eq!(result.error_message(), "Unknown error");
    }
}
