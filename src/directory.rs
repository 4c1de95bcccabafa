//! Phone number directory: which business owns a gateway number.

use serde::{Deserialize, Serialize};

use crate::error::StoreError;

/// A business-owned gateway number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TelecomNumber {
    /// Record identifier, referenced by [`Business::telecom_number`].
    pub id: String,
    pub phone_number: String,
    pub active: bool,
}

/// Account entity whose inbound messages are logged under its identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Business {
    pub id: String,
    pub business_name: Option<String>,
    pub telecom_number: Option<String>,
}

/// Read-only lookups used to route an inbound message.
pub trait PhoneNumberDirectory: Send + Sync {
    /// Find the active telecom record for a normalized phone number.
    fn find_active_number(&self, phone_number: &str) -> Result<Option<TelecomNumber>, StoreError>;

    /// Find the business linked to a telecom record.
    fn find_business(&self, telecom_id: &str) -> Result<Option<Business>, StoreError>;
}
