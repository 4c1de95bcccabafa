//! Typed view of the gateway's form-encoded webhook payload.
//!
//! Parsing is split in two steps: [`InboundMessagePayload::from_form`] lifts
//! the raw field map into optional fields, and
//! [`InboundMessagePayload::validate`] fails closed when any mandatory field is
//! missing or empty.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// Raw form fields as delivered by the HTTP layer.
pub type FormFields = HashMap<String, String>;

pub const FIELD_FROM: &str = "From";
pub const FIELD_TO: &str = "To";
pub const FIELD_BODY: &str = "Body";
pub const FIELD_MESSAGE_SID: &str = "MessageSid";
pub const FIELD_PROFILE_NAME: &str = "ProfileName";
pub const FIELD_WA_ID: &str = "WaId";
pub const FIELD_MESSAGE_TYPE: &str = "MessageType";
pub const FIELD_NUM_MEDIA: &str = "NumMedia";

/// Media count reported when the gateway omits `NumMedia`.
pub const DEFAULT_NUM_MEDIA: &str = "0";

/// Error type for payload validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PayloadError {
    MissingFields(Vec<&'static str>),
}

impl fmt::Display for PayloadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PayloadError::MissingFields(fields) => {
                write!(f, "Missing or empty required fields: {}", fields.join(", "))
            }
        }
    }
}

impl std::error::Error for PayloadError {}

/// Every field the handler reads, before validation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InboundMessagePayload {
    pub from: Option<String>,
    pub to: Option<String>,
    pub body: Option<String>,
    pub message_sid: Option<String>,
    pub profile_name: Option<String>,
    pub wa_id: Option<String>,
    pub message_type: Option<String>,
    pub num_media: String,
}

impl InboundMessagePayload {
    pub fn from_form(form: &FormFields) -> Self {
        let field = |name: &str| form.get(name).cloned();

        Self {
            from: field(FIELD_FROM),
            to: field(FIELD_TO),
            body: field(FIELD_BODY),
            message_sid: field(FIELD_MESSAGE_SID),
            profile_name: field(FIELD_PROFILE_NAME),
            wa_id: field(FIELD_WA_ID),
            message_type: field(FIELD_MESSAGE_TYPE),
            num_media: field(FIELD_NUM_MEDIA).unwrap_or_else(|| DEFAULT_NUM_MEDIA.to_string()),
        }
    }

    /// Check the four mandatory fields and produce a [`ValidatedPayload`].
    ///
    /// Empty strings count as missing.
    pub fn validate(self) -> Result<ValidatedPayload, PayloadError> {
        let mut missing = Vec::new();
        for (name, value) in [
            (FIELD_FROM, &self.from),
            (FIELD_TO, &self.to),
            (FIELD_BODY, &self.body),
            (FIELD_MESSAGE_SID, &self.message_sid),
        ] {
            if !is_present(value) {
                missing.push(name);
            }
        }

        match (self.from, self.to, self.body, self.message_sid) {
            (Some(from), Some(to), Some(body), Some(message_sid)) if missing.is_empty() => {
                Ok(ValidatedPayload {
                    from,
                    to,
                    body,
                    message_sid,
                    profile_name: self.profile_name.filter(|name| !name.is_empty()),
                    wa_id: self.wa_id,
                    message_type: self.message_type,
                    num_media: self.num_media,
                })
            }
            _ => Err(PayloadError::MissingFields(missing)),
        }
    }
}

fn is_present(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|v| !v.is_empty())
}

/// Payload with all mandatory fields present and non-empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedPayload {
    pub from: String,
    pub to: String,
    pub body: String,
    pub message_sid: String,
    /// Sender display name; empty names are dropped during validation.
    pub profile_name: Option<String>,
    pub wa_id: Option<String>,
    pub message_type: Option<String>,
    pub num_media: String,
}

/// Render the raw form with sorted keys, for diagnostics.
pub fn describe_form(form: &FormFields) -> String {
    let sorted: BTreeMap<&str, &str> = form
        .iter()
        .map(|(k, v)| (k.as_str(), v.as_str()))
        .collect();
    format!("{:?}", sorted)
}
