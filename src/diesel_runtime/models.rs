//! Diesel row types for the messaging tables

use chrono::NaiveDateTime;
use diesel::prelude::*;

use crate::diesel_runtime::schema::*;
use crate::directory::{Business, TelecomNumber};
use crate::message_log::NewMessageLog;

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = telecom_numbers)]
pub struct TelecomNumberRow {
    pub name: String,
    pub phone_number: String,
    pub status: bool,
}

impl From<TelecomNumberRow> for TelecomNumber {
    fn from(row: TelecomNumberRow) -> Self {
        TelecomNumber {
            id: row.name,
            phone_number: row.phone_number,
            active: row.status,
        }
    }
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = businesses)]
pub struct BusinessRow {
    pub name: String,
    pub business_name: Option<String>,
    pub telecom_number: Option<String>,
}

impl From<BusinessRow> for Business {
    fn from(row: BusinessRow) -> Self {
        Business {
            id: row.name,
            business_name: row.business_name,
            telecom_number: row.telecom_number,
        }
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = message_logs)]
pub struct MessageLogRow {
    pub name: String,
    pub business: String,
    pub twilio_phone_number: String,
    pub phone_number: String,
    pub sms_content: String,
    pub actual_content: String,
    pub status: String,
    pub direction: String,
    pub call_id: Option<String>,
    pub fail_reason: String,
    pub twilio_message_sid: String,
    pub extra_data: String,
    pub created_at: NaiveDateTime,
}

impl MessageLogRow {
    /// Build the row for `entry`; extra data is stored as a JSON string.
    pub fn from_entry(
        entry: &NewMessageLog,
        name: String,
        created_at: NaiveDateTime,
    ) -> Result<Self, serde_json::Error> {
        Ok(MessageLogRow {
            name,
            business: entry.business.clone(),
            twilio_phone_number: entry.channel_number.clone(),
            phone_number: entry.phone_number.clone(),
            sms_content: entry.content.clone(),
            actual_content: entry.actual_content.clone(),
            status: entry.status.to_string(),
            direction: entry.direction.to_string(),
            call_id: entry.call_id.clone(),
            fail_reason: entry.fail_reason.clone(),
            twilio_message_sid: entry.provider_message_id.clone(),
            extra_data: serde_json::to_string(&entry.extra_data)?,
            created_at,
        })
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = error_logs)]
pub struct ErrorLogRow {
    pub name: String,
    pub title: String,
    pub message: String,
    pub created_at: NaiveDateTime,
}
