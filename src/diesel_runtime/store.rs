//! Diesel-backed implementations of the directory, message log and
//! diagnostic sink.

use chrono::Utc;
use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use uuid::Uuid;

use crate::diagnostics::{DiagnosticCategory, DiagnosticLog, TracingDiagnostics};
use crate::diesel_runtime::database::Database;
use crate::diesel_runtime::models::{BusinessRow, ErrorLogRow, MessageLogRow, TelecomNumberRow};
use crate::directory::{Business, PhoneNumberDirectory, TelecomNumber};
use crate::error::StoreError;
use crate::message_log::{LogResult, MessageLogStore, NewMessageLog};

/// Telecom number and business lookups.
#[derive(Clone)]
pub struct DieselDirectory {
    db: Database,
}

impl DieselDirectory {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

impl PhoneNumberDirectory for DieselDirectory {
    fn find_active_number(&self, number: &str) -> Result<Option<TelecomNumber>, StoreError> {
        use crate::diesel_runtime::schema::telecom_numbers::dsl::*;

        let mut conn = self.db.get_connection()?;
        let row = telecom_numbers
            .filter(phone_number.eq(number))
            .filter(status.eq(true))
            .select(TelecomNumberRow::as_select())
            .first(&mut conn)
            .optional()?;

        Ok(row.map(TelecomNumber::from))
    }

    fn find_business(&self, telecom_id: &str) -> Result<Option<Business>, StoreError> {
        use crate::diesel_runtime::schema::businesses::dsl::*;

        let mut conn = self.db.get_connection()?;
        let row = businesses
            .filter(telecom_number.eq(telecom_id))
            .select(BusinessRow::as_select())
            .first(&mut conn)
            .optional()?;

        Ok(row.map(Business::from))
    }
}

/// Appends message log entries to `message_logs`.
#[derive(Clone)]
pub struct DieselMessageLog {
    db: Database,
}

impl DieselMessageLog {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

impl MessageLogStore for DieselMessageLog {
    fn append(&self, entry: &NewMessageLog) -> Result<LogResult, StoreError> {
        use crate::diesel_runtime::schema::message_logs;

        let mut conn = self.db.get_connection()?;
        let log_name = format!("MSG-{}", Uuid::new_v4().simple());
        let row = MessageLogRow::from_entry(entry, log_name.clone(), Utc::now().naive_utc())?;

        let inserted = diesel::insert_into(message_logs::table)
            .values(&row)
            .execute(&mut conn);
        Ok(log_result(inserted, log_name, &entry.provider_message_id))
    }
}

/// Map an insert outcome to the store result reported to the handler.
///
/// Every diesel failure here is one the store can describe, so none of them
/// becomes an `Err`.
fn log_result(inserted: QueryResult<usize>, log_name: String, message_sid: &str) -> LogResult {
    match inserted {
        Ok(_) => {
            tracing::debug!("Inserted message log {} for MessageSid {}", log_name, message_sid);
            LogResult::ok(log_name)
        }
        Err(DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, info)) => {
            LogResult::failed(format!(
                "Message with MessageSid {} already logged: {}",
                message_sid,
                info.message()
            ))
        }
        Err(e) => LogResult::failed(e.to_string()),
    }
}

/// Persists diagnostics to `error_logs` in addition to emitting them through
/// `tracing`.
#[derive(Clone)]
pub struct DatabaseDiagnostics {
    db: Database,
}

impl DatabaseDiagnostics {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    fn persist(&self, message: &str, category: DiagnosticCategory) -> Result<(), StoreError> {
        use crate::diesel_runtime::schema::error_logs;

        let mut conn = self.db.get_connection()?;
        let row = ErrorLogRow {
            name: format!("ERR-{}", Uuid::new_v4().simple()),
            title: category.title().to_string(),
            message: message.to_string(),
            created_at: Utc::now().naive_utc(),
        };
        diesel::insert_into(error_logs::table)
            .values(&row)
            .execute(&mut conn)?;
        Ok(())
    }
}

impl DiagnosticLog for DatabaseDiagnostics {
    fn log(&self, message: &str, category: DiagnosticCategory) {
        TracingDiagnostics.log(message, category);

        if let Err(e) = self.persist(message, category) {
            tracing::error!(category = category.title(), "Failed to persist diagnostic: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message_log::{ExtraData, MessageDirection, MessageStatus};
    use std::time::Duration;

    fn unreachable_database() -> Database {
        Database::lazy("postgres://127.0.0.1:1/messaging", Duration::from_millis(200))
    }

    fn entry() -> NewMessageLog {
        NewMessageLog {
            business: "B1".to_string(),
            channel_number: "+1777".to_string(),
            phone_number: "+1555".to_string(),
            content: "[WhatsApp] hi".to_string(),
            actual_content: "hi".to_string(),
            status: MessageStatus::Received,
            direction: MessageDirection::Inbound,
            call_id: None,
            fail_reason: String::new(),
            provider_message_id: "SID1".to_string(),
            extra_data: ExtraData::new(),
        }
    }

    #[test]
    fn test_successful_insert_names_the_entry() {
        let result = log_result(Ok(1), "MSG-1".to_string(), "SID1");
        assert_eq!(result, LogResult::ok("MSG-1"));
    }

    #[test]
    fn test_duplicate_message_sid_is_a_failed_result() {
        let inserted = Err(DieselError::DatabaseError(
            DatabaseErrorKind::UniqueViolation,
            Box::new(String::from("duplicate key value violates unique constraint")),
        ));

        let result = log_result(inserted, "MSG-1".to_string(), "SID1");

        assert!(!result.success);
        assert_eq!(result.name, None);
        assert_eq!(
            result.error_message(),
            "Message with MessageSid SID1 already logged: duplicate key value violates unique constraint"
        );
    }

    #[test]
    fn test_other_database_errors_are_failed_results() {
        let inserted = Err(DieselError::DatabaseError(
            DatabaseErrorKind::NotNullViolation,
            Box::new(String::from("null value in column \"business\"")),
        ));
        let result = log_result(inserted, "MSG-1".to_string(), "SID1");
        assert!(!result.success);
        assert_eq!(result.error_message(), "null value in column \"business\"");

        let result = log_result(Err(DieselError::NotFound), "MSG-2".to_string(), "SID2");
        assert!(!result.success);
        assert_eq!(result.error.as_deref(), Some("Record not found"));
    }

    #[test]
    fn test_unreachable_pool_is_a_store_fault() {
        let store = DieselMessageLog::new(unreachable_database());

        let err = store.append(&entry()).unwrap_err();

        assert!(matches!(err, StoreError::Pool(_)));
    }

    #[test]
    fn test_unreachable_directory_is_a_store_fault() {
        let directory = DieselDirectory::new(unreachable_database());

        assert!(matches!(directory.find_active_number("+1777"), Err(StoreError::Pool(_))));
        assert!(matches!(directory.find_business("TEL-0001"), Err(StoreError::Pool(_))));
    }

    #[test]
    fn test_database_diagnostics_swallow_persist_failures() {
        let diagnostics = DatabaseDiagnostics::new(unreachable_database());

        assert!(diagnostics.persist("boom", DiagnosticCategory::InternalError).is_err());
        diagnostics.log("boom", DiagnosticCategory::InternalError);
    }
}
