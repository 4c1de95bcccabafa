//! In-memory collaborators shared by the integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use whatsapp_inbound::{
    Business, DiagnosticCategory, DiagnosticLog, FormFields, HandlerOptions, InboundMessageHandler,
    LogResult, MessageLogStore, NewMessageLog, PhoneNumberDirectory, StoreError, TelecomNumber,
};

#[derive(Default)]
pub struct FakeDirectory {
    numbers: Vec<TelecomNumber>,
    businesses: Vec<Business>,
    unavailable: Option<String>,
    pub number_lookups: AtomicUsize,
    pub business_lookups: AtomicUsize,
}

impl FakeDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_number(mut self, id: &str, phone_number: &str, active: bool) -> Self {
        self.numbers.push(TelecomNumber {
            id: id.to_string(),
            phone_number: phone_number.to_string(),
            active,
        });
        self
    }

    pub fn with_business(mut self, id: &str, telecom_id: &str) -> Self {
        self.businesses.push(Business {
            id: id.to_string(),
            business_name: None,
            telecom_number: Some(telecom_id.to_string()),
        });
        self
    }

    pub fn unavailable(mut self, reason: &str) -> Self {
        self.unavailable = Some(reason.to_string());
        self
    }

    pub fn number_lookups(&self) -> usize {
        self.number_lookups.load(Ordering::SeqCst)
    }

    pub fn business_lookups(&self) -> usize {
        self.business_lookups.load(Ordering::SeqCst)
    }
}

impl PhoneNumberDirectory for FakeDirectory {
    fn find_active_number(&self, phone_number: &str) -> Result<Option<TelecomNumber>, StoreError> {
        self.number_lookups.fetch_add(1, Ordering::SeqCst);
        if let Some(reason) = &self.unavailable {
            return Err(StoreError::Unavailable(reason.clone()));
        }
        Ok(self
            .numbers
            .iter()
            .find(|n| n.phone_number == phone_number && n.active)
            .cloned())
    }

    fn find_business(&self, telecom_id: &str) -> Result<Option<Business>, StoreError> {
        self.business_lookups.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .businesses
            .iter()
            .find(|b| b.telecom_number.as_deref() == Some(telecom_id))
            .cloned())
    }
}

pub enum StoreBehavior {
    Accept,
    Reject(String),
    Unreachable(String),
    Panic,
}

pub struct FakeMessageLog {
    behavior: StoreBehavior,
    entries: Mutex<Vec<NewMessageLog>>,
}

impl FakeMessageLog {
    pub fn new(behavior: StoreBehavior) -> Self {
        Self {
            behavior,
            entries: Mutex::new(Vec::new()),
        }
    }

    pub fn entries(&self) -> Vec<NewMessageLog> {
        self.entries.lock().unwrap().clone()
    }
}

impl MessageLogStore for FakeMessageLog {
    fn append(&self, entry: &NewMessageLog) -> Result<LogResult, StoreError> {
        match &self.behavior {
            StoreBehavior::Accept => {
                let mut entries = self.entries.lock().unwrap();
                entries.push(entry.clone());
                Ok(LogResult::ok(format!("MSG-{:04}", entries.len())))
            }
            StoreBehavior::Reject(error) => Ok(LogResult::failed(error.clone())),
            StoreBehavior::Unreachable(reason) => Err(StoreError::Unavailable(reason.clone())),
            StoreBehavior::Panic => panic!("message log store exploded"),
        }
    }
}

#[derive(Default)]
pub struct RecordingDiagnostics {
    entries: Mutex<Vec<(DiagnosticCategory, String)>>,
}

impl RecordingDiagnostics {
    pub fn categories(&self) -> Vec<DiagnosticCategory> {
        self.entries.lock().unwrap().iter().map(|(c, _)| *c).collect()
    }

    pub fn messages_for(&self, category: DiagnosticCategory) -> Vec<String> {
        self.entries
            .lock()
            .unwrap()
            .iter()
            .filter(|(c, _)| *c == category)
            .map(|(_, m)| m.clone())
            .collect()
    }
}

impl DiagnosticLog for RecordingDiagnostics {
    fn log(&self, message: &str, category: DiagnosticCategory) {
        self.entries.lock().unwrap().push((category, message.to_string()));
    }
}

pub struct Fixture {
    pub directory: Arc<FakeDirectory>,
    pub store: Arc<FakeMessageLog>,
    pub diagnostics: Arc<RecordingDiagnostics>,
    pub handler: InboundMessageHandler,
}

impl Fixture {
    pub fn new(directory: FakeDirectory, behavior: StoreBehavior) -> Self {
        Self::with_options(directory, behavior, HandlerOptions::default())
    }

    pub fn with_options(directory: FakeDirectory, behavior: StoreBehavior, options: HandlerOptions) -> Self {
        let directory = Arc::new(directory);
        let store = Arc::new(FakeMessageLog::new(behavior));
        let diagnostics = Arc::new(RecordingDiagnostics::default());
        let handler = InboundMessageHandler::with_options(
            directory.clone(),
            store.clone(),
            diagnostics.clone(),
            options,
        );

        Self {
            directory,
            store,
            diagnostics,
            handler,
        }
    }
}

/// Directory with `+1777` active and owned by business `B1`.
pub fn routed_directory() -> FakeDirectory {
    FakeDirectory::new()
        .with_number("TEL-0001", "+1777", true)
        .with_business("B1", "TEL-0001")
}

pub fn form(pairs: &[(&str, &str)]) -> FormFields {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

/// The Ann-to-`+1777` payload used across scenarios.
pub fn ann_form() -> FormFields {
    form(&[
        ("From", "whatsapp:+1555"),
        ("To", "whatsapp:+1777"),
        ("Body", "hi"),
        ("MessageSid", "SID1"),
        ("ProfileName", "Ann"),
    ])
}
