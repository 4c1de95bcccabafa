//! Diagnostic sink for webhook processing.
//!
//! Every branch of the webhook handler writes one diagnostic before it
//! returns. The gateway does not surface our responses to anyone, so these
//! entries are the only trail operators have.

use std::fmt;

/// What a diagnostic entry is about. Each category has a stable title used
/// when entries are persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticCategory {
    IncompleteData,
    MessageReceived,
    TelecomNotFound,
    BusinessNotFound,
    LoggingFailed,
    MessageLogged,
    InternalError,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl DiagnosticCategory {
    pub fn title(&self) -> &'static str {
        match self {
            DiagnosticCategory::IncompleteData => "Twilio WhatsApp Webhook Error - Incomplete Data",
            DiagnosticCategory::MessageReceived => "WhatsApp Message Log",
            DiagnosticCategory::TelecomNotFound => "WhatsApp Webhook - Telecom Not Found",
            DiagnosticCategory::BusinessNotFound => "Twilio WhatsApp Webhook - Business Not Found",
            DiagnosticCategory::LoggingFailed => "WhatsApp Webhook - Logging Failed",
            DiagnosticCategory::MessageLogged => "WhatsApp Message Success Log",
            DiagnosticCategory::InternalError => "General Twilio WhatsApp Webhook Error",
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            DiagnosticCategory::MessageReceived | DiagnosticCategory::MessageLogged => Severity::Info,
            DiagnosticCategory::TelecomNotFound => Severity::Warning,
            DiagnosticCategory::IncompleteData
            | DiagnosticCategory::BusinessNotFound
            | DiagnosticCategory::LoggingFailed
            | DiagnosticCategory::InternalError => Severity::Error,
        }
    }
}

impl fmt::Display for DiagnosticCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

/// Fire-and-forget diagnostic log. Implementations must not fail or panic.
pub trait DiagnosticLog: Send + Sync {
    fn log(&self, message: &str, category: DiagnosticCategory);
}

/// Emits diagnostics as `tracing` events.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingDiagnostics;

impl DiagnosticLog for TracingDiagnostics {
    fn log(&self, message: &str, category: DiagnosticCategory) {
        let title = category.title();
        match category.severity() {
            Severity::Info => tracing::info!(category = title, "{}", message),
            Severity::Warning => tracing::warn!(category = title, "{}", message),
            Severity::Error => tracing::error!(category = title, "{}", message),
        }
    }
}
