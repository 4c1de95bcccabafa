//! Inbound WhatsApp webhook handler.
//!
//! Turns an untrusted form payload into a routed, persisted inbound message
//! log entry:
//!
//! 1. parse the form and fail closed on missing mandatory fields
//! 2. strip the transport scheme from `From`/`To`
//! 3. resolve the active telecom number, then the business that owns it
//! 4. append the message log entry and interpret the store's result
//!
//! Every path returns a [`WebhookResponse`]. Faults from the collaborators,
//! and panics, are caught in [`InboundMessageHandler::handle`] and answered
//! with the internal-error acknowledgement.

use std::any::Any;
use std::backtrace::Backtrace;
use std::cell::RefCell;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Once};

use serde_json::Value;

use crate::address::{AddressNormalizer, DEFAULT_SCHEME};
use crate::diagnostics::{DiagnosticCategory, DiagnosticLog};
use crate::directory::{Business, PhoneNumberDirectory};
use crate::error::HandlerError;
use crate::message_log::{ExtraData, MessageDirection, MessageLogStore, MessageStatus, NewMessageLog};
use crate::payload::{describe_form, FormFields, InboundMessagePayload, ValidatedPayload};
use crate::response::WebhookResponse;

/// Channel-specific settings for the handler.
#[derive(Debug, Clone)]
pub struct HandlerOptions {
    /// Transport scheme stripped from addresses (`whatsapp` in `whatsapp:+44...`).
    pub address_scheme: String,
    /// Label used in the display-content tag, e.g. `[WhatsApp from Ann]`.
    pub channel_label: String,
    /// Value stored as `message_type` in the entry's extra data.
    pub message_type: String,
}

impl Default for HandlerOptions {
    fn default() -> Self {
        Self {
            address_scheme: DEFAULT_SCHEME.to_string(),
            channel_label: "WhatsApp".to_string(),
            message_type: "whatsapp".to_string(),
        }
    }
}

pub struct InboundMessageHandler {
    directory: Arc<dyn PhoneNumberDirectory>,
    store: Arc<dyn MessageLogStore>,
    diagnostics: Arc<dyn DiagnosticLog>,
    normalizer: AddressNormalizer,
    options: HandlerOptions,
}

impl InboundMessageHandler {
    pub fn new(
        directory: Arc<dyn PhoneNumberDirectory>,
        store: Arc<dyn MessageLogStore>,
        diagnostics: Arc<dyn DiagnosticLog>,
    ) -> Self {
        Self::with_options(directory, store, diagnostics, HandlerOptions::default())
    }

    pub fn with_options(
        directory: Arc<dyn PhoneNumberDirectory>,
        store: Arc<dyn MessageLogStore>,
        diagnostics: Arc<dyn DiagnosticLog>,
        options: HandlerOptions,
    ) -> Self {
        Self {
            directory,
            store,
            diagnostics,
            normalizer: AddressNormalizer::new(&options.address_scheme),
            options,
        }
    }

    /// Process one webhook invocation. Never fails and never panics.
    pub fn handle(&self, form: &FormFields) -> WebhookResponse {
        install_panic_hook();
        take_panic_trace();

        match panic::catch_unwind(AssertUnwindSafe(|| self.process(form))) {
            Ok(Ok(response)) => response,
            Ok(Err(fault)) => self.fault_response(&fault, form),
            Err(payload) => {
                let fault = HandlerError::Panic(panic_message(payload.as_ref()));
                self.log_fault(&fault, take_panic_trace().as_deref(), form);
                WebhookResponse::InternalError(fault.to_string())
            }
        }
    }

    /// Log an unhandled fault and build the internal-error acknowledgement.
    pub fn fault_response(&self, fault: &HandlerError, form: &FormFields) -> WebhookResponse {
        self.log_fault(fault, None, form);
        WebhookResponse::InternalError(fault.to_string())
    }

    fn log_fault(&self, fault: &HandlerError, panic_trace: Option<&str>, form: &FormFields) {
        let mut message = error_trace(fault);
        if let Some(trace) = panic_trace {
            message.push('\n');
            message.push_str(trace);
        }
        message.push_str(&format!("\nPayload: {}", describe_form(form)));
        self.diagnostics.log(&message, DiagnosticCategory::InternalError);
    }

    fn process(&self, form: &FormFields) -> Result<WebhookResponse, HandlerError> {
        let payload = match InboundMessagePayload::from_form(form).validate() {
            Ok(payload) => payload,
            Err(e) => {
                self.diagnostics.log(
                    &format!(
                        "Incomplete Twilio WhatsApp webhook payload received ({}): {}",
                        e,
                        describe_form(form)
                    ),
                    DiagnosticCategory::IncompleteData,
                );
                return Ok(WebhookResponse::IncompleteData);
            }
        };

        let to_number = self.normalizer.normalize(&payload.to);
        let from_number = self.normalizer.normalize(&payload.from);

        self.diagnostics.log(
            &format!(
                "WhatsApp Message Received: From={}, To={}, ProfileName={}, WaId={}, Body={}",
                from_number,
                to_number,
                payload.profile_name.as_deref().unwrap_or(""),
                payload.wa_id.as_deref().unwrap_or(""),
                payload.body
            ),
            DiagnosticCategory::MessageReceived,
        );

        let telecom = self
            .directory
            .find_active_number(&to_number)
            .map_err(HandlerError::Directory)?;
        let Some(telecom) = telecom else {
            self.diagnostics.log(
                &format!("No active telecom record found for WhatsApp number: {}", to_number),
                DiagnosticCategory::TelecomNotFound,
            );
            return Ok(WebhookResponse::TelecomNotFound);
        };

        let business = self
            .directory
            .find_business(&telecom.id)
            .map_err(HandlerError::Directory)?;
        let Some(business) = business else {
            self.diagnostics.log(
                &format!(
                    "Incoming WhatsApp to {}: No Business found configured for this Twilio WhatsApp number. Payload: {}",
                    to_number,
                    describe_form(form)
                ),
                DiagnosticCategory::BusinessNotFound,
            );
            return Ok(WebhookResponse::BusinessNotFound);
        };

        let entry = self.build_entry(&payload, &business, from_number, to_number);
        let result = self.store.append(&entry).map_err(HandlerError::MessageLog)?;

        if !result.success {
            self.diagnostics.log(
                &format!(
                    "Failed to log incoming WhatsApp message from {} to {}: {}",
                    entry.phone_number,
                    entry.channel_number,
                    result.error_message()
                ),
                DiagnosticCategory::LoggingFailed,
            );
            return Ok(WebhookResponse::LogFailed(result));
        }

        let sender = match &payload.profile_name {
            Some(name) => format!("{} ({})", name, entry.phone_number),
            None => entry.phone_number.clone(),
        };
        self.diagnostics.log(
            &format!(
                "Successfully logged WhatsApp message from {} to business {}",
                sender, business.id
            ),
            DiagnosticCategory::MessageLogged,
        );

        Ok(WebhookResponse::Received)
    }

    fn build_entry(
        &self,
        payload: &ValidatedPayload,
        business: &Business,
        from_number: String,
        to_number: String,
    ) -> NewMessageLog {
        let mut extra_data = ExtraData::new();
        extra_data.insert("message_type".to_string(), Value::from(self.options.message_type.as_str()));
        extra_data.insert("profile_name".to_string(), optional_value(&payload.profile_name));
        extra_data.insert("wa_id".to_string(), optional_value(&payload.wa_id));
        extra_data.insert("num_media".to_string(), Value::from(payload.num_media.as_str()));
        extra_data.insert("original_from".to_string(), Value::from(payload.from.as_str()));
        extra_data.insert("original_to".to_string(), Value::from(payload.to.as_str()));
        if let Some(gateway_type) = &payload.message_type {
            extra_data.insert("gateway_message_type".to_string(), Value::from(gateway_type.as_str()));
        }

        NewMessageLog {
            business: business.id.clone(),
            channel_number: to_number,
            phone_number: from_number,
            content: compose_content(&self.options.channel_label, payload.profile_name.as_deref(), &payload.body),
            actual_content: payload.body.clone(),
            status: MessageStatus::Received,
            direction: MessageDirection::Inbound,
            call_id: None,
            fail_reason: String::new(),
            provider_message_id: payload.message_sid.clone(),
            extra_data,
        }
    }
}

/// Prefix a message body with the channel tag, naming the sender when known.
pub fn compose_content(channel_label: &str, profile_name: Option<&str>, body: &str) -> String {
    match profile_name.filter(|name| !name.is_empty()) {
        Some(name) => format!("[{} from {}] {}", channel_label, name, body),
        None => format!("[{}] {}", channel_label, body),
    }
}

fn optional_value(value: &Option<String>) -> Value {
    value.as_deref().map(Value::from).unwrap_or(Value::Null)
}

thread_local! {
    static PANIC_TRACE: RefCell<Option<String>> = const { RefCell::new(None) };
}

static PANIC_HOOK: Once = Once::new();

/// Record where a panic happened, and its backtrace, for the thread that
/// catches it. The previously installed hook still runs.
fn install_panic_hook() {
    PANIC_HOOK.call_once(|| {
        let previous = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            let location = info
                .location()
                .map(|l| format!("{}:{}:{}", l.file(), l.line(), l.column()))
                .unwrap_or_else(|| "unknown location".to_string());
            let trace = format!("panicked at {}\n{}", location, Backtrace::force_capture());
            PANIC_TRACE.with(|slot| *slot.borrow_mut() = Some(trace));
            previous(info);
        }));
    });
}

fn take_panic_trace() -> Option<String> {
    PANIC_TRACE.with(|slot| slot.borrow_mut().take())
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

/// Render an error and its chain of sources, one cause per line.
fn error_trace(err: &dyn std::error::Error) -> String {
    let mut trace = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        trace.push_str(&format!("\n  caused by: {}", cause));
        source = cause.source();
    }
    trace
}
