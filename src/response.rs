//! Webhook responses.
//!
//! The gateway integration expects a mix of TwiML-style markup and JSON
//! bodies depending on the outcome. Each outcome is a [`WebhookResponse`]
//! variant; [`WebhookResponse::body`] renders the wire shape. All outcomes are
//! answered with HTTP 200.

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};

use crate::message_log::LogResult;

pub const EMPTY_ACKNOWLEDGEMENT: &str = "<Response></Response>";

/// Outcome of one webhook invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookResponse {
    /// A mandatory field was missing or empty.
    IncompleteData,
    /// No active telecom record for the recipient number.
    TelecomNotFound,
    /// The telecom record has no linked business.
    BusinessNotFound,
    /// The message log store reported a failed write.
    LogFailed(LogResult),
    /// Message logged. Acknowledged without a reply.
    Received,
    /// Unhandled fault, described by the contained text.
    InternalError(String),
}

/// Explicit discriminant for [`WebhookResponse`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseKind {
    IncompleteData,
    TelecomNotFound,
    BusinessNotFound,
    LogFailed,
    Received,
    InternalError,
}

/// Rendered body of a webhook response.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseBody {
    Markup(String),
    Json(Value),
}

impl WebhookResponse {
    pub fn kind(&self) -> ResponseKind {
        match self {
            WebhookResponse::IncompleteData => ResponseKind::IncompleteData,
            WebhookResponse::TelecomNotFound => ResponseKind::TelecomNotFound,
            WebhookResponse::BusinessNotFound => ResponseKind::BusinessNotFound,
            WebhookResponse::LogFailed(_) => ResponseKind::LogFailed,
            WebhookResponse::Received => ResponseKind::Received,
            WebhookResponse::InternalError(_) => ResponseKind::InternalError,
        }
    }

    pub fn body(&self) -> ResponseBody {
        match self {
            WebhookResponse::IncompleteData => message_markup("Error: Incomplete Data"),
            WebhookResponse::TelecomNotFound => ResponseBody::Json(json!({
                "message": "No active telecom record found for this WhatsApp number"
            })),
            WebhookResponse::BusinessNotFound => {
                message_markup("Error: Business not found for this WhatsApp number.")
            }
            WebhookResponse::LogFailed(result) => ResponseBody::Json(json!({
                "success": false,
                "message": format!("Failed to log WhatsApp message: {}", result.error_message()),
                "err": result,
            })),
            WebhookResponse::Received => ResponseBody::Markup(EMPTY_ACKNOWLEDGEMENT.to_string()),
            WebhookResponse::InternalError(fault) => {
                message_markup(&format!("An internal server error occurred: {}", fault))
            }
        }
    }
}

fn message_markup(text: &str) -> ResponseBody {
    ResponseBody::Markup(format!(
        "<Response><Message>{}</Message></Response>",
        escape_markup(text)
    ))
}

fn escape_markup(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

impl IntoResponse for ResponseBody {
    fn into_response(self) -> Response {
        match self {
            ResponseBody::Markup(markup) => {
                (StatusCode::OK, [(header::CONTENT_TYPE, "text/xml")], markup).into_response()
            }
            ResponseBody::Json(value) => (StatusCode::OK, Json(value)).into_response(),
        }
    }
}

impl IntoResponse for WebhookResponse {
    fn into_response(self) -> Response {
        self.body().into_response()
    }
}
