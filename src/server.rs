//! Axum HTTP surface for the webhook.

use axum::{
    extract::{rejection::FormRejection, State},
    http::StatusCode,
    routing::{get, post},
    Form, Json, Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;

use crate::config::ServiceConfig;
use crate::diagnostics::{DiagnosticLog, TracingDiagnostics};
use crate::diesel_runtime::{Database, DatabaseDiagnostics, DieselDirectory, DieselMessageLog};
use crate::error::HandlerError;
use crate::handler::InboundMessageHandler;
use crate::payload::FormFields;
use crate::response::WebhookResponse;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub handler: Arc<InboundMessageHandler>,
    /// Checked by `/ready`. `None` when the handler runs without a database.
    pub database: Option<Database>,
}

impl AppState {
    pub fn new(handler: InboundMessageHandler) -> Self {
        Self {
            handler: Arc::new(handler),
            database: None,
        }
    }

    /// Wire the handler to diesel-backed collaborators.
    pub fn from_database(config: &ServiceConfig, database: Database) -> Self {
        let diagnostics: Arc<dyn DiagnosticLog> = if config.diagnostics.persist {
            Arc::new(DatabaseDiagnostics::new(database.clone()))
        } else {
            Arc::new(TracingDiagnostics)
        };

        let handler = InboundMessageHandler::with_options(
            Arc::new(DieselDirectory::new(database.clone())),
            Arc::new(DieselMessageLog::new(database.clone())),
            diagnostics,
            config.handler_options(),
        );

        Self {
            handler: Arc::new(handler),
            database: Some(database),
        }
    }
}

pub fn router(state: AppState, webhook_path: &str) -> Router {
    Router::new()
        .route(webhook_path, post(whatsapp_webhook))
        .route("/health", get(health_check))
        .route("/ready", get(readiness_check))
        .layer(CorsLayer::permissive())
        .with_state(Arc::new(state))
}

/// Inbound WhatsApp webhook (form-encoded POST from the gateway).
///
/// An unreadable body is treated as an empty form, so it is answered with
/// the incomplete-data acknowledgement rather than an extractor rejection.
async fn whatsapp_webhook(
    State(state): State<Arc<AppState>>,
    form: Result<Form<FormFields>, FormRejection>,
) -> WebhookResponse {
    let fields = match form {
        Ok(Form(fields)) => fields,
        Err(rejection) => {
            tracing::warn!("Unreadable webhook body: {}", rejection);
            FormFields::new()
        }
    };

    // Directory and store calls block on the database
    let handler = Arc::clone(&state.handler);
    let task_fields = fields.clone();
    match tokio::task::spawn_blocking(move || handler.handle(&task_fields)).await {
        Ok(response) => response,
        Err(e) => state
            .handler
            .fault_response(&HandlerError::Panic(e.to_string()), &fields),
    }
}

/// Health check endpoint (liveness)
async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "whatsapp-inbound",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Readiness check endpoint - verifies the database pool
async fn readiness_check(
    State(state): State<Arc<AppState>>,
) -> Result<Json<serde_json::Value>, StatusCode> {
    let Some(database) = state.database.clone() else {
        return Ok(Json(serde_json::json!({
            "status": "ready",
            "service": "whatsapp-inbound",
            "database": "not configured"
        })));
    };

    match tokio::task::spawn_blocking(move || database.test_connection()).await {
        Ok(Ok(())) => Ok(Json(serde_json::json!({
            "status": "ready",
            "service": "whatsapp-inbound",
            "database": "connected"
        }))),
        Ok(Err(e)) => {
            tracing::warn!("Readiness check failed: {}", e);
            Err(StatusCode::SERVICE_UNAVAILABLE)
        }
        Err(e) => {
            tracing::error!("Readiness check task failed: {}", e);
            Err(StatusCode::SERVICE_UNAVAILABLE)
        }
    }
}
