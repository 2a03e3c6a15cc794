//! Webhook endpoint for the WhatsApp Cloud API
//!
//! `GET /webhook` answers the subscription challenge, `POST /webhook`
//! ingests message events. A reply is only acted on when its sender is on
//! the allow-list; accepted replies are recorded and acknowledged.

use std::sync::Arc;

use axum::{
    Json, Router,
    body::Bytes,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{debug, error, info, warn};

use relay_core::{AllowList, ReplyStore, WhatsAppConfig, normalize};

use crate::client::MessageSender;
use crate::error::{Result, WhatsAppError};
use crate::message::OutboundMessage;
use crate::payload::{BUSINESS_ACCOUNT_OBJECT, WebhookEnvelope};

/// `hub.mode` value of a subscription request
pub const SUBSCRIBE_MODE: &str = "subscribe";

/// Webhook state
#[derive(Clone)]
pub struct WebhookState {
    pub sender: Arc<dyn MessageSender>,
    pub allow_list: AllowList,
    pub replies: ReplyStore,
    pub config: Arc<WhatsAppConfig>,
}

/// Subscription challenge parameters
#[derive(Debug, Default, Deserialize)]
pub struct VerifyQuery {
    #[serde(rename = "hub.mode")]
    pub mode: Option<String>,
    #[serde(rename = "hub.verify_token")]
    pub verify_token: Option<String>,
    #[serde(rename = "hub.challenge")]
    pub challenge: Option<String>,
}

/// Per-batch counters, for logs and tests
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct IngestReport {
    pub received: usize,
    pub recorded: usize,
    pub blocked: usize,
    pub without_reply: usize,
    pub ack_failures: usize,
}

/// Return the challenge when mode and token match. An unset expected
/// token never matches.
pub fn verify_subscription<'a>(query: &'a VerifyQuery, expected_token: &str) -> Option<&'a str> {
    let mode_ok = query.mode.as_deref() == Some(SUBSCRIBE_MODE);
    let token_ok =
        !expected_token.is_empty() && query.verify_token.as_deref() == Some(expected_token);

    (mode_ok && token_ok).then(|| query.challenge.as_deref().unwrap_or_default())
}

impl WebhookState {
    /// Process every message of a conversational event.
    ///
    /// Failed acknowledgements are logged and counted; they never fail the
    /// batch.
    pub async fn ingest(&self, envelope: &WebhookEnvelope) -> IngestReport {
        let mut report = IngestReport::default();

        for message in envelope.messages() {
            report.received += 1;
            let from = normalize(&message.from);

            let Some(reply) = message.reply() else {
                debug!("Message from {} carries no reply content", from);
                report.without_reply += 1;
                continue;
            };
            let content = reply.content();
            info!("Incoming reply from {}: {}", from, content);

            if !self.allow_list.contains(&from).await {
                warn!("Auto-reply blocked for {}", from);
                report.blocked += 1;
                continue;
            }

            self.replies.record(&from, content).await;
            report.recorded += 1;

            let ack = OutboundMessage::text(self.config.ack_message(content));
            if let Err(e) = self.sender.send(&from, &ack).await {
                error!("Failed to acknowledge reply from {}: {}", from, e);
                report.ack_failures += 1;
            }
        }

        report
    }

    /// Parse a raw notification body and ingest it.
    ///
    /// `Ok(None)` means the event was not conversational and was ignored.
    pub async fn handle_event(&self, body: &[u8]) -> Result<Option<IngestReport>> {
        let value: Value = if body.iter().all(u8::is_ascii_whitespace) {
            json!({})
        } else {
            serde_json::from_slice(body).map_err(|e| WhatsAppError::InvalidPayload(e.to_string()))?
        };

        if value.get("object").and_then(Value::as_str) != Some(BUSINESS_ACCOUNT_OBJECT) {
            return Ok(None);
        }

        let envelope: WebhookEnvelope = serde_json::from_value(value)
            .map_err(|e| WhatsAppError::InvalidPayload(e.to_string()))?;

        Ok(Some(self.ingest(&envelope).await))
    }
}

/// Create webhook router
pub fn create_webhook_router(state: WebhookState) -> Router {
    Router::new()
        .route("/webhook", get(verify_webhook).post(receive_webhook))
        .with_state(Arc::new(state))
}

/// Handle the subscription challenge
async fn verify_webhook(
    State(state): State<Arc<WebhookState>>,
    Query(query): Query<VerifyQuery>,
) -> Response {
    match verify_subscription(&query, &state.config.verify_token) {
        Some(challenge) => {
            info!("WhatsApp webhook verified");
            (StatusCode::OK, challenge.to_string()).into_response()
        }
        None => {
            warn!("WhatsApp webhook verification failed");
            StatusCode::FORBIDDEN.into_response()
        }
    }
}

/// Handle incoming event notifications
async fn receive_webhook(State(state): State<Arc<WebhookState>>, body: Bytes) -> Response {
    match state.handle_event(&body).await {
        Ok(Some(report)) => {
            debug!("Webhook batch processed: {:?}", report);
            Json(json!({"status": "EVENT_RECEIVED"})).into_response()
        }
        Ok(None) => Json(json!({"status": "IGNORED"})).into_response(),
        Err(e) => {
            error!("Webhook error: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
