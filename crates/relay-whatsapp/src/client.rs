//! WhatsApp Cloud API client

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, error, info};

use relay_core::WhatsAppConfig;

use crate::error::{Result, WhatsAppError};
use crate::message::OutboundMessage;

/// Something that can deliver one message to one recipient.
///
/// Exactly one provider call per invocation, no retry.
#[async_trait]
pub trait MessageSender: Send + Sync {
    async fn send(&self, to: &str, message: &OutboundMessage) -> Result<SendReceipt>;
}

/// Provider acknowledgement for an accepted message
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SendReceipt {
    /// `wamid` of the accepted message, when the provider returned one
    pub message_id: Option<String>,
}

/// Graph API client
#[derive(Debug, Clone)]
pub struct WhatsAppClient {
    client: Client,
    messages_url: String,
    media_url: String,
    access_token: String,
}

#[derive(Serialize)]
struct SendMessagePayload<'a> {
    messaging_product: &'static str,
    recipient_type: &'static str,
    to: &'a str,
    #[serde(flatten)]
    message: &'a OutboundMessage,
}

#[derive(Debug, Deserialize)]
struct SendMessageResponse {
    #[serde(default)]
    messages: Vec<MessageInfo>,
}

#[derive(Debug, Deserialize)]
struct MessageInfo {
    id: String,
}

#[derive(Debug, Deserialize)]
struct MediaUploadResponse {
    id: String,
}

impl WhatsAppClient {
    /// Create a client for the configured phone number
    pub fn new(config: &WhatsAppConfig) -> Self {
        Self {
            client: Client::new(),
            messages_url: config.messages_url(),
            media_url: config.media_url(),
            access_token: config.access_token.clone(),
        }
    }

    /// Endpoint messages are posted to
    pub fn messages_url(&self) -> &str {
        &self.messages_url
    }

    /// Send a message
    pub async fn send_message(&self, to: &str, message: &OutboundMessage) -> Result<SendReceipt> {
        info!("Sending WhatsApp {} message to {}", message.kind(), to);

        let payload = SendMessagePayload {
            messaging_product: "whatsapp",
            recipient_type: "individual",
            to,
            message,
        };

        let response = self
            .client
            .post(&self.messages_url)
            .bearer_auth(&self.access_token)
            .json(&payload)
            .send()
            .await
            .inspect_err(|e| error!("WhatsApp request to {} failed: {}", to, e))?;

        let parsed: SendMessageResponse = read_response(response).await?;
        let message_id = parsed.messages.into_iter().next().map(|m| m.id);
        debug!("WhatsApp accepted message to {}: {:?}", to, message_id);

        Ok(SendReceipt { message_id })
    }

    /// Upload a file to the media store and return its media id
    pub async fn upload_media(
        &self,
        data: Vec<u8>,
        mime_type: &str,
        filename: &str,
    ) -> Result<String> {
        info!(
            "Uploading {} ({}, {} bytes) to WhatsApp",
            filename,
            mime_type,
            data.len()
        );

        let part = Part::bytes(data)
            .file_name(filename.to_string())
            .mime_str(mime_type)
            .map_err(|e| WhatsAppError::InvalidPayload(format!("Invalid mime type: {}", e)))?;
        let form = Form::new()
            .text("messaging_product", "whatsapp")
            .text("type", mime_type.to_string())
            .part("file", part);

        let response = self
            .client
            .post(&self.media_url)
            .bearer_auth(&self.access_token)
            .multipart(form)
            .send()
            .await
            .inspect_err(|e| error!("WhatsApp media upload failed: {}", e))?;

        let uploaded: MediaUploadResponse = read_response(response).await?;
        debug!("WhatsApp stored {} as media {}", filename, uploaded.id);

        Ok(uploaded.id)
    }
}

/// Decode a 2xx body, or turn anything else into [`WhatsAppError::Api`]
/// carrying the provider body
async fn read_response<T: DeserializeOwned>(response: Response) -> Result<T> {
    let status = response.status();
    let text = response.text().await?;

    if !status.is_success() {
        let body = serde_json::from_str::<Value>(&text).unwrap_or(Value::String(text));
        error!("WhatsApp API error: {} - {}", status, body);
        return Err(WhatsAppError::Api {
            status: status.as_u16(),
            body,
        });
    }

    serde_json::from_str(&text)
        .map_err(|e| WhatsAppError::Http(format!("Unexpected response body: {}", e)))
}

#[async_trait]
impl MessageSender for WhatsAppClient {
    async fn send(&self, to: &str, message: &OutboundMessage) -> Result<SendReceipt> {
        self.send_message(to, message).await
    }
}
