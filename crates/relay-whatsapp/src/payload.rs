//! Inbound webhook payload model
//!
//! Only the fields the relay acts on are modelled; everything else the
//! provider sends is ignored. Missing or `null` collections are read as empty,
//! and string leaves of any other JSON type are read as empty strings.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// `object` value of conversational events
pub const BUSINESS_ACCOUNT_OBJECT: &str = "whatsapp_business_account";

fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn string_or_empty<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        _ => Ok(String::new()),
    }
}

/// Top-level webhook notification
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WebhookEnvelope {
    #[serde(default, deserialize_with = "null_as_default")]
    pub object: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub entry: Vec<WebhookEntry>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WebhookEntry {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub changes: Vec<WebhookChange>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WebhookChange {
    #[serde(default)]
    pub field: Option<String>,
    #[serde(default)]
    pub value: Option<WebhookValue>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WebhookValue {
    #[serde(default, deserialize_with = "null_as_default")]
    pub messages: Vec<WebhookMessage>,
}

/// One inbound user message
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WebhookMessage {
    /// Sender as reported by the provider (not normalized)
    #[serde(default, deserialize_with = "string_or_empty")]
    pub from: String,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub text: Option<TextContent>,
    #[serde(default)]
    pub button: Option<ButtonContent>,
    #[serde(default)]
    pub interactive: Option<InteractiveContent>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TextContent {
    #[serde(default, deserialize_with = "string_or_empty")]
    pub body: String,
}

/// Quick-reply button tapped on a template
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ButtonContent {
    #[serde(default, deserialize_with = "string_or_empty")]
    pub payload: String,
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct InteractiveContent {
    #[serde(default)]
    pub button_reply: Option<ButtonReply>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ButtonReply {
    #[serde(default, deserialize_with = "string_or_empty")]
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
}

/// Reply content extracted from an inbound message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundReply {
    /// Free text typed by the user
    Text(String),
    /// Payload of a template quick-reply button
    Button(String),
    /// Id of an interactive reply button
    Interactive(String),
}

impl InboundReply {
    pub fn content(&self) -> &str {
        match self {
            InboundReply::Text(s) | InboundReply::Button(s) | InboundReply::Interactive(s) => s,
        }
    }

    fn from_text(message: &WebhookMessage) -> Option<Self> {
        let text = message.text.as_ref()?;
        non_empty(&text.body).map(InboundReply::Text)
    }

    fn from_button(message: &WebhookMessage) -> Option<Self> {
        let button = message.button.as_ref()?;
        non_empty(&button.payload).map(InboundReply::Button)
    }

    fn from_interactive(message: &WebhookMessage) -> Option<Self> {
        let reply = message.interactive.as_ref()?.button_reply.as_ref()?;
        non_empty(&reply.id).map(InboundReply::Interactive)
    }
}

fn non_empty(s: &str) -> Option<String> {
    (!s.is_empty()).then(|| s.to_string())
}

impl WebhookMessage {
    /// Reply content by priority: text body, then button payload, then
    /// interactive button id. `None` when all are absent or empty.
    pub fn reply(&self) -> Option<InboundReply> {
        InboundReply::from_text(self)
            .or_else(|| InboundReply::from_button(self))
            .or_else(|| InboundReply::from_interactive(self))
    }
}

impl WebhookEnvelope {
    /// Whether this is a conversational event the relay handles
    pub fn is_business_account(&self) -> bool {
        self.object == BUSINESS_ACCOUNT_OBJECT
    }

    /// All messages, flattened across entries and changes, in payload order
    pub fn messages(&self) -> impl Iterator<Item = &WebhookMessage> {
        self.entry
            .iter()
            .flat_map(|entry| entry.changes.iter())
            .filter_map(|change| change.value.as_ref())
            .flat_map(|value| value.messages.iter())
    }
}
