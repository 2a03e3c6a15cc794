//! Configuration management
//!
//! Settings are resolved in this order:
//! 1. Environment variables
//! 2. `relay.toml` configuration file
//! 3. Built-in defaults
//!
//! `${VAR_NAME}` references inside the configuration file are expanded from
//! the environment before parsing.

use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info};

use crate::Error;

/// Default configuration file looked up by [`Config::load`]
pub const DEFAULT_CONFIG_FILE: &str = "relay.toml";

/// Acknowledgement sent back to a number after its reply was recorded.
/// `{reply}` is replaced with the reply text.
pub const DEFAULT_ACK_TEMPLATE: &str =
    "✅ Thank you for your response: \"{reply}\". We’ll contact you shortly 😊";

/// WhatsApp Cloud API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WhatsAppConfig {
    /// Secret echoed by the provider during webhook verification
    pub verify_token: String,

    /// Sending phone number identifier
    pub phone_number_id: String,

    /// Bearer token for the Graph API
    #[serde(skip_serializing)]
    pub access_token: String,

    /// Graph API version segment
    pub api_version: String,

    /// Graph API base URL
    pub base_url: String,

    /// Acknowledgement message template
    pub ack_template: String,
}

impl Default for WhatsAppConfig {
    fn default() -> Self {
        Self {
            verify_token: String::new(),
            phone_number_id: String::new(),
            access_token: String::new(),
            api_version: default_api_version(),
            base_url: default_graph_base_url(),
            ack_template: DEFAULT_ACK_TEMPLATE.to_string(),
        }
    }
}

impl WhatsAppConfig {
    /// Endpoint for outbound messages
    pub fn messages_url(&self) -> String {
        format!(
            "{}/{}/{}/messages",
            self.base_url.trim_end_matches('/'),
            self.api_version,
            self.phone_number_id
        )
    }

    /// Endpoint for media uploads
    pub fn media_url(&self) -> String {
        format!(
            "{}/{}/{}/media",
            self.base_url.trim_end_matches('/'),
            self.api_version,
            self.phone_number_id
        )
    }

    /// Render the acknowledgement for a reply
    pub fn ack_message(&self, reply: &str) -> String {
        self.ack_template.replace("{reply}", reply)
    }
}

/// Exotel voice API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExotelConfig {
    /// Exotel account SID used in the call URL
    pub account_sid: String,

    /// API base URL
    pub base_url: String,
}

impl Default for ExotelConfig {
    fn default() -> Self {
        Self {
            account_sid: String::new(),
            base_url: "https://api.exotel.com".to_string(),
        }
    }
}

/// Twilio REST API configuration
///
/// Credentials are supplied per request, only the endpoint is configured.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TwilioConfig {
    /// API base URL
    pub base_url: String,
}

impl Default for TwilioConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.twilio.com".to_string(),
        }
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Listen port
    pub port: u16,

    /// Allowed CORS origin; any origin when unset
    pub allowed_origin: Option<String>,

    /// Directory holding the built admin console
    pub static_dir: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            allowed_origin: None,
            static_dir: "client/build".to_string(),
        }
    }
}

/// Main configuration for the relay
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub whatsapp: WhatsAppConfig,
    pub exotel: ExotelConfig,
    pub twilio: TwilioConfig,
    pub server: ServerConfig,
}

fn default_api_version() -> String {
    "v22.0".to_string()
}

fn default_graph_base_url() -> String {
    "https://graph.facebook.com".to_string()
}

fn default_port() -> u16 {
    3000
}

impl Config {
    /// Load from `./relay.toml` when present, otherwise from the environment
    pub fn load() -> crate::Result<Self> {
        if Path::new(DEFAULT_CONFIG_FILE).exists() {
            info!("Loading configuration from {}", DEFAULT_CONFIG_FILE);
            return Self::from_toml_file(DEFAULT_CONFIG_FILE);
        }
        debug!("No {} found, using environment only", DEFAULT_CONFIG_FILE);
        Ok(Self::from_env())
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable lookup
    pub fn from_vars<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        config.apply_overrides(&lookup);
        config
    }

    /// Load a TOML file, expanding `${VAR}` references, then apply
    /// environment overrides
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> crate::Result<Self> {
        Self::from_toml_file_with(path, &|key: &str| std::env::var(key).ok())
    }

    fn from_toml_file_with<P, F>(path: P, lookup: &F) -> crate::Result<Self>
    where
        P: AsRef<Path>,
        F: Fn(&str) -> Option<String>,
    {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            Error::Config(format!(
                "Failed to read config file {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;

        let mut config = Self::from_toml_str(&content, lookup)?;
        config.apply_overrides(lookup);
        Ok(config)
    }

    fn from_toml_str<F>(content: &str, lookup: &F) -> crate::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let expanded = expand_vars(content, lookup);
        Ok(toml::from_str(&expanded)?)
    }

    /// Overwrite fields from set, non-empty variables
    fn apply_overrides<F>(&mut self, lookup: &F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        // WhatsApp
        if let Some(v) = var("WEBHOOK_VERIFY_TOKEN") {
            self.whatsapp.verify_token = v;
        }
        if let Some(v) = var("PHONE_NUMBER_ID") {
            self.whatsapp.phone_number_id = v;
        }
        if let Some(v) = var("WHATSAPP_ACCESS_TOKEN") {
            self.whatsapp.access_token = v;
        }
        if let Some(v) = var("WHATSAPP_API_VERSION") {
            self.whatsapp.api_version = v;
        }
        if let Some(v) = var("WHATSAPP_API_BASE_URL") {
            self.whatsapp.base_url = v;
        }
        if let Some(v) = var("ACK_MESSAGE_TEMPLATE") {
            self.whatsapp.ack_template = v;
        }

        // Exotel / Twilio
        if let Some(v) = var("EXOTEL_ACCOUNT_SID") {
            self.exotel.account_sid = v;
        }
        if let Some(v) = var("EXOTEL_API_BASE_URL") {
            self.exotel.base_url = v;
        }
        if let Some(v) = var("TWILIO_API_BASE_URL") {
            self.twilio.base_url = v;
        }

        // Server
        if let Some(v) = var("BACKEND_PORT") {
            if let Ok(port) = v.trim().parse() {
                self.server.port = port;
            }
        }
        if let Some(v) = var("FRONTEND_URL") {
            self.server.allowed_origin = Some(v);
        }
        if let Some(v) = var("STATIC_DIR") {
            self.server.static_dir = v;
        }
    }

    /// Names of required settings that are missing.
    ///
    /// Startup continues regardless; callers log the result.
    pub fn missing_required(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.whatsapp.verify_token.is_empty() {
            missing.push("WEBHOOK_VERIFY_TOKEN");
        }
        if self.whatsapp.phone_number_id.is_empty() {
            missing.push("PHONE_NUMBER_ID");
        }
        if self.whatsapp.access_token.is_empty() {
            missing.push("WHATSAPP_ACCESS_TOKEN");
        }
        missing
    }
}

/// Replace `${VAR_NAME}` with the variable's value (empty when unset).
/// An unterminated `${` is copied through unchanged.
fn expand_vars<F>(value: &str, lookup: &F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    let mut result = String::with_capacity(value.len());
    let mut rest = value;

    while let Some(start) = rest.find("${") {
        result.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        match after.find('}') {
            Some(end) => {
                let name = &after[..end];
                if let Some(v) = lookup(name) {
                    result.push_str(&v);
                }
                rest = &after[end + 1..];
            }
            None => {
                result.push_str(&rest[start..]);
                rest = "";
            }
        }
    }

    result.push_str(rest);
    result
}
