//! Twilio SMS client
//!
//! Account credentials come with each request so one relay can serve
//! several Twilio accounts.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{error, info};

use relay_core::TwilioConfig;

use crate::error::{Result, TelephonyError, parse_body};

/// Twilio REST client
#[derive(Debug, Clone)]
pub struct TwilioSmsClient {
    client: Client,
    base_url: String,
}

/// One SMS to send
#[derive(Debug, Clone)]
pub struct SmsRequest {
    pub account_sid: String,
    pub auth_token: String,
    pub to: String,
    pub from: String,
    pub body: String,
}

/// Outgoing message payload
#[derive(Debug, Serialize)]
struct SendMessageForm<'a> {
    #[serde(rename = "To")]
    to: &'a str,
    #[serde(rename = "From")]
    from: &'a str,
    #[serde(rename = "Body")]
    body: &'a str,
}

#[derive(Deserialize)]
struct SendMessageResponse {
    sid: String,
}

/// Failure details in the shape Twilio reports them
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SmsFailure {
    /// Human readable message
    pub error: String,
    /// Twilio error code, e.g. 21211 for an invalid `To` number
    pub code: Option<i64>,
    /// HTTP status of the Twilio response
    pub status: Option<u16>,
}

impl From<&TelephonyError> for SmsFailure {
    fn from(err: &TelephonyError) -> Self {
        match err {
            TelephonyError::Upstream { status, body } => Self {
                error: body
                    .get("message")
                    .and_then(Value::as_str)
                    .map(str::to_string)
                    .unwrap_or_else(|| err.to_string()),
                code: body.get("code").and_then(Value::as_i64),
                status: Some(*status),
            },
            TelephonyError::Http(message) => Self {
                error: message.clone(),
                code: None,
                status: None,
            },
        }
    }
}

impl TwilioSmsClient {
    /// Create a new Twilio client
    pub fn new(config: &TwilioConfig) -> Self {
        Self {
            client: Client::new(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Send an SMS and return the message SID
    pub async fn send_sms(&self, request: &SmsRequest) -> Result<String> {
        info!("Sending SMS to {}", request.to);

        let url = format!(
            "{}/2010-04-01/Accounts/{}/Messages.json",
            self.base_url, request.account_sid
        );

        let form = SendMessageForm {
            to: &request.to,
            from: &request.from,
            body: &request.body,
        };

        let response = self
            .client
            .post(&url)
            .basic_auth(&request.account_sid, Some(&request.auth_token))
            .form(&form)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = parse_body(response.text().await?);
            error!("Twilio error: {} - {}", status, body);
            return Err(TelephonyError::Upstream {
                status: status.as_u16(),
                body,
            });
        }

        let result: SendMessageResponse = response.json().await?;
        Ok(result.sid)
    }
}
