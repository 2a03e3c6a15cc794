//! Exotel voice API client

use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use tracing::{error, info};

use relay_core::ExotelConfig;

use crate::error::{Result, TelephonyError, parse_body};

/// Exotel client for click-to-call
#[derive(Debug, Clone)]
pub struct ExotelClient {
    client: Client,
    account_sid: String,
    base_url: String,
}

/// Connect `from` to `to`, presenting `caller_id`
#[derive(Debug, Clone)]
pub struct CallRequest {
    pub username: String,
    pub password: String,
    pub from: String,
    pub to: String,
    pub caller_id: String,
}

#[derive(Serialize)]
struct ConnectForm<'a> {
    #[serde(rename = "From")]
    from: &'a str,
    #[serde(rename = "To")]
    to: &'a str,
    #[serde(rename = "CallerId")]
    caller_id: &'a str,
    #[serde(rename = "Record")]
    record: &'static str,
}

impl ExotelClient {
    /// Create a new Exotel client
    pub fn new(config: &ExotelConfig) -> Self {
        Self {
            client: Client::new(),
            account_sid: config.account_sid.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
        }
    }

    fn connect_url(&self) -> String {
        format!(
            "{}/v1/Accounts/{}/Calls/connect",
            self.base_url, self.account_sid
        )
    }

    /// Place a recorded call. Returns the provider body on success.
    pub async fn connect_call(&self, request: &CallRequest) -> Result<Value> {
        info!("Connecting call from {} to {}", request.from, request.to);

        let form = ConnectForm {
            from: &request.from,
            to: &request.to,
            caller_id: &request.caller_id,
            record: "true",
        };

        let response = self
            .client
            .post(self.connect_url())
            .basic_auth(&request.username, Some(&request.password))
            .form(&form)
            .send()
            .await?;

        let status = response.status();
        let body = parse_body(response.text().await?);

        if !status.is_success() {
            error!("Exotel call failed: {} - {}", status, body);
            return Err(TelephonyError::Upstream {
                status: status.as_u16(),
                body,
            });
        }

        Ok(body)
    }
}
