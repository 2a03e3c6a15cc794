//! Bulk dispatch to a list of recipients
//!
//! Recipients are processed one at a time in input order. A failed send is
//! recorded and the loop moves on; it never aborts the batch.

use serde::Serialize;
use serde_json::Value;
use tracing::{info, warn};

use relay_core::{AllowList, normalize};

use crate::client::MessageSender;
use crate::message::OutboundMessage;

/// Outcome of one send
#[derive(Debug, Clone, PartialEq)]
pub enum DispatchOutcome {
    Sent { message_id: Option<String> },
    Failed { error: Value },
}

/// Per-recipient result, serialized as `{number, success, messageId?, error?}`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(into = "DispatchResultBody")]
pub struct DispatchResult {
    pub number: String,
    pub outcome: DispatchOutcome,
}

impl DispatchResult {
    pub fn is_success(&self) -> bool {
        matches!(self.outcome, DispatchOutcome::Sent { .. })
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DispatchResultBody {
    number: String,
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    message_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<Value>,
}

impl From<DispatchResult> for DispatchResultBody {
    fn from(result: DispatchResult) -> Self {
        match result.outcome {
            DispatchOutcome::Sent { message_id } => Self {
                number: result.number,
                success: true,
                message_id,
                error: None,
            },
            DispatchOutcome::Failed { error } => Self {
                number: result.number,
                success: false,
                message_id: None,
                error: Some(error),
            },
        }
    }
}

/// Send `message` to every number in order.
///
/// Numbers that normalize to an empty string are skipped without a result.
/// When `grant` is given, every successfully reached number is added to it.
pub async fn dispatch<S>(
    sender: &S,
    numbers: &[String],
    message: &OutboundMessage,
    grant: Option<&AllowList>,
) -> Vec<DispatchResult>
where
    S: MessageSender + ?Sized,
{
    let mut results = Vec::with_capacity(numbers.len());

    for raw in numbers {
        let number = normalize(raw);
        if number.is_empty() {
            continue;
        }

        let outcome = match sender.send(&number, message).await {
            Ok(receipt) => {
                if let Some(allow_list) = grant {
                    allow_list.add(&number).await;
                }
                DispatchOutcome::Sent {
                    message_id: receipt.message_id,
                }
            }
            Err(e) => {
                warn!("Dispatch to {} failed: {}", number, e);
                DispatchOutcome::Failed {
                    error: e.error_payload(),
                }
            }
        };

        results.push(DispatchResult { number, outcome });
    }

    let succeeded = results.iter().filter(|r| r.is_success()).count();
    info!(
        "Dispatched {} message to {} recipients ({} succeeded)",
        message.kind(),
        results.len(),
        succeeded
    );

    results
}
