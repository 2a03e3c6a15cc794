//! relay-whatsapp: WhatsApp Cloud API integration for the relay
//!
//! This crate provides the outbound sender for the Graph API, the inbound
//! webhook (verification and event ingestion) and the bulk dispatch loop
//! that grants auto-reply permission to the numbers it reaches.

pub mod client;
pub mod dispatch;
pub mod error;
pub mod message;
pub mod payload;
pub mod webhook;

pub use client::{MessageSender, SendReceipt, WhatsAppClient};
pub use dispatch::{DispatchOutcome, DispatchResult, dispatch};
pub use error::{Result, WhatsAppError};
pub use message::{Component, Location, MediaKind, OutboundMessage, Parameter, Template};
pub use payload::{InboundReply, WebhookEnvelope, WebhookMessage};
pub use webhook::{WebhookState, create_webhook_router};
