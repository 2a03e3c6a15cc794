//! relay-api: HTTP surface of the messaging relay
//!
//! Routes for bulk WhatsApp dispatch, reply status, the provider webhook,
//! Exotel calls and Twilio SMS, plus the static admin console.
//! Built with axum for async HTTP handling.

pub mod error;
pub mod handlers;
pub mod routes;
pub mod server;

pub use error::{ApiError, Result};
pub use server::{AppContext, build_app, start_server};
