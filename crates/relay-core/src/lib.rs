//! relay-core: shared building blocks for the messaging relay
//!
//! Configuration, phone number normalization and the two in-memory
//! stores (allow-list and reply board) used by the HTTP handlers.

pub mod config;
pub mod error;
pub mod phone;
pub mod store;

pub use config::{Config, ExotelConfig, ServerConfig, TwilioConfig, WhatsAppConfig};
pub use error::{Error, Result};
pub use phone::{is_e164, normalize};
pub use store::{AllowList, ReplyStore};
