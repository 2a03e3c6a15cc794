//! relay-telephony: voice calls via Exotel and SMS via Twilio
//!
//! Both clients are thin request relays: one provider call per request,
//! credentials supplied by the caller, provider answers passed back as-is.

pub mod error;
pub mod exotel;
pub mod twilio;

pub use error::{Result, TelephonyError};
pub use exotel::{CallRequest, ExotelClient};
pub use twilio::{SmsFailure, SmsRequest, TwilioSmsClient};
