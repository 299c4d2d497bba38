//! # Wifi Gate Common
//!
//! Shared types, errors, and constants used by the Wifi Gate service.
//!
//! ## Modules
//! - `types` - Phone numbers, verification records, response envelopes
//! - `error` - The client-visible error taxonomy
//! - `constants` - Limits, defaults, and client messages

pub mod constants;
pub mod error;
pub mod types;

pub use error::GateError;
pub use types::*;
