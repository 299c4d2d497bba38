//! Phone verification.
//!
//! A phone number requests a code, the code is delivered out-of-band, and
//! submitting it within [`MAX_ATTEMPTS`] tries yields the WiFi password and a
//! session token.
//!
//! [`MAX_ATTEMPTS`]: wifi_gate_common::constants::MAX_ATTEMPTS

mod code;
mod engine;
mod notifier;

pub use code::CodePolicy;
pub use engine::{EngineConfig, VerificationEngine};
pub use notifier::{CodeNotifier, LogNotifier};
