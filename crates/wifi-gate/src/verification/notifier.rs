//! Out-of-band delivery of verification codes.

use anyhow::Result;
use async_trait::async_trait;
use wifi_gate_common::PhoneNumber;

/// Delivers a freshly issued code to the phone's owner
#[async_trait]
pub trait CodeNotifier: Send + Sync {
    async fn deliver(&self, phone: &PhoneNumber, code: &str) -> Result<()>;
}

/// Notifier that only writes to the log.
///
/// With `reveal_codes` set the code itself is logged, which is how codes
/// reach the tester during development.
pub struct LogNotifier {
    reveal_codes: bool,
}

impl LogNotifier {
    pub fn new(reveal_codes: bool) -> Self {
        if reveal_codes {
            tracing::warn!("Verification codes will be written to the log");
        }
        Self { reveal_codes }
    }
}

#[async_trait]
impl CodeNotifier for LogNotifier {
    async fn deliver(&self, phone: &PhoneNumber, code: &str) -> Result<()> {
        if self.reveal_codes {
            tracing::info!(phone = %phone, code = %code, "[DEV] Verification code issued");
        } else {
            tracing::info!(phone = %phone.masked(), "Verification code issued");
        }
        Ok(())
    }
}
