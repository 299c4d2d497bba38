//! Core types shared across Wifi Gate components.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::constants::{
    MAX_ATTEMPTS, PHONE_MAX_DIGITS, PHONE_MIN_DIGITS, RECORD_ID_PREFIX, messages,
};
use crate::error::GateError;

/// A phone number that passed format validation (10-11 ASCII digits).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PhoneNumber(String);

impl PhoneNumber {
    /// Validate a raw phone number. No normalization is applied.
    pub fn parse(raw: &str) -> Result<Self, GateError> {
        let valid_len = (PHONE_MIN_DIGITS..=PHONE_MAX_DIGITS).contains(&raw.len());
        if valid_len && raw.bytes().all(|b| b.is_ascii_digit()) {
            Ok(Self(raw.to_string()))
        } else {
            Err(GateError::InvalidInput(messages::INVALID_PHONE.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Verification record id for this number
    pub fn record_id(&self) -> String {
        record_id(&self.0)
    }

    /// Log-safe rendering: only the last four digits survive
    pub fn masked(&self) -> String {
        let visible = &self.0[self.0.len() - 4..];
        format!("{}{}", "*".repeat(self.0.len() - 4), visible)
    }
}

impl TryFrom<String> for PhoneNumber {
    type Error = GateError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<PhoneNumber> for String {
    fn from(value: PhoneNumber) -> Self {
        value.0
    }
}

impl fmt::Display for PhoneNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Record id for a raw phone string, used for lookups before validation.
pub fn record_id(phone: &str) -> String {
    format!("{}{}", RECORD_ID_PREFIX, phone)
}

/// Verification state for one phone number
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationRecord {
    /// phone_{digits}
    pub id: String,

    pub phone_number: PhoneNumber,

    /// Code the user must submit
    pub verification_code: String,

    pub is_verified: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub verified_at: Option<DateTime<Utc>>,

    /// Failed comparisons since the last reset, never above MAX_ATTEMPTS
    pub attempts: u32,

    pub created_at: DateTime<Utc>,
}

impl VerificationRecord {
    pub fn new(phone_number: PhoneNumber, verification_code: String) -> Self {
        Self {
            id: phone_number.record_id(),
            phone_number,
            verification_code,
            is_verified: false,
            verified_at: None,
            attempts: 0,
            created_at: Utc::now(),
        }
    }

    /// Replace the code and start over. `created_at` and `verified_at` are kept.
    pub fn reset(&mut self, verification_code: String) {
        self.verification_code = verification_code;
        self.is_verified = false;
        self.attempts = 0;
    }

    pub fn is_exhausted(&self) -> bool {
        self.attempts >= MAX_ATTEMPTS
    }

    pub fn remaining_attempts(&self) -> u32 {
        MAX_ATTEMPTS.saturating_sub(self.attempts)
    }

    /// Count a failed comparison, saturating at MAX_ATTEMPTS
    pub fn record_failure(&mut self) {
        self.attempts = (self.attempts + 1).min(MAX_ATTEMPTS);
    }

    pub fn mark_verified(&mut self, now: DateTime<Utc>) {
        self.is_verified = true;
        self.verified_at = Some(now);
    }
}

/// What a successful verification or token check hands back to the client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessGrant {
    /// Shared WiFi password
    pub password: String,

    pub expires_at: DateTime<Utc>,

    /// Only present right after verification
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

/// JSON envelope for every API response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn ok(message: impl Into<String>, data: Option<T>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            data,
            error: None,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            message: None,
            data: None,
            error: Some(error.into()),
        }
    }
}
