//! Session tokens - HS256 JWTs proving a phone number was verified.
//!
//! Claims: `{ phoneNumber, verified: true, exp }`. Tokens are not stored
//! server-side; validation checks signature and expiry only, so a token
//! stays valid until `exp` even if its verification record is reset.

use chrono::{DateTime, TimeZone, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use wifi_gate_common::{GateError, PhoneNumber};

/// Signed claims carried by a session token
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionClaims {
    pub phone_number: String,
    pub verified: bool,
    /// Expiry (unix seconds)
    pub exp: i64,
}

/// A token that passed validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedSession {
    pub phone_number: String,
    pub expires_at: DateTime<Utc>,
}

/// Issues and validates session tokens with a server-held secret
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl TokenService {
    pub fn new(secret: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp"]);

        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    /// Sign a token for `phone` expiring at `expires_at` (truncated to seconds)
    pub fn issue(&self, phone: &PhoneNumber, expires_at: DateTime<Utc>) -> Result<String, GateError> {
        let claims = SessionClaims {
            phone_number: phone.as_str().to_string(),
            verified: true,
            exp: expires_at.timestamp(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| GateError::Internal(format!("Failed to sign session token: {e}")))?;

        tracing::debug!(
            phone = %phone.masked(),
            exp = claims.exp,
            "Issued session token"
        );

        Ok(token)
    }

    /// Validate a token against the current time
    pub fn validate(&self, token: &str) -> Result<ValidatedSession, GateError> {
        self.validate_at(token, Utc::now())
    }

    /// Validate a token, applying the claim-level expiry check at `now`.
    ///
    /// The JWT library enforces `exp` against the system clock as well; a
    /// failure from either check is reported as [`GateError::ExpiredToken`].
    pub fn validate_at(&self, token: &str, now: DateTime<Utc>) -> Result<ValidatedSession, GateError> {
        let claims = decode::<SessionClaims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => GateError::ExpiredToken,
                _ => {
                    tracing::debug!(error = %e, "Rejected session token");
                    GateError::InvalidToken
                }
            })?;

        if !claims.verified {
            return Err(GateError::InvalidToken);
        }

        let expires_at = Utc
            .timestamp_opt(claims.exp, 0)
            .single()
            .ok_or(GateError::InvalidToken)?;

        if expires_at < now {
            return Err(GateError::ExpiredToken);
        }

        Ok(ValidatedSession {
            phone_number: claims.phone_number,
            expires_at,
        })
    }
}
