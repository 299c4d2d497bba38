//! Verification state machine: request a code, submit it, get a session.

use chrono::{Duration, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex as SyncMutex, PoisonError};
use tokio::sync::{Mutex, OwnedMutexGuard};
use wifi_gate_common::{AccessGrant, GateError, PhoneNumber, VerificationRecord};

use super::{CodeNotifier, CodePolicy};
use crate::store::VerificationStore;
use crate::token::TokenService;

/// Engine settings
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub policy: CodePolicy,
    /// Fixed mode only: create a record on `verify_code` for unknown phones
    pub create_on_verify: bool,
    /// Shared WiFi password handed out on success
    pub wifi_password: String,
    /// Session lifetime in seconds
    pub session_ttl_secs: u64,
}

/// Verification engine
pub struct VerificationEngine {
    config: EngineConfig,
    store: Arc<dyn VerificationStore>,
    tokens: Arc<TokenService>,
    notifier: Arc<dyn CodeNotifier>,
    /// One mutex per record id in use; records are only mutated while holding it
    record_locks: RecordLocks,
}

type RecordLocks = SyncMutex<HashMap<String, Arc<Mutex<()>>>>;

/// Held while a record is read and written back. The lock table entry is
/// dropped with the last holder, so the table only holds ids in flight.
struct RecordGuard<'a> {
    locks: &'a RecordLocks,
    id: String,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for RecordGuard<'_> {
    fn drop(&mut self) {
        drop(self.guard.take());
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        if locks
            .get(&self.id)
            .is_some_and(|lock| Arc::strong_count(lock) == 1)
        {
            locks.remove(&self.id);
        }
    }
}

impl VerificationEngine {
    pub fn new(
        config: EngineConfig,
        store: Arc<dyn VerificationStore>,
        tokens: Arc<TokenService>,
        notifier: Arc<dyn CodeNotifier>,
    ) -> Self {
        Self {
            config,
            store,
            tokens,
            notifier,
            record_locks: SyncMutex::new(HashMap::new()),
        }
    }

    async fn lock_record(&self, id: &str) -> RecordGuard<'_> {
        let lock = {
            let mut locks = self
                .record_locks
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            locks.entry(id.to_string()).or_default().clone()
        };
        // Guard first: a caller dropped mid-wait still clears the entry
        let mut guard = RecordGuard {
            locks: &self.record_locks,
            id: id.to_string(),
            guard: None,
        };
        guard.guard = Some(lock.lock_owned().await);
        guard
    }

    #[cfg(test)]
    fn lock_entries(&self) -> usize {
        self.record_locks.lock().unwrap().len()
    }

    fn creates_on_verify(&self) -> bool {
        self.config.create_on_verify && self.config.policy.fixed_code().is_some()
    }

    /// Create or reset the record for `raw_phone` and deliver its code.
    pub async fn request_verification(&self, raw_phone: &str) -> Result<(), GateError> {
        let phone = PhoneNumber::parse(raw_phone)?;
        let id = phone.record_id();
        let code = self.config.policy.issue_code();

        let _guard = self.lock_record(&id).await;

        let record = match self.store.get(&id).await.map_err(internal)? {
            Some(mut existing) => {
                existing.reset(code.clone());
                tracing::debug!(phone = %phone.masked(), "Verification reset");
                existing
            }
            None => {
                tracing::debug!(phone = %phone.masked(), "Verification created");
                VerificationRecord::new(phone.clone(), code.clone())
            }
        };
        self.store.put(&id, record).await.map_err(internal)?;

        self.notifier
            .deliver(&phone, &code)
            .await
            .map_err(internal)?;

        Ok(())
    }

    /// Check a submitted code and, on a match, issue a session.
    pub async fn verify_code(
        &self,
        raw_phone: &str,
        submitted_code: &str,
    ) -> Result<AccessGrant, GateError> {
        // A malformed number can never have a record
        let phone = match PhoneNumber::parse(raw_phone) {
            Ok(phone) => phone,
            Err(err) if self.creates_on_verify() => return Err(err),
            Err(_) => return Err(GateError::NotFound),
        };
        let id = phone.record_id();
        let _guard = self.lock_record(&id).await;

        let mut record = match self.store.get(&id).await.map_err(internal)? {
            Some(record) => record,
            None => self.lazy_record(phone)?,
        };

        if record.is_exhausted() {
            tracing::warn!(
                phone = %record.phone_number.masked(),
                attempts = record.attempts,
                "Verification attempts exhausted"
            );
            return Err(GateError::AttemptsExceeded);
        }

        if record.verification_code != submitted_code {
            record.record_failure();
            let remaining = record.remaining_attempts();
            self.store.put(&id, record).await.map_err(internal)?;

            tracing::debug!(
                id = %id,
                remaining = remaining,
                "Verification code mismatch"
            );
            return Err(GateError::CodeMismatch { remaining });
        }

        let now = Utc::now();
        let expires_at = now + Duration::seconds(self.config.session_ttl_secs as i64);
        record.mark_verified(now);

        let token = self.tokens.issue(&record.phone_number, expires_at)?;
        let phone = record.phone_number.clone();
        self.store.put(&id, record).await.map_err(internal)?;

        tracing::info!(phone = %phone.masked(), "Phone verified");

        Ok(AccessGrant {
            password: self.config.wifi_password.clone(),
            expires_at,
            token: Some(token),
        })
    }

    /// Resume a session from a previously issued token
    pub fn validate_token(&self, token: &str) -> Result<AccessGrant, GateError> {
        let session = self.tokens.validate(token)?;

        tracing::debug!(
            phone = %mask_raw(&session.phone_number),
            expires_at = %session.expires_at,
            "Session resumed"
        );

        Ok(AccessGrant {
            password: self.config.wifi_password.clone(),
            expires_at: session.expires_at,
            token: None,
        })
    }

    /// Record for a phone seen for the first time at `verify_code`.
    fn lazy_record(&self, phone: PhoneNumber) -> Result<VerificationRecord, GateError> {
        match self.config.policy.fixed_code() {
            Some(fixed_code) if self.config.create_on_verify => {
                tracing::debug!(phone = %phone.masked(), "Verification created on verify");
                Ok(VerificationRecord::new(phone, fixed_code.to_string()))
            }
            _ => Err(GateError::NotFound),
        }
    }
}

/// Token claims are trusted but not re-parsed; mask whatever is there
fn mask_raw(phone: &str) -> String {
    PhoneNumber::parse(phone)
        .map(|p| p.masked())
        .unwrap_or_else(|_| "<invalid>".to_string())
}

/// Logged once, where the error becomes a response
fn internal(err: anyhow::Error) -> GateError {
    GateError::Internal(format!("{err:#}"))
}
