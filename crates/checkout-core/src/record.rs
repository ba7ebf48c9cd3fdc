//! Payment Records
//!
//! The durable half of a payment attempt: enough state to resume after the
//! consent redirect. A record is written before the user is handed the
//! redirect URL, so finalization can always locate it. `processed_at` is the
//! idempotency guard; it is set exactly once through an atomic conditional
//! update, never a separate read followed by a write.

use std::collections::HashMap;
use std::sync::RwLock;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

/// Durable record of one payment attempt
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentRecord {
    /// Opaque id generated at initiation; carried through the redirect URL
    pub id: String,

    /// Sender wallet address URL
    pub wallet_address: String,

    /// Token authorizing grant continuation after consent
    pub continue_token: String,

    /// Grant continuation endpoint
    pub continue_uri: String,

    /// Quote resource URL the outgoing payment will reference
    pub quote_id: String,

    /// Set exactly once, when finalization succeeds
    pub processed_at: Option<DateTime<Utc>>,
}

impl PaymentRecord {
    pub fn new(
        id: impl Into<String>,
        wallet_address: impl Into<String>,
        continue_token: impl Into<String>,
        continue_uri: impl Into<String>,
        quote_id: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            wallet_address: wallet_address.into(),
            continue_token: continue_token.into(),
            continue_uri: continue_uri.into(),
            quote_id: quote_id.into(),
            processed_at: None,
        }
    }
}

/// Keyed store for payment records
pub trait PaymentRecordStore: Send + Sync {
    /// Persist a new record
    fn create(&self, record: &PaymentRecord) -> Result<()>;

    /// Look up a record by id
    fn find(&self, id: &str) -> Result<Option<PaymentRecord>>;

    /// Atomically set `processed_at` for an unprocessed record.
    ///
    /// Fails with `PaymentNotFound` for an unknown id and `AlreadyProcessed`
    /// when the timestamp was already set; the check and the write happen
    /// under one lock so two racing finalize attempts cannot both succeed.
    fn mark_processed(&self, id: &str) -> Result<DateTime<Utc>>;
}

/// In-memory record store (for development/testing)
pub struct MemoryPaymentRecordStore {
    records: RwLock<HashMap<String, PaymentRecord>>,
}

impl Default for MemoryPaymentRecordStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryPaymentRecordStore {
    pub fn new() -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
        }
    }
}

impl PaymentRecordStore for MemoryPaymentRecordStore {
    fn create(&self, record: &PaymentRecord) -> Result<()> {
        let mut records = self
            .records
            .write()
            .map_err(|_| CoreError::Storage("record lock poisoned".into()))?;
        records.insert(record.id.clone(), record.clone());
        Ok(())
    }

    fn find(&self, id: &str) -> Result<Option<PaymentRecord>> {
        let records = self
            .records
            .read()
            .map_err(|_| CoreError::Storage("record lock poisoned".into()))?;
        Ok(records.get(id).cloned())
    }

    fn mark_processed(&self, id: &str) -> Result<DateTime<Utc>> {
        let mut records = self
            .records
            .write()
            .map_err(|_| CoreError::Storage("record lock poisoned".into()))?;
        let record = records
            .get_mut(id)
            .ok_or_else(|| CoreError::PaymentNotFound(id.to_string()))?;
        if record.processed_at.is_some() {
            return Err(CoreError::AlreadyProcessed(id.to_string()));
        }
        let now = Utc::now();
        record.processed_at = Some(now);
        Ok(now)
    }
}
