//! # Batch Admission
//!
//! Turns a batch's declared quantity into exactly that many uniquely
//! barcoded inventory units, one operator confirmation at a time.
//!
//! ## State Machine
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Admission Session                                  │
//! │                                                                         │
//! │   new(batch, admitted_count)                                           │
//! │        │                                                                │
//! │        ▼                                                                │
//! │   ┌──────────┐  evaluate(code) ok   ┌──────────────────────┐           │
//! │   │  ACTIVE  │ ───────────────────► │ caller writes record │           │
//! │   │          │ ◄─────────────────── │ record_admitted()    │           │
//! │   └────┬─────┘   count < quantity   └──────────┬───────────┘           │
//! │        │                                       │ count == quantity     │
//! │        │ evaluate(code) err                    ▼                        │
//! │        ▼                                ┌────────────┐                 │
//! │   no state change                       │  TERMINAL  │  (no way back)  │
//! │                                         └────────────┘                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Check Order
//! 1. Empty code → [`AdmissionError::EmptyCode`]
//! 2. Session already terminal → [`AdmissionError::BatchComplete`]
//! 3. Barcode exists anywhere in inventory → [`AdmissionError::DuplicateBarcode`]
//! 4. Neither the expected code nor batch-prefixed → [`AdmissionError::WrongBatch`]
//!
//! The sequential suggestion (`BATCH5-01`, `BATCH5-02`, ...) is advisory. Any
//! code carrying the batch's base code is accepted out of order; repeats are
//! caught by the duplicate check alone.
//!
//! This module holds no I/O. The barcode lookup is done by the caller and
//! passed in, so the same rules run against SQLite or an in-memory set.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::types::Batch;

// =============================================================================
// Errors
// =============================================================================

/// Why a scanned code was refused. None of these change session state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AdmissionError {
    #[error("Scanned code is empty")]
    EmptyCode,

    #[error("Batch {base_code} is already fully admitted")]
    BatchComplete { base_code: String },

    #[error("Barcode {code} is already registered")]
    DuplicateBarcode { code: String },

    #[error("Code {code} does not belong to this batch; expected a code starting with {expected_prefix}")]
    WrongBatch {
        code: String,
        expected_prefix: String,
    },
}

// =============================================================================
// Code Helpers
// =============================================================================

/// Barcode for the unit at `position` (1-indexed) of a batch.
///
/// Positions are padded to two digits; past 99 they simply grow.
///
/// ```rust
/// use stockroom_core::admission::unit_code;
///
/// assert_eq!(unit_code("BATCH1000", 3), "BATCH1000-03");
/// assert_eq!(unit_code("BATCH1000", 120), "BATCH1000-120");
/// ```
pub fn unit_code(base_code: &str, position: i64) -> String {
    format!("{}-{:02}", base_code, position)
}

/// Trims scanner noise and rejects empty input.
pub fn normalize_code(raw: &str) -> Result<&str, AdmissionError> {
    let code = raw.trim();
    if code.is_empty() {
        return Err(AdmissionError::EmptyCode);
    }
    Ok(code)
}

// =============================================================================
// Session
// =============================================================================

/// Whether a session still accepts scans.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum AdmissionPhase {
    /// Units remain to be scanned.
    Active,
    /// Every unit admitted; the scanner screen should leave.
    Terminal,
}

/// Serializable view of a session for the scanning screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct AdmissionStatus {
    pub batch_id: String,
    pub base_code: String,
    pub quantity: i64,
    pub admitted_count: i64,
    pub remaining: i64,
    /// `None` once the session is terminal.
    pub expected_code: Option<String>,
    pub phase: AdmissionPhase,
}

/// Admission progress for one batch.
#[derive(Debug, Clone)]
pub struct AdmissionSession {
    batch: Batch,
    admitted_count: i64,
}

impl AdmissionSession {
    /// Starts a session from the number of records already referencing the batch.
    ///
    /// ## Errors
    /// [`CoreError::AdmittedExceedsQuantity`] if the store already holds more
    /// records than the batch declares.
    pub fn new(batch: Batch, admitted_count: i64) -> CoreResult<Self> {
        if admitted_count < 0 || admitted_count > batch.quantity {
            return Err(CoreError::AdmittedExceedsQuantity {
                batch_id: batch.id.clone(),
                admitted: admitted_count,
                quantity: batch.quantity,
            });
        }

        Ok(AdmissionSession {
            batch,
            admitted_count,
        })
    }

    pub fn batch(&self) -> &Batch {
        &self.batch
    }

    pub fn admitted_count(&self) -> i64 {
        self.admitted_count
    }

    pub fn remaining(&self) -> i64 {
        self.batch.quantity - self.admitted_count
    }

    pub fn phase(&self) -> AdmissionPhase {
        if self.admitted_count >= self.batch.quantity {
            AdmissionPhase::Terminal
        } else {
            AdmissionPhase::Active
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.phase() == AdmissionPhase::Terminal
    }

    /// The next sequential code to suggest, or `None` when terminal.
    pub fn expected_code(&self) -> Option<String> {
        if self.is_terminal() {
            return None;
        }
        Some(unit_code(&self.batch.base_code, self.admitted_count + 1))
    }

    /// Checks a scanned code without changing state.
    ///
    /// `barcode_taken` is whether the normalized code already exists on any
    /// inventory record, in any batch.
    ///
    /// ## Returns
    /// The normalized code to write as the new record's barcode.
    pub fn evaluate<'a>(&self, raw: &'a str, barcode_taken: bool) -> Result<&'a str, AdmissionError> {
        let code = normalize_code(raw)?;

        if self.is_terminal() {
            return Err(AdmissionError::BatchComplete {
                base_code: self.batch.base_code.clone(),
            });
        }

        if barcode_taken {
            return Err(AdmissionError::DuplicateBarcode {
                code: code.to_string(),
            });
        }

        let is_expected = self.expected_code().as_deref() == Some(code);
        if !is_expected && !code.starts_with(&self.batch.base_code) {
            return Err(AdmissionError::WrongBatch {
                code: code.to_string(),
                expected_prefix: self.batch.base_code.clone(),
            });
        }

        Ok(code)
    }

    /// Advances the session after the caller has persisted a record.
    ///
    /// ## Returns
    /// The phase after the increment. [`AdmissionPhase::Terminal`] means the
    /// batch must now be flagged admitted.
    pub fn record_admitted(&mut self) -> Result<AdmissionPhase, AdmissionError> {
        if self.is_terminal() {
            return Err(AdmissionError::BatchComplete {
                base_code: self.batch.base_code.clone(),
            });
        }
        self.admitted_count += 1;
        Ok(self.phase())
    }

    pub fn status(&self) -> AdmissionStatus {
        AdmissionStatus {
            batch_id: self.batch.id.clone(),
            base_code: self.batch.base_code.clone(),
            quantity: self.batch.quantity,
            admitted_count: self.admitted_count,
            remaining: self.remaining(),
            expected_code: self.expected_code(),
            phase: self.phase(),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use chrono::Utc;

    use super::*;
    use crate::types::{batch_base_code, AdmittedFlag};

    fn batch(number: i64, quantity: i64) -> Batch {
        let now = Utc::now();
        Batch {
            id: format!("batch-{}", number),
            number,
            base_code: batch_base_code(number),
            product_id: "product-1".to_string(),
            cost_price_cents: 500,
            selling_price_cents: 900,
            quantity,
            admitted: AdmittedFlag::No,
            created_at: now,
            updated_at: now,
        }
    }

    /// Runs one submit against an in-memory barcode set, the way the
    /// database driver does against the inventory table.
    fn submit(
        session: &mut AdmissionSession,
        registry: &mut HashSet<String>,
        raw: &str,
    ) -> Result<AdmissionPhase, AdmissionError> {
        let taken = registry.contains(raw.trim());
        let code = session.evaluate(raw, taken)?.to_string();
        registry.insert(code);
        session.record_admitted()
    }

    #[test]
    fn test_expected_code_sequence() {
        let mut session = AdmissionSession::new(batch(1000, 5), 0).unwrap();
        let mut registry = HashSet::new();

        assert_eq!(session.expected_code().as_deref(), Some("BATCH1000-01"));
        submit(&mut session, &mut registry, "BATCH1000-01").unwrap();
        submit(&mut session, &mut registry, "BATCH1000-02").unwrap();
        assert_eq!(session.expected_code().as_deref(), Some("BATCH1000-03"));
    }

    #[test]
    fn test_initial_state_from_existing_records() {
        let session = AdmissionSession::new(batch(42, 10), 4).unwrap();
        assert_eq!(session.admitted_count(), 4);
        assert_eq!(session.remaining(), 6);
        assert_eq!(session.expected_code().as_deref(), Some("BATCH42-05"));
        assert_eq!(session.phase(), AdmissionPhase::Active);
    }

    #[test]
    fn test_new_rejects_overfull_batch() {
        let result = AdmissionSession::new(batch(1, 2), 3);
        assert!(matches!(
            result,
            Err(CoreError::AdmittedExceedsQuantity { admitted: 3, quantity: 2, .. })
        ));
    }

    #[test]
    fn test_two_unit_scenario() {
        let mut session = AdmissionSession::new(batch(5, 2), 0).unwrap();
        let mut registry = HashSet::new();

        let phase = submit(&mut session, &mut registry, "BATCH5-01").unwrap();
        assert_eq!(phase, AdmissionPhase::Active);
        assert_eq!(session.admitted_count(), 1);

        let err = submit(&mut session, &mut registry, "BATCH5-01").unwrap_err();
        assert_eq!(
            err,
            AdmissionError::DuplicateBarcode {
                code: "BATCH5-01".to_string()
            }
        );
        assert_eq!(session.admitted_count(), 1);

        let phase = submit(&mut session, &mut registry, "BATCH5-02").unwrap();
        assert_eq!(phase, AdmissionPhase::Terminal);
        assert_eq!(session.admitted_count(), 2);
        assert_eq!(session.expected_code(), None);
    }

    #[test]
    fn test_wrong_code_leaves_count_unchanged() {
        let mut session = AdmissionSession::new(batch(7, 1), 0).unwrap();
        let mut registry = HashSet::new();

        let err = submit(&mut session, &mut registry, "WRONGCODE").unwrap_err();
        assert!(matches!(
            err,
            AdmissionError::WrongBatch { ref expected_prefix, .. } if expected_prefix == "BATCH7"
        ));
        assert_eq!(session.admitted_count(), 0);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_empty_code_rejected() {
        let session = AdmissionSession::new(batch(7, 1), 0).unwrap();
        assert_eq!(session.evaluate("", false), Err(AdmissionError::EmptyCode));
        assert_eq!(session.evaluate("   ", false), Err(AdmissionError::EmptyCode));
    }

    #[test]
    fn test_out_of_order_code_with_prefix_accepted() {
        let session = AdmissionSession::new(batch(123, 3), 0).unwrap();
        assert_eq!(session.evaluate("BATCH123-03", false), Ok("BATCH123-03"));
        assert_eq!(session.evaluate("BATCH123-X", false), Ok("BATCH123-X"));
    }

    #[test]
    fn test_scanner_whitespace_is_trimmed() {
        let session = AdmissionSession::new(batch(9, 1), 0).unwrap();
        assert_eq!(session.evaluate("  BATCH9-01\n", false), Ok("BATCH9-01"));
    }

    #[test]
    fn test_any_code_starting_with_base_code_is_accepted() {
        let session = AdmissionSession::new(batch(1, 3), 0).unwrap();
        assert_eq!(session.evaluate("BATCH1-07", false), Ok("BATCH1-07"));
        assert_eq!(session.evaluate("BATCH10-01", false), Ok("BATCH10-01"));
        assert_eq!(session.evaluate("BATCH12", false), Ok("BATCH12"));
        assert!(matches!(
            session.evaluate("BATC1-01", false),
            Err(AdmissionError::WrongBatch { .. })
        ));
    }

    #[test]
    fn test_duplicate_checked_before_prefix() {
        let session = AdmissionSession::new(batch(2, 2), 0).unwrap();
        // Code from another batch that is already on the shelf.
        assert_eq!(
            session.evaluate("BATCH3-01", true),
            Err(AdmissionError::DuplicateBarcode {
                code: "BATCH3-01".to_string()
            })
        );
    }

    #[test]
    fn test_terminal_session_rejects_everything() {
        let mut session = AdmissionSession::new(batch(8, 1), 1).unwrap();
        assert!(session.is_terminal());
        assert!(matches!(
            session.evaluate("BATCH8-02", false),
            Err(AdmissionError::BatchComplete { .. })
        ));
        assert!(session.record_admitted().is_err());
        assert_eq!(session.admitted_count(), 1);
    }

    #[test]
    fn test_full_admission_of_n_units() {
        let quantity = 12;
        let mut session = AdmissionSession::new(batch(300, quantity), 0).unwrap();
        let mut registry = HashSet::new();

        for k in 1..=quantity {
            let code = session.expected_code().unwrap();
            assert_eq!(code, unit_code("BATCH300", k));
            submit(&mut session, &mut registry, &code).unwrap();
        }

        assert_eq!(registry.len() as i64, quantity);
        assert!(session.is_terminal());
    }

    #[test]
    fn test_batches_do_not_share_codes() {
        let mut first = AdmissionSession::new(batch(11, 2), 0).unwrap();
        let second = AdmissionSession::new(batch(12, 2), 0).unwrap();
        let mut registry = HashSet::new();

        submit(&mut first, &mut registry, "BATCH11-01").unwrap();
        submit(&mut first, &mut registry, "BATCH11-02").unwrap();

        assert!(first.is_terminal());
        assert_eq!(second.admitted_count(), 0);
        assert_eq!(second.expected_code().as_deref(), Some("BATCH12-01"));
        assert!(matches!(
            second.evaluate("BATCH11-03", false),
            Err(AdmissionError::WrongBatch { .. })
        ));
    }

    #[test]
    fn test_status_snapshot() {
        let session = AdmissionSession::new(batch(5, 2), 1).unwrap();
        let status = session.status();
        assert_eq!(status.base_code, "BATCH5");
        assert_eq!(status.admitted_count, 1);
        assert_eq!(status.remaining, 1);
        assert_eq!(status.expected_code.as_deref(), Some("BATCH5-02"));
        assert_eq!(status.phase, AdmissionPhase::Active);
    }
}
