//! # card-sense
//!
//! Extracts structured financial data from credit-card statement text by
//! reconciling two independent passes:
//!
//! - **Pattern extraction**: deterministic, regex-driven recovery of labeled
//!   fields (fast, local, trusted for short format-constrained values).
//! - **Model extraction**: a structured-extraction prompt against an LLM,
//!   whose free-form response is mined for JSON (better at contextual
//!   disambiguation, but non-deterministic and allowed to fail).
//!
//! The two candidate records are merged under field-level priority rules,
//! repaired through domain derivations (available credit, reward closing
//! balance, minimum due), and validated into one [`StatementRecord`] where
//! every field is present and "unknown" is an explicit null.
//!
//! ## Example
//!
//! ```rust,ignore
//! use card_sense::{MemorySessionStore, Session, SessionStore, StatementPipeline};
//!
//! let store = MemorySessionStore::new();
//! let session = store.put(Session::new(statement_text, tables));
//!
//! let pipeline = StatementPipeline::new(model);
//! let session = pipeline.process_session(&store, &session.id).await?;
//! println!("{:?}", session.record);
//! ```

pub mod error;
pub mod llm;
pub mod patterns;
pub mod reconcile;
pub mod schema;
pub mod session;
pub mod tables;
pub mod validate;

pub use error::{CardSenseError, Result};
pub use llm::{CompletionError, CompletionModel, CompletionOptions, StatementAssistant, StatementExtractor};
#[cfg(feature = "gemini")]
pub use llm::GeminiClient;
pub use reconcile::{finalize, merge, reconcile};
pub use schema::{RewardPointsSummary, StatementRecord, Transaction};
pub use session::{MemorySessionStore, Session, SessionStore, SessionSummary, TableGrid};
pub use validate::Usable;

use std::sync::Arc;

use log::{debug, info};

/// The full extraction pipeline over one completion model.
///
/// Per document: pattern extraction runs first (synchronous, infallible),
/// the model call is the sole await point, and merge/finalize run after it
/// resolves. Model failure is absorbed by the extractor, so the pipeline
/// always completes with at least the pattern-matched data.
pub struct StatementPipeline<M> {
    extractor: StatementExtractor<M>,
}

impl<M: CompletionModel> StatementPipeline<M> {
    pub fn new(model: M) -> Self {
        Self {
            extractor: StatementExtractor::new(model),
        }
    }

    /// Reconciles one statement's raw text into a finished record.
    pub async fn extract(&self, raw_text: &str) -> Result<StatementRecord> {
        if raw_text.trim().is_empty() {
            return Err(CardSenseError::EmptyDocument);
        }

        let pattern_record = patterns::extract_statement_patterns(raw_text);
        debug!(
            "pattern pass recovered {} transactions",
            pattern_record.transactions.len()
        );

        let model_record = self.extractor.extract(raw_text).await;

        let record = reconcile::reconcile(model_record, pattern_record);
        info!(
            "reconciled statement record (bank: {:?}, {} transactions)",
            record.bank_name,
            record.transactions.len()
        );
        Ok(record)
    }

    /// Extracts the record for a stored session and attaches it atomically.
    pub async fn process_session<S: SessionStore>(
        &self,
        store: &S,
        session_id: &str,
    ) -> Result<Arc<Session>> {
        let session = store
            .get(session_id)
            .ok_or_else(|| CardSenseError::SessionNotFound(session_id.to_string()))?;

        let record = self.extract(&session.raw_text).await?;
        store.attach_record(session_id, record)
    }
}

/// Pattern-only extraction: the same finalized record shape, computed without
/// any model call. This is also what the full pipeline degrades to when the
/// model is unavailable.
pub fn extract_without_model(raw_text: &str) -> Result<StatementRecord> {
    if raw_text.trim().is_empty() {
        return Err(CardSenseError::EmptyDocument);
    }
    Ok(reconcile::finalize(patterns::extract_statement_patterns(
        raw_text,
    )))
}
