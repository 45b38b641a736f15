//! The LLM extraction pass: prompt, completion call, JSON recovery.

use log::{debug, warn};

use crate::llm::client::{CompletionModel, CompletionOptions};
use crate::llm::{json, prompts};
use crate::schema::StatementRecord;

/// Runs the structured-extraction call against a completion model and turns
/// the response into a candidate record.
///
/// This stage never fails: a dead model, an error response, or unparseable
/// output all degrade to [`StatementRecord::fallback`], which the merge then
/// fills from pattern data alone.
pub struct StatementExtractor<M> {
    model: M,
}

impl<M: CompletionModel> StatementExtractor<M> {
    pub fn new(model: M) -> Self {
        Self { model }
    }

    pub async fn extract(&self, statement_text: &str) -> StatementRecord {
        let prompt = prompts::build_extraction_prompt(statement_text);

        let response = match self
            .model
            .complete(&prompt, &CompletionOptions::extraction())
            .await
        {
            Ok(response) => response,
            Err(err) => {
                warn!("completion call failed, continuing without model data: {}", err);
                return StatementRecord::fallback();
            }
        };

        match json::recover_json(&response) {
            Some(value) => {
                let record = StatementRecord::from_loose_json(&value);
                debug!(
                    "model extraction produced {} transactions",
                    record.transactions.len()
                );
                record
            }
            None => {
                warn!("no JSON recoverable from model response, using null record");
                StatementRecord::fallback()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::client::CompletionError;

    struct FixedModel(&'static str);

    impl CompletionModel for FixedModel {
        async fn complete(
            &self,
            _prompt: &str,
            _options: &CompletionOptions,
        ) -> Result<String, CompletionError> {
            Ok(self.0.to_string())
        }
    }

    struct FailingModel;

    impl CompletionModel for FailingModel {
        async fn complete(
            &self,
            _prompt: &str,
            _options: &CompletionOptions,
        ) -> Result<String, CompletionError> {
            Err(CompletionError::Transient("connection reset".to_string()))
        }
    }

    #[tokio::test]
    async fn test_extracts_record_from_json_response() {
        let extractor = StatementExtractor::new(FixedModel(
            r#"{"customer_name": "John Doe", "total_amount_due": 12000, "transactions": []}"#,
        ));
        let record = extractor.extract("some statement").await;
        assert_eq!(record.customer_name.as_deref(), Some("John Doe"));
        assert_eq!(record.total_amount_due, Some(12000.0));
    }

    #[tokio::test]
    async fn test_prose_response_degrades_to_fallback() {
        let extractor =
            StatementExtractor::new(FixedModel("Sorry, I can't read this statement."));
        let record = extractor.extract("some statement").await;
        assert_eq!(record, StatementRecord::fallback());
    }

    #[tokio::test]
    async fn test_model_failure_degrades_to_fallback() {
        let extractor = StatementExtractor::new(FailingModel);
        let record = extractor.extract("some statement").await;
        assert_eq!(record, StatementRecord::fallback());
    }
}
