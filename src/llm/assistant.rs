//! Question answering over a processed statement session.

use crate::error::Result;
use crate::llm::client::{CompletionModel, CompletionOptions};
use crate::llm::prompts;
use crate::session::Session;

pub struct StatementAssistant<M> {
    model: M,
}

impl<M: CompletionModel> StatementAssistant<M> {
    pub fn new(model: M) -> Self {
        Self { model }
    }

    /// Answers a question about one session's statement. The reconciled
    /// record (when attached) is the primary context, with a bounded slice
    /// of raw text as backup. Unlike extraction, a completion failure here
    /// is surfaced: there is no degraded answer worth returning.
    pub async fn ask(&self, session: &Session, question: &str) -> Result<String> {
        let record_json = match &session.record {
            Some(record) => serde_json::to_string_pretty(record)?,
            None => "{}".to_string(),
        };

        let prompt = prompts::build_chat_prompt(&record_json, &session.raw_text, question);
        let answer = self
            .model
            .complete(&prompt, &CompletionOptions::chat())
            .await?;
        Ok(answer)
    }
}
