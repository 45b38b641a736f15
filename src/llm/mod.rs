pub mod assistant;
pub mod client;
pub mod extractor;
pub mod json;
pub mod prompts;

pub use assistant::StatementAssistant;
#[cfg(feature = "gemini")]
pub use client::GeminiClient;
pub use client::{CompletionError, CompletionModel, CompletionOptions};
pub use extractor::StatementExtractor;
