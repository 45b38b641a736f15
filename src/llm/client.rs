//! The narrow completion interface the extraction pipeline depends on, plus
//! the Gemini-backed implementation behind the `gemini` feature.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CompletionError {
    /// The call failed in a way a retry might fix: network trouble, rate
    /// limiting, a 5xx from the provider.
    #[error("Transient completion failure: {0}")]
    Transient(String),

    /// The call can never succeed as configured: bad credentials, unknown
    /// model, malformed request.
    #[error("Completion configuration error: {0}")]
    Config(String),
}

/// Decoding settings for one completion call.
#[derive(Debug, Clone)]
pub struct CompletionOptions {
    pub temperature: f32,
    pub max_output_tokens: u32,
}

impl CompletionOptions {
    /// Low temperature biases toward deterministic extraction over creative
    /// variation; the token ceiling leaves room for a full transaction list.
    pub fn extraction() -> Self {
        Self {
            temperature: 0.1,
            max_output_tokens: 8192,
        }
    }

    pub fn chat() -> Self {
        Self {
            temperature: 0.4,
            max_output_tokens: 2048,
        }
    }
}

/// An opaque text-completion function. The reconciliation pipeline treats any
/// failure as "no enhancement available", never as a hard stop.
pub trait CompletionModel {
    fn complete(
        &self,
        prompt: &str,
        options: &CompletionOptions,
    ) -> impl std::future::Future<Output = Result<String, CompletionError>> + Send;
}

#[cfg(feature = "gemini")]
pub use gemini::GeminiClient;

#[cfg(feature = "gemini")]
mod gemini {
    use super::{CompletionError, CompletionModel, CompletionOptions};
    use reqwest::Client;
    use serde_json::json;

    const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
    const DEFAULT_MODEL: &str = "gemini-2.0-flash-exp";

    #[derive(Clone)]
    pub struct GeminiClient {
        client: Client,
        api_key: String,
        model: String,
        base_url: String,
    }

    impl GeminiClient {
        pub fn new(api_key: impl Into<String>) -> Self {
            Self {
                client: Client::new(),
                api_key: api_key.into(),
                model: DEFAULT_MODEL.to_string(),
                base_url: GEMINI_BASE_URL.to_string(),
            }
        }

        pub fn with_model(mut self, model: impl Into<String>) -> Self {
            self.model = model.into();
            self
        }
    }

    impl CompletionModel for GeminiClient {
        async fn complete(
            &self,
            prompt: &str,
            options: &CompletionOptions,
        ) -> Result<String, CompletionError> {
            if self.api_key.is_empty() {
                return Err(CompletionError::Config("missing API key".to_string()));
            }

            let url = format!(
                "{}/models/{}:generateContent?key={}",
                self.base_url, self.model, self.api_key
            );

            let payload = json!({
                "contents": [{ "parts": [{ "text": prompt }] }],
                "generationConfig": {
                    "temperature": options.temperature,
                    "maxOutputTokens": options.max_output_tokens,
                }
            });

            let res = self
                .client
                .post(&url)
                .json(&payload)
                .send()
                .await
                .map_err(|e| CompletionError::Transient(e.to_string()))?;

            let status = res.status();
            if !status.is_success() {
                let body = res.text().await.unwrap_or_default();
                let message = format!("Gemini API error (status {}): {}", status, body);
                return if status.as_u16() == 401 || status.as_u16() == 403 || status.as_u16() == 404
                {
                    Err(CompletionError::Config(message))
                } else {
                    Err(CompletionError::Transient(message))
                };
            }

            let body: serde_json::Value = res
                .json()
                .await
                .map_err(|e| CompletionError::Transient(e.to_string()))?;

            body.pointer("/candidates/0/content/parts/0/text")
                .and_then(|v| v.as_str())
                .map(|s| s.to_string())
                .ok_or_else(|| {
                    CompletionError::Transient("no text candidate in response".to_string())
                })
        }
    }
}
