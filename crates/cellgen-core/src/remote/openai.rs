//! Completer backed by an OpenAI-compatible chat completions API.

use cellgen_engine::compute::{Completer, ComputeError};
use tracing::debug;

use super::http::HttpClient;

pub const OPENAI_API_BASE: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

pub struct OpenAiCompleter {
    client: HttpClient,
    endpoint: String,
    model: String,
    api_key: String,
}

impl OpenAiCompleter {
    pub fn new(client: HttpClient, endpoint: &str, model: &str, api_key: String) -> Self {
        Self {
            client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            model: model.to_string(),
            api_key,
        }
    }
}

impl Completer for OpenAiCompleter {
    fn complete(&self, prompt: &str) -> Result<String, ComputeError> {
        let url = format!("{}/chat/completions", self.endpoint);
        let body = serde_json::json!({
            "model": self.model,
            "messages": [{"role": "user", "content": prompt}],
        });

        debug!(model = %self.model, chars = prompt.len(), "complete");
        let json = self
            .client
            .send_json(|http| http.post(&url).bearer_auth(&self.api_key).json(&body))?;

        json["choices"][0]["message"]["content"]
            .as_str()
            .map(|s| s.trim().to_string())
            .ok_or_else(|| ComputeError::Parse("missing choices[0].message.content".to_string()))
    }
}
