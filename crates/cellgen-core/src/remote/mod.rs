//! Network-backed compute backends.

pub mod http;
pub mod libretranslate;
pub mod openai;

pub use http::{DEFAULT_MAX_RETRIES, DEFAULT_TIMEOUT, HttpClient};
pub use libretranslate::{HttpTranslator, LIBRETRANSLATE_API_BASE};
pub use openai::{DEFAULT_MODEL, OPENAI_API_BASE, OpenAiCompleter};

use cellgen_engine::compute::{Completer, ComputeError, Translator};

/// Translation through LibreTranslate, completion through an OpenAI-compatible API.
pub struct RemoteBackend {
    translator: HttpTranslator,
    completer: Option<OpenAiCompleter>,
}

impl RemoteBackend {
    pub fn new(translator: HttpTranslator, completer: Option<OpenAiCompleter>) -> Self {
        Self {
            translator,
            completer,
        }
    }
}

impl Translator for RemoteBackend {
    fn translate(
        &self,
        text: &str,
        source_language: &str,
        target_language: &str,
    ) -> Result<String, ComputeError> {
        self.translator
            .translate(text, source_language, target_language)
    }
}

impl Completer for RemoteBackend {
    fn complete(&self, prompt: &str) -> Result<String, ComputeError> {
        match &self.completer {
            Some(completer) => completer.complete(prompt),
            None => Err(ComputeError::Unavailable(
                "no LLM API key configured".to_string(),
            )),
        }
    }
}
