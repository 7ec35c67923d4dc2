//! External computation shim.
//!
//! Computed fields call out to two services: a translator and a text
//! completion model. Both sit behind traits so the host can hand in a remote
//! implementation in production and [`StubBackend`] in tests. Backends are
//! passed explicitly; there is no process-wide test switch.

use thiserror::Error;

/// Failure of an external translation or completion call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ComputeError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Backend unavailable: {0}")]
    Unavailable(String),
}

/// Translates text between two language tags (e.g. `en` to `fr`).
pub trait Translator {
    fn translate(
        &self,
        text: &str,
        source_language: &str,
        target_language: &str,
    ) -> Result<String, ComputeError>;
}

/// Completes a fully expanded prompt.
pub trait Completer {
    fn complete(&self, prompt: &str) -> Result<String, ComputeError>;
}

/// Everything a computed field may call.
pub trait ComputeBackend: Translator + Completer {}

impl<T: Translator + Completer + ?Sized> ComputeBackend for T {}

/// Deterministic stand-in for both services.
///
/// Output encodes every input so tests can assert exact strings:
/// `translation (en to fr): Hello` and `chatgpt: <prompt>`.
#[derive(Clone, Copy, Debug, Default)]
pub struct StubBackend;

impl Translator for StubBackend {
    fn translate(
        &self,
        text: &str,
        source_language: &str,
        target_language: &str,
    ) -> Result<String, ComputeError> {
        Ok(format!(
            "translation ({} to {}): {}",
            source_language, target_language, text
        ))
    }
}

impl Completer for StubBackend {
    fn complete(&self, prompt: &str) -> Result<String, ComputeError> {
        Ok(format!("chatgpt: {}", prompt))
    }
}
