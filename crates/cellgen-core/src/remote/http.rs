//! Shared blocking HTTP client for the remote backends.
//!
//! Blocking reqwest client (no Tokio runtime required), with a request
//! timeout and bounded retry + exponential backoff on 429/5xx and transport
//! errors. Other 4xx responses fail immediately.

use std::thread;
use std::time::Duration;

use cellgen_engine::compute::ComputeError;
use tracing::warn;

/// Default request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default number of retries after the first attempt.
pub const DEFAULT_MAX_RETRIES: u32 = 2;

const INITIAL_BACKOFF: Duration = Duration::from_millis(500);

#[derive(Clone, Debug)]
pub struct HttpClient {
    http: reqwest::blocking::Client,
    service: &'static str,
    max_retries: u32,
    backoff: Duration,
}

impl HttpClient {
    pub fn new(service: &'static str, timeout: Duration, max_retries: u32) -> Result<Self, ComputeError> {
        let http = reqwest::blocking::Client::builder()
            .user_agent(format!("cellgen/{}", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .map_err(|e| ComputeError::Unavailable(format!("{} client: {}", service, e)))?;

        Ok(Self {
            http,
            service,
            max_retries,
            backoff: INITIAL_BACKOFF,
        })
    }

    /// Delay before the first retry; doubles on every further attempt.
    pub fn with_backoff(mut self, backoff: Duration) -> Self {
        self.backoff = backoff;
        self
    }

    /// Send a request with retry and return the parsed JSON body.
    ///
    /// `build_request` is called once per attempt and must return a fully
    /// configured `RequestBuilder` (URL, auth, body).
    pub fn send_json(
        &self,
        build_request: impl Fn(&reqwest::blocking::Client) -> reqwest::blocking::RequestBuilder,
    ) -> Result<serde_json::Value, ComputeError> {
        let mut backoff = self.backoff;
        let mut attempt = 0;

        loop {
            let retryable = match build_request(&self.http).send() {
                Ok(resp) => {
                    let status = resp.status().as_u16();
                    if resp.status().is_success() {
                        return resp.json::<serde_json::Value>().map_err(|e| {
                            ComputeError::Parse(format!("{} response: {}", self.service, e))
                        });
                    }

                    let body: serde_json::Value = resp.json().unwrap_or(serde_json::Value::Null);
                    let error = ComputeError::Http {
                        status,
                        message: error_message(&body),
                    };
                    if status != 429 && status < 500 {
                        return Err(error);
                    }
                    error
                }
                Err(e) => ComputeError::Network(format!("{}: {}", self.service, e)),
            };

            if attempt >= self.max_retries {
                return Err(retryable);
            }
            attempt += 1;
            warn!(
                service = self.service,
                attempt,
                max_retries = self.max_retries,
                error = %retryable,
                "retrying request"
            );
            thread::sleep(backoff);
            backoff *= 2;
        }
    }
}

/// Pull a human-readable message out of an error body.
/// Handles `{"error": "..."}`, `{"error": {"message": "..."}}` and `{"message": "..."}`.
fn error_message(body: &serde_json::Value) -> String {
    body["error"]["message"]
        .as_str()
        .or_else(|| body["error"].as_str())
        .or_else(|| body["message"].as_str())
        .unwrap_or("no error message")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    fn client(max_retries: u32) -> HttpClient {
        HttpClient::new("test", Duration::from_secs(5), max_retries)
            .unwrap()
            .with_backoff(Duration::ZERO)
    }

    #[test]
    fn test_error_message_shapes() {
        let nested = serde_json::json!({"error": {"message": "bad key"}});
        assert_eq!(error_message(&nested), "bad key");
        let flat = serde_json::json!({"error": "Invalid request"});
        assert_eq!(error_message(&flat), "Invalid request");
        assert_eq!(error_message(&serde_json::Value::Null), "no error message");
    }

    #[test]
    fn test_retries_server_errors_then_gives_up() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST).path("/x");
            then.status(503).json_body(serde_json::json!({"error": "down"}));
        });

        let url = server.url("/x");
        let result = client(2).send_json(|http| http.post(&url));

        assert_eq!(
            result.unwrap_err(),
            ComputeError::Http {
                status: 503,
                message: "down".to_string()
            }
        );
        mock.assert_hits(3);
    }

    #[test]
    fn test_client_errors_are_not_retried() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST).path("/x");
            then.status(401)
                .json_body(serde_json::json!({"error": {"message": "Incorrect API key"}}));
        });

        let url = server.url("/x");
        let result = client(2).send_json(|http| http.post(&url));

        assert!(matches!(result, Err(ComputeError::Http { status: 401, .. })));
        mock.assert_hits(1);
    }

    #[test]
    fn test_non_json_success_is_a_parse_error() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/x");
            then.status(200).body("not json");
        });

        let url = server.url("/x");
        let result = client(0).send_json(|http| http.post(&url));
        assert!(matches!(result, Err(ComputeError::Parse(_))));
    }
}
