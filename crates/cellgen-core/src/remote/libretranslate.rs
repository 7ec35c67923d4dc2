//! Translator backed by a LibreTranslate-compatible JSON API.

use cellgen_engine::compute::{ComputeError, Translator};
use tracing::debug;

use super::http::HttpClient;

pub const LIBRETRANSLATE_API_BASE: &str = "https://libretranslate.com";

pub struct HttpTranslator {
    client: HttpClient,
    endpoint: String,
    api_key: Option<String>,
}

impl HttpTranslator {
    pub fn new(client: HttpClient, endpoint: &str, api_key: Option<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            api_key,
        }
    }
}

impl Translator for HttpTranslator {
    fn translate(
        &self,
        text: &str,
        source_language: &str,
        target_language: &str,
    ) -> Result<String, ComputeError> {
        // Nothing to translate; skip the round-trip.
        if text.is_empty() {
            return Ok(String::new());
        }

        let url = format!("{}/translate", self.endpoint);
        let mut body = serde_json::json!({
            "q": text,
            "source": source_language,
            "target": target_language,
            "format": "text",
        });
        if let Some(key) = &self.api_key {
            body["api_key"] = serde_json::Value::String(key.clone());
        }

        debug!(source = source_language, target = target_language, chars = text.len(), "translate");
        let json = self.client.send_json(|http| http.post(&url).json(&body))?;

        json["translatedText"]
            .as_str()
            .map(String::from)
            .ok_or_else(|| ComputeError::Parse("missing translatedText in response".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use std::time::Duration;

    fn translator(server: &MockServer, api_key: Option<&str>) -> HttpTranslator {
        let client = HttpClient::new("LibreTranslate", Duration::from_secs(5), 0).unwrap();
        HttpTranslator::new(client, &server.base_url(), api_key.map(String::from))
    }

    #[test]
    fn test_translate_posts_languages_and_text() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST).path("/translate").json_body(serde_json::json!({
                "q": "Hello",
                "source": "en",
                "target": "fr",
                "format": "text",
                "api_key": "k",
            }));
            then.status(200)
                .json_body(serde_json::json!({"translatedText": "Bonjour"}));
        });

        let out = translator(&server, Some("k")).translate("Hello", "en", "fr").unwrap();
        assert_eq!(out, "Bonjour");
        mock.assert();
    }

    #[test]
    fn test_empty_text_skips_request() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST).path("/translate");
            then.status(200)
                .json_body(serde_json::json!({"translatedText": "?"}));
        });

        let out = translator(&server, None).translate("", "en", "fr").unwrap();
        assert_eq!(out, "");
        mock.assert_hits(0);
    }

    #[test]
    fn test_missing_field_is_a_parse_error() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/translate");
            then.status(200).json_body(serde_json::json!({"detected": "en"}));
        });

        let result = translator(&server, None).translate("Hello", "auto", "fr");
        assert!(matches!(result, Err(ComputeError::Parse(_))));
    }
}
