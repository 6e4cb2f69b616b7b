use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::{config::Config, error::Error};

/// Turns a day's transcript into prose.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Summarizer {
    async fn summarize(&self, transcript: &str, date: NaiveDate) -> Result<String, Error>;
}

/// Instructions sent along with the transcript.
pub fn summary_prompt(transcript: &str, date: NaiveDate) -> String {
    format!(
        "Below are the titles of the windows I had in focus on {date}, in chronological order.\n\
         Write a structured daily note from them.\n\
         Group the activities by category (for example Coding, Browsing, Communication, Research) \
         and infer which projects or tasks I was working on.\n\
         Add a \"Highlights\" section and, if the data allows it, a short chronological timeline.\n\
         Answer in clean Markdown suitable for keeping as a daily note.\n\
         \n\
         Raw logs:\n\
         {transcript}\n"
    )
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    contents: [RequestContent<'a>; 1],
}

#[derive(Serialize)]
struct RequestContent<'a> {
    parts: [RequestPart<'a>; 1],
}

#[derive(Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Deserialize, Default)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<ResponseContent>,
}

#[derive(Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

impl GenerateResponse {
    /// Text of the first candidate. Gemini may split it into several parts.
    fn text(self) -> Option<String> {
        let content = self.candidates.into_iter().next()?.content?;
        let text = content
            .parts
            .into_iter()
            .filter_map(|v| v.text)
            .collect::<String>();
        (!text.trim().is_empty()).then_some(text)
    }
}

/// [Summarizer] backed by the Gemini `generateContent` endpoint.
pub struct GeminiSummarizer {
    api_key: Option<String>,
    endpoint: String,
    request_timeout: Duration,
}

impl GeminiSummarizer {
    /// Nothing is checked or built here. The key and the HTTP client only matter once a summary
    /// is requested, so raw exports never depend on them.
    pub fn new(config: &Config) -> Self {
        Self {
            api_key: config.api_key.clone(),
            endpoint: format!(
                "{}/v1beta/models/{}:generateContent",
                config.api_base, config.model
            ),
            request_timeout: config.request_timeout,
        }
    }

    fn client(&self) -> Result<reqwest::Client, Error> {
        reqwest::Client::builder()
            .timeout(self.request_timeout)
            .build()
            .map_err(|e| Error::SummarizationFailed(format!("couldn't create HTTP client: {e}")))
    }
}

#[async_trait]
impl Summarizer for GeminiSummarizer {
    #[instrument(skip_all, fields(%date))]
    async fn summarize(&self, transcript: &str, date: NaiveDate) -> Result<String, Error> {
        let Some(api_key) = self.api_key.as_deref() else {
            return Err(Error::SummarizationUnavailable);
        };

        let prompt = summary_prompt(transcript, date);
        let request = GenerateRequest {
            contents: [RequestContent {
                parts: [RequestPart { text: &prompt }],
            }],
        };

        debug!("Sending {} bytes to {}", prompt.len(), self.endpoint);
        let response = self
            .client()?
            .post(&self.endpoint)
            .header("x-goog-api-key", api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::SummarizationFailed(format!("request to Gemini failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::SummarizationFailed(format!(
                "Gemini answered {status}: {body}"
            )));
        }

        response
            .json::<GenerateResponse>()
            .await
            .map_err(|e| Error::SummarizationFailed(format!("unreadable Gemini response: {e}")))?
            .text()
            .ok_or_else(|| Error::SummarizationFailed("Gemini response contained no text".into()))
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use anyhow::Result;
    use chrono::NaiveDate;
    use serde_json::json;
    use wiremock::{
        matchers::{body_string_contains, header, method, path},
        Mock, MockServer, ResponseTemplate,
    };

    use crate::{
        config::{Config, API_BASE_VAR, API_KEY_VAR},
        error::Error,
    };

    use super::{summary_prompt, GeminiSummarizer, Summarizer};

    const ENDPOINT: &str = "/v1beta/models/gemini-2.5-flash:generateContent";

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
    }

    fn summarizer(server: &MockServer, api_key: Option<&str>) -> Result<GeminiSummarizer> {
        let base = server.uri();
        let config = Config::from_lookup(
            |name| match name {
                API_BASE_VAR => Some(base.clone()),
                API_KEY_VAR => api_key.map(String::from),
                _ => None,
            },
            Path::new("/opt/daynote/bin"),
        )?;
        Ok(GeminiSummarizer::new(&config))
    }

    #[test]
    fn prompt_carries_date_and_transcript() {
        let prompt = summary_prompt("[2024-01-01 09:00:00] Editor", date());
        assert!(prompt.contains("2024-01-01"));
        assert!(prompt.contains("Highlights"));
        assert!(prompt.contains("Markdown"));
        assert!(prompt.ends_with("[2024-01-01 09:00:00] Editor\n"));
    }

    #[tokio::test]
    async fn returns_generated_text() -> Result<()> {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(ENDPOINT))
            .and(header("x-goog-api-key", "test-key"))
            .and(body_string_contains("[2024-01-01 09:00:00] Editor"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "candidates": [{
                    "content": {
                        "role": "model",
                        "parts": [{ "text": "# Daily note" }, { "text": "\n- coding" }]
                    }
                }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let text = summarizer(&server, Some("test-key"))?
            .summarize("[2024-01-01 09:00:00] Editor", date())
            .await?;

        assert_eq!(text, "# Daily note\n- coding");
        Ok(())
    }

    #[tokio::test]
    async fn missing_key_never_reaches_network() -> Result<()> {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let result = summarizer(&server, None)?
            .summarize("[2024-01-01 09:00:00] Editor", date())
            .await;

        assert!(matches!(result, Err(Error::SummarizationUnavailable)));
        Ok(())
    }

    #[tokio::test]
    async fn server_error_fails() -> Result<()> {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
            .expect(1)
            .mount(&server)
            .await;

        let result = summarizer(&server, Some("test-key"))?
            .summarize("[2024-01-01 09:00:00] Editor", date())
            .await;

        match result {
            Err(Error::SummarizationFailed(message)) => assert!(message.contains("overloaded")),
            other => panic!("unexpected result {other:?}"),
        }
        Ok(())
    }

    #[tokio::test]
    async fn response_without_text_fails() -> Result<()> {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "candidates": [] })))
            .mount(&server)
            .await;

        let result = summarizer(&server, Some("test-key"))?
            .summarize("[2024-01-01 09:00:00] Editor", date())
            .await;

        assert!(matches!(result, Err(Error::SummarizationFailed(_))));
        Ok(())
    }
}
