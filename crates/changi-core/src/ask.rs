use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header::CONTENT_TYPE, Client, StatusCode};
use serde::Deserialize;
use thiserror::Error;

/// Everything that can go wrong between sending a question and holding an answer
#[derive(Debug, Error)]
pub enum AskError {
    #[error("request to Q&A backend failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("Q&A backend returned status {0}")]
    Status(StatusCode),
    #[error("Q&A backend returned an unreadable body: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Anything that can answer a single question
#[async_trait]
pub trait AskBackend: Send + Sync {
    async fn ask(&self, question: &str) -> Result<String, AskError>;
}

#[derive(Deserialize)]
struct AskResponse {
    answer: String,
}

#[derive(Deserialize)]
struct HealthResponse {
    status: String,
}

/// Backend self-report from `GET /health`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Health {
    Healthy,
    Unhealthy,
}

#[derive(Clone)]
pub struct AskClient {
    client: Client,
    base_url: String,
}

impl AskClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Same as `new`, but every request gives up after `timeout`
    pub fn with_timeout(base_url: &str, timeout: Duration) -> Result<Self, AskError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn health(&self) -> Result<Health, AskError> {
        let url = format!("{}/health", self.base_url);

        let response = self.client.get(&url).send().await?;

        if !response.status().is_success() {
            return Err(AskError::Status(response.status()));
        }

        let body = response.text().await?;
        let health: HealthResponse = serde_json::from_str(&body)?;
        Ok(if health.status == "healthy" {
            Health::Healthy
        } else {
            Health::Unhealthy
        })
    }
}

/// Form body exactly as the browser widget sent it: `question=<percent-encoded>`
pub fn form_body(question: &str) -> String {
    format!("question={}", urlencoding::encode(question))
}

#[async_trait]
impl AskBackend for AskClient {
    async fn ask(&self, question: &str) -> Result<String, AskError> {
        let url = format!("{}/ask", self.base_url);

        let response = self
            .client
            .post(&url)
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(form_body(question))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(AskError::Status(response.status()));
        }

        // Read as text first so a non-JSON body surfaces as Decode, not Transport
        let body = response.text().await?;
        let parsed: AskResponse = serde_json::from_str(&body)?;
        Ok(parsed.answer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_string, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_form_body_percent_encodes() {
        assert_eq!(
            form_body("Which terminals exist?"),
            "question=Which%20terminals%20exist%3F"
        );
        assert_eq!(form_body("a&b=c"), "question=a%26b%3Dc");
        assert_eq!(form_body("Jewel"), "question=Jewel");
    }

    #[test]
    fn test_form_body_utf8() {
        assert_eq!(form_body("1–4"), "question=1%E2%80%934");
    }

    #[test]
    fn test_trailing_slash_trimmed() {
        let client = AskClient::new("http://localhost:8000/");
        assert_eq!(client.base_url(), "http://localhost:8000");
    }

    #[tokio::test]
    async fn test_ask_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/ask"))
            .and(header("content-type", "application/x-www-form-urlencoded"))
            .and(body_string("question=Which%20terminals%20exist%3F"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "answer": "Changi Airport has Terminals 1–4."
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = AskClient::new(&server.uri());
        let answer = client.ask("Which terminals exist?").await.unwrap();
        assert_eq!(answer, "Changi Airport has Terminals 1–4.");
    }

    #[tokio::test]
    async fn test_ask_server_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/ask"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let client = AskClient::new(&server.uri());
        let err = client.ask("anything").await.unwrap_err();
        assert!(matches!(err, AskError::Status(StatusCode::INTERNAL_SERVER_ERROR)));
    }

    #[tokio::test]
    async fn test_ask_not_json() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/ask"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let client = AskClient::new(&server.uri());
        let err = client.ask("anything").await.unwrap_err();
        assert!(matches!(err, AskError::Decode(_)));
    }

    #[tokio::test]
    async fn test_ask_missing_answer_field() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/ask"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({ "detail": "x" })),
            )
            .mount(&server)
            .await;

        let client = AskClient::new(&server.uri());
        let err = client.ask("anything").await.unwrap_err();
        assert!(matches!(err, AskError::Decode(_)));
    }

    #[tokio::test]
    async fn test_ask_unreachable() {
        // Nothing listens on port 9 of localhost in the test environment
        let client = AskClient::new("http://127.0.0.1:9");
        let err = client.ask("anything").await.unwrap_err();
        assert!(matches!(err, AskError::Transport(_)));
    }

    #[tokio::test]
    async fn test_health() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/health"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({ "status": "unhealthy" })),
            )
            .mount(&server)
            .await;

        let client = AskClient::new(&server.uri());
        assert_eq!(client.health().await.unwrap(), Health::Unhealthy);
    }
}
