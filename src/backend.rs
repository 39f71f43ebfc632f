//! Generative backend capability and its Gemini implementation.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;
use url::Url;

use crate::client::BackendError;
use crate::config::BackendConfig;

/// Anything that accepts a prompt plus a response schema and returns JSON text.
#[async_trait]
pub trait GenerativeBackend: Send + Sync {
    async fn generate_json(&self, prompt: &str, schema: &Value) -> Result<String, BackendError>;
}

#[derive(Debug, Serialize)]
struct GenerateContentRequest<'a> {
    contents: Vec<RequestContent<'a>>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig<'a>,
}

#[derive(Debug, Serialize)]
struct RequestContent<'a> {
    role: &'static str,
    parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
struct GenerationConfig<'a> {
    #[serde(rename = "responseMimeType")]
    response_mime_type: &'static str,
    #[serde(rename = "responseSchema")]
    response_schema: &'a Value,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
    #[serde(rename = "finishReason")]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

fn build_request_body<'a>(
    prompt: &'a str,
    schema: &'a Value,
    temperature: f32,
) -> GenerateContentRequest<'a> {
    GenerateContentRequest {
        contents: vec![RequestContent {
            role: "user",
            parts: vec![RequestPart { text: prompt }],
        }],
        generation_config: GenerationConfig {
            response_mime_type: "application/json",
            response_schema: schema,
            temperature,
        },
    }
}

/// Concatenate the text parts of the first candidate.
fn extract_text(response: GenerateContentResponse) -> Option<String> {
    let candidate = response.candidates.into_iter().next()?;
    if let Some(reason) = &candidate.finish_reason {
        debug!(finish_reason = %reason, "candidate_finished");
    }
    let text: String = candidate
        .content?
        .parts
        .into_iter()
        .filter_map(|part| part.text)
        .collect();
    if text.trim().is_empty() {
        None
    } else {
        Some(text)
    }
}

fn build_url(endpoint: &str, model: &str) -> Result<Url> {
    let mut base = endpoint.to_string();
    if !base.ends_with('/') {
        base.push('/');
    }
    let base = Url::parse(&base).with_context(|| format!("Invalid endpoint URL: {}", endpoint))?;
    base.join(&format!("models/{}:generateContent", model))
        .with_context(|| format!("Failed to build URL for model: {}", model))
}

/// Google Gemini `generateContent` over HTTPS.
pub struct GeminiBackend {
    client: Client,
    url: Url,
    api_key: Option<String>,
    api_key_env: String,
    temperature: f32,
}

impl GeminiBackend {
    /// Build a backend from config. The key is resolved by the caller from the environment.
    pub fn new(config: &BackendConfig, api_key: Option<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("Failed to build HTTP client")?;
        let url = build_url(&config.endpoint, &config.model)?;
        Ok(Self {
            client,
            url,
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            api_key_env: config.api_key_env.clone(),
            temperature: config.temperature,
        })
    }
}

#[async_trait]
impl GenerativeBackend for GeminiBackend {
    async fn generate_json(&self, prompt: &str, schema: &Value) -> Result<String, BackendError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| BackendError::MissingApiKey(self.api_key_env.clone()))?;

        let body = build_request_body(prompt, schema, self.temperature);
        debug!(url = %self.url, "backend_request");

        let response = self
            .client
            .post(self.url.clone())
            .header("x-goog-api-key", api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        debug!(status = status.as_u16(), body_len = text.len(), "backend_response");

        if !status.is_success() {
            return Err(BackendError::Status {
                status: status.as_u16(),
                body: text,
            });
        }

        let parsed: GenerateContentResponse =
            serde_json::from_str(&text).map_err(BackendError::MalformedJson)?;
        extract_text(parsed).ok_or(BackendError::EmptyResponse)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};
    use tokio::task::JoinHandle;

    fn test_config() -> BackendConfig {
        BackendConfig::default()
    }

    #[test]
    fn test_build_url_default_endpoint() {
        let config = test_config();
        let url = build_url(&config.endpoint, "gemini-2.5-flash").unwrap();
        assert_eq!(
            url.as_str(),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.5-flash:generateContent"
        );
    }

    #[test]
    fn test_build_url_adds_trailing_slash() {
        let url = build_url("http://localhost:8080/v1beta", "m").unwrap();
        assert_eq!(url.as_str(), "http://localhost:8080/v1beta/models/m:generateContent");
    }

    #[test]
    fn test_build_url_rejects_garbage() {
        assert!(build_url("not a url", "m").is_err());
    }

    #[test]
    fn test_request_body_shape() {
        let schema = json!({"type": "OBJECT"});
        let body = build_request_body("hello", &schema, 0.3);
        let value = serde_json::to_value(&body).unwrap();

        assert_eq!(value["contents"][0]["role"], "user");
        assert_eq!(value["contents"][0]["parts"][0]["text"], "hello");
        assert_eq!(
            value["generationConfig"]["responseMimeType"],
            "application/json"
        );
        assert_eq!(value["generationConfig"]["responseSchema"], schema);
        let temperature = value["generationConfig"]["temperature"].as_f64().unwrap();
        assert!((temperature - 0.3).abs() < 1e-6);
    }

    #[test]
    fn test_extract_text_joins_parts() {
        let response: GenerateContentResponse = serde_json::from_value(json!({
            "candidates": [{
                "content": {"parts": [{"text": "{\"steps\":"}, {"text": "[]}"}], "role": "model"},
                "finishReason": "STOP"
            }],
            "usageMetadata": {"totalTokenCount": 10}
        }))
        .unwrap();
        assert_eq!(extract_text(response).as_deref(), Some("{\"steps\":[]}"));
    }

    #[test]
    fn test_extract_text_no_candidates() {
        let response: GenerateContentResponse =
            serde_json::from_value(json!({"promptFeedback": {"blockReason": "SAFETY"}})).unwrap();
        assert!(extract_text(response).is_none());
    }

    #[test]
    fn test_extract_text_blank_parts() {
        let response: GenerateContentResponse = serde_json::from_value(json!({
            "candidates": [{"content": {"parts": [{"text": "  "}]}}]
        }))
        .unwrap();
        assert!(extract_text(response).is_none());
    }

    #[tokio::test]
    async fn test_missing_api_key_fails_before_network() {
        let backend = GeminiBackend::new(&test_config(), None).unwrap();
        let err = backend
            .generate_json("prompt", &json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, BackendError::MissingApiKey(ref var) if var == "GEMINI_API_KEY"));
    }

    #[tokio::test]
    async fn test_blank_api_key_treated_as_missing() {
        let backend = GeminiBackend::new(&test_config(), Some("   ".to_string())).unwrap();
        assert!(matches!(
            backend.generate_json("prompt", &json!({})).await,
            Err(BackendError::MissingApiKey(_))
        ));
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_transport_error() {
        let mut config = test_config();
        // Port 9 (discard) on localhost is closed in test environments.
        config.endpoint = "http://127.0.0.1:9/v1beta/".to_string();
        config.timeout_secs = 2;
        let backend = GeminiBackend::new(&config, Some("key".to_string())).unwrap();
        assert!(matches!(
            backend.generate_json("prompt", &json!({})).await,
            Err(BackendError::Transport(_))
        ));
    }

    /// Read one HTTP request: headers plus a `Content-Length` body.
    async fn read_request(socket: &mut TcpStream) -> String {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 4096];
        loop {
            let n = socket.read(&mut chunk).await.unwrap();
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);
            if let Some(end) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
                let headers = String::from_utf8_lossy(&buf[..end]).to_lowercase();
                let body_len = headers
                    .lines()
                    .find_map(|line| line.strip_prefix("content-length:"))
                    .and_then(|v| v.trim().parse::<usize>().ok())
                    .unwrap_or(0);
                if buf.len() >= end + 4 + body_len {
                    break;
                }
            }
        }
        String::from_utf8_lossy(&buf).into_owned()
    }

    /// Serve a single canned response on localhost. The handle yields the raw request.
    async fn serve_once(status_line: &'static str, body: &'static str) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let request = read_request(&mut socket).await;
            let response = format!(
                "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status_line,
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            let _ = socket.shutdown().await;
            request
        });
        (format!("http://{}/v1beta/", addr), handle)
    }

    fn local_backend(endpoint: String) -> GeminiBackend {
        let config = BackendConfig {
            endpoint,
            timeout_secs: 5,
            ..test_config()
        };
        GeminiBackend::new(&config, Some("test-key".to_string())).unwrap()
    }

    #[tokio::test]
    async fn test_success_returns_candidate_text() {
        let (endpoint, server) = serve_once(
            "200 OK",
            r#"{"candidates":[{"content":{"parts":[{"text":"{\"steps\":"},{"text":"[]}"}],"role":"model"},"finishReason":"STOP"}]}"#,
        )
        .await;
        let backend = local_backend(endpoint);

        let text = backend
            .generate_json("hello prompt", &json!({"type": "OBJECT"}))
            .await
            .unwrap();

        assert_eq!(text, "{\"steps\":[]}");
        let request = server.await.unwrap();
        assert!(request.starts_with("POST /v1beta/models/gemini-2.5-flash:generateContent"));
        assert!(request.to_lowercase().contains("x-goog-api-key: test-key"));
        assert!(request.contains("hello prompt"));
        assert!(request.contains("responseSchema"));
    }

    #[tokio::test]
    async fn test_error_status_keeps_code_and_body() {
        let (endpoint, server) = serve_once("500 Internal Server Error", r#"{"error":1}"#).await;
        let backend = local_backend(endpoint);

        let err = backend
            .generate_json("prompt", &json!({}))
            .await
            .unwrap_err();

        match err {
            BackendError::Status { status, body } => {
                assert_eq!(status, 500);
                assert_eq!(body, r#"{"error":1}"#);
            }
            other => panic!("expected status error, got {:?}", other),
        }
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_non_json_envelope_is_malformed() {
        let (endpoint, server) = serve_once("200 OK", "definitely not json").await;
        let backend = local_backend(endpoint);

        assert!(matches!(
            backend.generate_json("prompt", &json!({})).await,
            Err(BackendError::MalformedJson(_))
        ));
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_envelope_without_candidates_is_empty_response() {
        let (endpoint, server) =
            serve_once("200 OK", r#"{"promptFeedback":{"blockReason":"SAFETY"}}"#).await;
        let backend = local_backend(endpoint);

        assert!(matches!(
            backend.generate_json("prompt", &json!({})).await,
            Err(BackendError::EmptyResponse)
        ));
        server.await.unwrap();
    }
}
