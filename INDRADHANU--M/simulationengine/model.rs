use std::{
    collections::VecDeque,
    sync::atomic::{AtomicUsize, Ordering},
    time::Duration,
};

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use parking_lot::Mutex;
use reqwest::Client;
use serde::{Deserialize, Serialize};

/// Failures raised while talking to a generative model.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UpstreamError {
    /// Connection, timeout or decoding failure.
    #[error("transport error: {0}")]
    Transport(String),
    /// Non-success HTTP status.
    #[error("upstream returned status {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body, truncated.
        body: String,
    },
    /// Response carried no candidate content.
    #[error("upstream returned no candidates")]
    EmptyCandidates,
    /// No model is reachable or configured.
    #[error("generative model unavailable: {0}")]
    Unavailable(String),
}

impl From<reqwest::Error> for UpstreamError {
    fn from(err: reqwest::Error) -> Self {
        Self::Transport(err.to_string())
    }
}

/// Narrow seam over a text-generation backend.
#[async_trait]
pub trait ForecastModel: Send + Sync {
    /// Sends a single prompt and returns the raw text reply.
    async fn generate(&self, prompt: &str) -> Result<String, UpstreamError>;

    /// Label used in logs and events.
    fn name(&self) -> &str;
}

/// Connection settings for [`GeminiModel`].
#[derive(Debug, Clone)]
pub struct GeminiSettings {
    /// API base, e.g. `https://generativelanguage.googleapis.com/v1beta`.
    pub endpoint: String,
    /// Model identifier.
    pub model: String,
    /// API key sent in the `x-goog-api-key` header.
    pub api_key: String,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl GeminiSettings {
    /// Settings for the public endpoint with a 30 second timeout.
    #[must_use]
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            endpoint: "https://generativelanguage.googleapis.com/v1beta".into(),
            model: "gemini-2.5-flash-lite".into(),
            api_key: api_key.into(),
            timeout: Duration::from_secs(30),
        }
    }
}

/// Google Gemini `generateContent` client.
pub struct GeminiModel {
    client: Client,
    url: String,
    model: String,
    api_key: String,
}

impl GeminiModel {
    /// Builds a client; the timeout must be non-zero.
    pub fn new(settings: GeminiSettings) -> Result<Self> {
        if settings.timeout.is_zero() {
            bail!("gemini timeout must be greater than zero");
        }
        if settings.model.trim().is_empty() {
            bail!("gemini model name is empty");
        }
        let client = Client::builder()
            .user_agent("indradhanu-simulation/0.1")
            .timeout(settings.timeout)
            .build()
            .context("building gemini http client")?;
        let url = format!(
            "{}/models/{}:generateContent",
            settings.endpoint.trim_end_matches('/'),
            settings.model
        );
        Ok(Self {
            client,
            url,
            model: settings.model,
            api_key: settings.api_key,
        })
    }
}

#[derive(Debug, Serialize)]
struct GenerateContentRequest<'a> {
    contents: [RequestContent<'a>; 1],
}

#[derive(Debug, Serialize)]
struct RequestContent<'a> {
    parts: [RequestPart<'a>; 1],
}

#[derive(Debug, Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
}

const ERROR_BODY_LIMIT: usize = 512;

#[async_trait]
impl ForecastModel for GeminiModel {
    async fn generate(&self, prompt: &str) -> Result<String, UpstreamError> {
        let payload = GenerateContentRequest {
            contents: [RequestContent {
                parts: [RequestPart { text: prompt }],
            }],
        };
        let response = self
            .client
            .post(&self.url)
            .header("x-goog-api-key", &self.api_key)
            .json(&payload)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            let mut body = response.text().await.unwrap_or_default();
            if body.len() > ERROR_BODY_LIMIT {
                let mut cut = ERROR_BODY_LIMIT;
                while !body.is_char_boundary(cut) {
                    cut -= 1;
                }
                body.truncate(cut);
            }
            return Err(UpstreamError::Status {
                status: status.as_u16(),
                body,
            });
        }
        let body: GenerateContentResponse = response.json().await?;
        let candidate = body
            .candidates
            .into_iter()
            .next()
            .ok_or(UpstreamError::EmptyCandidates)?;
        Ok(candidate
            .content
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .filter_map(|part| part.text)
                    .collect::<String>()
            })
            .unwrap_or_default())
    }

    fn name(&self) -> &str {
        &self.model
    }
}

/// Model used when nothing is configured; every call fails.
#[derive(Debug, Clone)]
pub struct OfflineModel {
    reason: String,
}

impl OfflineModel {
    /// Creates the model with the reason reported on every call.
    #[must_use]
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl Default for OfflineModel {
    fn default() -> Self {
        Self::new("no generative model configured")
    }
}

#[async_trait]
impl ForecastModel for OfflineModel {
    async fn generate(&self, _prompt: &str) -> Result<String, UpstreamError> {
        Err(UpstreamError::Unavailable(self.reason.clone()))
    }

    fn name(&self) -> &str {
        "offline"
    }
}

/// Canned reply for [`ScriptedModel`].
#[derive(Debug, Clone)]
pub enum ScriptedReply {
    /// Return this text.
    Text(String),
    /// Fail with a transport error carrying this message.
    Fail(String),
}

/// Replays canned replies in order; used for tests and offline demos.
#[derive(Debug, Default)]
pub struct ScriptedModel {
    replies: Mutex<VecDeque<ScriptedReply>>,
    prompts: Mutex<Vec<String>>,
    calls: AtomicUsize,
}

impl ScriptedModel {
    /// Creates a model that answers with `replies` and then reports itself unavailable.
    #[must_use]
    pub fn new(replies: impl IntoIterator<Item = ScriptedReply>) -> Self {
        Self {
            replies: Mutex::new(replies.into_iter().collect()),
            prompts: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
        }
    }

    /// Convenience constructor answering with plain texts.
    #[must_use]
    pub fn texts<I, S>(texts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(texts.into_iter().map(|text| ScriptedReply::Text(text.into())))
    }

    /// Number of `generate` calls observed.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Prompts received so far.
    #[must_use]
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().clone()
    }
}

#[async_trait]
impl ForecastModel for ScriptedModel {
    async fn generate(&self, prompt: &str) -> Result<String, UpstreamError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().push(prompt.to_string());
        match self.replies.lock().pop_front() {
            Some(ScriptedReply::Text(text)) => Ok(text),
            Some(ScriptedReply::Fail(message)) => Err(UpstreamError::Transport(message)),
            None => Err(UpstreamError::Unavailable("script exhausted".into())),
        }
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        extract::Path,
        http::{HeaderMap, StatusCode},
        routing::post,
        Json, Router,
    };
    use serde_json::{json, Value};
    use tokio::net::TcpListener;

    async fn spawn_upstream(router: Router) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}/v1beta")
    }

    fn settings(endpoint: String) -> GeminiSettings {
        GeminiSettings {
            endpoint,
            model: "gemini-test".into(),
            api_key: "secret".into(),
            timeout: Duration::from_secs(5),
        }
    }

    async fn echo_prompt(
        Path(model): Path<String>,
        headers: HeaderMap,
        Json(body): Json<Value>,
    ) -> (StatusCode, Json<Value>) {
        if headers.get("x-goog-api-key").and_then(|v| v.to_str().ok()) != Some("secret") {
            return (StatusCode::UNAUTHORIZED, Json(json!({ "error": "bad key" })));
        }
        let prompt = body["contents"][0]["parts"][0]["text"].as_str().unwrap_or("");
        (
            StatusCode::OK,
            Json(json!({
                "candidates": [{
                    "content": { "parts": [{ "text": model }, { "text": format!("|{prompt}") }] }
                }]
            })),
        )
    }

    #[tokio::test]
    async fn gemini_joins_candidate_parts() {
        let endpoint =
            spawn_upstream(Router::new().route("/v1beta/models/:model", post(echo_prompt))).await;
        let model = GeminiModel::new(settings(endpoint)).unwrap();
        let text = model.generate("hello").await.unwrap();
        assert_eq!(text, "gemini-test:generateContent|hello");
        assert_eq!(model.name(), "gemini-test");
    }

    #[tokio::test]
    async fn gemini_reports_status_errors() {
        let endpoint = spawn_upstream(Router::new().route(
            "/v1beta/models/:model",
            post(|| async { (StatusCode::TOO_MANY_REQUESTS, "quota exceeded") }),
        ))
        .await;
        let model = GeminiModel::new(settings(endpoint)).unwrap();
        let err = model.generate("hello").await.unwrap_err();
        assert_eq!(
            err,
            UpstreamError::Status {
                status: 429,
                body: "quota exceeded".into()
            }
        );
    }

    #[tokio::test]
    async fn gemini_without_candidates_is_an_error() {
        let endpoint = spawn_upstream(Router::new().route(
            "/v1beta/models/:model",
            post(|| async { Json(json!({ "candidates": [] })) }),
        ))
        .await;
        let model = GeminiModel::new(settings(endpoint)).unwrap();
        assert_eq!(
            model.generate("hello").await.unwrap_err(),
            UpstreamError::EmptyCandidates
        );
    }

    #[test]
    fn gemini_rejects_zero_timeout() {
        let mut settings = GeminiSettings::new("key");
        settings.timeout = Duration::ZERO;
        assert!(GeminiModel::new(settings).is_err());
    }

    #[tokio::test]
    async fn scripted_model_replays_then_runs_dry() {
        let model = ScriptedModel::new([
            ScriptedReply::Text("first".into()),
            ScriptedReply::Fail("boom".into()),
        ]);
        assert_eq!(model.generate("a").await.unwrap(), "first");
        assert_eq!(
            model.generate("b").await.unwrap_err(),
            UpstreamError::Transport("boom".into())
        );
        assert!(matches!(
            model.generate("c").await,
            Err(UpstreamError::Unavailable(_))
        ));
        assert_eq!(model.calls(), 3);
        assert_eq!(model.prompts(), vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn offline_model_always_fails() {
        let model = OfflineModel::default();
        assert!(matches!(
            model.generate("x").await,
            Err(UpstreamError::Unavailable(reason)) if reason.contains("no generative model")
        ));
    }
}
