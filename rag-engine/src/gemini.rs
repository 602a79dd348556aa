//! Gemini generation client and embedding provider over the REST API.
//!
//! This module is only available when the `gemini` feature is enabled.

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};
use crate::generation::{GenerationClient, GenerationConfig, GenerationRequest};

/// The default Gemini API base URL.
const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// The default generation model.
const DEFAULT_MODEL: &str = "gemini-1.5-flash";

/// The default embedding model.
const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-004";

/// Output dimensionality of `text-embedding-004`.
const DEFAULT_EMBEDDING_DIMENSIONS: usize = 768;

const PROVIDER: &str = "Gemini";

/// Most texts `batchEmbedContents` accepts in one call.
const MAX_BATCH_REQUESTS: usize = 100;

/// A [`GenerationClient`] backed by the Gemini `generateContent` endpoint.
///
/// # Example
///
/// ```rust,ignore
/// use rag_engine::gemini::GeminiClient;
///
/// let client = GeminiClient::from_env()?;
/// let answer = client.complete(&GenerationRequest::text("Hello")).await?;
/// ```
#[derive(Clone)]
pub struct GeminiClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl GeminiClient {
    /// Create a new client with the given API key and the default model.
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.is_empty() {
            return Err(RagError::ConfigError("Gemini API key must not be empty".into()));
        }
        Ok(Self {
            client: reqwest::Client::new(),
            api_key,
            base_url: GEMINI_BASE_URL.into(),
            model: DEFAULT_MODEL.into(),
        })
    }

    /// Create a new client using the `GEMINI_API_KEY` environment variable.
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("GEMINI_API_KEY").map_err(|_| {
            RagError::ConfigError("GEMINI_API_KEY environment variable not set".into())
        })?;
        Self::new(api_key)
    }

    /// Set the generation model (e.g. `gemini-2.5-flash`).
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Override the API base URL (proxies, test servers).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// The configured generation model.
    pub fn model(&self) -> &str {
        &self.model
    }

    /// An embedding provider sharing this client's connection pool and key.
    pub fn embedding_provider(&self) -> GeminiEmbeddingProvider {
        GeminiEmbeddingProvider {
            inner: self.clone(),
            model: DEFAULT_EMBEDDING_MODEL.into(),
            dimensions: DEFAULT_EMBEDDING_DIMENSIONS,
        }
    }

    fn endpoint(&self, model: &str, method: &str) -> String {
        format!("{}/models/{model}:{method}", self.base_url)
    }

    async fn post<B: Serialize, R: for<'de> Deserialize<'de>>(
        &self,
        url: &str,
        body: &B,
        failure: fn(String) -> RagError,
    ) -> Result<R> {
        let response = self
            .client
            .post(url)
            .header("x-goog-api-key", &self.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| {
                error!(provider = PROVIDER, error = %e, "request failed");
                failure(format!("request failed: {e}"))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            let detail = serde_json::from_str::<ErrorResponse>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);

            error!(provider = PROVIDER, %status, "API error");
            return Err(failure(format!("API returned {status}: {detail}")));
        }

        response.json().await.map_err(|e| {
            error!(provider = PROVIDER, error = %e, "failed to parse response");
            failure(format!("failed to parse response: {e}"))
        })
    }
}

impl std::fmt::Debug for GeminiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiClient")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .finish_non_exhaustive()
    }
}

fn generation_failure(message: String) -> RagError {
    RagError::GenerationFailure { provider: PROVIDER.into(), message }
}

fn embedding_failure(message: String) -> RagError {
    RagError::EmbeddingFailure { provider: PROVIDER.into(), message }
}

// ── Gemini API request/response types ─────────────────────────────

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<WireGenerationConfig>,
}

#[derive(Serialize)]
struct Content<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'static str>,
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase", rename_all_fields = "camelCase")]
enum Part<'a> {
    Text(&'a str),
    InlineData { mime_type: &'a str, data: String },
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct WireGenerationConfig {
    max_output_tokens: u32,
    temperature: f32,
    top_p: f32,
    top_k: u32,
}

impl From<GenerationConfig> for WireGenerationConfig {
    fn from(config: GenerationConfig) -> Self {
        Self {
            max_output_tokens: config.max_output_tokens,
            temperature: config.temperature,
            top_p: config.top_p,
            top_k: config.top_k,
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

#[derive(Serialize)]
struct EmbedContentRequest<'a> {
    model: String,
    content: Content<'a>,
}

#[derive(Serialize)]
struct BatchEmbedContentsRequest<'a> {
    requests: Vec<EmbedContentRequest<'a>>,
}

#[derive(Deserialize)]
struct EmbedContentResponse {
    embedding: ContentEmbedding,
}

#[derive(Deserialize)]
struct BatchEmbedContentsResponse {
    #[serde(default)]
    embeddings: Vec<ContentEmbedding>,
}

#[derive(Deserialize)]
struct ContentEmbedding {
    values: Vec<f32>,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    message: String,
}

impl GenerateContentResponse {
    fn into_text(self) -> Result<String> {
        if let Some(reason) = self.prompt_feedback.and_then(|f| f.block_reason) {
            return Err(generation_failure(format!("prompt blocked: {reason}")));
        }
        let candidate = self
            .candidates
            .into_iter()
            .next()
            .ok_or_else(|| generation_failure("API returned no candidates".into()))?;

        let text: String = candidate
            .content
            .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();
        if text.is_empty() {
            let reason = candidate.finish_reason.unwrap_or_else(|| "unknown".into());
            return Err(generation_failure(format!("empty response (finish reason: {reason})")));
        }
        Ok(text)
    }
}

fn request_body(request: &GenerationRequest) -> GenerateContentRequest<'_> {
    let mut parts = vec![Part::Text(&request.prompt)];
    if let Some(image) = &request.image {
        parts.push(Part::InlineData { mime_type: &image.mime_type, data: BASE64.encode(&image.data) });
    }
    GenerateContentRequest {
        contents: vec![Content { role: Some("user"), parts }],
        generation_config: request.config.map(WireGenerationConfig::from),
    }
}

// ── GenerationClient implementation ───────────────────────────────

#[async_trait]
impl GenerationClient for GeminiClient {
    async fn complete(&self, request: &GenerationRequest) -> Result<String> {
        debug!(
            provider = PROVIDER,
            model = %self.model,
            prompt_len = request.prompt.len(),
            has_image = request.image.is_some(),
            "generating content"
        );
        let url = self.endpoint(&self.model, "generateContent");
        let response: GenerateContentResponse =
            self.post(&url, &request_body(request), generation_failure).await?;
        response.into_text()
    }

    fn name(&self) -> &str {
        PROVIDER
    }
}

/// An [`EmbeddingProvider`] backed by the Gemini embedding endpoints.
///
/// Obtain one from [`GeminiClient::embedding_provider`].
#[derive(Debug, Clone)]
pub struct GeminiEmbeddingProvider {
    inner: GeminiClient,
    model: String,
    dimensions: usize,
}

impl GeminiEmbeddingProvider {
    /// Set the embedding model and its output dimensionality.
    pub fn with_model(mut self, model: impl Into<String>, dimensions: usize) -> Self {
        self.model = model.into();
        self.dimensions = dimensions;
        self
    }

    fn embed_request<'a>(&self, text: &'a str) -> EmbedContentRequest<'a> {
        EmbedContentRequest {
            model: format!("models/{}", self.model),
            content: Content { role: None, parts: vec![Part::Text(text)] },
        }
    }

    /// Split `texts` into request bodies no larger than the endpoint allows.
    fn batch_requests<'a>(&self, texts: &[&'a str]) -> Vec<BatchEmbedContentsRequest<'a>> {
        texts
            .chunks(MAX_BATCH_REQUESTS)
            .map(|chunk| BatchEmbedContentsRequest {
                requests: chunk.iter().map(|text| self.embed_request(*text)).collect(),
            })
            .collect()
    }
}

#[async_trait]
impl EmbeddingProvider for GeminiEmbeddingProvider {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        debug!(provider = PROVIDER, text_len = text.len(), "embedding single text");
        let url = self.inner.endpoint(&self.model, "embedContent");
        let response: EmbedContentResponse =
            self.inner.post(&url, &self.embed_request(text), embedding_failure).await?;
        Ok(response.embedding.values)
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let bodies = self.batch_requests(texts);
        debug!(provider = PROVIDER, batch_size = texts.len(), calls = bodies.len(), "embedding batch");
        let url = self.inner.endpoint(&self.model, "batchEmbedContents");
        let mut vectors = Vec::with_capacity(texts.len());
        for body in &bodies {
            let response: BatchEmbedContentsResponse =
                self.inner.post(&url, body, embedding_failure).await?;
            if response.embeddings.len() != body.requests.len() {
                return Err(embedding_failure(format!(
                    "expected {} embeddings, got {}",
                    body.requests.len(),
                    response.embeddings.len()
                )));
            }
            vectors.extend(response.embeddings.into_iter().map(|e| e.values));
        }
        Ok(vectors)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn name(&self) -> &str {
        PROVIDER
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::generation::ImageInput;

    #[test]
    fn image_requests_carry_inline_data_and_config() {
        let request = GenerationRequest::text("describe")
            .with_image(ImageInput::new(vec![1, 2, 3], "image/png"))
            .with_config(GenerationConfig::image_description());

        let body = serde_json::to_value(request_body(&request)).unwrap();
        assert_eq!(body["contents"][0]["parts"][0]["text"], "describe");
        assert_eq!(body["contents"][0]["parts"][1]["inlineData"]["mimeType"], "image/png");
        assert_eq!(body["contents"][0]["parts"][1]["inlineData"]["data"], "AQID");
        assert_eq!(body["generationConfig"]["maxOutputTokens"], 256);
        assert_eq!(body["generationConfig"]["topK"], 8);
    }

    #[test]
    fn text_requests_omit_generation_config() {
        let body = serde_json::to_value(request_body(&GenerationRequest::text("hi"))).unwrap();
        assert!(body.get("generationConfig").is_none());
    }

    #[test]
    fn response_text_joins_parts() {
        let response: GenerateContentResponse = serde_json::from_value(json!({
            "candidates": [{
                "content": {"parts": [{"text": "Hello, "}, {"text": "world"}], "role": "model"},
                "finishReason": "STOP"
            }]
        }))
        .unwrap();
        assert_eq!(response.into_text().unwrap(), "Hello, world");
    }

    #[test]
    fn blocked_prompt_is_a_generation_failure() {
        let response: GenerateContentResponse = serde_json::from_value(json!({
            "promptFeedback": {"blockReason": "SAFETY"}
        }))
        .unwrap();
        let err = response.into_text().unwrap_err();
        assert!(matches!(err, RagError::GenerationFailure { ref message, .. } if message.contains("SAFETY")));
    }

    #[test]
    fn empty_candidate_reports_finish_reason() {
        let response: GenerateContentResponse = serde_json::from_value(json!({
            "candidates": [{"finishReason": "MAX_TOKENS"}]
        }))
        .unwrap();
        let err = response.into_text().unwrap_err();
        assert!(err.to_string().contains("MAX_TOKENS"));
    }

    #[test]
    fn large_batches_are_split_in_order() {
        let provider = GeminiClient::new("test-key").unwrap().embedding_provider();
        let owned: Vec<String> = (0..250).map(|i| format!("text {i}")).collect();
        let texts: Vec<&str> = owned.iter().map(String::as_str).collect();

        let bodies = provider.batch_requests(&texts);
        let sizes: Vec<usize> = bodies.iter().map(|b| b.requests.len()).collect();
        assert_eq!(sizes, vec![100, 100, 50]);

        let last = serde_json::to_value(&bodies[2]).unwrap();
        assert_eq!(last["requests"][0]["content"]["parts"][0]["text"], "text 200");
        assert_eq!(last["requests"][49]["content"]["parts"][0]["text"], "text 249");
        assert_eq!(last["requests"][0]["model"], "models/text-embedding-004");
    }

    #[test]
    fn small_batches_use_one_request() {
        let provider = GeminiClient::new("test-key").unwrap().embedding_provider();
        assert_eq!(provider.batch_requests(&["a", "b"]).len(), 1);
        assert!(provider.batch_requests(&[]).is_empty());
    }

    #[test]
    fn empty_api_key_is_rejected() {
        assert!(matches!(GeminiClient::new(""), Err(RagError::ConfigError(_))));
    }
}
