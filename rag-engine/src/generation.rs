//! Generation client trait: the opaque text/image completion service.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{RagError, Result};

/// Decoding parameters passed to the generation backend.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// Maximum number of tokens in the output.
    pub max_output_tokens: u32,
    /// Sampling temperature.
    pub temperature: f32,
    /// Nucleus sampling threshold.
    pub top_p: f32,
    /// Number of highest-probability candidates sampled from.
    pub top_k: u32,
}

impl GenerationConfig {
    /// Short, low-temperature decoding used for objective image captions.
    pub fn image_description() -> Self {
        Self { max_output_tokens: 256, temperature: 0.4, top_p: 0.9, top_k: 8 }
    }
}

/// An image sent alongside a prompt.
#[derive(Clone, PartialEq, Eq)]
pub struct ImageInput {
    /// Raw encoded image bytes (PNG, JPEG, ...). Never decoded by this crate.
    pub data: Vec<u8>,
    /// MIME type of `data`.
    pub mime_type: String,
}

impl ImageInput {
    /// Wrap image bytes with an explicit MIME type.
    pub fn new(data: Vec<u8>, mime_type: impl Into<String>) -> Self {
        Self { data, mime_type: mime_type.into() }
    }

    /// Wrap image bytes, guessing the MIME type from the leading magic bytes.
    ///
    /// Recognises PNG, JPEG, GIF, and WebP; anything else is labelled
    /// `application/octet-stream`.
    pub fn sniff(data: Vec<u8>) -> Self {
        let mime_type = match data.as_slice() {
            [0x89, b'P', b'N', b'G', ..] => "image/png",
            [0xFF, 0xD8, 0xFF, ..] => "image/jpeg",
            [b'G', b'I', b'F', b'8', ..] => "image/gif",
            [b'R', b'I', b'F', b'F', _, _, _, _, b'W', b'E', b'B', b'P', ..] => "image/webp",
            _ => "application/octet-stream",
        };
        Self::new(data, mime_type)
    }

    /// Size of the encoded image in bytes.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns `true` if there are no image bytes.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl std::fmt::Debug for ImageInput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageInput")
            .field("mime_type", &self.mime_type)
            .field("bytes", &self.data.len())
            .finish()
    }
}

/// A single completion request.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    /// The text prompt.
    pub prompt: String,
    /// Optional image conditioning the completion.
    pub image: Option<ImageInput>,
    /// Decoding parameters; `None` uses the backend's defaults.
    pub config: Option<GenerationConfig>,
}

impl GenerationRequest {
    /// A text-only request with backend-default decoding.
    pub fn text(prompt: impl Into<String>) -> Self {
        Self { prompt: prompt.into(), image: None, config: None }
    }

    /// Attach an image.
    pub fn with_image(mut self, image: ImageInput) -> Self {
        self.image = Some(image);
        self
    }

    /// Set decoding parameters.
    pub fn with_config(mut self, config: GenerationConfig) -> Self {
        self.config = Some(config);
        self
    }
}

/// A text/image-conditioned completion service.
///
/// Implementations report failures as [`RagError::GenerationFailure`]. No
/// retries happen at this layer: a failed call fails the request.
#[async_trait]
pub trait GenerationClient: Send + Sync {
    /// Produce a completion for `request`.
    async fn complete(&self, request: &GenerationRequest) -> Result<String>;

    /// A short label for this client, used in errors and logs.
    fn name(&self) -> &str {
        "generation"
    }
}

/// Run `client.complete`, failing with [`RagError::GenerationTimeout`] if it
/// does not answer within `timeout`.
pub async fn complete_with_timeout(
    client: &dyn GenerationClient,
    request: &GenerationRequest,
    timeout: Duration,
) -> Result<String> {
    debug!(
        provider = client.name(),
        prompt_len = request.prompt.len(),
        has_image = request.image.is_some(),
        "requesting completion"
    );
    tokio::time::timeout(timeout, client.complete(request)).await.map_err(|_| {
        warn!(provider = client.name(), ?timeout, "generation timed out");
        RagError::GenerationTimeout { provider: client.name().to_string(), timeout }
    })?
}
