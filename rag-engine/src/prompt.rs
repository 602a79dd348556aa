//! Prompt composition for text and image queries.
//!
//! [`PromptComposer`] turns a user query into a generation request:
//!
//! - **Text queries** retrieve context for the query itself, compose the
//!   answer prompt, and generate.
//! - **Image queries** first ask the generation backend for an objective
//!   description of the image, retrieve context using that description
//!   (when retrieval is requested), then generate with the image attached.
//!
//! The composed prompt is always returned next to the answer. When a stage
//! fails, the returned [`QueryFailure`] keeps whatever was already computed
//! (the image description, the prompt) so the caller can degrade gracefully.

use std::sync::Arc;

use thiserror::Error;
use tracing::{info, instrument, warn};

use crate::config::RagConfig;
use crate::error::RagError;
use crate::generation::{
    GenerationClient, GenerationConfig, GenerationRequest, ImageInput, complete_with_timeout,
};
use crate::retriever::Retriever;

/// Separator placed between retrieved documents in the context block.
pub const CONTEXT_SEPARATOR: &str = "\n\n";

/// Instruction used to obtain an image description.
pub const IMAGE_DESCRIPTION_INSTRUCTION: &str =
    "Provide a detailed, objective description of this image";

/// A generated answer to a text query.
#[derive(Debug, Clone, PartialEq)]
pub struct TextAnswer {
    /// The generated response.
    pub response: String,
    /// The exact prompt sent to the generation backend.
    pub prompt: String,
    /// Retrieved documents, nearest first.
    pub context: Vec<String>,
}

/// A generated answer to an image query.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageAnswer {
    /// The generated response.
    pub response: String,
    /// The exact prompt sent to the generation backend.
    pub prompt: String,
    /// The description obtained for the image.
    pub image_description: String,
    /// Retrieved documents, nearest first (empty without retrieval).
    pub context: Vec<String>,
}

/// A failed query together with the work completed before the failure.
#[derive(Debug, Error)]
#[error("Error generating response: {error}")]
pub struct QueryFailure {
    /// The underlying failure.
    #[source]
    pub error: RagError,
    /// The composed prompt, if composition was reached.
    pub prompt: Option<String>,
    /// The image description, if one was obtained.
    pub image_description: Option<String>,
}

impl QueryFailure {
    fn new(error: RagError) -> Self {
        Self { error, prompt: None, image_description: None }
    }

    fn with_description(mut self, description: &str) -> Self {
        self.image_description = Some(description.to_string());
        self
    }

    fn with_prompt(mut self, prompt: &str) -> Self {
        self.prompt = Some(prompt.to_string());
        self
    }

    /// Best reply available despite the failure: the image description when
    /// one was obtained, otherwise the error message.
    pub fn fallback_reply(&self) -> String {
        match &self.image_description {
            Some(description) if !description.trim().is_empty() => description.clone(),
            _ => self.to_string(),
        }
    }
}

/// Composes retrieval context and queries into generation requests.
pub struct PromptComposer {
    retriever: Arc<Retriever>,
    generator: Arc<dyn GenerationClient>,
    config: RagConfig,
}

impl PromptComposer {
    /// Create a composer over a shared retriever and generation client.
    pub fn new(retriever: Arc<Retriever>, generator: Arc<dyn GenerationClient>, config: RagConfig) -> Self {
        Self { retriever, generator, config }
    }

    /// Return a reference to the configuration.
    pub fn config(&self) -> &RagConfig {
        &self.config
    }

    /// Return a reference to the retriever.
    pub fn retriever(&self) -> &Arc<Retriever> {
        &self.retriever
    }

    /// Build the answer prompt for a text query.
    pub fn text_prompt(&self, context: &[String], query: &str) -> String {
        let context = context.join(CONTEXT_SEPARATOR);
        let language = &self.config.response_language;
        format!(
            "You are an AI assistant.\n\
             Use the following context to answer the question precisely:\n\
             \n\
             Context:\n\
             {context}\n\
             \n\
             Question: {query}\n\
             \n\
             Provide a detailed and informative response based on the context, written in {language}. \
             If the question is not related to the context, ignore the context and answer naturally in {language}."
        )
    }

    /// Build the answer prompt for an image query.
    pub fn image_prompt(&self, description: &str, context: &[String], query: &str) -> String {
        let context = context.join(CONTEXT_SEPARATOR);
        let language = &self.config.response_language;
        format!(
            "Image Description:\n\
             {description}\n\
             \n\
             Context from Knowledge Base:\n\
             {context}\n\
             \n\
             User Query: {query}\n\
             \n\
             Based on the image description and the contextual information from our knowledge base, \
             provide a comprehensive and insightful response to the query. \
             If the context does not directly relate to the image, focus on the image description \
             and your visual analysis. Respond in {language}."
        )
    }

    /// Answer a text query with retrieved context.
    ///
    /// # Errors
    ///
    /// Returns a [`QueryFailure`] wrapping embedding or generation errors;
    /// the prompt is attached when generation was attempted.
    #[instrument(skip_all, fields(query_len = query.len()))]
    pub async fn answer_text(&self, query: &str) -> Result<TextAnswer, QueryFailure> {
        let context =
            self.retriever.retrieve(query, self.config.top_k).await.map_err(QueryFailure::new)?;
        let prompt = self.text_prompt(&context, query);

        let request = GenerationRequest::text(prompt.clone());
        let response = self.generate(&request).await.map_err(|e| {
            warn!(error = %e, "text generation failed");
            QueryFailure::new(e).with_prompt(&prompt)
        })?;

        info!(context_docs = context.len(), response_len = response.len(), "answered text query");
        Ok(TextAnswer { response, prompt, context })
    }

    /// Ask the generation backend for an objective description of `image`.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::GenerationFailure`] or [`RagError::GenerationTimeout`].
    pub async fn describe_image(&self, image: &ImageInput) -> Result<String, RagError> {
        let request = GenerationRequest::text(IMAGE_DESCRIPTION_INSTRUCTION)
            .with_image(image.clone())
            .with_config(GenerationConfig::image_description());
        self.generate(&request).await
    }

    /// Answer a query about an image, optionally augmented with retrieved context.
    ///
    /// When `use_rag` is set the image description, not `query`, is used as
    /// the retrieval query.
    ///
    /// # Errors
    ///
    /// Returns a [`QueryFailure`]. [`RagError::ImageTooLarge`] is reported
    /// before any backend call; later failures carry the image description
    /// and, once composed, the prompt.
    #[instrument(skip_all, fields(image_bytes = image.len(), use_rag = use_rag, top_k = top_k))]
    pub async fn answer_image(
        &self,
        image: ImageInput,
        query: &str,
        use_rag: bool,
        top_k: usize,
    ) -> Result<ImageAnswer, QueryFailure> {
        if image.len() > self.config.max_image_bytes {
            return Err(QueryFailure::new(RagError::ImageTooLarge {
                size: image.len(),
                limit: self.config.max_image_bytes,
            }));
        }

        let description = self.describe_image(&image).await.map_err(|e| {
            warn!(error = %e, "image description failed");
            QueryFailure::new(e)
        })?;

        let context = if use_rag {
            self.retriever.retrieve(&description, top_k).await.map_err(|e| {
                warn!(error = %e, "retrieval for image query failed");
                QueryFailure::new(e).with_description(&description)
            })?
        } else {
            Vec::new()
        };

        let prompt = self.image_prompt(&description, &context, query);
        let request = GenerationRequest::text(prompt.clone())
            .with_image(image)
            .with_config(GenerationConfig::image_description());
        let response = self.generate(&request).await.map_err(|e| {
            warn!(error = %e, "image answer generation failed");
            QueryFailure::new(e).with_description(&description).with_prompt(&prompt)
        })?;

        info!(context_docs = context.len(), response_len = response.len(), "answered image query");
        Ok(ImageAnswer { response, prompt, image_description: description, context })
    }

    async fn generate(&self, request: &GenerationRequest) -> Result<String, RagError> {
        complete_with_timeout(self.generator.as_ref(), request, self.config.generation_timeout).await
    }
}

impl std::fmt::Debug for PromptComposer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PromptComposer")
            .field("retriever", &self.retriever)
            .field("generator", &self.generator.name())
            .field("config", &self.config)
            .finish()
    }
}
