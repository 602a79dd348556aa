//! # rag-engine
//!
//! Retrieval-augmented generation over a small persistent knowledge base.
//!
//! The crate keeps an ordered collection of text documents with their
//! embeddings in a JSON snapshot ([`DocumentStore`]), searches it with an
//! exact nearest-neighbour index ([`FlatIndex`]), and composes retrieved
//! context into prompts for a generation backend ([`PromptComposer`]).
//!
//! Embedding and generation backends sit behind the [`EmbeddingProvider`]
//! and [`GenerationClient`] traits. [`HashingEmbeddingProvider`] works
//! offline; the `gemini` and `openai` features add HTTP-backed providers.
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use rag_engine::{HashingEmbeddingProvider, Metadata, RagConfig, Retriever};
//!
//! let config = RagConfig::builder().snapshot_path("kb.json").top_k(3).build()?;
//! let retriever = Retriever::open(&config, Arc::new(HashingEmbeddingProvider::default()))?;
//! retriever.add_document("Bangkok is the capital of Thailand", Metadata::new()).await?;
//! let context = retriever.retrieve("capital of Thailand", config.top_k).await?;
//! ```

pub mod config;
pub mod document;
pub mod embedding;
pub mod error;
pub mod generation;
pub mod hashing;
pub mod index;
pub mod prompt;
pub mod retriever;
pub mod store;

#[cfg(feature = "gemini")]
pub mod gemini;
#[cfg(feature = "openai")]
pub mod openai;

pub use config::{RagConfig, RagConfigBuilder};
pub use document::{Document, DocumentId, Metadata, MetadataValue, ScoredDocument};
pub use embedding::{EmbeddingProvider, embed_batch_with_timeout, embed_with_timeout};
pub use error::{RagError, Result};
pub use generation::{
    GenerationClient, GenerationConfig, GenerationRequest, ImageInput, complete_with_timeout,
};
pub use hashing::HashingEmbeddingProvider;
pub use index::{FlatIndex, Neighbor};
pub use prompt::{ImageAnswer, PromptComposer, QueryFailure, TextAnswer};
pub use retriever::Retriever;
pub use store::DocumentStore;
