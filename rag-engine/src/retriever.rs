//! Retriever: embeds queries and ranks stored documents by vector distance.
//!
//! The [`Retriever`] owns the [`DocumentStore`] and the [`FlatIndex`] derived
//! from it, both behind one `tokio::sync::RwLock`:
//!
//! - appends and clears take the write lock;
//! - searches take the read lock against a fully built index.
//!
//! The index remembers the store generation it was built from. A search that
//! finds the index stale upgrades to the write lock, rebuilds once, and
//! downgrades back to a read lock before searching, so no search can ever
//! observe a partially rebuilt index and read-heavy workloads pay for at most
//! one rebuild per mutation.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use rag_engine::{HashingEmbeddingProvider, Metadata, RagConfig, Retriever};
//!
//! let config = RagConfig::builder().snapshot_path("kb.json").build()?;
//! let retriever = Retriever::open(&config, Arc::new(HashingEmbeddingProvider::default()))?;
//! retriever.add_document("Black holes bend spacetime.", Metadata::new()).await?;
//! let texts = retriever.retrieve("what is a black hole?", 3).await?;
//! ```

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{RwLock, RwLockReadGuard};
use tracing::{debug, info, instrument};

use crate::config::RagConfig;
use crate::document::{Document, DocumentId, Metadata, ScoredDocument};
use crate::embedding::{EmbeddingProvider, embed_batch_with_timeout, embed_with_timeout};
use crate::error::{RagError, Result};
use crate::index::FlatIndex;
use crate::store::DocumentStore;

/// Store plus the index derived from it.
#[derive(Debug)]
struct KnowledgeBase {
    store: DocumentStore,
    index: FlatIndex,
    /// Store generation the index was last built from.
    indexed_generation: Option<u64>,
}

impl KnowledgeBase {
    fn is_stale(&self) -> bool {
        self.indexed_generation != Some(self.store.generation())
    }

    fn refresh(&mut self) -> Result<()> {
        if !self.is_stale() {
            return Ok(());
        }
        self.index.build(self.store.embeddings())?;
        self.indexed_generation = Some(self.store.generation());
        debug!(
            generation = self.store.generation(),
            vectors = self.index.len(),
            "rebuilt vector index"
        );
        Ok(())
    }
}

/// Answers "top-k most similar documents" queries over a [`DocumentStore`].
pub struct Retriever {
    provider: Arc<dyn EmbeddingProvider>,
    state: RwLock<KnowledgeBase>,
    embedding_timeout: Duration,
}

impl Retriever {
    /// Load the store from `config.snapshot_path` and wrap it in a retriever.
    ///
    /// The store's dimensionality is pinned to the provider's.
    ///
    /// # Errors
    ///
    /// Propagates [`DocumentStore::load`] errors.
    pub fn open(config: &RagConfig, provider: Arc<dyn EmbeddingProvider>) -> Result<Self> {
        let store = DocumentStore::load(&config.snapshot_path, Some(provider.dimensions()))?;
        Self::new(store, provider, config.embedding_timeout)
    }

    /// Wrap an already loaded store.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::DimensionMismatch`] if the store's dimensionality
    /// differs from the provider's.
    pub fn new(
        store: DocumentStore,
        provider: Arc<dyn EmbeddingProvider>,
        embedding_timeout: Duration,
    ) -> Result<Self> {
        if let Some(actual) = store.dimensions() {
            if actual != provider.dimensions() {
                return Err(RagError::DimensionMismatch { expected: provider.dimensions(), actual });
            }
        }
        Ok(Self {
            provider,
            state: RwLock::new(KnowledgeBase {
                store,
                index: FlatIndex::new(),
                indexed_generation: None,
            }),
            embedding_timeout,
        })
    }

    /// The embedding provider used for documents and queries.
    pub fn embedding_provider(&self) -> &Arc<dyn EmbeddingProvider> {
        &self.provider
    }

    /// Embed `text` and append it to the store.
    ///
    /// # Errors
    ///
    /// Embedding errors ([`RagError::EmbeddingFailure`],
    /// [`RagError::EmbeddingTimeout`]) and store errors are propagated; on
    /// any error nothing is stored.
    pub async fn add_document(&self, text: &str, metadata: Metadata) -> Result<DocumentId> {
        let embedding = embed_with_timeout(self.provider.as_ref(), text, self.embedding_timeout).await?;
        let mut kb = self.state.write().await;
        let id = kb.store.append(text, embedding, metadata)?;
        info!(document.id = %id, documents = kb.store.len(), "added document");
        Ok(id)
    }

    /// Embed and append many documents with one batch embedding call and a
    /// single snapshot rewrite.
    ///
    /// # Errors
    ///
    /// Same as [`add_document`](Retriever::add_document); the batch is all-or-nothing.
    pub async fn add_documents(&self, items: Vec<(String, Metadata)>) -> Result<Vec<DocumentId>> {
        if items.is_empty() {
            return Ok(Vec::new());
        }
        let texts: Vec<&str> = items.iter().map(|(text, _)| text.as_str()).collect();
        let embeddings =
            embed_batch_with_timeout(self.provider.as_ref(), &texts, self.embedding_timeout).await?;

        let batch = items
            .into_iter()
            .zip(embeddings)
            .map(|((text, metadata), embedding)| (text, embedding, metadata))
            .collect();

        let mut kb = self.state.write().await;
        let ids = kb.store.append_batch(batch)?;
        info!(count = ids.len(), documents = kb.store.len(), "added documents");
        Ok(ids)
    }

    /// Remove every document, persist the empty store, and reset the index.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Snapshot`] if persisting fails.
    pub async fn clear(&self) -> Result<()> {
        let mut kb = self.state.write().await;
        kb.store.clear()?;
        kb.refresh()
    }

    /// Number of stored documents.
    pub async fn len(&self) -> usize {
        self.state.read().await.store.len()
    }

    /// Returns `true` if the store is empty.
    pub async fn is_empty(&self) -> bool {
        self.state.read().await.store.is_empty()
    }

    /// Current store generation.
    pub async fn generation(&self) -> u64 {
        self.state.read().await.store.generation()
    }

    /// Store generation the index was last built from, if it was built at all.
    pub async fn indexed_generation(&self) -> Option<u64> {
        self.state.read().await.indexed_generation
    }

    /// Number of vectors currently in the index.
    pub async fn indexed_len(&self) -> usize {
        self.state.read().await.index.len()
    }

    /// Embedding dimensionality.
    pub fn dimensions(&self) -> usize {
        self.provider.dimensions()
    }

    /// Fetch a stored document.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::NotFound`] if `id` is out of range.
    pub async fn get(&self, id: DocumentId) -> Result<Document> {
        self.state.read().await.store.get(id)
    }

    /// Return the texts of the `top_k` documents nearest to `query`, nearest first.
    ///
    /// An empty store yields an empty result, never an error.
    ///
    /// # Errors
    ///
    /// Propagates embedding errors.
    pub async fn retrieve(&self, query: &str, top_k: usize) -> Result<Vec<String>> {
        let scored = self.retrieve_scored(query, top_k).await?;
        Ok(scored.into_iter().map(|s| s.document.text).collect())
    }

    /// Like [`retrieve`](Retriever::retrieve) but returns full documents with distances.
    ///
    /// # Errors
    ///
    /// Propagates embedding errors.
    #[instrument(skip_all, fields(top_k = top_k, query_len = query.len()))]
    pub async fn retrieve_scored(&self, query: &str, top_k: usize) -> Result<Vec<ScoredDocument>> {
        let embedding =
            embed_with_timeout(self.provider.as_ref(), query, self.embedding_timeout).await?;
        let results = self.search(&embedding, top_k).await?;
        info!(result_count = results.len(), "retrieval completed");
        Ok(results)
    }

    /// Rank stored documents against an already computed query embedding.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::DimensionMismatch`] if the embedding has the wrong width.
    pub async fn search(&self, embedding: &[f32], top_k: usize) -> Result<Vec<ScoredDocument>> {
        let kb = self.fresh_view().await?;
        if kb.store.is_empty() {
            return Ok(Vec::new());
        }

        kb.index
            .search(embedding, top_k)?
            .into_iter()
            .map(|neighbor| -> Result<ScoredDocument> {
                Ok(ScoredDocument {
                    document: kb.store.get(DocumentId(neighbor.index))?,
                    distance: neighbor.distance,
                })
            })
            .collect()
    }

    /// A read guard over a knowledge base whose index matches its store.
    async fn fresh_view(&self) -> Result<RwLockReadGuard<'_, KnowledgeBase>> {
        let kb = self.state.read().await;
        if kb.store.is_empty() || !kb.is_stale() {
            return Ok(kb);
        }
        drop(kb);

        let mut kb = self.state.write().await;
        // Another task may have rebuilt while we waited for the write lock.
        kb.refresh()?;
        Ok(kb.downgrade())
    }
}

impl std::fmt::Debug for Retriever {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Retriever")
            .field("provider", &self.provider.name())
            .field("dimensions", &self.provider.dimensions())
            .field("embedding_timeout", &self.embedding_timeout)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hashing::HashingEmbeddingProvider;

    fn retriever(dir: &tempfile::TempDir) -> Retriever {
        let config = RagConfig::builder().snapshot_path(dir.path().join("kb.json")).build().unwrap();
        Retriever::open(&config, Arc::new(HashingEmbeddingProvider::new(32))).unwrap()
    }

    #[tokio::test]
    async fn rebuilds_only_when_generation_advances() {
        let dir = tempfile::tempdir().unwrap();
        let retriever = retriever(&dir);
        retriever.add_document("comets travel through time", Metadata::new()).await.unwrap();
        assert_eq!(retriever.indexed_generation().await, None);

        retriever.retrieve("comet", 1).await.unwrap();
        assert_eq!(retriever.indexed_generation().await, Some(1));
        retriever.retrieve("comet", 1).await.unwrap();
        assert_eq!(retriever.indexed_generation().await, Some(1));

        retriever.add_document("stars fuse hydrogen", Metadata::new()).await.unwrap();
        assert_eq!(retriever.indexed_generation().await, Some(1));
        let hits = retriever.retrieve("stars", 5).await.unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(retriever.indexed_generation().await, Some(2));
        assert_eq!(retriever.indexed_len().await, 2);
    }

    #[tokio::test]
    async fn clear_resets_the_index() {
        let dir = tempfile::tempdir().unwrap();
        let retriever = retriever(&dir);
        retriever.add_document("a document", Metadata::new()).await.unwrap();
        retriever.retrieve("document", 1).await.unwrap();

        retriever.clear().await.unwrap();
        assert!(retriever.is_empty().await);
        assert_eq!(retriever.indexed_len().await, 0);
        assert_eq!(retriever.indexed_generation().await, Some(retriever.generation().await));
    }

    #[tokio::test]
    async fn store_of_another_width_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = DocumentStore::load(dir.path().join("kb.json"), None).unwrap();
        store.append("x", vec![1.0; 8], Metadata::new()).unwrap();

        let err = Retriever::new(store, Arc::new(HashingEmbeddingProvider::new(32)), Duration::from_secs(1))
            .unwrap_err();
        assert!(matches!(err, RagError::DimensionMismatch { expected: 32, actual: 8 }));
    }

    #[tokio::test]
    async fn search_checks_query_width() {
        let dir = tempfile::tempdir().unwrap();
        let retriever = retriever(&dir);
        retriever.add_document("text", Metadata::new()).await.unwrap();
        let err = retriever.search(&[1.0, 2.0], 1).await.unwrap_err();
        assert!(matches!(err, RagError::DimensionMismatch { expected: 32, actual: 2 }));
    }
}
