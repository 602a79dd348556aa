//! Snapshot-backed document store.
//!
//! [`DocumentStore`] keeps three parallel sequences (texts, embeddings,
//! metadata) in memory and rewrites a single JSON snapshot after every
//! mutation. Writes go to a sibling `.tmp` file which is fsynced and then
//! renamed over the snapshot, so the file on disk is always either the old
//! or the new state.
//!
//! Snapshot layout:
//!
//! ```json
//! {
//!   "documents": ["text", ...],
//!   "embeddings": [[0.1, 0.2, ...], ...],
//!   "metadata": [{"key": "value"}, ...]
//! }
//! ```

use std::fs::{self, File};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use crate::document::{Document, DocumentId, Metadata, MetadataValue};
use crate::error::{RagError, Result};

#[derive(Debug, Default, Deserialize)]
struct Snapshot {
    #[serde(default)]
    documents: Vec<String>,
    #[serde(default)]
    embeddings: Vec<Vec<f32>>,
    #[serde(default)]
    metadata: Vec<Metadata>,
}

#[derive(Serialize)]
struct SnapshotRef<'a> {
    documents: &'a [String],
    embeddings: &'a [Vec<f32>],
    metadata: &'a [Metadata],
}

/// An ordered, durable collection of documents.
///
/// Invariant: `texts`, `embeddings`, and `metadata` always have the same
/// length, and every embedding has the store's dimensionality.
///
/// The dimensionality is either fixed up front (`load(path, Some(d))`) or
/// taken from the first inserted embedding and immutable from then on.
///
/// Every successful mutation bumps [`generation`](DocumentStore::generation),
/// which lets derived structures (the vector index) detect staleness.
#[derive(Debug)]
pub struct DocumentStore {
    path: PathBuf,
    dimensions: Option<usize>,
    texts: Vec<String>,
    embeddings: Vec<Vec<f32>>,
    metadata: Vec<Metadata>,
    generation: u64,
}

impl DocumentStore {
    /// Load the store from the snapshot at `path`.
    ///
    /// A missing snapshot is not an error: it yields an empty store (fresh
    /// install). Nothing is written until the first mutation.
    ///
    /// # Errors
    ///
    /// - [`RagError::Snapshot`] if the file cannot be read or parsed, or its
    ///   three sequences have different lengths.
    /// - [`RagError::DimensionMismatch`] if a stored embedding disagrees with
    ///   `dimensions` or with the other stored embeddings.
    pub fn load(path: impl Into<PathBuf>, dimensions: Option<usize>) -> Result<Self> {
        let path = path.into();
        let snapshot = match fs::read(&path) {
            Ok(bytes) => serde_json::from_slice::<Snapshot>(&bytes).map_err(|e| {
                error!(path = %path.display(), error = %e, "failed to parse snapshot");
                RagError::snapshot(&path, format!("failed to parse snapshot: {e}"))
            })?,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!(path = %path.display(), "no snapshot found, starting with an empty store");
                Snapshot::default()
            }
            Err(e) => {
                error!(path = %path.display(), error = %e, "failed to read snapshot");
                return Err(RagError::snapshot(&path, format!("failed to read snapshot: {e}")));
            }
        };

        let Snapshot { documents, embeddings, metadata } = snapshot;
        if documents.len() != embeddings.len() || documents.len() != metadata.len() {
            return Err(RagError::snapshot(
                &path,
                format!(
                    "inconsistent snapshot: {} documents, {} embeddings, {} metadata entries",
                    documents.len(),
                    embeddings.len(),
                    metadata.len()
                ),
            ));
        }

        let mut dimensions = dimensions;
        for embedding in &embeddings {
            match dimensions {
                Some(expected) if expected != embedding.len() => {
                    return Err(RagError::DimensionMismatch { expected, actual: embedding.len() });
                }
                Some(_) => {}
                None => dimensions = Some(embedding.len()),
            }
        }

        info!(path = %path.display(), documents = documents.len(), ?dimensions, "loaded document store");
        Ok(Self { path, dimensions, texts: documents, embeddings, metadata, generation: 0 })
    }

    /// Path of the snapshot file backing this store.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The embedding dimensionality, if fixed yet.
    pub fn dimensions(&self) -> Option<usize> {
        self.dimensions
    }

    /// Number of stored documents.
    pub fn len(&self) -> usize {
        self.texts.len()
    }

    /// Returns `true` if the store holds no documents.
    pub fn is_empty(&self) -> bool {
        self.texts.is_empty()
    }

    /// Monotonic counter bumped on every successful mutation.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// All stored embeddings, in id order.
    pub fn embeddings(&self) -> &[Vec<f32>] {
        &self.embeddings
    }

    /// All stored texts, in id order.
    pub fn texts(&self) -> &[String] {
        &self.texts
    }

    /// Fetch a full copy of the document with the given id.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::NotFound`] if `id` is out of range.
    pub fn get(&self, id: DocumentId) -> Result<Document> {
        let i = self.check_id(id)?;
        Ok(Document {
            id,
            text: self.texts[i].clone(),
            embedding: self.embeddings[i].clone(),
            metadata: self.metadata[i].clone(),
        })
    }

    /// Borrow the text of the document with the given id.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::NotFound`] if `id` is out of range.
    pub fn text(&self, id: DocumentId) -> Result<&str> {
        let i = self.check_id(id)?;
        Ok(&self.texts[i])
    }

    /// Append one document and persist the snapshot before returning.
    ///
    /// Either text, embedding, and metadata are all stored (in memory and on
    /// disk), or none of them are.
    ///
    /// # Errors
    ///
    /// - [`RagError::DimensionMismatch`] if the embedding width is wrong.
    /// - [`RagError::InvalidEmbedding`] if it contains NaN or infinity.
    /// - [`RagError::InvalidMetadata`] if a metadata number is NaN or infinite.
    /// - [`RagError::Snapshot`] if persisting fails; the store is unchanged.
    pub fn append(
        &mut self,
        text: impl Into<String>,
        embedding: Vec<f32>,
        metadata: Metadata,
    ) -> Result<DocumentId> {
        let dimensions = self.validate(&embedding, self.dimensions)?;
        validate_metadata(&metadata)?;
        let id = DocumentId(self.texts.len());

        self.texts.push(text.into());
        self.embeddings.push(embedding);
        self.metadata.push(metadata);

        if let Err(e) = self.persist() {
            self.truncate(id.0);
            return Err(e);
        }

        self.dimensions = Some(dimensions);
        self.generation += 1;
        debug!(document.id = %id, generation = self.generation, "appended document");
        Ok(id)
    }

    /// Append many documents with a single snapshot rewrite.
    ///
    /// All items are validated before anything is stored; on any failure
    /// the store is left unchanged. Returns the assigned ids in input order.
    ///
    /// # Errors
    ///
    /// Same as [`append`](DocumentStore::append).
    pub fn append_batch(
        &mut self,
        items: Vec<(String, Vec<f32>, Metadata)>,
    ) -> Result<Vec<DocumentId>> {
        if items.is_empty() {
            return Ok(Vec::new());
        }

        let mut dimensions = self.dimensions;
        for (_, embedding, metadata) in &items {
            dimensions = Some(self.validate(embedding, dimensions)?);
            validate_metadata(metadata)?;
        }

        let start = self.texts.len();
        for (text, embedding, metadata) in items {
            self.texts.push(text);
            self.embeddings.push(embedding);
            self.metadata.push(metadata);
        }

        if let Err(e) = self.persist() {
            self.truncate(start);
            return Err(e);
        }

        self.dimensions = dimensions;
        self.generation += 1;
        let ids: Vec<DocumentId> = (start..self.texts.len()).map(DocumentId).collect();
        info!(count = ids.len(), generation = self.generation, "appended document batch");
        Ok(ids)
    }

    /// Remove every document and persist the empty snapshot.
    ///
    /// The dimensionality stays fixed. Calling `clear` on an empty store is
    /// fine and still rewrites the snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Snapshot`] if persisting fails; the store is unchanged.
    pub fn clear(&mut self) -> Result<()> {
        write_snapshot(&self.path, &SnapshotRef { documents: &[], embeddings: &[], metadata: &[] })?;
        self.texts.clear();
        self.embeddings.clear();
        self.metadata.clear();
        self.generation += 1;
        info!(generation = self.generation, "cleared document store");
        Ok(())
    }

    fn check_id(&self, id: DocumentId) -> Result<usize> {
        if id.0 >= self.texts.len() {
            return Err(RagError::NotFound { id, len: self.texts.len() });
        }
        Ok(id.0)
    }

    fn validate(&self, embedding: &[f32], dimensions: Option<usize>) -> Result<usize> {
        if let Some(expected) = dimensions {
            if embedding.len() != expected {
                return Err(RagError::DimensionMismatch { expected, actual: embedding.len() });
            }
        }
        if embedding.is_empty() {
            return Err(RagError::DimensionMismatch { expected: 1, actual: 0 });
        }
        if let Some(position) = embedding.iter().position(|x| !x.is_finite()) {
            return Err(RagError::InvalidEmbedding { position });
        }
        Ok(embedding.len())
    }

    fn truncate(&mut self, len: usize) {
        self.texts.truncate(len);
        self.embeddings.truncate(len);
        self.metadata.truncate(len);
    }

    fn persist(&self) -> Result<()> {
        write_snapshot(
            &self.path,
            &SnapshotRef {
                documents: &self.texts,
                embeddings: &self.embeddings,
                metadata: &self.metadata,
            },
        )
    }
}

/// Path of the scratch file a snapshot is staged in before the rename.
/// JSON has no NaN or infinity, so such numbers would not survive a reload.
fn validate_metadata(metadata: &Metadata) -> Result<()> {
    match metadata.iter().find(|(_, value)| matches!(value, MetadataValue::Number(n) if !n.is_finite())) {
        Some((key, _)) => Err(RagError::InvalidMetadata { key: key.clone() }),
        None => Ok(()),
    }
}

fn staging_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

fn write_snapshot(path: &Path, snapshot: &SnapshotRef<'_>) -> Result<()> {
    let bytes = serde_json::to_vec_pretty(snapshot)
        .map_err(|e| RagError::snapshot(path, format!("failed to serialize snapshot: {e}")))?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| {
            error!(path = %path.display(), error = %e, "failed to create snapshot directory");
            RagError::snapshot(path, format!("failed to create directory: {e}"))
        })?;
    }

    let tmp = staging_path(path);
    let result = File::create(&tmp)
        .and_then(|mut file| {
            file.write_all(&bytes)?;
            file.sync_all()
        })
        .and_then(|()| fs::rename(&tmp, path));

    if let Err(e) = result {
        error!(path = %path.display(), error = %e, "failed to write snapshot");
        // The staging file may be a partial write; the real snapshot is untouched.
        let _ = fs::remove_file(&tmp);
        return Err(RagError::snapshot(path, format!("failed to write snapshot: {e}")));
    }

    debug!(path = %path.display(), bytes = bytes.len(), "snapshot written");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_store(dimensions: Option<usize>) -> (tempfile::TempDir, DocumentStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = DocumentStore::load(dir.path().join("db.json"), dimensions).unwrap();
        (dir, store)
    }

    #[test]
    fn missing_snapshot_loads_empty() {
        let (_dir, store) = temp_store(Some(3));
        assert!(store.is_empty());
        assert_eq!(store.generation(), 0);
        assert!(!store.path().exists());
    }

    #[test]
    fn append_round_trips_through_the_snapshot() {
        let (dir, mut store) = temp_store(None);
        let embedding = vec![0.1f32, -2.5e-8, 3.4028235e38, f32::MIN_POSITIVE];
        let mut metadata = Metadata::new();
        metadata.insert("lang".into(), "th".into());
        metadata.insert("score".into(), 0.1f64.into());
        metadata.insert("seed".into(), true.into());

        let id = store.append("หวัดดีครับ", embedding.clone(), metadata.clone()).unwrap();
        assert_eq!(id, DocumentId(0));

        let reloaded = DocumentStore::load(dir.path().join("db.json"), None).unwrap();
        let doc = reloaded.get(id).unwrap();
        assert_eq!(doc.text, "หวัดดีครับ");
        assert_eq!(doc.metadata, metadata);
        let bits: Vec<u32> = doc.embedding.iter().map(|x| x.to_bits()).collect();
        let expected: Vec<u32> = embedding.iter().map(|x| x.to_bits()).collect();
        assert_eq!(bits, expected);
        assert_eq!(reloaded.dimensions(), Some(4));
    }

    #[test]
    fn ids_are_sequential() {
        let (_dir, mut store) = temp_store(Some(2));
        let a = store.append("a", vec![0.0, 1.0], Metadata::new()).unwrap();
        let b = store.append("b", vec![1.0, 0.0], Metadata::new()).unwrap();
        assert_eq!((a, b), (DocumentId(0), DocumentId(1)));
        assert_eq!(store.text(b).unwrap(), "b");
    }

    #[test]
    fn wrong_dimension_is_rejected_and_store_unchanged() {
        let (_dir, mut store) = temp_store(Some(384));
        store.append("ok", vec![0.5; 384], Metadata::new()).unwrap();
        let generation = store.generation();

        let err = store.append("bad", vec![0.5; 10], Metadata::new()).unwrap_err();
        assert!(matches!(err, RagError::DimensionMismatch { expected: 384, actual: 10 }));
        assert_eq!(store.len(), 1);
        assert_eq!(store.generation(), generation);
    }

    #[test]
    fn first_insert_fixes_dimension() {
        let (_dir, mut store) = temp_store(None);
        store.append("a", vec![1.0; 3], Metadata::new()).unwrap();
        let err = store.append("b", vec![1.0; 4], Metadata::new()).unwrap_err();
        assert!(matches!(err, RagError::DimensionMismatch { expected: 3, actual: 4 }));
    }

    #[test]
    fn non_finite_embedding_is_rejected() {
        let (_dir, mut store) = temp_store(Some(3));
        let err = store.append("nan", vec![0.0, f32::NAN, 1.0], Metadata::new()).unwrap_err();
        assert!(matches!(err, RagError::InvalidEmbedding { position: 1 }));
        assert!(store.is_empty());
    }

    #[test]
    fn non_finite_metadata_is_rejected_and_snapshot_stays_loadable() {
        let (dir, mut store) = temp_store(Some(2));
        let path = dir.path().join("db.json");
        store.append("kept", vec![1.0, 2.0], Metadata::new()).unwrap();
        let before = fs::read(&path).unwrap();

        for bad in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            let mut metadata = Metadata::new();
            metadata.insert("lang".into(), "th".into());
            metadata.insert("score".into(), bad.into());
            let err = store.append("bad", vec![3.0, 4.0], metadata).unwrap_err();
            assert!(matches!(err, RagError::InvalidMetadata { ref key } if key == "score"));
        }
        assert_eq!(store.len(), 1);
        assert_eq!(store.generation(), 1);
        assert_eq!(fs::read(&path).unwrap(), before);

        let reloaded = DocumentStore::load(&path, Some(2)).unwrap();
        assert_eq!(reloaded.len(), 1);
        assert_eq!(reloaded.text(DocumentId(0)).unwrap(), "kept");
    }

    #[test]
    fn batch_with_non_finite_metadata_stores_nothing() {
        let (dir, mut store) = temp_store(Some(2));
        let mut bad = Metadata::new();
        bad.insert("weight".into(), MetadataValue::Number(f64::NAN));
        let items = vec![
            ("a".to_string(), vec![1.0, 2.0], Metadata::new()),
            ("b".to_string(), vec![3.0, 4.0], bad),
        ];

        let err = store.append_batch(items).unwrap_err();
        assert!(matches!(err, RagError::InvalidMetadata { ref key } if key == "weight"));
        assert!(store.is_empty());
        assert_eq!(store.generation(), 0);
        assert!(!dir.path().join("db.json").exists());
    }

    #[test]
    fn missing_id_is_not_found() {
        let (_dir, store) = temp_store(Some(3));
        let err = store.get(DocumentId(0)).unwrap_err();
        assert!(matches!(err, RagError::NotFound { id: DocumentId(0), len: 0 }));
    }

    #[test]
    fn clear_twice_leaves_store_empty_and_persisted() {
        let (dir, mut store) = temp_store(Some(2));
        store.append("a", vec![1.0, 2.0], Metadata::new()).unwrap();

        store.clear().unwrap();
        assert!(store.is_empty());
        store.clear().unwrap();
        assert!(store.is_empty());
        assert_eq!(store.generation(), 3);

        let reloaded = DocumentStore::load(dir.path().join("db.json"), Some(2)).unwrap();
        assert!(reloaded.is_empty());
    }

    #[test]
    fn batch_is_all_or_nothing() {
        let (_dir, mut store) = temp_store(Some(2));
        let items = vec![
            ("a".to_string(), vec![1.0, 2.0], Metadata::new()),
            ("b".to_string(), vec![1.0], Metadata::new()),
        ];
        assert!(store.append_batch(items).is_err());
        assert!(store.is_empty());
        assert_eq!(store.generation(), 0);

        let items = vec![
            ("a".to_string(), vec![1.0, 2.0], Metadata::new()),
            ("b".to_string(), vec![3.0, 4.0], Metadata::new()),
        ];
        let ids = store.append_batch(items).unwrap();
        assert_eq!(ids, vec![DocumentId(0), DocumentId(1)]);
        assert_eq!(store.generation(), 1);
    }

    #[test]
    fn failed_write_leaves_memory_and_disk_unchanged() {
        let (dir, mut store) = temp_store(Some(2));
        let path = dir.path().join("db.json");
        store.append("kept", vec![1.0, 2.0], Metadata::new()).unwrap();
        let before = fs::read(&path).unwrap();

        // A directory squatting on the staging path makes the write fail.
        fs::create_dir(staging_path(&path)).unwrap();
        let err = store.append("lost", vec![3.0, 4.0], Metadata::new()).unwrap_err();
        assert!(matches!(err, RagError::Snapshot { .. }));
        assert_eq!(store.len(), 1);
        assert_eq!(store.generation(), 1);
        assert_eq!(fs::read(&path).unwrap(), before);

        assert!(store.clear().is_err());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn inconsistent_snapshot_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("db.json");
        fs::write(&path, r#"{"documents":["a"],"embeddings":[],"metadata":[{}]}"#).unwrap();
        let err = DocumentStore::load(&path, None).unwrap_err();
        assert!(matches!(err, RagError::Snapshot { .. }));
    }

    #[test]
    fn snapshot_with_wrong_width_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("db.json");
        fs::write(&path, r#"{"documents":["a"],"embeddings":[[1.0,2.0]],"metadata":[{}]}"#)
            .unwrap();
        let err = DocumentStore::load(&path, Some(3)).unwrap_err();
        assert!(matches!(err, RagError::DimensionMismatch { expected: 3, actual: 2 }));
    }

    #[test]
    fn snapshot_uses_documents_embeddings_metadata_keys() {
        let (dir, mut store) = temp_store(Some(1));
        let mut metadata = Metadata::new();
        metadata.insert("n".into(), MetadataValue::Number(1.5));
        store.append("x", vec![0.25], metadata).unwrap();

        let raw: serde_json::Value =
            serde_json::from_slice(&fs::read(dir.path().join("db.json")).unwrap()).unwrap();
        assert_eq!(raw["documents"][0], "x");
        assert_eq!(raw["embeddings"][0][0], 0.25);
        assert_eq!(raw["metadata"][0]["n"], 1.5);
    }
}
