//! Embedding capability and corpus indexing.
//!
//! [`build`] renders every catalog record, embeds the texts through a
//! caller-supplied [`Embedder`], normalizes the vectors, and packs them with
//! the records into an [`IndexedCorpus`]. The corpus owns both halves, so
//! position `i` in the index always resolves to `records()[i]`.

use async_trait::async_trait;

use crate::catalog;
use crate::corpus;
use crate::index::{normalize_l2, FlatIpIndex, VectorIndex};
use crate::models::CatalogRecord;
use crate::{Error, Result};

/// A text-to-vector backend.
///
/// Implementations must return one vector per input text, in input order,
/// with the same dimensionality on every call. Concrete providers (OpenAI,
/// Ollama, fastembed, feature hashing) live in the `model-recommender` app
/// crate.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Returns the model identifier (e.g. `"all-minilm-l6-v2"`).
    fn model_name(&self) -> &str;
    /// Returns the embedding vector dimensionality (e.g. `384`).
    fn dims(&self) -> usize;
    /// Embed a batch of texts.
    async fn embed(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>>;
}

/// The built artifact: a similarity index and its positionally aligned
/// metadata.
///
/// Generic over the index so retrieval can run against any
/// [`VectorIndex`]; [`build`] and the on-disk format use [`FlatIpIndex`].
#[derive(Debug, Clone, PartialEq)]
pub struct IndexedCorpus<I = FlatIpIndex> {
    index: I,
    records: Vec<CatalogRecord>,
}

impl<I: VectorIndex> IndexedCorpus<I> {
    /// Pair an index with its metadata.
    ///
    /// Fails with [`Error::Load`] if the vector count and record count
    /// differ, or if the pair is empty.
    pub fn new(index: I, records: Vec<CatalogRecord>) -> Result<Self> {
        if index.len() != records.len() {
            return Err(Error::Load(format!(
                "index holds {} vectors but metadata holds {} records",
                index.len(),
                records.len()
            )));
        }
        if records.is_empty() {
            return Err(Error::Load("corpus is empty".to_string()));
        }
        Ok(Self { index, records })
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn dims(&self) -> usize {
        self.index.dims()
    }

    pub fn index(&self) -> &I {
        &self.index
    }

    pub fn records(&self) -> &[CatalogRecord] {
        &self.records
    }

    pub fn record(&self, position: usize) -> Option<&CatalogRecord> {
        self.records.get(position)
    }

    /// Look up a record by id.
    pub fn find(&self, id: &str) -> Option<&CatalogRecord> {
        self.records.iter().find(|r| r.id == id)
    }

}

impl IndexedCorpus<FlatIpIndex> {
    /// Normalized vectors in index order.
    pub fn vectors(&self) -> impl Iterator<Item = &[f32]> {
        self.index.vectors()
    }
}

/// Build an [`IndexedCorpus`] from merged catalog records.
///
/// Texts go to the embedder in batches of `batch_size` (at least 1); order
/// is preserved across batches.
///
/// # Errors
///
/// - [`Error::Build`] for an empty catalog, an invalid id set, or a record
///   whose corpus text is empty.
/// - [`Error::Embedding`] if the embedder fails, returns the wrong number of
///   vectors, mixes dimensionalities, or returns a zero vector.
pub async fn build(
    records: Vec<CatalogRecord>,
    embedder: &dyn Embedder,
    batch_size: usize,
) -> Result<IndexedCorpus> {
    if records.is_empty() {
        return Err(Error::Build("catalog is empty".to_string()));
    }
    catalog::validate(&records)?;

    let texts: Vec<String> = records.iter().map(corpus::render).collect();
    if let Some(position) = texts.iter().position(|t| t.trim().is_empty()) {
        return Err(Error::Build(format!(
            "record at position {} renders to empty corpus text",
            position
        )));
    }

    let mut vectors: Vec<Vec<f32>> = Vec::with_capacity(texts.len());
    for batch in texts.chunks(batch_size.max(1)) {
        let embedded = embedder.embed(batch).await.map_err(Error::Embedding)?;
        if embedded.len() != batch.len() {
            return Err(Error::embedding(format!(
                "embedder returned {} vectors for {} texts",
                embedded.len(),
                batch.len()
            )));
        }
        vectors.extend(embedded);
    }

    let dims = vectors[0].len();
    if dims == 0 {
        return Err(Error::embedding("embedder returned empty vectors"));
    }
    for (position, v) in vectors.iter_mut().enumerate() {
        if v.len() != dims {
            return Err(Error::embedding(format!(
                "vector {} has {} dims, expected {}",
                position,
                v.len(),
                dims
            )));
        }
        if !normalize_l2(v) {
            return Err(Error::embedding(format!(
                "embedding for record {} has zero norm",
                records[position].id
            )));
        }
    }

    let mut index = FlatIpIndex::new(dims);
    index.add(&vectors)?;
    IndexedCorpus::new(index, records)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::index::l2_norm;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Maps word stems onto fixed axes; collision-free and deterministic.
    pub(crate) struct StemEmbedder {
        stems: Vec<&'static str>,
        pub(crate) calls: AtomicUsize,
    }

    impl StemEmbedder {
        pub(crate) fn new() -> Self {
            Self {
                stems: vec![
                    "sentiment", "classif", "image", "segment", "text", "forecast", "time",
                ],
                calls: AtomicUsize::new(0),
            }
        }

        pub(crate) fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Embedder for StemEmbedder {
        fn model_name(&self) -> &str {
            "stem-test"
        }

        fn dims(&self) -> usize {
            self.stems.len() + 1
        }

        async fn embed(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(texts
                .iter()
                .map(|t| {
                    let lower = t.to_lowercase();
                    let mut v = vec![0.0f32; self.dims()];
                    for word in lower.split(|c: char| !c.is_alphanumeric()) {
                        match self.stems.iter().position(|s| word.starts_with(s)) {
                            Some(axis) => v[axis] += 1.0,
                            None if !word.is_empty() => v[self.stems.len()] += 0.1,
                            None => {}
                        }
                    }
                    v
                })
                .collect())
        }
    }

    struct FailingEmbedder;

    #[async_trait]
    impl Embedder for FailingEmbedder {
        fn model_name(&self) -> &str {
            "failing"
        }
        fn dims(&self) -> usize {
            4
        }
        async fn embed(&self, _texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>> {
            anyhow::bail!("backend unavailable")
        }
    }

    struct ShortEmbedder;

    #[async_trait]
    impl Embedder for ShortEmbedder {
        fn model_name(&self) -> &str {
            "short"
        }
        fn dims(&self) -> usize {
            2
        }
        async fn embed(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>> {
            Ok(texts.iter().skip(1).map(|_| vec![1.0, 0.0]).collect())
        }
    }

    pub(crate) fn record(id: &str, description: &str) -> CatalogRecord {
        let mut r = CatalogRecord::new(id);
        r.description = Some(description.to_string());
        r
    }

    #[tokio::test]
    async fn test_build_aligns_vectors_and_metadata() {
        let records = vec![
            record("a", "Use case: sentiment classification"),
            record("b", "Use case: image segmentation"),
            record("c", "Use case: time series forecasting"),
        ];
        let embedder = StemEmbedder::new();
        let corpus = build(records.clone(), &embedder, 2).await.unwrap();

        assert_eq!(corpus.len(), 3);
        assert_eq!(corpus.records(), records.as_slice());
        assert_eq!(embedder.calls(), 2);
        for (position, v) in corpus.vectors().enumerate() {
            assert!((l2_norm(v) - 1.0).abs() < 1e-5, "vector {} not unit", position);
        }
        // "b" is the only record with an image axis.
        let image_axis = 2;
        let best = corpus
            .vectors()
            .enumerate()
            .max_by(|x, y| x.1[image_axis].partial_cmp(&y.1[image_axis]).unwrap())
            .map(|(p, _)| p)
            .unwrap();
        assert_eq!(corpus.record(best).unwrap().id, "b");
    }

    #[tokio::test]
    async fn test_build_rejects_empty_catalog() {
        let err = build(Vec::new(), &StemEmbedder::new(), 8).await.unwrap_err();
        assert!(matches!(err, Error::Build(_)));
    }

    #[tokio::test]
    async fn test_build_rejects_empty_corpus_text() {
        let records = vec![record("a", "text"), CatalogRecord::new("  ")];
        let embedder = StemEmbedder::new();
        let err = build(records, &embedder, 8).await.unwrap_err();
        assert!(matches!(err, Error::Build(_)));
        assert_eq!(embedder.calls(), 0);
    }

    #[tokio::test]
    async fn test_build_propagates_embedding_failure() {
        let err = build(vec![record("a", "text")], &FailingEmbedder, 8)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Embedding(_)));
        assert!(err.to_string().contains("backend unavailable"));
    }

    #[tokio::test]
    async fn test_build_rejects_short_batch() {
        let records = vec![record("a", "text"), record("b", "image")];
        let err = build(records, &ShortEmbedder, 8).await.unwrap_err();
        assert!(matches!(err, Error::Embedding(_)));
    }

    #[test]
    fn test_corpus_new_rejects_count_mismatch() {
        let mut index = FlatIpIndex::new(2);
        index.add(&[vec![1.0, 0.0]]).unwrap();
        let err =
            IndexedCorpus::new(index, vec![record("a", "x"), record("b", "y")]).unwrap_err();
        assert!(matches!(err, Error::Load(_)));
    }
}
