//! Top-k retrieval over an [`IndexedCorpus`].
//!
//! # Algorithm
//!
//! 1. Blank query text short-circuits to an empty result (no embedding call).
//! 2. Embed the query, L2-normalize it.
//! 3. Exact inner-product search for `min(top_k, len)` neighbours.
//! 4. Drop sentinel slots, resolve each position to its record.
//! 5. Sort by score (desc), then position (asc).

use crate::index::{normalize_l2, VectorIndex};
use crate::indexer::{Embedder, IndexedCorpus};
use crate::models::{CatalogRecord, QueryResult, RecommendQuery};
use crate::query::is_blank_text;
use crate::{Error, Result};

/// Find the `top_k` records most similar to `query_text`.
///
/// Returns at most `min(top_k, corpus.len())` results. Slots the index
/// leaves empty ([`NO_MATCH`](crate::index::NO_MATCH)) are dropped.
///
/// # Errors
///
/// - [`Error::Config`] if `top_k` is zero.
/// - [`Error::Embedding`] if the embedder fails or returns a vector that
///   cannot be compared with the corpus.
/// - [`Error::Alignment`] if the index yields a position with no record.
pub async fn search<I: VectorIndex>(
    query_text: &str,
    corpus: &IndexedCorpus<I>,
    embedder: &dyn Embedder,
    top_k: usize,
) -> Result<Vec<QueryResult>> {
    check_top_k(top_k)?;
    if is_blank_text(query_text) {
        return Ok(Vec::new());
    }

    let mut query_vec = embedder
        .embed(&[query_text.to_string()])
        .await
        .map_err(Error::Embedding)?
        .into_iter()
        .next()
        .ok_or_else(|| Error::embedding("empty embedding response"))?;

    if query_vec.len() != corpus.dims() {
        return Err(Error::embedding(format!(
            "query vector has {} dims, corpus was built with {}",
            query_vec.len(),
            corpus.dims()
        )));
    }
    if !normalize_l2(&mut query_vec) {
        return Err(Error::embedding("query embedding has zero norm"));
    }

    let neighbors = corpus.index().search(&query_vec, top_k.min(corpus.len()));

    let mut hits: Vec<(usize, f32, &CatalogRecord)> = Vec::with_capacity(neighbors.len());
    for neighbor in neighbors.into_iter().filter(|n| n.is_match()) {
        let (position, record) = usize::try_from(neighbor.label)
            .ok()
            .and_then(|p| corpus.record(p).map(|r| (p, r)))
            .ok_or(Error::Alignment {
                position: neighbor.label,
                len: corpus.len(),
            })?;
        hits.push((position, neighbor.score, record));
    }

    hits.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.0.cmp(&b.0))
    });

    Ok(hits
        .into_iter()
        .map(|(_, score, record)| QueryResult {
            score,
            record: record.clone(),
        })
        .collect())
}

/// Compose a structured query and search with it.
///
/// A blank use case yields no results without calling the embedder, even
/// when facets are filled in.
pub async fn recommend<I: VectorIndex>(
    query: &RecommendQuery,
    corpus: &IndexedCorpus<I>,
    embedder: &dyn Embedder,
    top_k: usize,
) -> Result<Vec<QueryResult>> {
    check_top_k(top_k)?;
    if query.is_blank() {
        return Ok(Vec::new());
    }
    search(&query.compose(), corpus, embedder, top_k).await
}

fn check_top_k(top_k: usize) -> Result<()> {
    if top_k == 0 {
        return Err(Error::Config("top_k must be >= 1".to_string()));
    }
    Ok(())
}
