//! Ranking cached embeddings against a query.

use serde::Serialize;

use crate::index::IndexEntry;
use crate::math::cosine_similarity;

/// One ranked match.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResult {
    pub path: String,
    /// Cosine similarity in `[-1, 1]`
    pub similarity: f64,
}

/// Rank every entry by cosine similarity to `query`, best first.
///
/// The whole list is scored and sorted; callers truncate for display. The
/// sort is stable, so exact ties keep the order in which entries were given.
pub fn rank(query: &[f64], entries: &[IndexEntry]) -> Vec<SearchResult> {
    let mut results: Vec<SearchResult> = entries
        .iter()
        .map(|entry| SearchResult {
            path: entry.path.clone(),
            similarity: cosine_similarity(query, &entry.embedding),
        })
        .collect();
    results.sort_by(|a, b| b.similarity.total_cmp(&a.similarity));
    results
}

/// [`rank`] followed by truncation to `limit`.
pub fn top_matches(query: &[f64], entries: &[IndexEntry], limit: usize) -> Vec<SearchResult> {
    let mut results = rank(query, entries);
    results.truncate(limit);
    results
}
