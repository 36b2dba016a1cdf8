//! Interest-driven snippet retrieval

use std::sync::Arc;

use tracing::debug;

use super::DocumentIndex;

/// Default number of snippets per query
pub const DEFAULT_TOP_K: usize = 3;

/// Looks up destination snippets for a set of interest tags
#[derive(Debug, Clone)]
pub struct DestinationRetriever {
    index: Arc<DocumentIndex>,
    top_k: usize,
}

impl DestinationRetriever {
    /// Retriever over `index` with the default `top_k`
    pub fn new(index: Arc<DocumentIndex>) -> Self {
        Self {
            index,
            top_k: DEFAULT_TOP_K,
        }
    }

    /// Number of snippets to return
    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    /// Underlying index
    pub fn index(&self) -> &Arc<DocumentIndex> {
        &self.index
    }

    /// `"{title}: {content}"` per ranked hit, newline separated.
    ///
    /// Returns an empty string when the index holds no documents.
    pub fn retrieve_info(&self, interests: &[String]) -> String {
        if self.index.is_empty() {
            return String::new();
        }

        let query = interests.join(", ");
        let hits = self.index.search(&query, self.top_k);
        debug!(query = %query, hits = hits.len(), "destination info retrieved");

        hits.iter()
            .map(|hit| format!("{}: {}", hit.document.title, hit.document.content))
            .collect::<Vec<_>>()
            .join("\n")
    }
}
