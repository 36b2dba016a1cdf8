//! Destination dataset retrieval
//!
//! The [`DocumentIndex`] is built once from a static JSON dataset and never
//! mutated afterwards, so one `Arc<DocumentIndex>` can serve any number of
//! concurrent runs. Components receive the handle through their
//! constructors; [`init_global_index`] exists for processes that want a
//! single shared instance created at startup.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

pub mod embedding;
pub mod retriever;

pub use embedding::{cosine_similarity, Embedder, HashingEmbedder};
pub use retriever::DestinationRetriever;

/// Errors raised while loading the destination dataset
#[derive(Error, Debug)]
pub enum RetrievalError {
    /// Dataset file could not be read
    #[error("failed to read dataset {}: {source}", .path.display())]
    Io {
        /// Dataset path
        path: PathBuf,
        /// Underlying read error
        source: std::io::Error,
    },

    /// Dataset file is not a valid record array
    #[error("failed to parse dataset {}: {source}", .path.display())]
    Parse {
        /// Dataset path
        path: PathBuf,
        /// Underlying parse error
        source: serde_json::Error,
    },
}

/// One record of the dataset file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DestinationRecord {
    /// Display title
    pub title: String,
    /// Body text
    pub content: String,
}

/// An indexed document
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Document {
    /// `doc-<position>` in load order
    pub id: String,
    /// Display title
    pub title: String,
    /// Body text
    pub content: String,
}

/// A ranked search result
#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit<'a> {
    /// Matched document
    pub document: &'a Document,
    /// Cosine similarity to the query
    pub score: f32,
}

/// Read-only similarity index over the destination dataset
pub struct DocumentIndex {
    documents: Vec<Document>,
    embeddings: Vec<Vec<f32>>,
    by_id: HashMap<String, usize>,
    embedder: Arc<dyn Embedder>,
}

impl DocumentIndex {
    /// An index with no documents; every search returns nothing
    pub fn empty(embedder: Arc<dyn Embedder>) -> Self {
        Self::from_records(Vec::new(), embedder)
    }

    /// Embed and index `records` in order. Ids are `doc-{position}`.
    pub fn from_records(records: Vec<DestinationRecord>, embedder: Arc<dyn Embedder>) -> Self {
        let mut documents = Vec::with_capacity(records.len());
        let mut embeddings = Vec::with_capacity(records.len());
        let mut by_id = HashMap::with_capacity(records.len());

        for (position, record) in records.into_iter().enumerate() {
            let id = format!("doc-{}", position);
            embeddings.push(embedder.embed(&format!("{} {}", record.title, record.content)));
            by_id.insert(id.clone(), position);
            documents.push(Document {
                id,
                title: record.title,
                content: record.content,
            });
        }

        Self {
            documents,
            embeddings,
            by_id,
            embedder,
        }
    }

    /// Load a JSON array of `{title, content}` records
    pub fn load(path: impl AsRef<Path>, embedder: Arc<dyn Embedder>) -> Result<Self, RetrievalError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| RetrievalError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let records: Vec<DestinationRecord> =
            serde_json::from_str(&raw).map_err(|source| RetrievalError::Parse {
                path: path.to_path_buf(),
                source,
            })?;

        info!(path = %path.display(), documents = records.len(), "destination index loaded");
        Ok(Self::from_records(records, embedder))
    }

    /// Load the dataset, degrading to an empty index on any failure
    pub fn load_or_empty(path: impl AsRef<Path>, embedder: Arc<dyn Embedder>) -> Self {
        match Self::load(path, Arc::clone(&embedder)) {
            Ok(index) => index,
            Err(e) => {
                warn!(error = %e, "destination dataset unavailable, retrieval disabled");
                Self::empty(embedder)
            }
        }
    }

    /// Number of indexed documents
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    /// True when nothing is indexed
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Look a document up by id
    pub fn get(&self, id: &str) -> Option<&Document> {
        self.by_id.get(id).map(|&position| &self.documents[position])
    }

    /// Top `k` documents by descending similarity. Equal scores keep corpus order.
    pub fn search(&self, query: &str, k: usize) -> Vec<SearchHit<'_>> {
        if k == 0 || self.documents.is_empty() {
            return Vec::new();
        }

        let query_vector = self.embedder.embed(query);
        let mut hits: Vec<SearchHit<'_>> = self
            .documents
            .iter()
            .zip(&self.embeddings)
            .map(|(document, embedding)| SearchHit {
                document,
                score: cosine_similarity(&query_vector, embedding),
            })
            .collect();

        // sort_by is stable, which is what keeps tie order fixed
        hits.sort_by(|a, b| b.score.total_cmp(&a.score));
        hits.truncate(k);
        hits
    }
}

impl std::fmt::Debug for DocumentIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentIndex")
            .field("documents", &self.documents.len())
            .field("dimensions", &self.embedder.dimensions())
            .finish()
    }
}

static GLOBAL_INDEX: OnceLock<Arc<DocumentIndex>> = OnceLock::new();

/// Build the process-wide index. The first call loads; later calls return it.
pub fn init_global_index(path: impl AsRef<Path>, embedder: Arc<dyn Embedder>) -> Arc<DocumentIndex> {
    GLOBAL_INDEX
        .get_or_init(|| Arc::new(DocumentIndex::load_or_empty(path, embedder)))
        .clone()
}

/// The process-wide index, if [`init_global_index`] has run
pub fn global_index() -> Option<Arc<DocumentIndex>> {
    GLOBAL_INDEX.get().cloned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn embedder() -> Arc<dyn Embedder> {
        Arc::new(HashingEmbedder::default())
    }

    fn records() -> Vec<DestinationRecord> {
        vec![
            DestinationRecord {
                title: "Paris Food Guide".to_string(),
                content: "Bakeries, bistros and street food markets.".to_string(),
            },
            DestinationRecord {
                title: "Swiss Alps Hiking".to_string(),
                content: "Mountain trails and glacier views.".to_string(),
            },
        ]
    }

    #[test]
    fn test_index_assigns_ids_in_order() {
        let index = DocumentIndex::from_records(records(), embedder());
        assert_eq!(index.len(), 2);
        assert_eq!(index.get("doc-0").unwrap().title, "Paris Food Guide");
        assert_eq!(index.get("doc-1").unwrap().title, "Swiss Alps Hiking");
        assert!(index.get("doc-2").is_none());
    }

    #[test]
    fn test_search_ranks_by_similarity() {
        let index = DocumentIndex::from_records(records(), embedder());
        let hits = index.search("food", 1);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].document.title, "Paris Food Guide");
    }

    #[test]
    fn test_search_with_zero_k_or_empty_index() {
        let index = DocumentIndex::from_records(records(), embedder());
        assert!(index.search("food", 0).is_empty());
        assert!(DocumentIndex::empty(embedder()).search("food", 3).is_empty());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[{{"title": "Kyoto Temples", "content": "Zen gardens and shrines."}}]"#
        )
        .unwrap();

        let index = DocumentIndex::load(file.path(), embedder()).unwrap();
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn test_missing_file_degrades_to_empty() {
        let index = DocumentIndex::load_or_empty("/nonexistent/destination_data.json", embedder());
        assert!(index.is_empty());
    }

    #[test]
    fn test_malformed_file_is_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{ not json").unwrap();

        let err = DocumentIndex::load(file.path(), embedder()).unwrap_err();
        assert!(matches!(err, RetrievalError::Parse { .. }));
        assert!(DocumentIndex::load_or_empty(file.path(), embedder()).is_empty());
    }
}
