use crate::document::DocumentFormat;
use crate::error::{IndexError, IoContext, Result};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fs;
use std::path::{Path, PathBuf};

/// Unique identifier for a document in the index
pub type DocId = u32;

/// Unique identifier for a vocabulary term
pub type TermId = u32;

/// Run number, assigned sequentially from 0
pub type RunId = usize;

/// One term occurring in one document, with its in-document frequency.
///
/// Ordered by `(term_id, doc_id)`, which is the order of run files and of
/// the merged stream. The frequency does not take part in the ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DocumentTerm {
    pub term_id: TermId,
    pub doc_id: DocId,
    pub frequency: u32,
}

impl DocumentTerm {
    pub fn new(term_id: TermId, doc_id: DocId, frequency: u32) -> Self {
        Self {
            term_id,
            doc_id,
            frequency,
        }
    }

    #[inline]
    pub fn key(&self) -> (TermId, DocId) {
        (self.term_id, self.doc_id)
    }
}

impl Ord for DocumentTerm {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key()
            .cmp(&other.key())
            .then(self.frequency.cmp(&other.frequency))
    }
}

impl PartialOrd for DocumentTerm {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Posting entry - a document containing a term, and how often
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Posting {
    pub doc_id: DocId,
    pub frequency: u32,
}

impl Posting {
    pub fn new(doc_id: DocId, frequency: u32) -> Self {
        Self { doc_id, frequency }
    }
}

/// The complete posting list of a single term
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TermPostings {
    pub term_id: TermId,
    pub postings: Vec<Posting>,
}

impl TermPostings {
    /// Document frequency: the number of documents containing the term
    pub fn df(&self) -> usize {
        self.postings.len()
    }
}

/// Index metadata stored in meta.json
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexMeta {
    pub version: u32,
    pub corpus_path: PathBuf,
    pub doc_count: u32,
    pub vocabulary_size: u32,
    pub run_count: usize,
    pub run_size: usize,
    /// Sum of df over all terms
    pub posting_count: u64,
    pub total_tokens: u64,
    pub created_at: u64,
}

impl Default for IndexMeta {
    fn default() -> Self {
        Self {
            version: 1,
            corpus_path: PathBuf::new(),
            doc_count: 0,
            vocabulary_size: 0,
            run_count: 0,
            run_size: 0,
            posting_count: 0,
            total_tokens: 0,
            created_at: 0,
        }
    }
}

/// Configuration for the indexer
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    /// Directory receiving every artifact of the build
    pub output_dir: PathBuf,
    /// Maximum number of records held in memory before a run is spilled
    pub run_size: usize,
    /// Write the gap, variable-byte and gamma outputs
    pub compress: bool,
    /// Keep run files after a successful merge
    pub keep_runs: bool,
    /// Lowercase tokens before they reach the vocabulary
    pub case_fold: bool,
    /// Plain text, HTML, or chosen per document by file extension
    pub format: DocumentFormat,
    /// Parse the documents of a batch in parallel
    pub parallel_parse: bool,
    /// Number of documents read from the corpus at a time
    pub parse_batch_size: usize,
    /// Capacity (in documents) of the queue feeding the run spiller
    pub channel_capacity: usize,
    /// Show progress bars
    pub progress: bool,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("data"),
            run_size: 1_000_000,
            compress: true,
            keep_runs: false,
            case_fold: true,
            format: DocumentFormat::Auto,
            parallel_parse: true,
            parse_batch_size: 256,
            channel_capacity: 64,
            progress: true,
        }
    }
}

impl IndexConfig {
    /// Load a config from a JSON file. Missing fields take their defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).with_path(path)?;
        let config: IndexConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.run_size == 0 {
            return Err(IndexError::Config("run_size must be at least 1".into()));
        }
        if self.parse_batch_size == 0 {
            return Err(IndexError::Config(
                "parse_batch_size must be at least 1".into(),
            ));
        }
        if self.channel_capacity == 0 {
            return Err(IndexError::Config(
                "channel_capacity must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_term_order() {
        let mut records = vec![
            DocumentTerm::new(2, 0, 1),
            DocumentTerm::new(0, 5, 3),
            DocumentTerm::new(0, 1, 1),
            DocumentTerm::new(1, 0, 2),
        ];
        records.sort();
        let keys: Vec<_> = records.iter().map(DocumentTerm::key).collect();
        assert_eq!(keys, vec![(0, 1), (0, 5), (1, 0), (2, 0)]);
    }

    #[test]
    fn test_config_partial_json() {
        let config: IndexConfig = serde_json::from_str(r#"{"run_size": 10}"#).unwrap();
        assert_eq!(config.run_size, 10);
        assert_eq!(config.output_dir, PathBuf::from("data"));
        assert!(config.compress);
        assert_eq!(config.format, DocumentFormat::Auto);

        let config: IndexConfig = serde_json::from_str(r#"{"format": "text"}"#).unwrap();
        assert_eq!(config.format, DocumentFormat::Text);
    }

    #[test]
    fn test_config_rejects_zero_run_size() {
        let config = IndexConfig {
            run_size: 0,
            ..IndexConfig::default()
        };
        assert!(matches!(config.validate(), Err(IndexError::Config(_))));
    }
}
