use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::index::types::{DocId, DocumentTerm, TermId};

/// Error type for every stage of an index build and for index readers
#[derive(Error, Debug)]
pub enum IndexError {
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(
        "Sort invariant violated in run {run}: ({}, {}) followed by ({}, {})",
        previous.term_id, previous.doc_id, found.term_id, found.doc_id
    )]
    SortInvariant {
        run: usize,
        previous: DocumentTerm,
        found: DocumentTerm,
    },

    #[error("Malformed run {run} at line {line}: {reason}")]
    MalformedRun {
        run: usize,
        line: usize,
        reason: String,
    },

    #[error("Malformed postings: {0}")]
    MalformedPostings(String),

    #[error("Malformed code: {0}")]
    MalformedCode(String),

    #[error("Gamma codes require a value >= 1, got {0}")]
    InvalidGammaValue(u32),

    #[error("Offset table error: {0}")]
    OffsetTable(String),

    #[error("Unknown term id: {0}")]
    UnknownTerm(TermId),

    #[error("Unknown document id: {0}")]
    UnknownDocument(DocId),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Corpus error: {0}")]
    Corpus(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for index operations
pub type Result<T> = std::result::Result<T, IndexError>;

impl IndexError {
    /// Wrap an I/O error with the path it happened on
    pub fn io(path: impl AsRef<Path>, source: io::Error) -> Self {
        IndexError::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    /// Whether this error means the data on disk is inconsistent, as opposed
    /// to the environment failing
    pub fn is_corruption(&self) -> bool {
        matches!(
            self,
            IndexError::SortInvariant { .. }
                | IndexError::MalformedRun { .. }
                | IndexError::MalformedPostings(_)
                | IndexError::MalformedCode(_)
                | IndexError::OffsetTable(_)
        )
    }
}

/// Attach a path to `io::Result`s
pub trait IoContext<T> {
    fn with_path(self, path: impl AsRef<Path>) -> Result<T>;
}

impl<T> IoContext<T> for io::Result<T> {
    fn with_path(self, path: impl AsRef<Path>) -> Result<T> {
        self.map_err(|e| IndexError::io(path, e))
    }
}
