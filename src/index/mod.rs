//! Index construction and access.
//!
//! Construction runs in two passes over bounded memory: documents are
//! accumulated into sorted runs ([`run`]), then the runs are merged
//! ([`merge`]) and written out per term ([`writer`]). [`reader`] opens the
//! finished index for random access.

pub mod accumulator;
pub mod build;
pub mod direct;
pub mod merge;
pub mod paths;
pub mod reader;
pub mod run;
pub mod stats;
pub mod types;
pub mod vocabulary;
pub mod writer;

pub use paths::IndexPaths;
pub use reader::IndexReader;
pub use types::*;
pub use vocabulary::Vocabulary;
pub use writer::InvertedIndexWriter;
