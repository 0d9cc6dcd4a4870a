//! # spindex - external-memory inverted index builder
//!
//! spindex turns a corpus of documents (a zip archive or a directory) into
//! an on-disk inverted index using sort-based construction, so memory stays
//! bounded no matter how large the corpus is.
//!
//! ## Architecture
//!
//! - [`corpus`] - reading documents from a zip archive or directory
//! - [`document`] - the parser seam and stored document form
//! - [`index`] - accumulation, sorted runs, k-way merge, writers and reader
//! - [`codec`] - gap, variable-byte and gamma posting codecs
//! - [`error`] - the library error type
//! - [`output`] - colored terminal output for the CLI
//! - [`utils`] - tokenizer and progress bars
//!
//! ## Quick Start
//!
//! ```no_run
//! use spindex::index::build::build_index;
//! use spindex::index::{IndexConfig, IndexReader};
//! use std::path::Path;
//!
//! let config = IndexConfig::default();
//! build_index(Path::new("data/crawl.zip"), &config).unwrap();
//!
//! let reader = IndexReader::open(&config.output_dir).unwrap();
//! if let Some(term_id) = reader.term_id("the") {
//!     for posting in reader.gamma_postings(term_id).unwrap() {
//!         println!("{} {}", posting.doc_id, posting.frequency);
//!     }
//! }
//! ```

pub mod codec;
pub mod corpus;
pub mod document;
pub mod error;
pub mod index;
pub mod output;
pub mod utils;

pub use error::{IndexError, Result};
