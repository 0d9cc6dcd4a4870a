//! Shared helpers.
//!
//! - [`tokenizer`] - whitespace tokenization and case folding
//! - [`progress`] - progress bars, no-op without the `progress` feature

pub mod progress;
pub mod tokenizer;

pub use tokenizer::*;
