//! Posting list codecs.
//!
//! - [`gap`] - delta transform of doc ids
//! - [`vbyte`] - variable-byte codes (high bit terminates an integer)
//! - [`gamma`] - Elias gamma codes packed into a bitstream
//! - [`postings`] - the `(code,freq);` text form used by the index files

pub mod gamma;
pub mod gap;
pub mod postings;
pub mod vbyte;

pub use gap::{gap_decode, gap_encode, GapPosting};
pub use postings::{format_line, format_postings, parse_line, parse_postings};

/// Posting list representations a reader can decode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Codec {
    /// Absolute doc ids from the merged text index
    Plain,
    /// Variable-byte coded gaps
    VByte,
    /// Gamma coded gaps
    Gamma,
}
