//! Delta transform of posting lists.
//!
//! The first gap is measured from an implicit origin of 0, every later gap
//! from the previous absolute doc id.

use crate::error::{IndexError, Result};
use crate::index::types::{DocId, Posting};

/// A posting whose doc id has been replaced by its distance to the previous one
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GapPosting {
    pub gap: u32,
    pub frequency: u32,
}

impl GapPosting {
    pub fn new(gap: u32, frequency: u32) -> Self {
        Self { gap, frequency }
    }
}

/// Gap-encode a posting list. Doc ids must be strictly increasing.
pub fn gap_encode(postings: &[Posting]) -> Result<Vec<GapPosting>> {
    let mut previous: Option<DocId> = None;
    let mut gaps = Vec::with_capacity(postings.len());

    for posting in postings {
        let gap = match previous {
            None => posting.doc_id,
            Some(prev) if posting.doc_id > prev => posting.doc_id - prev,
            Some(prev) => {
                return Err(IndexError::MalformedPostings(format!(
                    "doc ids must be strictly increasing, got {} after {}",
                    posting.doc_id, prev
                )));
            }
        };
        gaps.push(GapPosting::new(gap, posting.frequency));
        previous = Some(posting.doc_id);
    }

    Ok(gaps)
}

/// Rebuild absolute doc ids from gaps (prefix sum)
pub fn gap_decode(gaps: &[GapPosting]) -> Result<Vec<Posting>> {
    let mut postings = Vec::with_capacity(gaps.len());
    let mut current: DocId = 0;

    for (i, gap) in gaps.iter().enumerate() {
        if i > 0 && gap.gap == 0 {
            return Err(IndexError::MalformedPostings(format!("zero gap at position {}", i)));
        }
        current = current.checked_add(gap.gap).ok_or_else(|| {
            IndexError::MalformedPostings(format!("doc id overflow at position {}", i))
        })?;
        postings.push(Posting::new(current, gap.frequency));
    }

    Ok(postings)
}
