//! K-way merge of sorted runs and grouping of the merged stream into
//! per-term posting lists.

use crate::error::{IndexError, Result};
use crate::index::run::RunReader;
use crate::index::types::{DocumentTerm, Posting, RunId, TermPostings};
use log::{debug, info};
use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;
use std::path::PathBuf;

/// Read buffer memory shared by all run readers during a merge
const MERGE_READ_BUDGET: usize = 8 * 1024 * 1024;
const MIN_READ_BUFFER: usize = 8 * 1024;

/// Heap candidate: the current head record of one run
#[derive(Debug, PartialEq, Eq)]
struct HeapEntry {
    record: DocumentTerm,
    run: RunId,
}

impl Ord for HeapEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        self.record
            .key()
            .cmp(&other.record.key())
            .then(self.run.cmp(&other.run))
    }
}

impl PartialOrd for HeapEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Merges any number of sorted runs into one `(termId, docId)`-ordered stream
pub struct RunMerger {
    readers: Vec<RunReader>,
    heap: BinaryHeap<Reverse<HeapEntry>>,
    last: Option<DocumentTerm>,
    merged: u64,
}

impl RunMerger {
    /// Open one reader per run and seed the heap with each run's first record
    pub fn open(runs: &[PathBuf]) -> Result<Self> {
        let buffer_size = (MERGE_READ_BUDGET / runs.len().max(1)).max(MIN_READ_BUFFER);
        info!("Merging {} run files", runs.len());

        let mut readers = Vec::with_capacity(runs.len());
        let mut heap = BinaryHeap::with_capacity(runs.len());

        for (run, path) in runs.iter().enumerate() {
            let mut reader = RunReader::open(path, run, buffer_size)?;
            match reader.next_record()? {
                Some(record) => heap.push(Reverse(HeapEntry { record, run })),
                None => debug!("Run {} is empty", run),
            }
            readers.push(reader);
        }

        Ok(Self {
            readers,
            heap,
            last: None,
            merged: 0,
        })
    }

    pub fn run_count(&self) -> usize {
        self.readers.len()
    }

    /// Records emitted so far
    pub fn merged(&self) -> u64 {
        self.merged
    }

    /// Pop the smallest record across all runs, refilling from its run
    pub fn next_record(&mut self) -> Result<Option<DocumentTerm>> {
        let Some(Reverse(entry)) = self.heap.pop() else {
            return Ok(None);
        };

        if let Some(next) = self.readers[entry.run].next_record()? {
            self.heap.push(Reverse(HeapEntry {
                record: next,
                run: entry.run,
            }));
        }

        if let Some(previous) = self.last {
            if entry.record.key() <= previous.key() {
                return Err(IndexError::SortInvariant {
                    run: entry.run,
                    previous,
                    found: entry.record,
                });
            }
        }

        self.last = Some(entry.record);
        self.merged += 1;
        Ok(Some(entry.record))
    }
}

/// Groups the merged stream into one [`TermPostings`] per term id
pub struct PostingsAssembler {
    merger: RunMerger,
    pending: Option<DocumentTerm>,
}

impl PostingsAssembler {
    pub fn new(merger: RunMerger) -> Self {
        Self {
            merger,
            pending: None,
        }
    }

    /// The next complete posting list, or `None` after the last term
    pub fn next_term(&mut self) -> Result<Option<TermPostings>> {
        let first = match self.pending.take() {
            Some(record) => record,
            None => match self.merger.next_record()? {
                Some(record) => record,
                None => return Ok(None),
            },
        };

        let mut term = TermPostings {
            term_id: first.term_id,
            postings: vec![Posting::new(first.doc_id, first.frequency)],
        };

        while let Some(record) = self.merger.next_record()? {
            if record.term_id == term.term_id {
                term.postings.push(Posting::new(record.doc_id, record.frequency));
            } else {
                self.pending = Some(record);
                break;
            }
        }

        Ok(Some(term))
    }

    pub fn merger(&self) -> &RunMerger {
        &self.merger
    }
}
