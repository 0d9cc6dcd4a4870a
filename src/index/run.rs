//! Sorted runs: the spill side and the read side of external sorting.
//!
//! A run file holds one `docId<TAB>termId<TAB>frequency` line per record,
//! sorted by `(termId, docId)`.

use crate::error::{IndexError, IoContext, Result};
use crate::index::types::{DocumentTerm, RunId};
use log::{debug, info};
use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

/// Path of run `run` inside `dir`
pub fn run_path(dir: &Path, run: RunId) -> PathBuf {
    dir.join(format!("run{}", run))
}

/// Bounded in-memory buffer of records that spills sorted runs to disk
pub struct RunSpiller {
    dir: PathBuf,
    capacity: usize,
    buffer: Vec<DocumentTerm>,
    runs: Vec<PathBuf>,
    records_spilled: u64,
}

impl RunSpiller {
    /// Create a spiller writing into `dir`, which is created if missing
    pub fn new(dir: &Path, capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(IndexError::Config("run size must be at least 1".into()));
        }
        fs::create_dir_all(dir).with_path(dir)?;

        Ok(Self {
            dir: dir.to_path_buf(),
            capacity,
            buffer: Vec::with_capacity(capacity.min(1 << 20)),
            runs: Vec::new(),
            records_spilled: 0,
        })
    }

    /// Add one record, spilling when the buffer reaches capacity
    pub fn push(&mut self, record: DocumentTerm) -> Result<()> {
        self.buffer.push(record);
        if self.buffer.len() >= self.capacity {
            info!("Current run full ({} records), storing to disk", self.buffer.len());
            self.spill()?;
        }
        Ok(())
    }

    pub fn extend<I: IntoIterator<Item = DocumentTerm>>(&mut self, records: I) -> Result<()> {
        for record in records {
            self.push(record)?;
        }
        Ok(())
    }

    /// Records currently held in memory
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    pub fn run_count(&self) -> usize {
        self.runs.len()
    }

    /// Sort the buffer and write it as the next run
    fn spill(&mut self) -> Result<()> {
        let run = self.runs.len();
        let path = run_path(&self.dir, run);

        self.buffer.sort_unstable();
        debug!("Writing run {} ({} records) to {}", run, self.buffer.len(), path.display());

        // File::create truncates leftovers from an earlier build
        let mut file = BufWriter::new(File::create(&path).with_path(&path)?);
        for record in &self.buffer {
            writeln!(
                file,
                "{}\t{}\t{}",
                record.doc_id, record.term_id, record.frequency
            )
            .with_path(&path)?;
        }
        file.flush().with_path(&path)?;

        self.records_spilled += self.buffer.len() as u64;
        self.buffer.clear();
        self.runs.push(path);
        Ok(())
    }

    /// Spill whatever is left and return the run files in run order
    pub fn finish(mut self) -> Result<SpillSummary> {
        if !self.buffer.is_empty() {
            info!("Writing final run to disk");
            self.spill()?;
        }
        Ok(SpillSummary {
            runs: self.runs,
            records: self.records_spilled,
        })
    }
}

/// What a finished spiller leaves behind
#[derive(Debug, Clone, Default)]
pub struct SpillSummary {
    pub runs: Vec<PathBuf>,
    /// Total number of records across all runs
    pub records: u64,
}

/// Buffered sequential cursor over one run file.
///
/// Checks that every record is strictly greater than the one before it.
pub struct RunReader {
    run: RunId,
    path: PathBuf,
    reader: BufReader<File>,
    line: String,
    line_no: usize,
    last: Option<DocumentTerm>,
}

impl RunReader {
    pub fn open(path: &Path, run: RunId, buffer_size: usize) -> Result<Self> {
        let file = File::open(path).with_path(path)?;
        Ok(Self {
            run,
            path: path.to_path_buf(),
            reader: BufReader::with_capacity(buffer_size.max(1024), file),
            line: String::new(),
            line_no: 0,
            last: None,
        })
    }

    pub fn run(&self) -> RunId {
        self.run
    }

    /// Next record, or `None` once the run is exhausted
    pub fn next_record(&mut self) -> Result<Option<DocumentTerm>> {
        self.line.clear();
        let read = self
            .reader
            .read_line(&mut self.line)
            .with_path(&self.path)?;
        if read == 0 {
            return Ok(None);
        }
        self.line_no += 1;

        let record = self.parse_line()?;
        if let Some(last) = self.last {
            if record.key() <= last.key() {
                return Err(self.malformed(format!(
                    "record ({}, {}) does not follow ({}, {})",
                    record.term_id, record.doc_id, last.term_id, last.doc_id
                )));
            }
        }
        self.last = Some(record);
        Ok(Some(record))
    }

    fn parse_line(&self) -> Result<DocumentTerm> {
        let text = self.line.trim_end_matches(['\n', '\r']);
        let mut fields = text.split('\t');

        let mut next_field = |name: &str| -> Result<u32> {
            fields
                .next()
                .ok_or_else(|| self.malformed(format!("missing {}", name)))?
                .parse::<u32>()
                .map_err(|_| self.malformed(format!("invalid {} in '{}'", name, text)))
        };

        let doc_id = next_field("doc id")?;
        let term_id = next_field("term id")?;
        let frequency = next_field("frequency")?;
        if fields.next().is_some() {
            return Err(self.malformed(format!("trailing fields in '{}'", text)));
        }
        if frequency == 0 {
            return Err(self.malformed(format!("zero frequency in '{}'", text)));
        }
        Ok(DocumentTerm::new(term_id, doc_id, frequency))
    }

    fn malformed(&self, reason: String) -> IndexError {
        IndexError::MalformedRun {
            run: self.run,
            line: self.line_no,
            reason,
        }
    }
}
