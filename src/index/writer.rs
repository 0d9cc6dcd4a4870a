use crate::codec::gamma::{self, GammaEncoder};
use crate::codec::postings::{
    format_gamma_pairs, format_gap_pairs, format_line, format_postings, format_vbyte_pairs,
};
use crate::codec::{gap_encode, vbyte};
use crate::error::{IndexError, IoContext, Result};
use crate::index::paths::IndexPaths;
use crate::index::types::{IndexMeta, TermId, TermPostings};
use log::{debug, info};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Buffered file writer that knows how many bytes it has written
pub struct CountingWriter {
    path: PathBuf,
    inner: BufWriter<File>,
    written: u64,
}

impl CountingWriter {
    pub fn create(path: &Path) -> Result<Self> {
        let file = File::create(path).with_path(path)?;
        Ok(Self {
            path: path.to_path_buf(),
            inner: BufWriter::new(file),
            written: 0,
        })
    }

    pub fn write_all(&mut self, bytes: &[u8]) -> Result<()> {
        self.inner.write_all(bytes).with_path(&self.path)?;
        self.written += bytes.len() as u64;
        Ok(())
    }

    /// Byte offset of the next write
    pub fn position(&self) -> u64 {
        self.written
    }

    /// Flush and return the total byte count
    pub fn finish(mut self) -> Result<u64> {
        self.inner.flush().with_path(&self.path)?;
        Ok(self.written)
    }
}

/// Writes an offset table: the entry count on the first line, then one
/// offset per line
pub struct OffsetTableWriter {
    out: CountingWriter,
    expected: usize,
    entries: usize,
}

impl OffsetTableWriter {
    pub fn create(path: &Path, expected: usize) -> Result<Self> {
        let mut out = CountingWriter::create(path)?;
        out.write_all(format!("{}\n", expected).as_bytes())?;
        Ok(Self {
            out,
            expected,
            entries: 0,
        })
    }

    pub fn push(&mut self, offset: u64) -> Result<()> {
        self.out.write_all(format!("{}\n", offset).as_bytes())?;
        self.entries += 1;
        Ok(())
    }

    pub fn finish(self) -> Result<()> {
        if self.entries != self.expected {
            return Err(IndexError::OffsetTable(format!(
                "{} holds {} offsets, expected {}",
                self.out.path.display(),
                self.entries,
                self.expected
            )));
        }
        self.out.finish()?;
        Ok(())
    }
}

/// Gap, variable-byte and gamma outputs
struct CompressedOutputs {
    gaps: CountingWriter,
    vbe: CountingWriter,
    gamma: CountingWriter,
    vbe_bin: CountingWriter,
    vbe_offsets: OffsetTableWriter,
    gamma_bin: CountingWriter,
    gamma_offsets: OffsetTableWriter,
    scratch: Vec<u8>,
}

impl CompressedOutputs {
    fn create(paths: &IndexPaths, vocabulary_size: usize) -> Result<Self> {
        Ok(Self {
            gaps: CountingWriter::create(&paths.gaps())?,
            vbe: CountingWriter::create(&paths.vbe())?,
            gamma: CountingWriter::create(&paths.gamma())?,
            vbe_bin: CountingWriter::create(&paths.vbe_bin())?,
            vbe_offsets: OffsetTableWriter::create(&paths.vbe_offsets(), vocabulary_size)?,
            gamma_bin: CountingWriter::create(&paths.gamma_bin())?,
            gamma_offsets: OffsetTableWriter::create(&paths.gamma_offsets(), vocabulary_size)?,
            scratch: Vec::new(),
        })
    }

    fn write_term(&mut self, term: &TermPostings) -> Result<()> {
        let df = term.df();
        let gaps = gap_encode(&term.postings)?;

        self.gaps
            .write_all(format_line(term.term_id, df, &format_gap_pairs(&gaps)).as_bytes())?;
        self.vbe
            .write_all(format_line(term.term_id, df, &format_vbyte_pairs(&gaps)).as_bytes())?;
        self.gamma.write_all(
            format_line(term.term_id, df, &format_gamma_pairs(&gaps)?).as_bytes(),
        )?;

        // vbyte(df), then vbyte(gap) vbyte(freq) per posting
        self.scratch.clear();
        vbyte::encode(df as u32, &mut self.scratch);
        for g in &gaps {
            vbyte::encode(g.gap, &mut self.scratch);
            vbyte::encode(g.frequency, &mut self.scratch);
        }
        self.vbe_offsets.push(self.vbe_bin.position())?;
        self.vbe_bin.write_all(&self.scratch)?;

        // One stream per term: df, then (shifted gap, freq) pairs
        let values: Vec<u32> = gaps.iter().map(|g| g.gap).collect();
        let shifted = gamma::shift_first_gap(&values)?;
        let mut encoder = GammaEncoder::new();
        encoder.push(df as u32)?;
        for (gap, g) in shifted.into_iter().zip(&gaps) {
            encoder.push(gap)?;
            encoder.push(g.frequency)?;
        }
        let stream = encoder.finish()?;
        self.gamma_offsets.push(self.gamma_bin.position())?;
        self.gamma_bin.write_all(&stream.bytes)?;

        Ok(())
    }

    fn finish(self) -> Result<()> {
        self.gaps.finish()?;
        self.vbe.finish()?;
        self.gamma.finish()?;
        let vbe_bytes = self.vbe_bin.finish()?;
        self.vbe_offsets.finish()?;
        let gamma_bytes = self.gamma_bin.finish()?;
        self.gamma_offsets.finish()?;
        debug!(
            "Compressed postings: {} vbyte bytes, {} gamma bytes",
            vbe_bytes, gamma_bytes
        );
        Ok(())
    }
}

/// What the inverted index writer produced
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteSummary {
    pub terms: usize,
    /// Sum of df over all terms
    pub posting_count: u64,
    pub index_bytes: u64,
}

/// Writes posting lists, arriving one term at a time in term id order,
/// to the merged index, its offset table and the compressed forms.
pub struct InvertedIndexWriter {
    vocabulary_size: usize,
    next_term: TermId,
    posting_count: u64,
    index: CountingWriter,
    term_offsets: OffsetTableWriter,
    compressed: Option<CompressedOutputs>,
}

impl InvertedIndexWriter {
    /// Create every output file under `paths`. `compress` toggles the gap,
    /// variable-byte and gamma outputs.
    pub fn create(paths: &IndexPaths, vocabulary_size: usize, compress: bool) -> Result<Self> {
        let compressed = if compress {
            Some(CompressedOutputs::create(paths, vocabulary_size)?)
        } else {
            None
        };

        Ok(Self {
            vocabulary_size,
            next_term: 0,
            posting_count: 0,
            index: CountingWriter::create(&paths.merged())?,
            term_offsets: OffsetTableWriter::create(&paths.term_offsets(), vocabulary_size)?,
            compressed,
        })
    }

    /// Append one term. Terms must arrive with consecutive ids starting at 0.
    pub fn write_term(&mut self, term: &TermPostings) -> Result<()> {
        if term.term_id != self.next_term {
            return Err(IndexError::OffsetTable(format!(
                "term {} written where term {} was expected",
                term.term_id, self.next_term
            )));
        }
        if term.term_id as usize >= self.vocabulary_size {
            return Err(IndexError::OffsetTable(format!(
                "term {} is outside a vocabulary of {} terms",
                term.term_id, self.vocabulary_size
            )));
        }

        self.term_offsets.push(self.index.position())?;
        let line = format_line(term.term_id, term.df(), &format_postings(&term.postings));
        self.index.write_all(line.as_bytes())?;

        if let Some(compressed) = &mut self.compressed {
            compressed.write_term(term)?;
        }

        self.next_term += 1;
        self.posting_count += term.df() as u64;
        Ok(())
    }

    /// Flush everything. Fails unless every vocabulary term was written.
    pub fn finish(self) -> Result<WriteSummary> {
        if self.next_term as usize != self.vocabulary_size {
            return Err(IndexError::OffsetTable(format!(
                "{} terms written for a vocabulary of {}",
                self.next_term, self.vocabulary_size
            )));
        }

        let index_bytes = self.index.finish()?;
        self.term_offsets.finish()?;
        if let Some(compressed) = self.compressed {
            compressed.finish()?;
        }

        info!(
            "Wrote {} terms, {} postings ({} bytes)",
            self.next_term, self.posting_count, index_bytes
        );
        Ok(WriteSummary {
            terms: self.next_term as usize,
            posting_count: self.posting_count,
            index_bytes,
        })
    }
}

/// Write index metadata as pretty JSON
pub fn write_meta(path: &Path, meta: &IndexMeta) -> Result<()> {
    let file = File::create(path).with_path(path)?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, meta)?;
    writer.flush().with_path(path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::types::Posting;
    use std::fs;
    use tempfile::TempDir;

    fn term(term_id: TermId, postings: &[(u32, u32)]) -> TermPostings {
        TermPostings {
            term_id,
            postings: postings.iter().map(|&(d, f)| Posting::new(d, f)).collect(),
        }
    }

    #[test]
    fn test_writes_all_forms() {
        let dir = TempDir::new().unwrap();
        let paths = IndexPaths::new(dir.path());

        let mut writer = InvertedIndexWriter::create(&paths, 2, true).unwrap();
        writer.write_term(&term(0, &[(0, 1), (5, 2)])).unwrap();
        writer.write_term(&term(1, &[(3, 1)])).unwrap();
        let summary = writer.finish().unwrap();

        assert_eq!(summary.terms, 2);
        assert_eq!(summary.posting_count, 3);

        assert_eq!(
            fs::read_to_string(paths.merged()).unwrap(),
            "0:2\t(0,1);(5,2);\n1:1\t(3,1);\n"
        );
        assert_eq!(
            fs::read_to_string(paths.term_offsets()).unwrap(),
            "2\n0\n17\n"
        );
        assert_eq!(
            fs::read_to_string(paths.gaps()).unwrap(),
            "0:2\t(0,1);(5,2);\n1:1\t(3,1);\n"
        );
        assert_eq!(
            fs::read_to_string(paths.vbe()).unwrap(),
            "0:2\t(80,1);(85,2);\n1:1\t(83,1);\n"
        );
        assert_eq!(
            fs::read_to_string(paths.gamma()).unwrap(),
            "0:2\t(0,1);(11001,2);\n1:1\t(11000,1);\n"
        );

        // df=2, gap 0, freq 1, gap 5, freq 2 | df=1, gap 3, freq 1
        assert_eq!(
            fs::read(paths.vbe_bin()).unwrap(),
            vec![0x82, 0x80, 0x81, 0x85, 0x82, 0x81, 0x83, 0x81]
        );
        assert_eq!(
            fs::read_to_string(paths.vbe_offsets()).unwrap(),
            "2\n0\n5\n"
        );

        // Term 0: 2 -> 100, 1 -> 0, 1 -> 0, 5 -> 11001, 2 -> 100
        //   = 1000 0110 0110 0 -> 0x86 0x60
        // Term 1: 1 -> 0, 4 -> 11000, 1 -> 0 = 0110 000 -> 0x60
        assert_eq!(fs::read(paths.gamma_bin()).unwrap(), vec![0x86, 0x60, 0x60]);
        assert_eq!(
            fs::read_to_string(paths.gamma_offsets()).unwrap(),
            "2\n0\n2\n"
        );
    }

    #[test]
    fn test_without_compression() {
        let dir = TempDir::new().unwrap();
        let paths = IndexPaths::new(dir.path());

        let mut writer = InvertedIndexWriter::create(&paths, 1, false).unwrap();
        writer.write_term(&term(0, &[(2, 1)])).unwrap();
        writer.finish().unwrap();

        assert!(paths.merged().exists());
        assert!(!paths.gaps().exists());
        assert!(!paths.vbe_bin().exists());
    }

    #[test]
    fn test_empty_vocabulary() {
        let dir = TempDir::new().unwrap();
        let paths = IndexPaths::new(dir.path());

        let writer = InvertedIndexWriter::create(&paths, 0, true).unwrap();
        let summary = writer.finish().unwrap();
        assert_eq!(summary, WriteSummary::default());
        assert_eq!(fs::read_to_string(paths.merged()).unwrap(), "");
        assert_eq!(fs::read_to_string(paths.term_offsets()).unwrap(), "0\n");
        assert_eq!(fs::read_to_string(paths.gamma_offsets()).unwrap(), "0\n");
    }

    #[test]
    fn test_rejects_term_gap() {
        let dir = TempDir::new().unwrap();
        let paths = IndexPaths::new(dir.path());

        let mut writer = InvertedIndexWriter::create(&paths, 3, true).unwrap();
        writer.write_term(&term(0, &[(0, 1)])).unwrap();
        let err = writer.write_term(&term(2, &[(0, 1)])).unwrap_err();
        assert!(matches!(err, IndexError::OffsetTable(_)));
    }

    #[test]
    fn test_rejects_missing_terms() {
        let dir = TempDir::new().unwrap();
        let paths = IndexPaths::new(dir.path());

        let mut writer = InvertedIndexWriter::create(&paths, 2, false).unwrap();
        writer.write_term(&term(0, &[(0, 1)])).unwrap();
        assert!(matches!(writer.finish(), Err(IndexError::OffsetTable(_))));
    }

    #[test]
    fn test_write_meta() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("meta.json");
        let meta = IndexMeta {
            doc_count: 2,
            vocabulary_size: 4,
            ..IndexMeta::default()
        };
        write_meta(&path, &meta).unwrap();

        let back: IndexMeta = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(back.doc_count, 2);
        assert_eq!(back.vocabulary_size, 4);
    }
}
