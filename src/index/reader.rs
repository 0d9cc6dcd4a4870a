use crate::codec::gamma::{self, GammaDecoder};
use crate::codec::postings::{parse_line, parse_postings};
use crate::codec::vbyte::VByteReader;
use crate::codec::{gap_decode, GapPosting};
use crate::document::StoredDocument;
use crate::error::{IndexError, IoContext, Result};
use crate::index::direct::parse_document;
use crate::index::paths::IndexPaths;
use crate::index::types::{DocId, IndexMeta, Posting, TermId};
use crate::index::vocabulary::Vocabulary;
use log::debug;
use memmap2::Mmap;
use std::fs::{self, File};
use std::path::Path;

/// A read-only memory-mapped file. Empty files are not mapped.
struct MappedFile {
    map: Option<Mmap>,
}

impl MappedFile {
    fn open(path: &Path) -> Result<Self> {
        let file = File::open(path).with_path(path)?;
        let len = file.metadata().with_path(path)?.len();
        let map = if len == 0 {
            None
        } else {
            // Index files are written once and never modified while a reader is open
            Some(unsafe { Mmap::map(&file).with_path(path)? })
        };
        Ok(Self { map })
    }

    fn bytes(&self) -> &[u8] {
        self.map.as_deref().unwrap_or(&[])
    }
}

/// Parse an offset table: entry count on the first line, then the offsets
fn read_offset_table(path: &Path) -> Result<Vec<u64>> {
    let content = fs::read_to_string(path).with_path(path)?;
    let mut lines = content.lines();
    let bad = |what: &str| IndexError::OffsetTable(format!("{}: {}", path.display(), what));

    let count = lines
        .next()
        .ok_or_else(|| bad("missing size line"))?
        .parse::<usize>()
        .map_err(|_| bad("invalid size line"))?;
    let offsets = parse_offsets(lines, path)?;
    if offsets.len() != count {
        return Err(bad(&format!("declares {} entries but holds {}", count, offsets.len())));
    }
    Ok(offsets)
}

/// Parse ascending offsets, one per line
fn parse_offsets<'a>(lines: impl Iterator<Item = &'a str>, path: &Path) -> Result<Vec<u64>> {
    let mut offsets: Vec<u64> = Vec::new();
    for line in lines {
        let offset = line.parse::<u64>().map_err(|_| {
            IndexError::OffsetTable(format!("{}: invalid offset '{}'", path.display(), line))
        })?;
        if offsets.last().is_some_and(|&last| offset <= last) {
            return Err(IndexError::OffsetTable(format!(
                "{}: offsets are not ascending",
                path.display()
            )));
        }
        offsets.push(offset);
    }
    Ok(offsets)
}

/// A file of per-entry records located through an offset table
struct OffsetFile {
    data: MappedFile,
    offsets: Vec<u64>,
}

impl OffsetFile {
    fn open(data: &Path, offsets: Vec<u64>) -> Result<Self> {
        let data_file = MappedFile::open(data)?;
        if offsets
            .last()
            .is_some_and(|&last| last >= data_file.bytes().len() as u64)
        {
            return Err(IndexError::OffsetTable(format!(
                "{}: offset past the end of the file",
                data.display()
            )));
        }
        Ok(Self {
            data: data_file,
            offsets,
        })
    }

    fn len(&self) -> usize {
        self.offsets.len()
    }

    /// Bytes of entry `i`, up to the start of the next entry
    fn entry(&self, i: usize) -> Option<&[u8]> {
        let bytes = self.data.bytes();
        let start = *self.offsets.get(i)? as usize;
        let end = self
            .offsets
            .get(i + 1)
            .map_or(bytes.len(), |&next| next as usize);
        bytes.get(start..end)
    }

    /// Entry `i` up to its first newline
    fn line(&self, i: usize) -> Option<&[u8]> {
        let entry = self.entry(i)?;
        let end = memchr::memchr(b'\n', entry).unwrap_or(entry.len());
        Some(&entry[..end])
    }
}

/// Open a per-term file whose offset table must hold exactly `terms` entries
fn open_term_table(data: &Path, offsets: &Path, terms: usize) -> Result<OffsetFile> {
    let file = OffsetFile::open(data, read_offset_table(offsets)?)?;
    if file.len() != terms {
        return Err(IndexError::OffsetTable(format!(
            "{} has {} entries for a vocabulary of {}",
            offsets.display(),
            file.len(),
            terms
        )));
    }
    Ok(file)
}

/// Random-access reader over a finished index directory
pub struct IndexReader {
    paths: IndexPaths,
    meta: IndexMeta,
    vocabulary: Vocabulary,
    postings: OffsetFile,
    vbe: Option<OffsetFile>,
    gamma: Option<OffsetFile>,
    documents: OffsetFile,
}

impl IndexReader {
    /// Open the index in `dir`. Compressed postings are optional.
    pub fn open(dir: &Path) -> Result<Self> {
        let paths = IndexPaths::new(dir);

        let meta_path = paths.meta();
        let meta_file = File::open(&meta_path).with_path(&meta_path)?;
        let meta: IndexMeta = serde_json::from_reader(meta_file)?;

        let vocabulary = Vocabulary::read_lexicon(&paths.lexicon())?;
        let terms = vocabulary.len();
        let postings = open_term_table(&paths.merged(), &paths.term_offsets(), terms)?;

        // Both binary forms or neither
        let (vbe, gamma) = match (paths.vbe_bin().exists(), paths.gamma_bin().exists()) {
            (true, true) => (
                Some(open_term_table(&paths.vbe_bin(), &paths.vbe_offsets(), terms)?),
                Some(open_term_table(&paths.gamma_bin(), &paths.gamma_offsets(), terms)?),
            ),
            (false, false) => (None, None),
            _ => {
                return Err(IndexError::OffsetTable(format!(
                    "{} holds only one of the binary posting files",
                    dir.display()
                )));
            }
        };

        let doc_offsets_path = paths.doc_offsets();
        let doc_offsets = fs::read_to_string(&doc_offsets_path).with_path(&doc_offsets_path)?;
        let documents = OffsetFile::open(
            &paths.doc_index(),
            parse_offsets(doc_offsets.lines(), &doc_offsets_path)?,
        )?;
        if documents.len() != meta.doc_count as usize {
            return Err(IndexError::OffsetTable(format!(
                "{} documents stored, meta.json records {}",
                documents.len(),
                meta.doc_count
            )));
        }

        debug!(
            "Opened index at {}: {} terms, {} documents",
            dir.display(),
            vocabulary.len(),
            documents.len()
        );

        Ok(Self {
            paths,
            meta,
            vocabulary,
            postings,
            vbe,
            gamma,
            documents,
        })
    }

    pub fn meta(&self) -> &IndexMeta {
        &self.meta
    }

    pub fn dir(&self) -> &Path {
        self.paths.dir()
    }

    pub fn term_id(&self, term: &str) -> Option<TermId> {
        self.vocabulary.get(term)
    }

    pub fn vocabulary_size(&self) -> usize {
        self.vocabulary.len()
    }

    pub fn doc_count(&self) -> usize {
        self.documents.len()
    }

    /// Whether the compressed binary postings are present
    pub fn has_compressed(&self) -> bool {
        self.vbe.is_some() && self.gamma.is_some()
    }

    /// Posting list of a term from the plain text index
    pub fn postings(&self, term_id: TermId) -> Result<Vec<Posting>> {
        let line = self
            .postings
            .line(term_id as usize)
            .ok_or(IndexError::UnknownTerm(term_id))?;
        let line = std::str::from_utf8(line).map_err(|_| {
            IndexError::MalformedPostings(format!("term {} line is not UTF-8", term_id))
        })?;

        let (found, df, body) = parse_line(line)?;
        if found != term_id {
            return Err(IndexError::MalformedPostings(format!(
                "offset of term {} points at term {}",
                term_id, found
            )));
        }
        let postings = parse_postings(body)?;
        check_df(term_id, df, postings.len())?;
        Ok(postings)
    }

    /// Posting list of a term decoded from the variable-byte binary index
    pub fn vbyte_postings(&self, term_id: TermId) -> Result<Vec<Posting>> {
        let bytes = compressed_entry(self.vbe.as_ref(), term_id)?;
        let mut reader = VByteReader::new(bytes);

        // Every posting takes at least two bytes
        let df = reader.next_value()? as usize;
        check_df_fits(term_id, df, (bytes.len() - reader.position()) / 2)?;
        let mut gaps = Vec::with_capacity(df);
        for _ in 0..df {
            let gap = reader.next_value()?;
            let frequency = reader.next_value()?;
            gaps.push(GapPosting::new(gap, frequency));
        }
        if reader.position() != bytes.len() {
            return Err(IndexError::MalformedCode(format!(
                "trailing bytes after variable-byte postings of term {}",
                term_id
            )));
        }
        gap_decode(&gaps)
    }

    /// Posting list of a term decoded from the gamma binary index
    pub fn gamma_postings(&self, term_id: TermId) -> Result<Vec<Posting>> {
        let bytes = compressed_entry(self.gamma.as_ref(), term_id)?;
        let mut decoder = GammaDecoder::new(bytes);

        // Every posting takes at least two bits
        let df = decoder.next_value()? as usize;
        let bits_left = (bytes.len() as u64 * 8).saturating_sub(decoder.bits_read());
        check_df_fits(term_id, df, (bits_left / 2) as usize)?;
        let mut values = Vec::with_capacity(df);
        let mut frequencies = Vec::with_capacity(df);
        for _ in 0..df {
            values.push(decoder.next_value()?);
            frequencies.push(decoder.next_value()?);
        }
        decoder.finish(bytes.len())?;
        gamma::unshift_first_gap(&mut values)?;

        let gaps: Vec<GapPosting> = values
            .into_iter()
            .zip(frequencies)
            .map(|(gap, frequency)| GapPosting::new(gap, frequency))
            .collect();
        gap_decode(&gaps)
    }

    /// Stored form of a document from the direct index
    pub fn document(&self, doc_id: DocId) -> Result<StoredDocument> {
        let line = self
            .documents
            .line(doc_id as usize)
            .ok_or(IndexError::UnknownDocument(doc_id))?;
        let doc = parse_document(line)?;
        if doc.doc_id != doc_id {
            return Err(IndexError::OffsetTable(format!(
                "offset of document {} points at document {}",
                doc_id, doc.doc_id
            )));
        }
        Ok(doc)
    }

    pub fn num_tokens(&self, doc_id: DocId) -> Result<usize> {
        Ok(self.document(doc_id)?.num_tokens)
    }
}

fn compressed_entry(file: Option<&OffsetFile>, term_id: TermId) -> Result<&[u8]> {
    let file = file.ok_or_else(|| {
        IndexError::Config("index was built without compressed postings".into())
    })?;
    file.entry(term_id as usize)
        .ok_or(IndexError::UnknownTerm(term_id))
}

fn check_df_fits(term_id: TermId, df: usize, max: usize) -> Result<()> {
    if df > max {
        return Err(IndexError::MalformedCode(format!(
            "term {} declares df {} but its entry holds at most {} postings",
            term_id, df, max
        )));
    }
    Ok(())
}

fn check_df(term_id: TermId, df: usize, found: usize) -> Result<()> {
    if df != found {
        return Err(IndexError::MalformedPostings(format!(
            "term {} declares df {} but lists {} postings",
            term_id, df, found
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_offset_table() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("offsets.txt");

        fs::write(&path, "3\n0\n10\n25\n").unwrap();
        assert_eq!(read_offset_table(&path).unwrap(), vec![0, 10, 25]);

        fs::write(&path, "0\n").unwrap();
        assert!(read_offset_table(&path).unwrap().is_empty());
    }

    #[test]
    fn test_bad_offset_tables() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("offsets.txt");

        for bad in ["", "2\n0\n", "2\n5\n5\n", "x\n", "1\n-3\n"] {
            fs::write(&path, bad).unwrap();
            assert!(
                matches!(read_offset_table(&path), Err(IndexError::OffsetTable(_))),
                "{:?} should be rejected",
                bad
            );
        }
    }

    #[test]
    fn test_offset_file_entries() {
        let dir = TempDir::new().unwrap();
        let data = dir.path().join("data.txt");
        fs::write(&data, "alpha\nbe\ngamma\n").unwrap();

        let file = OffsetFile::open(&data, vec![0, 6, 9]).unwrap();
        assert_eq!(file.entry(1), Some(&b"be\n"[..]));
        assert_eq!(file.line(2), Some(&b"gamma"[..]));
        assert_eq!(file.line(3), None);

        assert!(OffsetFile::open(&data, vec![0, 40]).is_err());
    }

    #[test]
    fn test_missing_index() {
        let dir = TempDir::new().unwrap();
        let err = IndexReader::open(dir.path()).err().unwrap();
        assert!(matches!(err, IndexError::Io { .. }));
    }
}
