//! Direct index: every parsed document by doc id.
//!
//! `doc_idx.txt` holds one [`StoredDocument`] JSON object per line and
//! `doc_idx_offset.txt` the byte offset where each of those lines starts.

use crate::document::{ParsedDocument, StoredDocument};
use crate::error::{IndexError, Result};
use crate::index::paths::IndexPaths;
use crate::index::types::DocId;
use crate::index::writer::CountingWriter;
use log::info;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DirectSummary {
    pub documents: u32,
    pub total_tokens: u64,
}

pub struct DirectIndexWriter {
    docs: CountingWriter,
    offsets: CountingWriter,
    next_doc: DocId,
    total_tokens: u64,
}

impl DirectIndexWriter {
    pub fn create(paths: &IndexPaths) -> Result<Self> {
        Ok(Self {
            docs: CountingWriter::create(&paths.doc_index())?,
            offsets: CountingWriter::create(&paths.doc_offsets())?,
            next_doc: 0,
            total_tokens: 0,
        })
    }

    /// Append a document. Documents must arrive in doc id order.
    pub fn add(&mut self, doc: &ParsedDocument) -> Result<()> {
        if doc.doc_id != self.next_doc {
            return Err(IndexError::OffsetTable(format!(
                "document {} stored where document {} was expected",
                doc.doc_id, self.next_doc
            )));
        }

        self.offsets
            .write_all(format!("{}\n", self.docs.position()).as_bytes())?;
        let mut line = serde_json::to_vec(&doc.to_stored())?;
        line.push(b'\n');
        self.docs.write_all(&line)?;

        self.next_doc += 1;
        self.total_tokens += doc.num_tokens() as u64;
        Ok(())
    }

    pub fn finish(self) -> Result<DirectSummary> {
        let bytes = self.docs.finish()?;
        self.offsets.finish()?;
        info!("Stored {} documents ({} bytes)", self.next_doc, bytes);
        Ok(DirectSummary {
            documents: self.next_doc,
            total_tokens: self.total_tokens,
        })
    }
}

/// Parse one direct index line
pub fn parse_document(line: &[u8]) -> Result<StoredDocument> {
    Ok(serde_json::from_slice(line)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{DocumentParser, TextParser};
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_offsets_point_at_lines() {
        let dir = TempDir::new().unwrap();
        let paths = IndexPaths::new(dir.path());
        let parser = TextParser::default();

        let mut writer = DirectIndexWriter::create(&paths).unwrap();
        writer.add(&parser.parse(0, "a", b"the cat sat")).unwrap();
        writer.add(&parser.parse(1, "b", b"the dog")).unwrap();
        let summary = writer.finish().unwrap();
        assert_eq!(summary.documents, 2);
        assert_eq!(summary.total_tokens, 5);

        let docs = fs::read(paths.doc_index()).unwrap();
        let offsets: Vec<usize> = fs::read_to_string(paths.doc_offsets())
            .unwrap()
            .lines()
            .map(|l| l.parse().unwrap())
            .collect();
        assert_eq!(offsets.len(), 2);
        assert_eq!(offsets[0], 0);

        let start = offsets[1];
        let end = start + docs[start..].iter().position(|&b| b == b'\n').unwrap();
        let stored = parse_document(&docs[start..end]).unwrap();
        assert_eq!(stored.doc_id, 1);
        assert_eq!(stored.name, "b");
        assert_eq!(stored.tokens, vec!["the", "dog"]);
    }

    #[test]
    fn test_rejects_out_of_order_documents() {
        let dir = TempDir::new().unwrap();
        let paths = IndexPaths::new(dir.path());
        let mut writer = DirectIndexWriter::create(&paths).unwrap();
        let doc = TextParser::default().parse(3, "x", b"x");
        assert!(writer.add(&doc).is_err());
    }
}
