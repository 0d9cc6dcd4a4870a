use crate::error::{IndexError, IoContext, Result};
use crate::index::types::TermId;
use log::info;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

/// Term string <-> term id mapping for one build.
///
/// Ids are handed out densely from 0 in first-encounter order. The map is
/// ordered by term so the lexicon comes out sorted.
#[derive(Debug, Default, Clone)]
pub struct Vocabulary {
    terms: BTreeMap<String, TermId>,
    next_id: TermId,
}

impl Vocabulary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a term, assigning the next id if it has not been seen
    pub fn get_or_insert(&mut self, term: &str) -> TermId {
        if let Some(&id) = self.terms.get(term) {
            return id;
        }

        let id = self.next_id;
        self.terms.insert(term.to_string(), id);
        self.next_id += 1;
        id
    }

    pub fn get(&self, term: &str) -> Option<TermId> {
        self.terms.get(term).copied()
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Entries in lexicographic order of the term
    pub fn iter(&self) -> impl Iterator<Item = (&str, TermId)> {
        self.terms.iter().map(|(t, &id)| (t.as_str(), id))
    }

    /// Write the lexicon: `term<TAB>termId` per line, sorted by term
    pub fn write_lexicon(&self, path: &Path) -> Result<()> {
        info!("Writing lexicon ({} terms) to {}", self.len(), path.display());
        let mut file = BufWriter::new(File::create(path).with_path(path)?);

        for (term, id) in self.iter() {
            writeln!(file, "{}\t{}", term, id).with_path(path)?;
        }

        file.flush().with_path(path)?;
        Ok(())
    }

    /// Load a lexicon written by [`Vocabulary::write_lexicon`]
    pub fn read_lexicon(path: &Path) -> Result<Self> {
        let file = BufReader::new(File::open(path).with_path(path)?);
        let mut terms = BTreeMap::new();

        for (line_no, line) in file.lines().enumerate() {
            let line = line.with_path(path)?;
            let bad = || {
                IndexError::OffsetTable(format!("bad lexicon line {}: '{}'", line_no + 1, line))
            };
            let (term, id) = line.rsplit_once('\t').ok_or_else(bad)?;
            let id = id.parse::<TermId>().map_err(|_| bad())?;
            if terms.insert(term.to_string(), id).is_some() {
                return Err(bad());
            }
        }

        // Ids must be exactly 0..n
        let mut ids: Vec<TermId> = terms.values().copied().collect();
        ids.sort_unstable();
        if ids.iter().enumerate().any(|(i, &id)| id as usize != i) {
            return Err(IndexError::OffsetTable(format!(
                "lexicon {} does not hold a dense id range",
                path.display()
            )));
        }

        Ok(Self {
            next_id: terms.len() as TermId,
            terms,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_ids_by_first_occurrence() {
        let mut vocab = Vocabulary::new();
        let ids: Vec<_> = ["the", "cat", "sat", "the", "dog", "sat"]
            .iter()
            .map(|t| vocab.get_or_insert(t))
            .collect();
        assert_eq!(ids, vec![0, 1, 2, 0, 3, 2]);
        assert_eq!(vocab.len(), 4);
        assert_eq!(vocab.get("dog"), Some(3));
        assert_eq!(vocab.get("bird"), None);
    }

    #[test]
    fn test_iteration_is_sorted_by_term() {
        let mut vocab = Vocabulary::new();
        for t in ["the", "cat", "sat", "dog"] {
            vocab.get_or_insert(t);
        }
        let entries: Vec<_> = vocab.iter().collect();
        assert_eq!(entries, vec![("cat", 1), ("dog", 3), ("sat", 2), ("the", 0)]);
    }

    #[test]
    fn test_lexicon_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("lex.txt");

        let mut vocab = Vocabulary::new();
        for t in ["the", "cat", "sat", "dog"] {
            vocab.get_or_insert(t);
        }
        vocab.write_lexicon(&path).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content, "cat\t1\ndog\t3\nsat\t2\nthe\t0\n");

        let loaded = Vocabulary::read_lexicon(&path).unwrap();
        assert_eq!(loaded.len(), 4);
        assert_eq!(loaded.get("sat"), Some(2));
    }

    #[test]
    fn test_empty_lexicon() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("lex.txt");
        Vocabulary::new().write_lexicon(&path).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "");
        assert!(Vocabulary::read_lexicon(&path).unwrap().is_empty());
    }

    #[test]
    fn test_rejects_sparse_ids() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("lex.txt");
        std::fs::write(&path, "cat\t0\ndog\t2\n").unwrap();
        assert!(Vocabulary::read_lexicon(&path).is_err());
    }
}
