use crate::index::types::{DocId, DocumentTerm, TermId};
use crate::index::vocabulary::Vocabulary;
use rustc_hash::FxHashMap;

/// Per-document term counter.
///
/// Turns a document's token list into one [`DocumentTerm`] per distinct term.
/// The counter map is reused between documents.
#[derive(Debug, Default)]
pub struct LocalAccumulator {
    counts: FxHashMap<TermId, u32>,
}

impl LocalAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count the tokens of one document, growing the vocabulary as needed.
    /// Records come back in ascending term id order.
    pub fn accumulate<S: AsRef<str>>(
        &mut self,
        vocab: &mut Vocabulary,
        doc_id: DocId,
        tokens: &[S],
    ) -> Vec<DocumentTerm> {
        self.counts.clear();
        for token in tokens {
            let term_id = vocab.get_or_insert(token.as_ref());
            *self.counts.entry(term_id).or_insert(0) += 1;
        }

        let mut records: Vec<DocumentTerm> = self
            .counts
            .iter()
            .map(|(&term_id, &frequency)| DocumentTerm::new(term_id, doc_id, frequency))
            .collect();
        records.sort_unstable();
        records
    }
}
