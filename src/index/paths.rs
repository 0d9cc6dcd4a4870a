use std::path::{Path, PathBuf};

const DOC_INDEX: &str = "doc_idx.txt";
const DOC_OFFSETS: &str = "doc_idx_offset.txt";
const LEXICON: &str = "lex.txt";
const RUNS_DIR: &str = "runs";
const MERGED: &str = "idx.txt";
const GAPS: &str = "idx_gaps.txt";
const VBE: &str = "idx_vbe.txt";
const GAMMA: &str = "idx_gamma.txt";
const TERM_OFFSETS: &str = "idx_term_offset.txt";
const VBE_BIN: &str = "idx_vbe.bin";
const VBE_OFFSETS: &str = "idx_vbe_offset.txt";
const GAMMA_BIN: &str = "idx_gamma.bin";
const GAMMA_OFFSETS: &str = "idx_gamma_offset.txt";
const META: &str = "meta.json";

/// Locations of every artifact inside an index directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexPaths {
    dir: PathBuf,
}

impl IndexPaths {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn doc_index(&self) -> PathBuf {
        self.dir.join(DOC_INDEX)
    }

    pub fn doc_offsets(&self) -> PathBuf {
        self.dir.join(DOC_OFFSETS)
    }

    pub fn lexicon(&self) -> PathBuf {
        self.dir.join(LEXICON)
    }

    pub fn runs_dir(&self) -> PathBuf {
        self.dir.join(RUNS_DIR)
    }

    /// Plain `(docId,freq)` index
    pub fn merged(&self) -> PathBuf {
        self.dir.join(MERGED)
    }

    pub fn gaps(&self) -> PathBuf {
        self.dir.join(GAPS)
    }

    pub fn vbe(&self) -> PathBuf {
        self.dir.join(VBE)
    }

    pub fn gamma(&self) -> PathBuf {
        self.dir.join(GAMMA)
    }

    pub fn term_offsets(&self) -> PathBuf {
        self.dir.join(TERM_OFFSETS)
    }

    pub fn vbe_bin(&self) -> PathBuf {
        self.dir.join(VBE_BIN)
    }

    pub fn vbe_offsets(&self) -> PathBuf {
        self.dir.join(VBE_OFFSETS)
    }

    pub fn gamma_bin(&self) -> PathBuf {
        self.dir.join(GAMMA_BIN)
    }

    pub fn gamma_offsets(&self) -> PathBuf {
        self.dir.join(GAMMA_OFFSETS)
    }

    pub fn meta(&self) -> PathBuf {
        self.dir.join(META)
    }

    /// Outputs written only by compressed builds
    pub fn compressed_artifacts(&self) -> [PathBuf; 7] {
        [
            self.gaps(),
            self.vbe(),
            self.gamma(),
            self.vbe_bin(),
            self.vbe_offsets(),
            self.gamma_bin(),
            self.gamma_offsets(),
        ]
    }

    /// Every final artifact with a display label, in the order `stats` lists them
    pub fn artifacts(&self) -> Vec<(&'static str, PathBuf)> {
        vec![
            ("direct index", self.doc_index()),
            ("document offsets", self.doc_offsets()),
            ("lexicon", self.lexicon()),
            ("postings", self.merged()),
            ("term offsets", self.term_offsets()),
            ("gap postings", self.gaps()),
            ("vbyte postings", self.vbe()),
            ("gamma postings", self.gamma()),
            ("vbyte binary", self.vbe_bin()),
            ("vbyte offsets", self.vbe_offsets()),
            ("gamma binary", self.gamma_bin()),
            ("gamma offsets", self.gamma_offsets()),
            ("metadata", self.meta()),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_artifact_names() {
        let paths = IndexPaths::new("out");
        assert_eq!(paths.merged(), Path::new("out/idx.txt"));
        assert_eq!(paths.runs_dir(), Path::new("out/runs"));
        assert_eq!(paths.gamma_offsets(), Path::new("out/idx_gamma_offset.txt"));
        assert_eq!(paths.artifacts().len(), 13);
        for path in paths.compressed_artifacts() {
            assert!(paths.artifacts().iter().any(|(_, p)| *p == path));
        }
    }
}
