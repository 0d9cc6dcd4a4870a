//! Corpus sources.
//!
//! A corpus is either a zip archive, where every file entry is one document,
//! or a directory tree, where every file is one document. Documents keep the
//! order they have in the archive, or sorted path order for directories,
//! and that order decides doc ids.

use crate::error::{IndexError, IoContext, Result};
use ignore::WalkBuilder;
use log::{debug, info};
use std::fs::{self, File};
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};
use zip::ZipArchive;

/// One unparsed document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawDocument {
    pub name: String,
    pub content: Vec<u8>,
}

enum Source {
    Zip {
        path: PathBuf,
        archive: ZipArchive<BufReader<File>>,
        entries: Vec<usize>,
    },
    Directory {
        files: Vec<(PathBuf, String)>,
    },
}

/// Sequential reader over the documents of a corpus
pub struct Corpus {
    source: Source,
    position: usize,
}

impl Corpus {
    /// Open a zip archive or a directory
    pub fn open(path: &Path) -> Result<Self> {
        let metadata = fs::metadata(path).with_path(path)?;
        let source = if metadata.is_dir() {
            open_directory(path)?
        } else {
            open_zip(path)?
        };

        let corpus = Self {
            source,
            position: 0,
        };
        info!("Corpus {} holds {} documents", path.display(), corpus.len());
        Ok(corpus)
    }

    /// Total number of documents
    pub fn len(&self) -> usize {
        match &self.source {
            Source::Zip { entries, .. } => entries.len(),
            Source::Directory { files } => files.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Read up to `max` further documents. An empty batch means the corpus is
    /// exhausted.
    pub fn next_batch(&mut self, max: usize) -> Result<Vec<RawDocument>> {
        let end = (self.position + max).min(self.len());
        let mut batch = Vec::with_capacity(end - self.position);

        for i in self.position..end {
            batch.push(self.read(i)?);
        }
        self.position = end;
        Ok(batch)
    }

    fn read(&mut self, i: usize) -> Result<RawDocument> {
        match &mut self.source {
            Source::Zip {
                path,
                archive,
                entries,
            } => {
                let path: &Path = path;
                let mut entry = archive
                    .by_index(entries[i])
                    .map_err(|e| zip_error(path, e))?;
                let name = entry.name().to_string();
                let mut content = Vec::with_capacity(entry.size() as usize);
                entry.read_to_end(&mut content).with_path(path)?;
                Ok(RawDocument { name, content })
            }
            Source::Directory { files } => {
                let (full, name) = &files[i];
                let content = fs::read(full).with_path(full)?;
                Ok(RawDocument {
                    name: name.clone(),
                    content,
                })
            }
        }
    }
}

fn zip_error(path: &Path, e: zip::result::ZipError) -> IndexError {
    IndexError::Corpus(format!("{}: {}", path.display(), e))
}

fn open_zip(path: &Path) -> Result<Source> {
    let file = File::open(path).with_path(path)?;
    let archive = ZipArchive::new(BufReader::new(file)).map_err(|e| zip_error(path, e))?;

    // Directory entries carry a trailing slash
    let entries: Vec<usize> = (0..archive.len())
        .filter(|&i| {
            archive
                .name_for_index(i)
                .is_some_and(|name| !name.ends_with('/'))
        })
        .collect();
    debug!(
        "{}: {} entries, {} documents",
        path.display(),
        archive.len(),
        entries.len()
    );

    Ok(Source::Zip {
        path: path.to_path_buf(),
        archive,
        entries,
    })
}

fn open_directory(root: &Path) -> Result<Source> {
    let walker = WalkBuilder::new(root)
        .standard_filters(false)
        .sort_by_file_name(|a, b| a.cmp(b))
        .build();

    let mut files = Vec::new();
    for entry in walker {
        let entry = entry.map_err(|e| IndexError::Corpus(format!("{}: {}", root.display(), e)))?;
        if !entry.file_type().is_some_and(|t| t.is_file()) {
            continue;
        }
        let full = entry.path().to_path_buf();
        let rel = full.strip_prefix(root).unwrap_or(&full);
        let name = rel
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        files.push((full, name));
    }
    files.sort_by(|a, b| a.1.cmp(&b.1));

    Ok(Source::Directory { files })
}
