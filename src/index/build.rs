use crate::corpus::Corpus;
use crate::document::{DocumentParser, FormatParser, ParsedDocument};
use crate::index::accumulator::LocalAccumulator;
use crate::index::direct::{DirectIndexWriter, DirectSummary};
use crate::index::merge::{PostingsAssembler, RunMerger};
use crate::index::paths::IndexPaths;
use crate::index::run::{RunSpiller, SpillSummary};
use crate::index::types::{DocId, DocumentTerm, IndexConfig, IndexMeta};
use crate::index::vocabulary::Vocabulary;
use crate::index::writer::{write_meta, InvertedIndexWriter};
use crate::utils::progress::progress_bar;
use anyhow::{anyhow, ensure, Context, Result};
use crossbeam_channel::{bounded, Sender};
use log::{debug, info, warn};
use rayon::prelude::*;
use std::fs;
use std::io;
use std::path::Path;
use std::thread;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

/// Outcome of a complete build
#[derive(Debug, Clone)]
pub struct BuildSummary {
    pub meta: IndexMeta,
    pub elapsed: Duration,
}

/// Build an index of `corpus_path`, parsing documents as `config.format` says
pub fn build_index(corpus_path: &Path, config: &IndexConfig) -> Result<BuildSummary> {
    let parser = FormatParser::new(config.format, config.case_fold)?;
    build_index_with_parser(corpus_path, config, &parser)
}

/// Build an index of `corpus_path` into `config.output_dir`.
///
/// Documents are parsed batch by batch, their term records streamed to a
/// spiller thread that writes sorted runs, and the runs are merged into the
/// final posting files once the corpus is exhausted.
pub fn build_index_with_parser<P: DocumentParser>(
    corpus_path: &Path,
    config: &IndexConfig,
    parser: &P,
) -> Result<BuildSummary> {
    let started = Instant::now();
    config.validate()?;

    let paths = IndexPaths::new(&config.output_dir);
    fs::create_dir_all(paths.dir())
        .with_context(|| format!("Failed to create output directory {}", paths.dir().display()))?;

    let mut corpus = Corpus::open(corpus_path)
        .with_context(|| format!("Failed to open corpus {}", corpus_path.display()))?;
    info!("Indexing: {}", corpus_path.display());

    // Until the new meta.json lands the directory is not a complete index
    remove_stale(&paths.meta())?;
    if !config.compress {
        for path in paths.compressed_artifacts() {
            remove_stale(&path)?;
        }
    }

    // Phase 1: parse, accumulate and spill sorted runs
    let mut vocabulary = Vocabulary::new();
    let (direct, spill) = spill_runs(&mut corpus, parser, config, &paths, &mut vocabulary)?;
    info!(
        "Parsed {} documents, {} terms, {} runs",
        direct.documents,
        vocabulary.len(),
        spill.runs.len()
    );

    // Phase 2: lexicon, then the merge
    vocabulary
        .write_lexicon(&paths.lexicon())
        .context("Failed to write lexicon")?;
    let posting_count = merge_runs(&spill, &vocabulary, config, &paths)?;
    ensure!(
        posting_count == spill.records,
        "merged {} postings from {} run records",
        posting_count,
        spill.records
    );

    if !config.keep_runs {
        remove_runs(&paths.runs_dir());
    }

    // Phase 3: metadata marks the index complete
    let created_at = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default();
    let meta = IndexMeta {
        corpus_path: corpus_path.to_path_buf(),
        doc_count: direct.documents,
        vocabulary_size: u32::try_from(vocabulary.len()).context("vocabulary too large")?,
        run_count: spill.runs.len(),
        run_size: config.run_size,
        posting_count,
        total_tokens: direct.total_tokens,
        created_at,
        ..IndexMeta::default()
    };
    write_meta(&paths.meta(), &meta).context("Failed to write meta.json")?;

    let elapsed = started.elapsed();
    info!(
        "Index stored at {} in {:.2}s",
        paths.dir().display(),
        elapsed.as_secs_f64()
    );
    Ok(BuildSummary { meta, elapsed })
}

/// Run the parse side on this thread and the spiller on a scoped thread
fn spill_runs<P: DocumentParser>(
    corpus: &mut Corpus,
    parser: &P,
    config: &IndexConfig,
    paths: &IndexPaths,
    vocabulary: &mut Vocabulary,
) -> Result<(DirectSummary, SpillSummary)> {
    let runs_dir = paths.runs_dir();
    let mut direct = DirectIndexWriter::create(paths).context("Failed to create direct index")?;

    let (produced, spilled) = thread::scope(|scope| {
        let (tx, rx) = bounded::<Vec<DocumentTerm>>(config.channel_capacity);

        let spiller = scope.spawn(move || -> crate::error::Result<SpillSummary> {
            let mut spiller = RunSpiller::new(&runs_dir, config.run_size)?;
            for records in rx {
                spiller.extend(records)?;
            }
            spiller.finish()
        });

        let produced = parse_corpus(corpus, parser, config, vocabulary, &mut direct, &tx);
        // Closing the channel lets the spiller write its final run
        drop(tx);
        (produced, spiller.join())
    });

    let spill = spilled
        .map_err(|_| anyhow!("run spiller thread panicked"))?
        .context("Failed to write runs")?;
    produced?;

    let direct = direct.finish().context("Failed to finish direct index")?;
    Ok((direct, spill))
}

fn parse_corpus<P: DocumentParser>(
    corpus: &mut Corpus,
    parser: &P,
    config: &IndexConfig,
    vocabulary: &mut Vocabulary,
    direct: &mut DirectIndexWriter,
    tx: &Sender<Vec<DocumentTerm>>,
) -> Result<()> {
    let bar = progress_bar(corpus.len() as u64, "Parsing documents", config.progress);
    let mut accumulator = LocalAccumulator::new();
    let mut next_doc: DocId = 0;

    loop {
        let batch = corpus.next_batch(config.parse_batch_size)?;
        if batch.is_empty() {
            break;
        }

        let first = next_doc;
        next_doc = u32::try_from(batch.len())
            .ok()
            .and_then(|n| first.checked_add(n))
            .context("too many documents for 32-bit doc ids")?;

        let parse = |(i, raw): (usize, &crate::corpus::RawDocument)| {
            parser.parse(first + i as DocId, &raw.name, &raw.content)
        };
        let parsed: Vec<ParsedDocument> = if config.parallel_parse {
            batch.par_iter().enumerate().map(parse).collect()
        } else {
            batch.iter().enumerate().map(parse).collect()
        };

        // Sequential in doc id order: term ids follow first occurrence
        for doc in &parsed {
            direct.add(doc)?;
            let records = accumulator.accumulate(vocabulary, doc.doc_id, &doc.tokens);
            if tx.send(records).is_err() {
                return Err(anyhow!("run spiller stopped"));
            }
        }

        if let Some(bar) = &bar {
            bar.inc(parsed.len() as u64);
        }
    }

    if let Some(bar) = bar {
        bar.finish_with_message(format!("Parsed {} documents", next_doc));
    }
    Ok(())
}

/// Merge the runs and write every posting file. Returns the posting count.
fn merge_runs(
    spill: &SpillSummary,
    vocabulary: &Vocabulary,
    config: &IndexConfig,
    paths: &IndexPaths,
) -> Result<u64> {
    let mut writer = InvertedIndexWriter::create(paths, vocabulary.len(), config.compress)
        .context("Failed to create index files")?;
    let merger = RunMerger::open(&spill.runs).context("Failed to open runs")?;
    let mut assembler = PostingsAssembler::new(merger);

    let bar = progress_bar(vocabulary.len() as u64, "Merging runs", config.progress);
    while let Some(term) = assembler.next_term().context("Failed to merge runs")? {
        writer.write_term(&term)?;
        if let Some(bar) = &bar {
            bar.inc(1);
        }
    }
    let merged = assembler.merger().merged();

    let summary = writer.finish().context("Failed to finish index files")?;
    if let Some(bar) = bar {
        bar.finish_with_message(format!("Merged {} postings", merged));
    }
    Ok(summary.posting_count)
}

/// Delete an output left by an earlier build, if there is one
fn remove_stale(path: &Path) -> Result<()> {
    match fs::remove_file(path) {
        Ok(()) => {
            debug!("Removed {}", path.display());
            Ok(())
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e).with_context(|| format!("Failed to remove {}", path.display())),
    }
}

fn remove_runs(dir: &Path) {
    if !dir.exists() {
        return;
    }
    match fs::remove_dir_all(dir) {
        Ok(()) => info!("Removed run files in {}", dir.display()),
        Err(e) => warn!("Could not remove run files in {}: {}", dir.display(), e),
    }
}
