use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use log::debug;
use spindex::codec::Codec;
use spindex::document::DocumentFormat;
use spindex::index::build::{build_index, BuildSummary};
use spindex::index::stats::{format_size, show_stats};
use spindex::index::{IndexConfig, IndexPaths, IndexReader};
use spindex::output;
use std::path::{Path, PathBuf};

const DEFAULT_CORPUS: &str = "data/crawl.zip";
const DEFAULT_OUTPUT: &str = "data";

#[derive(Parser)]
#[command(name = "spindex")]
#[command(about = "Build an on-disk inverted index with external-memory sort-merge")]
#[command(args_conflicts_with_subcommands = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Corpus to index with default settings (zip archive or directory)
    corpus: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the index
    Index {
        /// Corpus to index (zip archive or directory)
        #[arg(default_value = DEFAULT_CORPUS)]
        corpus: PathBuf,

        /// Output directory (overrides the config file)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Records held in memory before a run is spilled
        #[arg(long)]
        run_size: Option<usize>,

        /// JSON config file
        #[arg(long)]
        config: Option<PathBuf>,

        /// Keep run files after the merge
        #[arg(long)]
        keep_runs: bool,

        /// How documents are parsed (auto picks HTML for .html/.htm names)
        #[arg(long, value_enum)]
        format: Option<FormatArg>,

        /// Disable progress bars
        #[arg(long)]
        no_progress: bool,
    },
    /// Show index statistics
    Stats {
        /// Index directory
        #[arg(short, long, default_value = DEFAULT_OUTPUT)]
        output: PathBuf,
    },
    /// Print the posting list of a term
    Postings {
        term: String,

        /// Index directory
        #[arg(short, long, default_value = DEFAULT_OUTPUT)]
        output: PathBuf,

        /// Which stored form to decode
        #[arg(long, value_enum, default_value_t = CodecArg::Plain)]
        codec: CodecArg,
    },
    /// Print a stored document
    Doc {
        doc_id: u32,

        /// Index directory
        #[arg(short, long, default_value = DEFAULT_OUTPUT)]
        output: PathBuf,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum CodecArg {
    Plain,
    Vbyte,
    Gamma,
}

#[derive(Clone, Copy, ValueEnum)]
enum FormatArg {
    Text,
    Html,
    Auto,
}

impl From<FormatArg> for DocumentFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Text => DocumentFormat::Text,
            FormatArg::Html => DocumentFormat::Html,
            FormatArg::Auto => DocumentFormat::Auto,
        }
    }
}

impl From<CodecArg> for Codec {
    fn from(arg: CodecArg) -> Self {
        match arg {
            CodecArg::Plain => Codec::Plain,
            CodecArg::Vbyte => Codec::VByte,
            CodecArg::Gamma => Codec::Gamma,
        }
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Index {
            corpus,
            output,
            run_size,
            config,
            keep_runs,
            format,
            no_progress,
        }) => {
            let mut config = match config {
                Some(path) => IndexConfig::load(&path)
                    .with_context(|| format!("Failed to load config {}", path.display()))?,
                None => IndexConfig::default(),
            };
            if let Some(output) = output {
                config.output_dir = output;
            }
            if let Some(run_size) = run_size {
                config.run_size = run_size;
            }
            config.keep_runs |= keep_runs;
            if let Some(format) = format {
                config.format = format.into();
            }
            config.progress &= !no_progress;
            run_build(&corpus, &config)?;
        }
        Some(Commands::Stats { output }) => {
            show_stats(&output)?;
        }
        Some(Commands::Postings {
            term,
            output,
            codec,
        }) => {
            print_postings(&output, &term, codec.into())?;
        }
        Some(Commands::Doc { doc_id, output: dir }) => {
            let reader = open_reader(&dir)?;
            let doc = reader.document(doc_id)?;
            output::print_document(&mut output::stdout(true), &doc, 20)?;
        }
        None => {
            let corpus = cli.corpus.unwrap_or_else(|| PathBuf::from(DEFAULT_CORPUS));
            run_build(&corpus, &IndexConfig::default())?;
        }
    }

    Ok(())
}

fn run_build(corpus: &Path, config: &IndexConfig) -> Result<()> {
    debug!("Build config: {:?}", config);
    let BuildSummary { meta, elapsed } = build_index(corpus, config)?;

    println!(
        "Indexed {} documents: {} terms, {} postings, {} runs in {:.2}s",
        meta.doc_count,
        meta.vocabulary_size,
        meta.posting_count,
        meta.run_count,
        elapsed.as_secs_f64()
    );
    let merged = IndexPaths::new(&config.output_dir).merged();
    if let Ok(size) = std::fs::metadata(&merged).map(|m| m.len()) {
        println!(
            "Index stored at: {} ({} postings text)",
            config.output_dir.display(),
            format_size(size)
        );
    }
    Ok(())
}

fn open_reader(dir: &Path) -> Result<IndexReader> {
    IndexReader::open(dir).with_context(|| {
        format!(
            "No usable index in {}. Run 'spindex index' first.",
            dir.display()
        )
    })
}

fn print_postings(dir: &Path, term: &str, codec: Codec) -> Result<()> {
    let reader = open_reader(dir)?;
    let Some(term_id) = reader
        .term_id(term)
        .or_else(|| reader.term_id(&term.to_lowercase()))
    else {
        bail!("'{}' is not in the vocabulary", term);
    };

    let postings = match codec {
        Codec::Plain => reader.postings(term_id)?,
        Codec::VByte => reader.vbyte_postings(term_id)?,
        Codec::Gamma => reader.gamma_postings(term_id)?,
    };
    output::print_postings(&mut output::stdout(true), term, term_id, codec, &postings)?;
    Ok(())
}
