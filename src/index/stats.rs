use crate::index::paths::IndexPaths;
use crate::index::types::IndexMeta;
use anyhow::{Context, Result};
use std::fs::{self, File};
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

/// Print the build summary in `meta.json` and the size of every artifact
pub fn show_stats(dir: &Path) -> Result<()> {
    let paths = IndexPaths::new(dir);
    let meta_path = paths.meta();
    let meta_file = File::open(&meta_path).with_context(|| {
        format!("No index found in {}. Run 'spindex index' first.", dir.display())
    })?;
    let meta: IndexMeta =
        serde_json::from_reader(meta_file).context("Failed to parse meta.json")?;

    println!("spindex index");
    println!("-------------");
    println!();
    println!("Index location:   {}", dir.display());
    println!("Corpus:           {}", meta.corpus_path.display());
    println!("Index version:    {}", meta.version);
    println!("Document count:   {}", meta.doc_count);
    println!("Vocabulary size:  {}", meta.vocabulary_size);
    println!("Postings:         {}", meta.posting_count);
    println!("Tokens:           {}", meta.total_tokens);
    println!("Runs:             {} (up to {} records each)", meta.run_count, meta.run_size);
    if meta.doc_count > 0 {
        println!(
            "Avg doc length:   {:.1} tokens",
            meta.total_tokens as f64 / meta.doc_count as f64
        );
    }

    println!();
    println!("Artifacts:");
    for (label, path) in paths.artifacts() {
        if let Ok(metadata) = fs::metadata(&path) {
            println!("  {:18} {}", label, format_size(metadata.len()));
        }
    }

    if let Ok(size) = dir_size(&paths.runs_dir()) {
        if size > 0 {
            println!("  {:18} {}", "kept runs", format_size(size));
        }
    }

    println!();
    println!("Created:          {}", format_timestamp(meta.created_at));

    Ok(())
}

/// Total size of the files in the run directory, which holds no subdirectories
fn dir_size(path: &Path) -> std::io::Result<u64> {
    if !path.is_dir() {
        return Ok(0);
    }
    fs::read_dir(path)?.try_fold(0, |total: u64, entry| -> std::io::Result<u64> {
        let metadata = entry?.metadata()?;
        Ok(total + if metadata.is_file() { metadata.len() } else { 0 })
    })
}

/// Human readable byte count in binary units
pub fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 3] = ["KB", "MB", "GB"];

    let mut value = bytes as f64;
    let mut unit = None;
    for name in UNITS {
        if value < 1024.0 {
            break;
        }
        value /= 1024.0;
        unit = Some(name);
    }

    match unit {
        Some(name) => format!("{:.2} {}", value, name),
        None => format!("{} bytes", bytes),
    }
}

/// Build time as seconds since the epoch plus how long ago that was
fn format_timestamp(ts: u64) -> String {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(ts);
    let age = now.saturating_sub(ts);
    let ago = match age {
        0..60 => format!("{}s", age),
        60..3600 => format!("{}m", age / 60),
        3600..86400 => format!("{}h", age / 3600),
        _ => format!("{}d", age / 86400),
    };
    format!("{} (unix time, {} ago)", ts, ago)
}
