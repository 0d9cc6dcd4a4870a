//! Integration tests driving the spindex binary.

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

fn spindex_binary() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_spindex"))
}

/// Run spindex with given args, returning (stdout, stderr, success)
fn run_spindex(args: &[&str], cwd: &Path) -> (String, String, bool) {
    let output = Command::new(spindex_binary())
        .args(args)
        .current_dir(cwd)
        .env("NO_COLOR", "1")
        .env("TERM", "dumb")
        .env("RUST_LOG", "warn")
        .output()
        .expect("Failed to run spindex");

    (
        String::from_utf8_lossy(&output.stdout).to_string(),
        String::from_utf8_lossy(&output.stderr).to_string(),
        output.status.success(),
    )
}

/// Corpus of the two classic documents, indexed into `<tmp>/index`
fn indexed_fixture() -> TempDir {
    let tmp = TempDir::new().unwrap();
    let corpus = tmp.path().join("crawl.zip");
    let mut zip = ZipWriter::new(File::create(&corpus).unwrap());
    for (name, text) in [("a.txt", "The cat sat"), ("b.txt", "the dog sat")] {
        zip.start_file(name, SimpleFileOptions::default()).unwrap();
        zip.write_all(text.as_bytes()).unwrap();
    }
    zip.finish().unwrap();

    let (stdout, stderr, ok) = run_spindex(
        &[
            "index",
            "crawl.zip",
            "-o",
            "index",
            "--run-size",
            "2",
            "--no-progress",
        ],
        tmp.path(),
    );
    assert!(ok, "spindex index failed: {}", stderr);
    assert!(stdout.contains("Indexed 2 documents: 4 terms, 6 postings, 3 runs"));
    tmp
}

#[test]
fn test_postings_in_every_codec() {
    let tmp = indexed_fixture();

    for codec in ["plain", "vbyte", "gamma"] {
        let (stdout, stderr, ok) = run_spindex(
            &["postings", "sat", "-o", "index", "--codec", codec],
            tmp.path(),
        );
        assert!(ok, "postings --codec {} failed: {}", codec, stderr);
        assert_eq!(
            stdout,
            format!("sat (term 2, df 2, {})\n0\t1\n1\t1\n", codec)
        );
    }
}

#[test]
fn test_postings_lookup_is_case_folded() {
    let tmp = indexed_fixture();
    let (stdout, _, ok) = run_spindex(&["postings", "THE", "-o", "index"], tmp.path());
    assert!(ok);
    assert!(stdout.starts_with("THE (term 0, df 2, plain)"));
}

#[test]
fn test_unknown_term_fails() {
    let tmp = indexed_fixture();
    let (_, stderr, ok) = run_spindex(&["postings", "bird", "-o", "index"], tmp.path());
    assert!(!ok);
    assert!(stderr.contains("not in the vocabulary"));
}

#[test]
fn test_doc_command() {
    let tmp = indexed_fixture();
    let (stdout, _, ok) = run_spindex(&["doc", "1", "-o", "index"], tmp.path());
    assert!(ok);
    assert!(stdout.starts_with("b.txt\n"));
    assert!(stdout.contains("Tokens:           3"));
    assert!(stdout.contains("Preview:          the dog sat"));

    let (_, _, ok) = run_spindex(&["doc", "7", "-o", "index"], tmp.path());
    assert!(!ok);
}

#[test]
fn test_stats_command() {
    let tmp = indexed_fixture();
    let (stdout, _, ok) = run_spindex(&["stats", "-o", "index"], tmp.path());
    assert!(ok);
    assert!(stdout.contains("Document count:   2"));
    assert!(stdout.contains("Vocabulary size:  4"));
    assert!(stdout.contains("Postings:         6"));
    assert!(stdout.contains("gamma binary"));
}

#[test]
fn test_default_build_uses_data_directory() {
    let tmp = TempDir::new().unwrap();
    let pages = tmp.path().join("pages");
    std::fs::create_dir(&pages).unwrap();
    std::fs::write(pages.join("one.txt"), "hello world").unwrap();

    let (stdout, stderr, ok) = run_spindex(&["pages"], tmp.path());
    assert!(ok, "default build failed: {}", stderr);
    assert!(stdout.contains("Indexed 1 documents"));
    assert!(tmp.path().join("data").join("idx.txt").exists());
    assert!(tmp.path().join("data").join("meta.json").exists());
}

#[test]
fn test_missing_corpus_fails() {
    let tmp = TempDir::new().unwrap();
    let (_, stderr, ok) = run_spindex(&["index", "nope.zip", "--no-progress"], tmp.path());
    assert!(!ok);
    assert!(stderr.contains("Failed to open corpus"));
}

#[test]
fn test_invalid_config_fails() {
    let tmp = TempDir::new().unwrap();
    std::fs::write(tmp.path().join("cfg.json"), r#"{"run_size": 0}"#).unwrap();
    let (_, _, ok) = run_spindex(
        &["index", "nope.zip", "--config", "cfg.json", "--no-progress"],
        tmp.path(),
    );
    assert!(!ok);
}

#[test]
fn test_format_flag_overrides_extension() {
    let tmp = TempDir::new().unwrap();
    let pages = tmp.path().join("pages");
    std::fs::create_dir(&pages).unwrap();
    std::fs::write(pages.join("note.txt"), "<p>hello</p>").unwrap();

    let build = |format: &str| {
        let (_, stderr, ok) = run_spindex(
            &["index", "pages", "-o", "index", "--format", format, "--no-progress"],
            tmp.path(),
        );
        assert!(ok, "index --format {} failed: {}", format, stderr);
        run_spindex(&["postings", "hello", "-o", "index"], tmp.path())
    };

    let (_, _, ok) = build("auto");
    assert!(!ok);

    let (stdout, stderr, ok) = build("html");
    assert!(ok, "postings after html build failed: {}", stderr);
    assert!(stdout.starts_with("hello (term 0, df 1, plain)"));
}
