//! Loading source documents from JSON / JSONL files.
//!
//! A record that fails to deserialize is skipped with a warning; the rest of
//! the file is still ingested.

use anyhow::{Context, Result};
use search_core::SourceDocument;
use serde_json::Value;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

#[derive(Debug, Default)]
pub struct Ingested {
    pub docs: Vec<SourceDocument>,
    pub skipped: usize,
}

impl Ingested {
    fn accept(&mut self, value: Value, origin: &str) {
        match serde_json::from_value::<SourceDocument>(value) {
            Ok(doc) => self.docs.push(doc),
            Err(err) => {
                self.skipped += 1;
                tracing::warn!(origin, error = %err, "skipping malformed document");
            }
        }
    }
}

/// Input files in a stable order: the file itself, or every `.json` /
/// `.jsonl` file under a directory sorted by path.
pub fn collect_files(input: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = Vec::new();
    if input.is_dir() {
        for entry in WalkDir::new(input).into_iter().filter_map(|e| e.ok()) {
            let p = entry.path();
            if p.is_file() {
                if let Some(ext) = p.extension().and_then(|s| s.to_str()) {
                    if matches!(ext, "json" | "jsonl") {
                        files.push(p.to_path_buf());
                    }
                }
            }
        }
        files.sort();
    } else if input.is_file() {
        files.push(input.to_path_buf());
    }
    files
}

pub fn load_documents(input: &Path) -> Result<Ingested> {
    let mut out = Ingested::default();
    for file in collect_files(input) {
        if file.extension().and_then(|s| s.to_str()) == Some("jsonl") {
            ingest_jsonl(&file, &mut out)?;
        } else {
            ingest_json(&file, &mut out)?;
        }
    }
    Ok(out)
}

fn ingest_jsonl(file: &Path, out: &mut Ingested) -> Result<()> {
    let f = File::open(file).with_context(|| format!("opening {}", file.display()))?;
    let reader = BufReader::new(f);
    for (lineno, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() { continue; }
        let origin = format!("{}:{}", file.display(), lineno + 1);
        match serde_json::from_str::<Value>(&line) {
            Ok(v) => out.accept(v, &origin),
            Err(err) => {
                out.skipped += 1;
                tracing::warn!(origin, error = %err, "skipping unparseable line");
            }
        }
    }
    Ok(())
}

fn ingest_json(file: &Path, out: &mut Ingested) -> Result<()> {
    let f = File::open(file).with_context(|| format!("opening {}", file.display()))?;
    let reader = BufReader::new(f);
    let origin = file.display().to_string();
    let json: Value = match serde_json::from_reader(reader) {
        Ok(v) => v,
        Err(err) => {
            tracing::warn!(origin, error = %err, "skipping unparseable file");
            return Ok(());
        }
    };
    match json {
        Value::Array(arr) => {
            for (i, v) in arr.into_iter().enumerate() {
                out.accept(v, &format!("{origin}[{i}]"));
            }
        }
        v @ Value::Object(_) => out.accept(v, &origin),
        _ => tracing::warn!(origin, "expected a JSON array or object"),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn skips_bad_records_and_keeps_the_rest() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join("a.json"),
            r#"[{"id": 0, "title": "Neural", "url": "u0", "text": "neural networks"},
               {"title": "no text"},
               {"title": "Body alias", "body": "deep learning"}]"#,
        )
        .unwrap();
        fs::write(
            dir.path().join("b.jsonl"),
            "{\"title\": \"R\", \"text\": \"robotics\"}\nnot json\n\n{\"title\": 3, \"text\": \"x\"}\n",
        )
        .unwrap();
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let got = load_documents(dir.path()).unwrap();
        let titles: Vec<_> = got.docs.iter().map(|d| d.title.as_str()).collect();
        assert_eq!(titles, vec!["Neural", "Body alias", "R"]);
        assert_eq!(got.docs[1].text, "deep learning");
        assert_eq!(got.docs[2].url, "");
        assert_eq!(got.skipped, 3);
    }

    #[test]
    fn single_object_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("one.json");
        fs::write(&path, r#"{"title": "Solo", "url": "https://x", "text": "alone"}"#).unwrap();
        let got = load_documents(&path).unwrap();
        assert_eq!(got.docs.len(), 1);
        assert_eq!(got.skipped, 0);
    }

    #[test]
    fn broken_file_is_skipped() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("broken.json"), "[{").unwrap();
        fs::write(dir.path().join("ok.json"), r#"[{"title": "ok", "text": "fine"}]"#).unwrap();
        let got = load_documents(dir.path()).unwrap();
        assert_eq!(got.docs.len(), 1);
    }
}
