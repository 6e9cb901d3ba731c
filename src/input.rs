// src/input.rs
//! Load input records from JSON files or directories of JSON files.
//!
//! A file is either a bare array of records or `{"meta": {...}, "items": [...]}`.
//! Records without `source_id` inherit `meta.source_id`; `ordinal` is the
//! record's index inside its file. Unreadable files are skipped with a warning.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::warn;

use crate::item::RawItem;

#[derive(Debug, Default, Deserialize)]
struct Meta {
    #[serde(default)]
    source_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum InputFile {
    // Bare first: a struct variant would also accept a JSON array.
    Bare(Vec<RawItem>),
    Wrapped {
        #[serde(default)]
        meta: Meta,
        #[serde(default)]
        items: Vec<RawItem>,
    },
}

/// Parse one file's content into records.
pub fn parse_records(content: &str) -> Result<Vec<RawItem>> {
    let file: InputFile = serde_json::from_str(content)?;
    let (default_source, items) = match file {
        InputFile::Wrapped { meta, items } => (meta.source_id, items),
        InputFile::Bare(items) => (None, items),
    };

    Ok(items
        .into_iter()
        .enumerate()
        .map(|(local_idx, mut it)| {
            if it.source_id.as_deref().map_or(true, str::is_empty) {
                it.source_id = Some(default_source.clone().unwrap_or_default());
            }
            it.ordinal = Some(local_idx);
            it
        })
        .collect())
}

/// Load one JSON file.
pub fn load_file(path: &Path) -> Result<Vec<RawItem>> {
    let content =
        fs::read_to_string(path).with_context(|| format!("reading input {}", path.display()))?;
    parse_records(&content).with_context(|| format!("parsing input {}", path.display()))
}

/// Load every input path in order. Directories are walked recursively for
/// `*.json`, sorted by path. Missing paths are skipped.
pub fn load_inputs(paths: &[PathBuf]) -> Vec<RawItem> {
    let mut out = Vec::new();
    for p in paths {
        if !p.exists() {
            warn!(target: "input", path = %p.display(), "input path does not exist; skipping");
            continue;
        }
        let files = if p.is_file() {
            vec![p.clone()]
        } else {
            let mut files = Vec::new();
            collect_json_files(p, &mut files);
            files.sort();
            files
        };
        for f in files {
            match load_file(&f) {
                Ok(mut items) => out.append(&mut items),
                Err(e) => warn!(target: "input", error = %format!("{e:#}"), "skipping input file"),
            }
        }
    }
    out
}

fn collect_json_files(dir: &Path, out: &mut Vec<PathBuf>) {
    let entries = match fs::read_dir(dir) {
        Ok(e) => e,
        Err(e) => {
            warn!(target: "input", path = %dir.display(), error = %e, "cannot read directory");
            return;
        }
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            collect_json_files(&path, out);
        } else if path
            .extension()
            .and_then(|s| s.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("json"))
        {
            out.push(path);
        }
    }
}
