// src/output.rs
//! Output records and the run envelope.

use std::fs;
use std::io::Write;
use std::path::Path;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::hotness::ScoredItem;
use crate::item::{to_iso, Item};

/// One ranked item as emitted to callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputRecord {
    pub source_id: String,
    pub ordinal: usize,
    /// Resolved effective timestamp.
    pub published_at: String,
    pub url: Option<String>,
    pub title: String,
    pub summary: Option<String>,
    pub category: Option<String>,
    pub time_coef: f64,
    pub density_coef: f64,
    pub domain_coef: f64,
    pub hotness: f64,
}

impl OutputRecord {
    pub fn new(item: &Item, scored: &ScoredItem) -> Self {
        Self {
            source_id: item.source_id.clone(),
            ordinal: item.ordinal,
            published_at: to_iso(&item.timestamp),
            url: item.url.clone(),
            title: item.title.clone(),
            summary: item.summary.clone(),
            category: item.category.clone(),
            time_coef: round6(scored.time_coef),
            density_coef: round6(scored.density_coef),
            domain_coef: round6(scored.domain_coef),
            hotness: round6(scored.hotness),
        }
    }
}

/// Run envelope: generation time, total count, ranked list (hotness descending).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedRun {
    pub generated_at: String,
    pub total_items: usize,
    pub items: Vec<OutputRecord>,
}

impl RankedRun {
    pub fn new(generated_at: DateTime<Utc>, items: Vec<OutputRecord>) -> Self {
        Self {
            generated_at: generated_at.to_rfc3339_opts(SecondsFormat::Secs, true),
            total_items: items.len(),
            items,
        }
    }

    pub fn empty(generated_at: DateTime<Utc>) -> Self {
        Self::new(generated_at, Vec::new())
    }

    /// Keep the first `limit` entries; `total_items` still reports the full run.
    pub fn truncated(mut self, limit: Option<usize>) -> Self {
        if let Some(n) = limit {
            self.items.truncate(n);
        }
        self
    }

    /// Write as pretty JSON via temp file + rename, so a failed write never
    /// leaves a partial file behind.
    pub fn write_atomic(&self, path: &Path) -> Result<()> {
        let dir = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir)?;
        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        serde_json::to_writer_pretty(&mut tmp, self)?;
        tmp.write_all(b"\n")?;
        tmp.as_file().sync_all()?;
        tmp.persist(path).map_err(|e| e.error)?;
        Ok(())
    }
}

fn round6(x: f64) -> f64 {
    (x * 1e6).round() / 1e6
}
