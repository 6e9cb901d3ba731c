// src/item.rs
//! Input records and the ingested `Item`.
//!
//! The effective timestamp is resolved exactly once, in [`Item::ingest`]:
//! `published_at` if parseable, else `crawled_at`, else the run's `now`.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::DomainWeights;

/// Record as supplied by the ingestion collaborator.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RawItem {
    #[serde(default)]
    pub source_id: Option<String>,
    /// Position within the originating batch. Defaults to the position in the run input.
    #[serde(default, alias = "num")]
    pub ordinal: Option<usize>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub published_at: Option<String>,
    #[serde(default)]
    pub crawled_at: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    /// Explicit domain weight (the summarizer writes it as `weight`).
    #[serde(default, alias = "weight")]
    pub domain_coef: Option<f64>,
}

/// One ingested article candidate. Immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct Item {
    pub source_id: String,
    pub ordinal: usize,
    pub title: String,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    pub url: Option<String>,
    pub summary: Option<String>,
    pub category: Option<String>,
    pub domain_coef: f64,
}

impl Item {
    /// Resolve timestamp and domain weight for one raw record.
    pub fn ingest(raw: RawItem, position: usize, now: DateTime<Utc>, domain: &DomainWeights) -> Self {
        let timestamp = best_time(raw.published_at.as_deref(), raw.crawled_at.as_deref(), now);
        let source_id = raw.source_id.unwrap_or_default();
        let domain_coef = domain.resolve(raw.domain_coef, raw.category.as_deref(), &source_id);

        Self {
            ordinal: raw.ordinal.unwrap_or(position),
            title: raw.title.unwrap_or_default(),
            content: raw.content.unwrap_or_default(),
            timestamp,
            url: raw.url,
            summary: raw.summary,
            category: raw.category,
            domain_coef,
            source_id,
        }
    }
}

/// Ingest a whole batch, preserving input order.
pub fn ingest_all(raws: Vec<RawItem>, now: DateTime<Utc>, domain: &DomainWeights) -> Vec<Item> {
    raws.into_iter()
        .enumerate()
        .map(|(pos, raw)| Item::ingest(raw, pos, now, domain))
        .collect()
}

/// Effective timestamp with fallback priority published → crawled → now.
pub fn best_time(published_at: Option<&str>, crawled_at: Option<&str>, now: DateTime<Utc>) -> DateTime<Utc> {
    published_at
        .and_then(parse_utc)
        .or_else(|| crawled_at.and_then(parse_utc))
        .unwrap_or(now)
}

/// Lenient timestamp parsing. Values without an offset are taken as UTC.
pub fn parse_utc(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    // RSS feeds mostly use RFC 2822.
    if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Output rendering used for `published_at`.
pub fn to_iso(dt: &DateTime<Utc>) -> String {
    dt.format("%Y-%m-%dT%H:%M:%SZ").to_string()
}
