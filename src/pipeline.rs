// src/pipeline.rs
//! Scoring run: ingest → normalize → fuse → partition → density → combine → rank.
//!
//! Each stage consumes the previous stage's output and returns a new value;
//! nothing is written back onto the input records, so an aborted run leaves
//! no half-scored state behind.

use std::time::Instant;

use chrono::{DateTime, Duration, Utc};
use metrics::{counter, histogram};
use ndarray::Array2;
use tracing::{info, warn};

use crate::config::HotnessConfig;
use crate::density;
use crate::embedding::{DynEmbeddingProvider, EmbeddingFuser};
use crate::error::Result;
use crate::hotness::{self, HotnessCombiner, ScoredItem};
use crate::item::{ingest_all, Item, RawItem};
use crate::metrics::{ITEMS_TOTAL, RUNS_TOTAL, RUN_DURATION_MS};
use crate::output::{OutputRecord, RankedRun};
use crate::text;
use crate::window;

/// Items plus their fused unit vectors (row i ↔ item i).
#[derive(Debug, Clone)]
pub struct EmbeddedBatch {
    pub items: Vec<Item>,
    pub vectors: Array2<f32>,
}

/// Configured engine. Validation happens in `new`, before any work.
pub struct HotnessEngine {
    config: HotnessConfig,
    window: Duration,
    fuser: EmbeddingFuser,
}

impl HotnessEngine {
    pub fn new(config: HotnessConfig, provider: DynEmbeddingProvider) -> Result<Self> {
        config.validate()?;
        let window = config.window_duration()?;
        if config.window.hours != 24 {
            warn!(
                target: "pipeline",
                hours = config.window.hours,
                "windows are UTC days; window.hours only sets the decay span"
            );
        }
        let fuser = EmbeddingFuser::new(
            provider,
            config.embedding.title_weight,
            config.embedding.content_weight,
        );
        Ok(Self {
            config,
            window,
            fuser,
        })
    }

    pub fn config(&self) -> &HotnessConfig {
        &self.config
    }

    /// Resolve timestamps and domain weights against the run anchor.
    pub fn ingest(&self, raws: Vec<RawItem>, now: DateTime<Utc>) -> Vec<Item> {
        ingest_all(raws, now, &self.config.domain)
    }

    /// Normalize texts and fuse them into one vector per item.
    pub async fn embed(&self, items: Vec<Item>) -> Result<EmbeddedBatch> {
        let content_chars = self.config.embedding.content_chars;
        let titles: Vec<String> = items.iter().map(|it| text::normalize(&it.title)).collect();
        let contents: Vec<String> = items
            .iter()
            .map(|it| text::lead(&it.content, content_chars))
            .collect();
        let vectors = self.fuser.fuse(&titles, &contents).await?;
        Ok(EmbeddedBatch { items, vectors })
    }

    /// Density for every item, window by window.
    pub fn density(&self, batch: &EmbeddedBatch) -> Vec<f64> {
        let windows = window::partition(&batch.items);
        let sources: Vec<String> = batch.items.iter().map(|it| it.source_id.clone()).collect();
        density::score_all(&windows, &batch.vectors, &sources)
    }

    /// Combine, normalize and rank.
    pub fn combine(&self, items: &[Item], density: &[f64], now: DateTime<Utc>) -> Vec<ScoredItem> {
        let combiner = HotnessCombiner::new(
            self.config.hotness.time_decay,
            self.window,
            self.config.hotness.weights,
            now,
        );
        hotness::rank(combiner.apply(items, density))
    }

    /// Full run anchored at `now`. All-or-nothing: any error means no output.
    pub async fn run(&self, raws: Vec<RawItem>, now: DateTime<Utc>) -> Result<RankedRun> {
        let started = Instant::now();
        if raws.is_empty() {
            info!(target: "pipeline", "no items to score");
            return Ok(RankedRun::empty(Utc::now()));
        }

        let items = self.ingest(raws, now);
        let batch = self.embed(items).await?;
        let density = self.density(&batch);
        let ranked = self.combine(&batch.items, &density, now);

        let records: Vec<OutputRecord> = ranked
            .iter()
            .map(|s| OutputRecord::new(&batch.items[s.index], s))
            .collect();

        let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;
        counter!(RUNS_TOTAL).increment(1);
        counter!(ITEMS_TOTAL).increment(records.len() as u64);
        histogram!(RUN_DURATION_MS).record(elapsed_ms);
        info!(
            target: "pipeline",
            items = records.len(),
            provider = self.fuser.provider_name(),
            elapsed_ms = elapsed_ms as u64,
            "scoring run finished"
        );

        Ok(RankedRun::new(Utc::now(), records))
    }
}
