//! Hotness: time decay + density + domain weight, globally min-max normalized.
//!
//! `time_coef` rescales `exp(-rate * ratio)` so it spans exactly `[0, 1]`
//! across the window instead of `[exp(-rate), 1]`:
//! `(exp(-rate*ratio) - exp(-rate)) / (1 - exp(-rate))`.
//!
//! score = w_time*time + w_density*density + w_domain*domain, then min-max
//! over the whole item set (not per window).

use chrono::{DateTime, Duration, Utc};

use tracing::debug;

use crate::config::HotnessWeights;
use crate::item::Item;

/// Derived coefficients of one item; `index` points into the run input.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoredItem {
    pub index: usize,
    pub time_coef: f64,
    pub density_coef: f64,
    pub domain_coef: f64,
    pub hotness: f64,
}

#[derive(Debug, Clone, Copy)]
pub struct HotnessCombiner {
    time_decay_rate: f64,
    window: Duration,
    weights: HotnessWeights,
    now: DateTime<Utc>,
}

impl HotnessCombiner {
    /// `now` is the run anchor; fix it once per run.
    pub fn new(time_decay_rate: f64, window: Duration, weights: HotnessWeights, now: DateTime<Utc>) -> Self {
        Self {
            time_decay_rate,
            window,
            weights,
            now,
        }
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.now
    }

    /// Recency coefficient in `[0, 1]`: 1 at or after `now`, 0 at or before `now - W`.
    pub fn time_coef(&self, ts: DateTime<Utc>) -> f64 {
        // A cutoff outside chrono's range means nothing is old enough to expire.
        if let Some(cutoff) = self.now.checked_sub_signed(self.window) {
            if ts <= cutoff {
                return 0.0;
            }
        }
        if ts >= self.now {
            return 1.0;
        }

        let window_secs = seconds(self.window);
        let ratio = if window_secs <= 0.0 {
            1.0
        } else {
            (seconds(self.now - ts) / window_secs).clamp(0.0, 1.0)
        };
        let tail = (-self.time_decay_rate).exp();
        let raw = (-self.time_decay_rate * ratio).exp();
        if raw <= tail {
            return 0.0;
        }
        ((raw - tail) / (1.0 - tail)).clamp(0.0, 1.0)
    }

    /// Blend coefficients and normalize across the whole set.
    ///
    /// `density` is indexed like `items`; a missing entry counts as 0.
    pub fn apply(&self, items: &[Item], density: &[f64]) -> Vec<ScoredItem> {
        let w = self.weights;
        let raw: Vec<ScoredItem> = items
            .iter()
            .enumerate()
            .map(|(index, it)| {
                let time_coef = self.time_coef(it.timestamp);
                let density_coef = density.get(index).copied().unwrap_or(0.0);
                let domain_coef = it.domain_coef;
                ScoredItem {
                    index,
                    time_coef,
                    density_coef,
                    domain_coef,
                    hotness: w.time * time_coef + w.density * density_coef + w.domain * domain_coef,
                }
            })
            .collect();

        let scores: Vec<f64> = raw.iter().map(|s| s.hotness).collect();
        let normalized = min_max_normalize(&scores);
        debug!(
            target: "hotness",
            items = raw.len(),
            fresh = raw.iter().filter(|s| s.time_coef > 0.0).count(),
            "combined scores"
        );
        raw.into_iter()
            .zip(normalized)
            .map(|(s, hotness)| ScoredItem { hotness, ..s })
            .collect()
    }
}

/// Global min-max to `[0, 1]`. Constant input maps to 1 where the score is
/// positive and 0 elsewhere.
pub fn min_max_normalize(scores: &[f64]) -> Vec<f64> {
    if scores.is_empty() {
        return Vec::new();
    }
    let lo = scores.iter().copied().fold(f64::INFINITY, f64::min);
    let hi = scores.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    scores
        .iter()
        .map(|&s| {
            if hi > lo {
                ((s - lo) / (hi - lo)).clamp(0.0, 1.0)
            } else if s > 0.0 {
                1.0
            } else {
                0.0
            }
        })
        .collect()
}

/// Stable sort by hotness descending; ties keep input order.
pub fn rank(mut scored: Vec<ScoredItem>) -> Vec<ScoredItem> {
    scored.sort_by(|a, b| b.hotness.total_cmp(&a.hotness));
    scored
}

fn seconds(d: Duration) -> f64 {
    d.num_milliseconds() as f64 / 1000.0
}
