// src/density.rs
//! Per-window density from cross-source cosine distances.
//!
//! Policy:
//! - 0 items → nothing; 1 item → 0.0.
//! - Pair (i, j) is eligible iff i != j and the sources differ.
//! - mean distance per item over eligible pairs; items with no eligible pair
//!   are isolated and get 0.0.
//! - min-max over non-isolated items (max == min → all 0), density = 1 - norm.
//!
//! Windows are small (one day of ingestion), so the dense O(n²) matrix is fine.

use std::collections::BTreeMap;

use metrics::counter;
use ndarray::{Array2, Axis};
use tracing::{debug, warn};

use crate::metrics::{DEGENERATE_WINDOWS_TOTAL, WINDOWS_TOTAL};

/// Scores of one window plus how many items had no cross-source neighbour.
#[derive(Debug, Clone, PartialEq)]
pub struct WindowDensity {
    /// `(item index, density)` in input order; every input index appears once.
    pub scores: Vec<(usize, f64)>,
    pub isolated: usize,
}

/// Score one window. `vectors` and `source_ids` are indexed by item index.
pub fn score_window(indices: &[usize], vectors: &Array2<f32>, source_ids: &[String]) -> WindowDensity {
    let n = indices.len();
    match n {
        0 => {
            return WindowDensity {
                scores: Vec::new(),
                isolated: 0,
            }
        }
        1 => {
            return WindowDensity {
                scores: vec![(indices[0], 0.0)],
                isolated: 1,
            }
        }
        _ => {}
    }

    // Rows are unit length, so the Gram matrix holds cosine similarities.
    let w = vectors.select(Axis(0), indices);
    let sim = w.dot(&w.t());
    let dist = sim.mapv(|s| 1.0 - f64::from(s).clamp(-1.0, 1.0));

    let srcs: Vec<&str> = indices.iter().map(|&i| source_ids[i].as_str()).collect();
    let eligible = Array2::from_shape_fn((n, n), |(i, j)| i != j && srcs[i] != srcs[j]);

    let mean_dist: Vec<Option<f64>> = (0..n)
        .map(|i| {
            let (sum, cnt) = dist
                .row(i)
                .iter()
                .zip(eligible.row(i))
                .filter(|&(_, &ok)| ok)
                .fold((0.0f64, 0usize), |(s, c), (&d, _)| (s + d, c + 1));
            (cnt > 0).then(|| sum / cnt as f64)
        })
        .collect();

    let valid: Vec<f64> = mean_dist.iter().flatten().copied().collect();
    let isolated = n - valid.len();
    let lo = valid.iter().copied().fold(f64::INFINITY, f64::min);
    let hi = valid.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    let scores = indices
        .iter()
        .zip(&mean_dist)
        .map(|(&idx, md)| {
            let value = match md {
                Some(d) => {
                    let norm = if hi > lo { (d - lo) / (hi - lo) } else { 0.0 };
                    (1.0 - norm).clamp(0.0, 1.0)
                }
                None => 0.0,
            };
            (idx, value)
        })
        .collect();

    WindowDensity { scores, isolated }
}

/// Score every window and lay the results out by item index.
///
/// Windows are independent; the result does not depend on iteration order.
pub fn score_all(
    windows: &BTreeMap<String, Vec<usize>>,
    vectors: &Array2<f32>,
    source_ids: &[String],
) -> Vec<f64> {
    let mut out = vec![0.0; source_ids.len()];
    for (key, indices) in windows {
        let wd = score_window(indices, vectors, source_ids);
        counter!(WINDOWS_TOTAL).increment(1);
        // A lone item is a defined case, not a degenerate window.
        if wd.isolated > 0 && indices.len() > 1 {
            counter!(DEGENERATE_WINDOWS_TOTAL).increment(1);
            warn!(
                target: "density",
                window = %key,
                items = indices.len(),
                isolated = wd.isolated,
                "degenerate window: items without cross-source neighbours scored 0.0"
            );
        }
        debug!(target: "density", window = %key, items = indices.len(), "window scored");
        for (idx, v) in wd.scores {
            out[idx] = v;
        }
    }
    out
}
