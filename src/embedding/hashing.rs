//! Offline provider: signed feature hashing over word terms.
//!
//! Each distinct term lands in one of `dimensions` slots (FNV-1a), with a
//! sign taken from the hash's top bit and a log-scaled count as magnitude.
//! No model, no network; identical text always gives the identical row.

use std::collections::BTreeMap;

use async_trait::async_trait;

use super::{l2_normalized, EmbeddingProvider, PASSAGE_PREFIX};
use crate::error::{HotnessError, Result};

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

fn fnv1a(bytes: &[u8]) -> u64 {
    bytes
        .iter()
        .fold(FNV_OFFSET, |h, &b| (h ^ u64::from(b)).wrapping_mul(FNV_PRIME))
}

/// Lowercased alphanumeric runs of two or more characters.
fn terms(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| w.chars().nth(1).is_some())
        .map(str::to_lowercase)
}

pub struct HashingEmbeddingProvider {
    dimensions: usize,
}

impl HashingEmbeddingProvider {
    pub fn new(dimensions: usize) -> Self {
        Self { dimensions }
    }

    fn vector(&self, text: &str) -> Vec<f32> {
        let body = text.strip_prefix(PASSAGE_PREFIX).unwrap_or(text);

        // Ordered map: slot sums are accumulated in a fixed order.
        let mut counts: BTreeMap<String, u32> = BTreeMap::new();
        for term in terms(body) {
            *counts.entry(term).or_insert(0) += 1;
        }

        let dims = self.dimensions as u64;
        let mut row = vec![0.0f32; self.dimensions];
        for (term, n) in &counts {
            let h = fnv1a(term.as_bytes());
            let sign = if h >> 63 == 0 { 1.0 } else { -1.0 };
            row[(h % dims) as usize] += sign * (1.0 + (*n as f32).ln());
        }
        l2_normalized(row)
    }
}

#[async_trait]
impl EmbeddingProvider for HashingEmbeddingProvider {
    async fn encode(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if self.dimensions == 0 {
            return Err(HotnessError::provider("hashing provider has zero dimensions"));
        }
        Ok(texts.iter().map(|t| self.vector(t)).collect())
    }

    fn name(&self) -> &str {
        "hashing"
    }
}
