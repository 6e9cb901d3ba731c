// src/embedding/mod.rs
//! Embedding fusion: one unit vector per item from its title and lead content.
//!
//! The provider is an explicit handle passed in at construction; there is no
//! process-wide model.

pub mod hashing;
pub mod http;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use metrics::counter;
use ndarray::{Array2, Zip};

use crate::config::{EmbeddingConfig, HotnessConfig};
use crate::error::{HotnessError, Result};

pub use hashing::HashingEmbeddingProvider;
pub use http::HttpEmbeddingProvider;

/// Role marker expected by E5/BGE-style passage encoders.
pub const PASSAGE_PREFIX: &str = "passage: ";

/// Norm floor applied before division.
pub const NORM_EPS: f32 = 1e-12;

/// External capability: batch-encode strings to L2-normalized rows.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// One row per input, same order, deterministic for identical input.
    async fn encode(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Provider name for diagnostics.
    fn name(&self) -> &str;
}

pub type DynEmbeddingProvider = Arc<dyn EmbeddingProvider>;

/// Factory: build the configured provider.
pub fn build_provider(config: &HotnessConfig) -> Result<DynEmbeddingProvider> {
    let e: &EmbeddingConfig = &config.embedding;
    match e.provider.as_str() {
        "hashing" => Ok(Arc::new(HashingEmbeddingProvider::new(e.dimensions))),
        "http" => {
            let provider = HttpEmbeddingProvider::new(
                e.endpoint.clone(),
                e.model_id.clone(),
                config.resolved_api_key()?,
                e.batch_size,
                Duration::from_secs(e.timeout_secs),
            )?;
            Ok(Arc::new(provider))
        }
        other => Err(HotnessError::config(format!(
            "unsupported embedding provider: {other}"
        ))),
    }
}

/// Weighted title/content fusion over a provider handle.
#[derive(Clone)]
pub struct EmbeddingFuser {
    provider: DynEmbeddingProvider,
    title_weight: f32,
    content_weight: f32,
}

impl EmbeddingFuser {
    pub fn new(provider: DynEmbeddingProvider, title_weight: f32, content_weight: f32) -> Self {
        Self {
            provider,
            title_weight,
            content_weight,
        }
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    /// Fuse normalized titles and contents into an `[n, d]` matrix of unit rows.
    ///
    /// Items with neither title nor content come out as zero rows.
    pub async fn fuse(&self, titles: &[String], contents: &[String]) -> Result<Array2<f32>> {
        let n = titles.len();
        if contents.len() != n {
            return Err(HotnessError::provider(format!(
                "{} titles but {} contents",
                n,
                contents.len()
            )));
        }
        if n == 0 {
            return Ok(Array2::zeros((0, 0)));
        }

        let e_title = self.encode_role(titles).await?;
        let e_content = self.encode_role(contents).await?;
        if e_title.dim() != e_content.dim() {
            return Err(HotnessError::provider(format!(
                "title rows are {:?} but content rows are {:?}",
                e_title.dim(),
                e_content.dim()
            )));
        }

        let mut fused = Array2::<f32>::zeros(e_title.dim());
        for i in 0..n {
            let w_t = if titles[i].is_empty() { 0.0 } else { self.title_weight };
            let w_c = if contents[i].is_empty() { 0.0 } else { self.content_weight };
            let w_sum = if w_t + w_c == 0.0 { 1.0 } else { w_t + w_c };

            Zip::from(fused.row_mut(i))
                .and(e_title.row(i))
                .and(e_content.row(i))
                .for_each(|f, &t, &c| *f = (w_t * t + w_c * c) / w_sum);
        }

        normalize_rows(&mut fused);
        tracing::debug!(
            target: "embedding",
            rows = n,
            dim = fused.ncols(),
            provider = self.provider.name(),
            "fused embeddings"
        );
        Ok(fused)
    }

    /// One provider call per role; empty strings stay empty to keep the batch aligned.
    async fn encode_role(&self, texts: &[String]) -> Result<Array2<f32>> {
        let prefixed: Vec<String> = texts
            .iter()
            .map(|t| {
                if t.is_empty() {
                    String::new()
                } else {
                    format!("{PASSAGE_PREFIX}{t}")
                }
            })
            .collect();

        let rows = match self.provider.encode(&prefixed).await {
            Ok(rows) => rows,
            Err(e) => {
                counter!(crate::metrics::PROVIDER_ERRORS_TOTAL).increment(1);
                return Err(e);
            }
        };
        let mut m = to_matrix(rows, texts.len())?;
        normalize_rows(&mut m);
        Ok(m)
    }
}

/// Stack provider rows into a matrix, rejecting count or width mismatches.
pub fn to_matrix(rows: Vec<Vec<f32>>, expected: usize) -> Result<Array2<f32>> {
    if rows.len() != expected {
        return Err(HotnessError::provider(format!(
            "provider returned {} rows for {} inputs",
            rows.len(),
            expected
        )));
    }
    let d = rows.first().map(Vec::len).unwrap_or(0);
    if let Some(bad) = rows.iter().position(|r| r.len() != d) {
        return Err(HotnessError::provider(format!(
            "ragged provider output: row {bad} has {} values, expected {d}",
            rows[bad].len()
        )));
    }
    if rows.iter().flatten().any(|x| !x.is_finite()) {
        return Err(HotnessError::provider("provider returned non-finite values"));
    }
    let flat: Vec<f32> = rows.into_iter().flatten().collect();
    Array2::from_shape_vec((expected, d), flat)
        .map_err(|e| HotnessError::provider(format!("shape error: {e}")))
}

/// L2-normalize every row in place; zero rows stay zero.
pub fn normalize_rows(m: &mut Array2<f32>) {
    for mut row in m.rows_mut() {
        let norm = row.dot(&row).sqrt().max(NORM_EPS);
        row.mapv_inplace(|x| x / norm);
    }
}

/// L2-normalize one vector; zero vectors stay zero.
pub fn l2_normalized(mut v: Vec<f32>) -> Vec<f32> {
    let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt().max(NORM_EPS);
    for x in &mut v {
        *x /= norm;
    }
    v
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    /// Fixed lookup provider: known strings map to given vectors, others to zeros.
    struct TableProvider {
        table: HashMap<String, Vec<f32>>,
        dim: usize,
    }

    #[async_trait]
    impl EmbeddingProvider for TableProvider {
        async fn encode(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            Ok(texts
                .iter()
                .map(|t| self.table.get(t).cloned().unwrap_or_else(|| vec![0.0; self.dim]))
                .collect())
        }
        fn name(&self) -> &str {
            "table"
        }
    }

    struct FailingProvider;

    #[async_trait]
    impl EmbeddingProvider for FailingProvider {
        async fn encode(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>> {
            Err(HotnessError::provider("boom"))
        }
        fn name(&self) -> &str {
            "failing"
        }
    }

    struct ShortProvider;

    #[async_trait]
    impl EmbeddingProvider for ShortProvider {
        async fn encode(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            Ok(vec![vec![1.0, 0.0]; texts.len().saturating_sub(1)])
        }
        fn name(&self) -> &str {
            "short"
        }
    }

    fn table_fuser() -> EmbeddingFuser {
        let mut table = HashMap::new();
        table.insert("passage: rates up".to_string(), vec![1.0, 0.0, 0.0]);
        table.insert("passage: bonds slide".to_string(), vec![0.0, 1.0, 0.0]);
        EmbeddingFuser::new(Arc::new(TableProvider { table, dim: 3 }), 0.7, 0.3)
    }

    #[tokio::test]
    async fn title_only_item_equals_title_embedding() {
        let f = table_fuser();
        let m = f
            .fuse(&["rates up".to_string()], &[String::new()])
            .await
            .unwrap();
        let row = m.row(0);
        assert!((row[0] - 1.0).abs() < 1e-6);
        assert!(row[1].abs() < 1e-6 && row[2].abs() < 1e-6);
    }

    #[tokio::test]
    async fn weighted_blend_is_renormalized() {
        let f = table_fuser();
        let m = f
            .fuse(&["rates up".to_string()], &["bonds slide".to_string()])
            .await
            .unwrap();
        let row = m.row(0);
        let norm = row.dot(&row).sqrt();
        assert!((norm - 1.0).abs() < 1e-6);
        // 0.7 : 0.3 direction survives normalization.
        assert!((row[0] / row[1] - 0.7 / 0.3).abs() < 1e-4);
    }

    #[tokio::test]
    async fn empty_item_is_zero_vector() {
        let f = table_fuser();
        let m = f.fuse(&[String::new()], &[String::new()]).await.unwrap();
        assert!(m.row(0).iter().all(|x| *x == 0.0));
        assert!(m.iter().all(|x| x.is_finite()));
    }

    #[tokio::test]
    async fn empty_batch_skips_the_provider() {
        let f = EmbeddingFuser::new(Arc::new(FailingProvider), 0.7, 0.3);
        let m = f.fuse(&[], &[]).await.unwrap();
        assert_eq!(m.nrows(), 0);
    }

    #[tokio::test]
    async fn provider_failure_propagates() {
        let f = EmbeddingFuser::new(Arc::new(FailingProvider), 0.7, 0.3);
        let err = f.fuse(&["a".to_string()], &["b".to_string()]).await.unwrap_err();
        assert!(matches!(err, HotnessError::EmbeddingProvider(_)));
    }

    #[tokio::test]
    async fn shape_mismatch_is_provider_error() {
        let f = EmbeddingFuser::new(Arc::new(ShortProvider), 0.7, 0.3);
        let err = f
            .fuse(&["a".to_string(), "b".to_string()], &["c".to_string(), "d".to_string()])
            .await
            .unwrap_err();
        assert!(matches!(err, HotnessError::EmbeddingProvider(_)));
    }

    #[test]
    fn ragged_rows_are_rejected() {
        assert!(to_matrix(vec![vec![1.0, 0.0], vec![1.0]], 2).is_err());
        assert!(to_matrix(vec![vec![f32::NAN]], 1).is_err());
    }

    #[test]
    fn build_provider_rejects_unknown_name() {
        let mut cfg = HotnessConfig::default();
        cfg.embedding.provider = "magic".into();
        assert!(matches!(build_provider(&cfg), Err(HotnessError::Configuration(_))));
        cfg.embedding.provider = "hashing".into();
        assert_eq!(build_provider(&cfg).unwrap().name(), "hashing");
    }
}
