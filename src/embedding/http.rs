//! OpenAI-compatible embeddings endpoint (`POST {endpoint}` with `{model, input}`).
//!
//! Works against hosted APIs and local servers (text-embeddings-inference,
//! vLLM, Ollama's OpenAI shim). No retries here: a failed call fails the run.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{l2_normalized, EmbeddingProvider};
use crate::error::{HotnessError, Result};

pub struct HttpEmbeddingProvider {
    http: reqwest::Client,
    endpoint: String,
    model: String,
    api_key: Option<String>,
    batch_size: usize,
}

#[derive(Serialize)]
struct Req<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Deserialize)]
struct Resp {
    data: Vec<Datum>,
}

#[derive(Deserialize)]
struct Datum {
    #[serde(default)]
    index: Option<usize>,
    embedding: Vec<f32>,
}

impl HttpEmbeddingProvider {
    pub fn new(
        endpoint: impl Into<String>,
        model: impl Into<String>,
        api_key: Option<String>,
        batch_size: usize,
        timeout: Duration,
    ) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("news-hotness/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(Duration::from_secs(4))
            .timeout(timeout)
            .build()
            .map_err(|e| HotnessError::provider(format!("http client: {e}")))?;
        Ok(Self {
            http,
            endpoint: endpoint.into(),
            model: model.into(),
            api_key,
            batch_size: batch_size.max(1),
        })
    }

    async fn encode_chunk(&self, chunk: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut req = self.http.post(&self.endpoint).json(&Req {
            model: &self.model,
            input: chunk,
        });
        if let Some(key) = &self.api_key {
            req = req.bearer_auth(key);
        }

        let resp = req
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| HotnessError::provider(format!("request to {} failed: {e}", self.endpoint)))?;
        let body: Resp = resp
            .json()
            .await
            .map_err(|e| HotnessError::provider(format!("decoding embeddings response: {e}")))?;

        order_rows(body.data, chunk.len())
    }
}

/// Place rows by their `index` (position order when absent) and check the count.
fn order_rows(data: Vec<Datum>, expected: usize) -> Result<Vec<Vec<f32>>> {
    if data.len() != expected {
        return Err(HotnessError::provider(format!(
            "provider returned {} rows for {} inputs",
            data.len(),
            expected
        )));
    }
    let mut rows: Vec<Option<Vec<f32>>> = vec![None; expected];
    for (pos, d) in data.into_iter().enumerate() {
        let idx = d.index.unwrap_or(pos);
        match rows.get_mut(idx) {
            Some(slot) if slot.is_none() => *slot = Some(l2_normalized(d.embedding)),
            _ => {
                return Err(HotnessError::provider(format!(
                    "provider returned invalid or duplicate row index {idx}"
                )))
            }
        }
    }
    // Every slot is filled: `expected` distinct in-range indices were written.
    Ok(rows.into_iter().flatten().collect())
}

#[async_trait]
impl EmbeddingProvider for HttpEmbeddingProvider {
    async fn encode(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut out = Vec::with_capacity(texts.len());
        for chunk in texts.chunks(self.batch_size) {
            out.extend(self.encode_chunk(chunk).await?);
        }
        tracing::debug!(target: "embedding", rows = out.len(), model = %self.model, "http encode done");
        Ok(out)
    }

    fn name(&self) -> &str {
        "http"
    }
}
