// src/config.rs
//! Run configuration: embedding, window, hotness weights, domain table, output.
//!
//! Loading order:
//! 1) $HOTNESS_CONFIG_PATH (must exist when set)
//! 2) config/hotness.toml
//! 3) config/hotness.json
//! 4) built-in defaults
//!
//! `HOTNESS_TIME_DECAY` and `HOTNESS_WINDOW_HOURS` override the file values.

use anyhow::{anyhow, Context};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::domain::DomainWeights;
use crate::error::{HotnessError, Result};

pub const ENV_CONFIG_PATH: &str = "HOTNESS_CONFIG_PATH";
pub const ENV_TIME_DECAY: &str = "HOTNESS_TIME_DECAY";
pub const ENV_WINDOW_HOURS: &str = "HOTNESS_WINDOW_HOURS";
pub const ENV_EMBEDDING_API_KEY: &str = "EMBEDDING_API_KEY";

/// Windows are calendar days; a decay span beyond a year has no meaning.
pub const MAX_WINDOW_HOURS: i64 = 24 * 366;

pub const DEFAULT_CONFIG_TOML: &str = "config/hotness.toml";
pub const DEFAULT_CONFIG_JSON: &str = "config/hotness.json";

fn default_provider() -> String {
    "hashing".to_string()
}
fn default_model_id() -> String {
    "BAAI/bge-m3".to_string()
}
fn default_endpoint() -> String {
    "http://127.0.0.1:8080/v1/embeddings".to_string()
}
fn default_title_weight() -> f32 {
    0.7
}
fn default_content_weight() -> f32 {
    0.3
}
fn default_content_chars() -> usize {
    300
}
fn default_batch_size() -> usize {
    64
}
fn default_dimensions() -> usize {
    384
}
fn default_timeout_secs() -> u64 {
    30
}
fn default_window_hours() -> i64 {
    24
}
fn default_time_decay() -> f64 {
    3.0
}
fn default_output_path() -> PathBuf {
    PathBuf::from("out/hotness.json")
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EmbeddingConfig {
    /// "http" | "hashing" (case-insensitive)
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default = "default_model_id")]
    pub model_id: String,
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// "ENV" means: read from EMBEDDING_API_KEY.
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_title_weight")]
    pub title_weight: f32,
    #[serde(default = "default_content_weight")]
    pub content_weight: f32,
    /// Characters of lead content fed to the encoder.
    #[serde(default = "default_content_chars")]
    pub content_chars: usize,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    /// Vector size of the hashing provider.
    #[serde(default = "default_dimensions")]
    pub dimensions: usize,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model_id: default_model_id(),
            endpoint: default_endpoint(),
            api_key: None,
            title_weight: default_title_weight(),
            content_weight: default_content_weight(),
            content_chars: default_content_chars(),
            batch_size: default_batch_size(),
            dimensions: default_dimensions(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct WindowConfig {
    /// Partitioning is by UTC day regardless; this also sets the decay window.
    #[serde(default = "default_window_hours")]
    pub hours: i64,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            hours: default_window_hours(),
        }
    }
}

/// Linear blend weights for the final score.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct HotnessWeights {
    pub time: f64,
    pub density: f64,
    pub domain: f64,
}

impl Default for HotnessWeights {
    fn default() -> Self {
        Self {
            time: 0.4,
            density: 0.4,
            domain: 0.2,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct HotnessSection {
    #[serde(default = "default_time_decay")]
    pub time_decay: f64,
    #[serde(default)]
    pub weights: HotnessWeights,
}

impl Default for HotnessSection {
    fn default() -> Self {
        Self {
            time_decay: default_time_decay(),
            weights: HotnessWeights::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OutputConfig {
    #[serde(default = "default_output_path")]
    pub path: PathBuf,
    /// Trim the ranked list to the first N entries.
    #[serde(default)]
    pub limit: Option<usize>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: default_output_path(),
            limit: None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct HotnessConfig {
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub window: WindowConfig,
    #[serde(default)]
    pub hotness: HotnessSection,
    #[serde(default)]
    pub domain: DomainWeights,
    #[serde(default)]
    pub output: OutputConfig,
}

impl HotnessConfig {
    /// Load from an explicit path. TOML or JSON, picked by extension.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading hotness config from {}", path.display()))?;
        let ext = path
            .extension()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();
        let cfg = parse_config(&content, &ext)
            .with_context(|| format!("parsing hotness config {}", path.display()))?;
        Ok(cfg.finish())
    }

    /// Env path, then config/ fallbacks, then defaults. Env overrides applied last.
    pub fn load_default() -> anyhow::Result<Self> {
        let mut cfg = if let Ok(p) = std::env::var(ENV_CONFIG_PATH) {
            let pb = PathBuf::from(p);
            if !pb.exists() {
                return Err(anyhow!("{ENV_CONFIG_PATH} points to non-existent path"));
            }
            Self::load_from_file(&pb)?
        } else if Path::new(DEFAULT_CONFIG_TOML).exists() {
            Self::load_from_file(DEFAULT_CONFIG_TOML)?
        } else if Path::new(DEFAULT_CONFIG_JSON).exists() {
            Self::load_from_file(DEFAULT_CONFIG_JSON)?
        } else {
            Self::default().finish()
        };
        cfg.apply_env_overrides();
        Ok(cfg)
    }

    fn finish(mut self) -> Self {
        self.embedding.provider = self.embedding.provider.trim().to_ascii_lowercase();
        self.domain = self.domain.normalized();
        self
    }

    /// Numeric env overrides; unparseable values are ignored.
    pub fn apply_env_overrides(&mut self) {
        if let Some(v) = parse_env::<f64>(ENV_TIME_DECAY) {
            self.hotness.time_decay = v;
        }
        if let Some(v) = parse_env::<i64>(ENV_WINDOW_HOURS) {
            self.window.hours = v;
        }
    }

    /// Resolve `api_key = "ENV"` against the environment.
    pub fn resolved_api_key(&self) -> Result<Option<String>> {
        match self.embedding.api_key.as_deref().map(str::trim) {
            Some(k) if k.eq_ignore_ascii_case("env") => std::env::var(ENV_EMBEDDING_API_KEY)
                .map(Some)
                .map_err(|_| HotnessError::config(format!("missing {ENV_EMBEDDING_API_KEY} env var"))),
            Some("") | None => Ok(None),
            Some(k) => Ok(Some(k.to_string())),
        }
    }

    /// Decay window as a chrono duration.
    pub fn window_duration(&self) -> Result<chrono::Duration> {
        chrono::TimeDelta::try_hours(self.window.hours).ok_or_else(|| {
            HotnessError::config(format!("window.hours out of range: {}", self.window.hours))
        })
    }

    /// Fail fast before any scoring work.
    pub fn validate(&self) -> Result<()> {
        if self.window.hours <= 0 || self.window.hours > MAX_WINDOW_HOURS {
            return Err(HotnessError::config(format!(
                "window.hours must be in 1..={MAX_WINDOW_HOURS}, got {}",
                self.window.hours
            )));
        }

        let decay = self.hotness.time_decay;
        if !decay.is_finite() || decay <= 0.0 {
            return Err(HotnessError::config(format!(
                "hotness.time_decay must be > 0, got {decay}"
            )));
        }

        let w = self.hotness.weights;
        for (name, v) in [("time", w.time), ("density", w.density), ("domain", w.domain)] {
            if !v.is_finite() || v < 0.0 {
                return Err(HotnessError::config(format!(
                    "hotness.weights.{name} must be a non-negative number, got {v}"
                )));
            }
        }
        if w.time + w.density + w.domain <= 0.0 {
            return Err(HotnessError::config("hotness.weights are all zero"));
        }

        let e = &self.embedding;
        for (name, v) in [("title_weight", e.title_weight), ("content_weight", e.content_weight)] {
            if !v.is_finite() || v < 0.0 {
                return Err(HotnessError::config(format!(
                    "embedding.{name} must be a non-negative number, got {v}"
                )));
            }
        }
        if e.batch_size == 0 {
            return Err(HotnessError::config("embedding.batch_size must be positive"));
        }
        if e.content_chars == 0 {
            return Err(HotnessError::config("embedding.content_chars must be positive"));
        }
        if !matches!(e.provider.as_str(), "http" | "hashing") {
            return Err(HotnessError::config(format!(
                "unsupported embedding provider: {}",
                e.provider
            )));
        }
        if e.provider == "hashing" && e.dimensions == 0 {
            return Err(HotnessError::config("embedding.dimensions must be positive"));
        }
        Ok(())
    }
}

fn parse_config(s: &str, hint_ext: &str) -> anyhow::Result<HotnessConfig> {
    if hint_ext == "json" {
        return Ok(serde_json::from_str(s)?);
    }
    match toml::from_str(s) {
        Ok(cfg) => Ok(cfg),
        // Extension-less files may still be JSON.
        Err(toml_err) => serde_json::from_str(s).map_err(|_| anyhow!(toml_err)),
    }
}

fn parse_env<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|s| s.trim().parse::<T>().ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    #[test]
    fn defaults_are_valid() {
        let cfg = HotnessConfig::default();
        cfg.validate().unwrap();
        assert_eq!(cfg.embedding.title_weight, 0.7);
        assert_eq!(cfg.embedding.content_chars, 300);
        assert_eq!(cfg.window.hours, 24);
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let s = r#"
            [hotness]
            time_decay = 2.5

            [hotness.weights]
            time = 1.0
            density = 0.0
            domain = 0.0
        "#;
        let cfg = parse_config(s, "toml").unwrap();
        assert_eq!(cfg.hotness.time_decay, 2.5);
        assert_eq!(cfg.hotness.weights.time, 1.0);
        assert_eq!(cfg.embedding.batch_size, 64);
        cfg.validate().unwrap();
    }

    #[test]
    fn json_config_parses() {
        let s = r#"{"window": {"hours": 12}, "embedding": {"provider": "HTTP"}}"#;
        let cfg = parse_config(s, "json").unwrap().finish();
        assert_eq!(cfg.window.hours, 12);
        assert_eq!(cfg.embedding.provider, "http");
    }

    #[test]
    fn rejects_bad_values() {
        let mut cfg = HotnessConfig::default();
        cfg.window.hours = 0;
        assert!(matches!(cfg.validate(), Err(HotnessError::Configuration(_))));

        let mut cfg = HotnessConfig::default();
        cfg.window.hours = 10_000_000_000;
        assert!(matches!(cfg.validate(), Err(HotnessError::Configuration(_))));
        cfg.window.hours = i64::MAX;
        assert!(cfg.validate().is_err());
        assert!(cfg.window_duration().is_err());

        let mut cfg = HotnessConfig::default();
        cfg.window.hours = MAX_WINDOW_HOURS;
        cfg.validate().unwrap();

        let mut cfg = HotnessConfig::default();
        cfg.hotness.weights.density = -0.1;
        assert!(matches!(cfg.validate(), Err(HotnessError::Configuration(_))));

        let mut cfg = HotnessConfig::default();
        cfg.hotness.weights = HotnessWeights {
            time: 0.0,
            density: 0.0,
            domain: 0.0,
        };
        assert!(cfg.validate().is_err());

        let mut cfg = HotnessConfig::default();
        cfg.hotness.time_decay = 0.0;
        assert!(cfg.validate().is_err());

        let mut cfg = HotnessConfig::default();
        cfg.embedding.provider = "word2vec".into();
        assert!(cfg.validate().is_err());
    }

    #[serial_test::serial]
    #[test]
    fn env_overrides_apply() {
        env::set_var(ENV_TIME_DECAY, "1.5");
        env::set_var(ENV_WINDOW_HOURS, "not-a-number");
        let mut cfg = HotnessConfig::default();
        cfg.apply_env_overrides();
        assert_eq!(cfg.hotness.time_decay, 1.5);
        assert_eq!(cfg.window.hours, 24);
        env::remove_var(ENV_TIME_DECAY);
        env::remove_var(ENV_WINDOW_HOURS);
    }

    #[serial_test::serial]
    #[test]
    fn env_path_must_exist() {
        env::set_var(ENV_CONFIG_PATH, "/definitely/not/here.toml");
        assert!(HotnessConfig::load_default().is_err());
        env::remove_var(ENV_CONFIG_PATH);
    }

    #[serial_test::serial]
    #[test]
    fn api_key_env_resolution() {
        let mut cfg = HotnessConfig::default();
        cfg.embedding.api_key = Some("ENV".into());
        env::remove_var(ENV_EMBEDDING_API_KEY);
        assert!(cfg.resolved_api_key().is_err());
        env::set_var(ENV_EMBEDDING_API_KEY, "secret");
        assert_eq!(cfg.resolved_api_key().unwrap().as_deref(), Some("secret"));
        env::remove_var(ENV_EMBEDDING_API_KEY);
    }
}
