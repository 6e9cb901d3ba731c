//! # Domain Weights
//!
//! Maps an item's category (as tagged by the upstream summarizer) or its
//! source to a domain coefficient in `[0.0, 1.0]`.
//!
//! - Loads from the `[domain]` section of the run config (weights + aliases).
//! - Case-insensitive lookup with normalization of punctuation, dashes, etc.
//! - Fallback order: explicit per-item weight → category → source → default.
//! - `default_seed()` carries the summarizer's five news categories.
//!
//! The scoring core treats the resolved value as opaque.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Category/source weight table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DomainWeights {
    /// Weight used when nothing matches.
    #[serde(default)]
    pub default_weight: f64,
    /// Explicit weights for canonical category or source names.
    #[serde(default)]
    pub weights: HashMap<String, f64>,
    /// Aliases mapping non-canonical names → canonical names.
    #[serde(default)]
    pub aliases: HashMap<String, String>,
}

impl Default for DomainWeights {
    fn default() -> Self {
        Self::default_seed()
    }
}

impl DomainWeights {
    /// No table at all: every item without an explicit weight gets 0.
    pub fn empty() -> Self {
        Self {
            default_weight: 0.0,
            weights: HashMap::new(),
            aliases: HashMap::new(),
        }
    }

    /// Resolve the domain coefficient for one item.
    pub fn resolve(&self, explicit: Option<f64>, category: Option<&str>, source_id: &str) -> f64 {
        if let Some(w) = explicit.filter(|w| w.is_finite()) {
            return clamp01(w);
        }
        if let Some(w) = category.and_then(|c| self.lookup(c)) {
            return w;
        }
        if let Some(w) = self.lookup(source_id) {
            return w;
        }
        clamp01(self.default_weight)
    }

    /// Weight for a name, or the default when nothing matches.
    pub fn weight_for(&self, name: &str) -> f64 {
        self.lookup(name).unwrap_or_else(|| clamp01(self.default_weight))
    }

    /// Steps:
    /// 1. Alias lookup (normalized) → canonical → weight.
    /// 2. Exact weight match.
    /// 3. Substring fallback (e.g. "major releases and partnerships" → "major releases").
    fn lookup(&self, name: &str) -> Option<f64> {
        let s = normalize(name);
        if s.is_empty() {
            return None;
        }

        if let Some(canon) = self.aliases.get(&s) {
            if let Some(&w) = self.weights.get(&normalize(canon)) {
                return Some(clamp01(w));
            }
        }

        if let Some(&w) = self.weights.get(&s) {
            return Some(clamp01(w));
        }

        // Longest key first so overlapping keys resolve deterministically.
        let mut keys: Vec<(&String, &f64)> = self.weights.iter().collect();
        keys.sort_by(|a, b| b.0.len().cmp(&a.0.len()).then_with(|| a.0.cmp(b.0)));
        keys.into_iter()
            .find(|(k, _)| !k.is_empty() && s.contains(k.as_str()))
            .map(|(_, &w)| clamp01(w))
    }

    /// Keys are stored normalized so config files may use any casing.
    pub fn normalized(self) -> Self {
        Self {
            default_weight: self.default_weight,
            weights: self
                .weights
                .into_iter()
                .map(|(k, v)| (normalize(&k), v))
                .collect(),
            aliases: self
                .aliases
                .into_iter()
                .map(|(k, v)| (normalize(&k), normalize(&v)))
                .collect(),
        }
    }

    /// The five categories the summarizer assigns, with their weights.
    pub fn default_seed() -> Self {
        let mut weights = HashMap::new();
        let mut aliases = HashMap::new();

        for (k, v) in [
            ("regulation sanctions legal risk", 1.0),
            ("hacks incidents outages", 0.9),
            ("tech breakthroughs sota", 0.8),
            ("major releases partnerships finance", 0.7),
            ("marketing noise", 0.2),
        ] {
            weights.insert(k.to_string(), v);
        }

        for (a, c) in [
            ("regulation", "regulation sanctions legal risk"),
            ("sanctions", "regulation sanctions legal risk"),
            ("legal", "regulation sanctions legal risk"),
            ("hack", "hacks incidents outages"),
            ("incident", "hacks incidents outages"),
            ("outage", "hacks incidents outages"),
            ("sota", "tech breakthroughs sota"),
            ("breakthrough", "tech breakthroughs sota"),
            ("release", "major releases partnerships finance"),
            ("partnership", "major releases partnerships finance"),
            ("m&a", "major releases partnerships finance"),
            ("marketing", "marketing noise"),
            ("noise", "marketing noise"),
            // Labels as the summarizer emits them.
            ("регуляторика/санкции/правовые риски", "regulation sanctions legal risk"),
            ("взломы/инциденты/остановки", "hacks incidents outages"),
            ("существенные тех. прорывы/SOTA", "tech breakthroughs sota"),
            ("крупные релизы/партнёрства/финансы", "major releases partnerships finance"),
            ("маркетинг/«шум»", "marketing noise"),
        ] {
            aliases.insert(normalize(a), c.to_string());
        }

        Self {
            default_weight: 0.0,
            weights,
            aliases,
        }
    }
}

/// Lowercase, replace punctuation/dashes with spaces, collapse spaces.
fn normalize(s: &str) -> String {
    let mut out = s.trim().to_lowercase();

    for ch in ['—', '–', '-', '_', '/', '\\', '«', '»'] {
        out = out.replace(ch, " ");
    }

    out = out.replace(['\n', '\r', '\t', '.', ',', '’', '\''], " ");

    out.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn clamp01(x: f64) -> f64 {
    x.clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg() -> DomainWeights {
        DomainWeights::default_seed()
    }

    #[test]
    fn exact_match() {
        assert!((cfg().weight_for("Hacks/Incidents/Outages") - 0.9).abs() < 1e-12);
    }

    #[test]
    fn alias_match() {
        let c = cfg();
        assert!((c.weight_for("Sanctions") - 1.0).abs() < 1e-12);
        assert!((c.weight_for("M&A") - 0.7).abs() < 1e-12);
    }

    #[test]
    fn summarizer_labels_resolve() {
        let c = cfg();
        assert_eq!(c.resolve(None, Some("взломы/инциденты/остановки"), "x"), 0.9);
        assert_eq!(c.resolve(None, Some("Существенные тех. прорывы/SOTA"), "x"), 0.8);
        assert_eq!(c.resolve(None, Some("маркетинг/«шум»"), "x"), 0.2);
        assert_eq!(c.resolve(None, Some("регуляторика/санкции/правовые риски"), "x"), 1.0);
        assert_eq!(c.resolve(None, Some("крупные релизы/партнёрства/финансы"), "x"), 0.7);
    }

    #[test]
    fn substring_match() {
        assert!((cfg().weight_for("Marketing / noise (promo)") - 0.2).abs() < 1e-12);
    }

    #[test]
    fn default_weight_used() {
        let c = cfg();
        assert_eq!(c.weight_for("TotallyUnknown"), c.default_weight);
    }

    #[test]
    fn explicit_weight_wins_and_is_clamped() {
        let c = cfg();
        assert_eq!(c.resolve(Some(0.33), Some("marketing"), "src"), 0.33);
        assert_eq!(c.resolve(Some(4.0), None, "src"), 1.0);
        assert_eq!(c.resolve(Some(f64::NAN), Some("marketing"), "src"), 0.2);
    }

    #[test]
    fn source_lookup_after_category() {
        let mut c = DomainWeights::empty();
        c.weights.insert("reuters".into(), 0.8);
        assert_eq!(c.resolve(None, Some("unknown"), "Reuters"), 0.8);
        assert_eq!(c.resolve(None, None, "blog"), 0.0);
    }

    #[test]
    fn normalized_keys_from_config() {
        let mut c = DomainWeights::empty();
        c.weights.insert("Tech-News".into(), 0.5);
        let c = c.normalized();
        assert_eq!(c.weight_for("tech news"), 0.5);
    }
}
