// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod api;
pub mod config;
pub mod density;
pub mod domain;
pub mod embedding;
pub mod error;
pub mod hotness;
pub mod input;
pub mod item;
pub mod metrics;
pub mod output;
pub mod pipeline;
pub mod text;
pub mod window;

// ---- Re-exports for stable public API ----
pub use crate::api::router;
pub use crate::config::HotnessConfig;
pub use crate::embedding::{build_provider, DynEmbeddingProvider, EmbeddingProvider};
pub use crate::error::{HotnessError, Result};
pub use crate::item::RawItem;
pub use crate::output::{OutputRecord, RankedRun};
pub use crate::pipeline::HotnessEngine;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Install the global tracing subscriber.
///
/// `RUST_LOG` wins over the built-in filter; `LOG_FORMAT=json` switches to
/// one JSON object per line. Safe to call twice (the second call is a no-op).
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("news_hotness=info,warn"));

    let json = std::env::var("LOG_FORMAT")
        .ok()
        .is_some_and(|v| v.eq_ignore_ascii_case("json"));

    let registry = tracing_subscriber::registry().with(filter);
    let _ = if json {
        registry.with(fmt::layer().json()).try_init()
    } else {
        registry.with(fmt::layer().compact()).try_init()
    };
}
