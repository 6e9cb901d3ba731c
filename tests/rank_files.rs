// tests/rank_files.rs
//
// File-to-file flow used by the `rank` command: config from TOML, inputs from
// a directory of JSON batches, envelope written atomically.

use std::fs;
use std::sync::Arc;

use chrono::{TimeZone, Utc};

use news_hotness::embedding::HashingEmbeddingProvider;
use news_hotness::{input, HotnessConfig, HotnessEngine, RankedRun};

#[tokio::test]
async fn directory_of_batches_ranks_into_one_envelope() {
    let dir = tempfile::tempdir().unwrap();
    let inputs = dir.path().join("in");
    fs::create_dir_all(&inputs).unwrap();

    fs::write(
        inputs.join("reuters.json"),
        r#"{"meta": {"source_id": "reuters"}, "items": [
            {"title": "Central bank holds rates", "published_at": "2024-05-10T07:00:00Z",
             "category": "finance"},
            {"title": "Data breach at retailer", "published_at": "2024-05-10T10:00:00Z",
             "category": "hack"}
        ]}"#,
    )
    .unwrap();
    fs::write(
        inputs.join("ft.json"),
        r#"[{"source_id": "ft", "title": "Retailer hit by data breach",
             "content": "<p>Millions of records leaked.</p> Systems are down.",
             "published_at": "2024-05-10T10:30:00Z", "weight": 0.9}]"#,
    )
    .unwrap();

    let cfg_path = dir.path().join("hotness.toml");
    fs::write(
        &cfg_path,
        r#"
[embedding]
provider = "Hashing"
dimensions = 96

[hotness]
time_decay = 2.0

[hotness.weights]
time = 0.5
density = 0.3
domain = 0.2

[output]
limit = 2
"#,
    )
    .unwrap();

    let cfg = HotnessConfig::load_from_file(&cfg_path).unwrap();
    assert_eq!(cfg.embedding.provider, "hashing");
    assert_eq!(cfg.output.limit, Some(2));

    let limit = cfg.output.limit;
    let dims = cfg.embedding.dimensions;
    let engine = HotnessEngine::new(cfg, Arc::new(HashingEmbeddingProvider::new(dims))).unwrap();

    let raws = input::load_inputs(&[inputs.clone()]);
    assert_eq!(raws.len(), 3);

    let now = Utc.with_ymd_and_hms(2024, 5, 10, 12, 0, 0).unwrap();
    let run = engine.run(raws, now).await.unwrap().truncated(limit);
    assert_eq!(run.total_items, 3);
    assert_eq!(run.items.len(), 2);

    let out = dir.path().join("out").join("hotness.json");
    run.write_atomic(&out).unwrap();
    let back: RankedRun = serde_json::from_str(&fs::read_to_string(&out).unwrap()).unwrap();
    assert_eq!(back, run);
    assert!(back.items[0].hotness >= back.items[1].hotness);
}
