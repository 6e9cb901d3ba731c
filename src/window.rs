// src/window.rs
//! UTC calendar-day windows.
//!
//! Only the day-boundary policy exists: a configured width other than 24h
//! still buckets by UTC date. Keys iterate in date order (`BTreeMap`) and
//! indices keep input order inside each window.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use crate::item::Item;

/// `YYYY-MM-DD` of the effective timestamp.
pub fn window_key(ts: &DateTime<Utc>) -> String {
    ts.format("%Y-%m-%d").to_string()
}

/// Group item indices by window key.
pub fn partition(items: &[Item]) -> BTreeMap<String, Vec<usize>> {
    let mut groups: BTreeMap<String, Vec<usize>> = BTreeMap::new();
    for (idx, it) in items.iter().enumerate() {
        groups.entry(window_key(&it.timestamp)).or_default().push(idx);
    }
    groups
}
