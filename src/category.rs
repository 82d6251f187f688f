//! Category aggregation: raw attribute values → per-axis buckets.
//!
//! Every value is normalized to a string key, counted per axis, and keys whose
//! count falls below `max(1, floor(ratio × total))` are folded into [`OTHERS`].

use crate::data::{Dataset, Value};
use crate::ir::{Aggregation, AxisCategories, Category, OTHERS};
use std::collections::HashMap;
use tracing::debug;

/// Canonical category key of a raw value. Missing, null and empty values become `"NA"`.
pub fn normalize(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => "NA".to_string(),
        Some(Value::Text(s)) if s.is_empty() => "NA".to_string(),
        Some(v) => v.to_string(),
    }
}

/// Smallest count a category needs to stay standalone.
pub fn merge_threshold(min_ratio: f64, total: usize) -> usize {
    let scaled = (min_ratio * total as f64).floor();
    // NaN and negative ratios saturate to 0 in the cast
    (scaled as usize).max(1)
}

/// Bucket every record on every axis.
pub fn aggregate(dataset: &Dataset, axes: &[String], min_ratio: f64) -> Aggregation {
    let total = dataset.len();
    let threshold = merge_threshold(min_ratio, total);

    let axes = axes
        .iter()
        .map(|axis| aggregate_axis(dataset, axis, threshold))
        .collect();

    Aggregation {
        total,
        threshold,
        axes,
    }
}

fn aggregate_axis(dataset: &Dataset, axis: &str, threshold: usize) -> AxisCategories {
    // Raw counts, first-seen order
    let mut raw: Vec<Category> = Vec::new();
    let mut slots: HashMap<String, usize> = HashMap::new();
    for record in &dataset.records {
        let key = normalize(record.get(axis));
        let slot = *slots.entry(key.clone()).or_insert_with(|| {
            raw.push(Category::new(key));
            raw.len() - 1
        });
        raw[slot].count += 1;
        raw[slot].items.push(record.index);
    }

    let mut mapping = HashMap::with_capacity(raw.len());
    let mut merged: Vec<Category> = Vec::new();
    let mut merged_slots: HashMap<String, usize> = HashMap::new();
    for category in raw {
        let target = if category.count < threshold {
            OTHERS.to_string()
        } else {
            category.key.clone()
        };
        mapping.insert(category.key.clone(), target.clone());

        let slot = *merged_slots.entry(target.clone()).or_insert_with(|| {
            merged.push(Category::new(target));
            merged.len() - 1
        });
        merged[slot].count += category.count;
        merged[slot].items.extend(category.items);
    }

    debug!(
        axis,
        categories = merged.len(),
        raw_values = mapping.len(),
        threshold,
        "aggregated axis"
    );

    AxisCategories {
        axis: axis.to_string(),
        categories: merged,
        mapping,
    }
}
