use crate::category::normalize;
use crate::data::Dataset;
use crate::ir::{Aggregation, Path, PATH_SEPARATOR};
use std::cmp::Ordering;
use std::collections::HashMap;
use tracing::debug;

/// Build every distinct cross-axis tuple of (merged) category keys.
///
/// The result is sorted axis by axis with [`compare_keys`], larger paths first on
/// ties, so repeated calls over the same input return the same sequence.
/// Geometry (`height`, `segments`) is left for the layout pass.
pub fn index_paths(dataset: &Dataset, aggregation: &Aggregation) -> Vec<Path> {
    if aggregation.axes.is_empty() {
        return Vec::new();
    }

    let mut paths: Vec<Path> = Vec::new();
    let mut slots: HashMap<String, usize> = HashMap::new();

    for record in &dataset.records {
        let values: Vec<String> = aggregation
            .axes
            .iter()
            .map(|axis| {
                let raw = normalize(record.get(&axis.axis));
                axis.mapped(&raw).to_string()
            })
            .collect();
        let key = path_key(&values);

        let slot = match slots.get(&key) {
            Some(&slot) => slot,
            None => {
                paths.push(Path {
                    key: key.clone(),
                    values,
                    count: 0,
                    items: Vec::new(),
                    height: 0.0,
                    segments: Vec::new(),
                });
                slots.insert(key, paths.len() - 1);
                paths.len() - 1
            }
        };
        paths[slot].count += 1;
        paths[slot].items.push(record.index);
    }

    paths.sort_by(compare_paths);
    debug!(paths = paths.len(), records = dataset.len(), "indexed paths");
    paths
}

pub fn path_key(values: &[String]) -> String {
    let mut sep = [0u8; 4];
    values.join(PATH_SEPARATOR.encode_utf8(&mut sep))
}

fn compare_paths(a: &Path, b: &Path) -> Ordering {
    a.values
        .iter()
        .zip(&b.values)
        .map(|(x, y)| compare_keys(x, y))
        .find(|o| o.is_ne())
        .unwrap_or(Ordering::Equal)
        .then_with(|| b.count.cmp(&a.count))
}

/// Locale-independent key ordering: case-insensitive first, raw bytes to break ties.
pub fn compare_keys(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::category::aggregate;
    use crate::data::Value;

    fn housing() -> Dataset {
        let rows = [
            ("furnished", 2.0),
            ("furnished", 0.0),
            ("semi-furnished", 0.0),
            ("furnished", 2.0),
            ("unfurnished", 1.0),
            ("semi-furnished", 0.0),
        ];
        Dataset::new(
            vec!["furnishingstatus".to_string(), "parking".to_string()],
            rows.iter()
                .map(|(f, p)| vec![Value::Text(f.to_string()), Value::Number(*p)])
                .collect(),
        )
    }

    fn axes() -> Vec<String> {
        vec!["furnishingstatus".to_string(), "parking".to_string()]
    }

    #[test]
    fn test_distinct_paths_and_counts() {
        let ds = housing();
        let agg = aggregate(&ds, &axes(), 0.01);
        let paths = index_paths(&ds, &agg);

        let summary: Vec<(Vec<String>, usize)> =
            paths.iter().map(|p| (p.values.clone(), p.count)).collect();
        assert_eq!(
            summary,
            vec![
                (vec!["furnished".to_string(), "0".to_string()], 1),
                (vec!["furnished".to_string(), "2".to_string()], 2),
                (vec!["semi-furnished".to_string(), "0".to_string()], 2),
                (vec!["unfurnished".to_string(), "1".to_string()], 1),
            ]
        );
        assert_eq!(paths[1].items, vec![0, 3]);
    }

    #[test]
    fn test_partition() {
        let ds = housing();
        let agg = aggregate(&ds, &axes(), 0.01);
        let paths = index_paths(&ds, &agg);
        assert_eq!(paths.iter().map(|p| p.count).sum::<usize>(), ds.len());

        let mut items: Vec<usize> = paths.iter().flat_map(|p| p.items.clone()).collect();
        items.sort();
        assert_eq!(items, (0..ds.len()).collect::<Vec<_>>());
    }

    #[test]
    fn test_paths_use_merged_keys() {
        // threshold = floor(0.5 * 6) = 3: only "furnished" (3 rows) survives
        let ds = housing();
        let agg = aggregate(&ds, &axes()[..1], 0.5);
        let paths = index_paths(&ds, &agg);
        let keys: Vec<&str> = paths.iter().map(|p| p.values[0].as_str()).collect();
        assert_eq!(keys, vec!["furnished", "Others"]);
        assert_eq!(paths[1].count, 3);
    }

    #[test]
    fn test_zero_axes() {
        let ds = housing();
        let agg = aggregate(&ds, &[], 0.01);
        assert!(index_paths(&ds, &agg).is_empty());
    }

    #[test]
    fn test_deterministic_order() {
        let ds = housing();
        let agg = aggregate(&ds, &axes(), 0.01);
        assert_eq!(index_paths(&ds, &agg), index_paths(&ds, &agg));
    }

    #[test]
    fn test_compare_keys() {
        assert_eq!(compare_keys("apple", "Banana"), Ordering::Less);
        assert_eq!(compare_keys("B", "b"), Ordering::Less);
        assert_eq!(compare_keys("x", "x"), Ordering::Equal);
    }

    #[test]
    fn test_path_key_separator() {
        let a = path_key(&["a|".to_string(), "b".to_string()]);
        let b = path_key(&["a".to_string(), "|b".to_string()]);
        assert_ne!(a, b);
    }
}
