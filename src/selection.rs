//! Selection state, path matching and selection-driven clustering.

use crate::arrange::force_others_last;
use crate::ir::{Layout, Path};
use crate::order::OrderMap;
use serde::{Deserialize, Serialize};
use std::collections::hash_map::DefaultHasher;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::hash::{Hash, Hasher};

/// Axis name → chosen category keys. Absent or empty sets impose no constraint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SelectionSet(BTreeMap<String, BTreeSet<String>>);

impl SelectionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, axis: impl Into<String>, key: impl Into<String>) {
        self.0.entry(axis.into()).or_default().insert(key.into());
    }

    /// Add `key` if absent, remove it if present. Returns whether it is now selected.
    pub fn toggle(&mut self, axis: &str, key: &str) -> bool {
        let keys = self.0.entry(axis.to_string()).or_default();
        let selected = if keys.remove(key) {
            false
        } else {
            keys.insert(key.to_string());
            true
        };
        if keys.is_empty() {
            self.0.remove(axis);
        }
        selected
    }

    pub fn contains(&self, axis: &str, key: &str) -> bool {
        self.0.get(axis).is_some_and(|keys| keys.contains(key))
    }

    pub fn get(&self, axis: &str) -> Option<&BTreeSet<String>> {
        self.0.get(axis)
    }

    /// True when no axis carries a selected key.
    pub fn is_empty(&self) -> bool {
        self.0.values().all(BTreeSet::is_empty)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &BTreeSet<String>)> {
        self.0.iter()
    }

    /// Only the non-empty entries for axes in `axes`.
    pub fn restricted_to(&self, axes: &[String]) -> SelectionSet {
        SelectionSet(
            self.0
                .iter()
                .filter(|(axis, keys)| !keys.is_empty() && axes.contains(*axis))
                .map(|(axis, keys)| (axis.clone(), keys.clone()))
                .collect(),
        )
    }

    /// Hash of the serialized effective selection for `axes`, plus the axis list.
    pub fn fingerprint(&self, axes: &[String]) -> u64 {
        let serialized = serde_json::to_string(&self.restricted_to(axes)).unwrap_or_default();
        let mut hasher = DefaultHasher::new();
        serialized.hash(&mut hasher);
        axes.hash(&mut hasher);
        hasher.finish()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for SelectionSet {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut selection = SelectionSet::new();
        for (axis, key) in iter {
            selection.insert(axis, key);
        }
        selection
    }
}

/// A selection resolved against the axes of one layout.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SelectionMatcher {
    // (axis index, allowed keys)
    constraints: Vec<(usize, BTreeSet<String>)>,
}

impl SelectionMatcher {
    /// Entries for axes the layout does not display are dropped.
    pub fn new(selection: &SelectionSet, layout: &Layout) -> Self {
        let constraints = selection
            .iter()
            .filter(|(_, keys)| !keys.is_empty())
            .filter_map(|(axis, keys)| layout.axis_index(axis).map(|i| (i, keys.clone())))
            .collect();
        Self { constraints }
    }

    pub fn is_active(&self) -> bool {
        !self.constraints.is_empty()
    }

    /// A path matches when every constrained axis holds one of the chosen keys.
    /// An inactive selection matches nothing.
    pub fn matches(&self, path: &Path) -> bool {
        self.is_active()
            && self
                .constraints
                .iter()
                .all(|(i, keys)| path.value(*i).is_some_and(|v| keys.contains(v)))
    }
}

/// Cluster the categories that carry matching paths at the top of each axis.
///
/// `baseline` must be laid out with the persisted order. Matching categories are
/// sorted by the count-weighted mean rank of their neighbours (both sides) over
/// matching paths, ties by baseline rank; the rest keep baseline order and
/// `Others` stays last. Returns an order for every axis, or nothing when the
/// selection is inactive.
pub fn reorganize(baseline: &Layout, matcher: &SelectionMatcher) -> OrderMap {
    if !matcher.is_active() {
        return OrderMap::new();
    }

    let matching: Vec<&Path> = baseline.paths.iter().filter(|p| matcher.matches(p)).collect();
    let ranks: Vec<HashMap<&str, usize>> = baseline.axes.iter().map(|a| a.rank_map()).collect();

    let mut order = OrderMap::new();
    for (i, axis) in baseline.axes.iter().enumerate() {
        let neighbours: Vec<usize> = [i.checked_sub(1), Some(i + 1)]
            .into_iter()
            .flatten()
            .filter(|&n| n < baseline.axes.len())
            .collect();

        let mut flow: HashMap<&str, (f64, f64)> = HashMap::new();
        for path in &matching {
            let Some(own) = path.value(i) else { continue };
            let entry = flow.entry(own).or_insert((0.0, 0.0));
            for &n in &neighbours {
                if let Some(rank) = path.value(n).and_then(|v| ranks[n].get(v)) {
                    entry.0 += *rank as f64 * path.count as f64;
                    entry.1 += path.count as f64;
                }
            }
        }

        let mut hits: Vec<(f64, usize, &str)> = Vec::new();
        let mut rest: Vec<String> = Vec::new();
        for (rank, category) in axis.categories.iter().enumerate() {
            match flow.get(category.key.as_str()) {
                Some(&(sum, weight)) => {
                    let score = if weight > 0.0 { sum / weight } else { 0.0 };
                    hits.push((score, rank, category.key.as_str()));
                }
                None => rest.push(category.key.clone()),
            }
        }
        hits.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));

        let mut keys: Vec<String> = hits.into_iter().map(|(_, _, k)| k.to_string()).collect();
        keys.extend(rest);
        force_others_last(&mut keys);
        order.insert(axis.name.clone(), keys);
    }
    order
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{Dataset, Value};
    use crate::layout::compute_layout;
    use crate::LayoutOptions;

    fn colors() -> Dataset {
        let rows = [
            ("red", "s"),
            ("blue", "m"),
            ("blue", "l"),
            ("green", "m"),
            ("green", "s"),
            ("green", "l"),
        ];
        Dataset::new(
            vec!["color".to_string(), "size".to_string()],
            rows.iter()
                .map(|(c, s)| vec![Value::Text(c.to_string()), Value::Text(s.to_string())])
                .collect(),
        )
    }

    fn axes() -> Vec<String> {
        vec!["color".to_string(), "size".to_string()]
    }

    fn layout() -> Layout {
        compute_layout(&colors(), &axes(), &OrderMap::new(), &LayoutOptions::default())
    }

    #[test]
    fn test_toggle() {
        let mut selection = SelectionSet::new();
        assert!(selection.toggle("color", "red"));
        assert!(selection.contains("color", "red"));
        assert!(!selection.toggle("color", "red"));
        assert!(selection.is_empty());
        assert!(selection.get("color").is_none());
    }

    #[test]
    fn test_single_key_matches_only_its_paths() {
        let layout = layout();
        let selection: SelectionSet = [("color", "red")].into_iter().collect();
        let matcher = SelectionMatcher::new(&selection, &layout);

        let matched: Vec<&Vec<String>> = layout
            .paths
            .iter()
            .filter(|p| matcher.matches(p))
            .map(|p| &p.values)
            .collect();
        assert_eq!(matched, vec![&vec!["red".to_string(), "s".to_string()]]);
    }

    #[test]
    fn test_constraints_intersect() {
        let layout = layout();
        let selection: SelectionSet = [("color", "green"), ("color", "blue"), ("size", "m")]
            .into_iter()
            .collect();
        let matcher = SelectionMatcher::new(&selection, &layout);
        let count = layout.paths.iter().filter(|p| matcher.matches(p)).count();
        assert_eq!(count, 2);
    }

    #[test]
    fn test_empty_selection_matches_nothing() {
        let layout = layout();
        let matcher = SelectionMatcher::new(&SelectionSet::new(), &layout);
        assert!(!matcher.is_active());
        assert!(layout.paths.iter().all(|p| !matcher.matches(p)));
    }

    #[test]
    fn test_hidden_axis_selection_ignored() {
        let layout = layout();
        let selection: SelectionSet = [("weight", "heavy")].into_iter().collect();
        let matcher = SelectionMatcher::new(&selection, &layout);
        assert!(!matcher.is_active());
        assert!(selection.restricted_to(&axes()).is_empty());
    }

    #[test]
    fn test_fingerprint() {
        let a: SelectionSet = [("color", "red")].into_iter().collect();
        let mut b = a.clone();
        b.insert("weight", "heavy");
        // hidden axis does not change the fingerprint
        assert_eq!(a.fingerprint(&axes()), b.fingerprint(&axes()));

        let c: SelectionSet = [("color", "blue")].into_iter().collect();
        assert_ne!(a.fingerprint(&axes()), c.fingerprint(&axes()));
        assert_ne!(a.fingerprint(&axes()), a.fingerprint(&["color".to_string()]));
    }

    #[test]
    fn test_reorganize_clusters_matching_categories() {
        let layout = layout();
        // baseline: color green, blue, red; size s, m, l (counts 2, 2, 2: first-seen)
        assert_eq!(layout.axes[0].keys(), vec!["green", "blue", "red"]);
        assert_eq!(layout.axes[1].keys(), vec!["s", "m", "l"]);

        let selection: SelectionSet = [("color", "red")].into_iter().collect();
        let matcher = SelectionMatcher::new(&selection, &layout);
        let order = reorganize(&layout, &matcher);

        assert_eq!(order["color"], vec!["red", "green", "blue"]);
        assert_eq!(order["size"], vec!["s", "m", "l"]);
    }

    #[test]
    fn test_reorganize_leaves_unmatched_in_baseline_order() {
        let baseline = layout();
        let selection: SelectionSet = [("size", "l")].into_iter().collect();
        let matcher = SelectionMatcher::new(&selection, &baseline);

        let order = reorganize(&baseline, &matcher);
        // size "l" moves to the top; blue and green touch it, red does not
        assert_eq!(order["size"], vec!["l", "s", "m"]);
        assert_eq!(order["color"].last().map(String::as_str), Some("red"));
    }

    #[test]
    fn test_reorganize_inactive_is_empty() {
        let layout = layout();
        let matcher = SelectionMatcher::new(&SelectionSet::new(), &layout);
        assert!(reorganize(&layout, &matcher).is_empty());
    }
}
