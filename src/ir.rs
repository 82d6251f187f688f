use crate::order::OrderMap;
use serde::Serialize;
use std::collections::HashMap;

/// Synthetic category absorbing every value below the merge threshold.
pub const OTHERS: &str = "Others";

/// Joins per-axis keys into a path identifier (ASCII unit separator).
pub const PATH_SEPARATOR: char = '\u{1f}';

// =============================================================================
// Phase 1: Aggregation
// =============================================================================

/// A bucket of one axis. `y`/`height` are zero until the layout places it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Category {
    pub key: String,
    pub count: usize,
    pub items: Vec<usize>,
    pub y: f64,
    pub height: f64,
}

impl Category {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            count: 0,
            items: Vec::new(),
            y: 0.0,
            height: 0.0,
        }
    }

    pub fn is_others(&self) -> bool {
        self.key == OTHERS
    }
}

/// Categories of one axis after the Others merge, in first-seen order.
#[derive(Debug, Clone)]
pub struct AxisCategories {
    pub axis: String,
    pub categories: Vec<Category>,
    /// Normalized raw value -> category key (itself or `Others`)
    pub mapping: HashMap<String, String>,
}

impl AxisCategories {
    /// Category key a normalized raw value lands in.
    pub fn mapped<'a>(&'a self, raw: &'a str) -> &'a str {
        self.mapping.get(raw).map(String::as_str).unwrap_or(raw)
    }
}

#[derive(Debug, Clone)]
pub struct Aggregation {
    pub total: usize,
    pub threshold: usize,
    pub axes: Vec<AxisCategories>,
}

// =============================================================================
// Phase 2: Paths
// =============================================================================

/// Vertical endpoints of one path between axis `i` and axis `i + 1`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Segment {
    pub y_source: f64,
    pub y_target: f64,
    pub height: f64,
}

/// One distinct combination of category keys across all displayed axes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Path {
    pub key: String,
    pub values: Vec<String>,
    pub count: usize,
    pub items: Vec<usize>,
    pub height: f64,
    pub segments: Vec<Segment>,
}

impl Path {
    pub fn value(&self, axis_index: usize) -> Option<&str> {
        self.values.get(axis_index).map(String::as_str)
    }
}

// =============================================================================
// Phase 3: Layout
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AxisLayout {
    pub name: String,
    /// Categories in display order, top to bottom
    pub categories: Vec<Category>,
}

impl AxisLayout {
    pub fn rank(&self, key: &str) -> Option<usize> {
        self.categories.iter().position(|c| c.key == key)
    }

    pub fn category(&self, key: &str) -> Option<&Category> {
        self.categories.iter().find(|c| c.key == key)
    }

    pub fn keys(&self) -> Vec<String> {
        self.categories.iter().map(|c| c.key.clone()).collect()
    }

    /// Key -> display rank lookup table.
    pub fn rank_map(&self) -> HashMap<&str, usize> {
        self.categories
            .iter()
            .enumerate()
            .map(|(i, c)| (c.key.as_str(), i))
            .collect()
    }
}

/// Complete geometry of one layout pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Layout {
    pub total: usize,
    pub available_height: f64,
    pub axes: Vec<AxisLayout>,
    pub paths: Vec<Path>,
}

impl Layout {
    pub fn empty(total: usize, available_height: f64) -> Self {
        Self {
            total,
            available_height,
            axes: Vec::new(),
            paths: Vec::new(),
        }
    }

    pub fn axis_index(&self, name: &str) -> Option<usize> {
        self.axes.iter().position(|a| a.name == name)
    }

    pub fn axis(&self, name: &str) -> Option<&AxisLayout> {
        self.axes.iter().find(|a| a.name == name)
    }

    /// Value of `path` on the axis called `axis`, if that axis is displayed.
    pub fn path_value<'a>(&self, path: &'a Path, axis: &str) -> Option<&'a str> {
        self.axis_index(axis).and_then(|i| path.value(i))
    }

    /// Display order of every axis, as an order map.
    pub fn order_map(&self) -> OrderMap {
        self.axes
            .iter()
            .map(|a| (a.name.clone(), a.keys()))
            .collect()
    }

    /// Horizontal position of each axis for a plot `width` pixels wide.
    pub fn axis_positions(&self, width: f64) -> Vec<f64> {
        let n = self.axes.len();
        if n > 1 {
            let gap = (width - 40.0) / (n - 1) as f64;
            (0..n).map(|i| i as f64 * gap).collect()
        } else {
            vec![width / 2.0; n]
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn axis(name: &str, keys: &[&str]) -> AxisLayout {
        AxisLayout {
            name: name.to_string(),
            categories: keys.iter().map(|k| Category::new(*k)).collect(),
        }
    }

    #[test]
    fn test_rank_lookup() {
        let a = axis("parking", &["2", "0", "1"]);
        assert_eq!(a.rank("0"), Some(1));
        assert_eq!(a.rank("9"), None);
        assert_eq!(a.rank_map()["1"], 2);
    }

    #[test]
    fn test_axis_positions() {
        let mut layout = Layout::empty(0, 365.0);
        assert!(layout.axis_positions(800.0).is_empty());

        layout.axes.push(axis("a", &[]));
        assert_eq!(layout.axis_positions(800.0), vec![400.0]);

        layout.axes.push(axis("b", &[]));
        layout.axes.push(axis("c", &[]));
        assert_eq!(layout.axis_positions(800.0), vec![0.0, 380.0, 760.0]);
    }

    #[test]
    fn test_order_map() {
        let mut layout = Layout::empty(0, 0.0);
        layout.axes.push(axis("a", &["x", "y"]));
        let order = layout.order_map();
        assert_eq!(order["a"], vec!["x", "y"]);
    }
}
