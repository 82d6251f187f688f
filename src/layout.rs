//! Layout pass: places categories on every axis and assigns both endpoints of
//! every ribbon segment.
//!
//! A pass is a pure function of (dataset, axes, order, options). Categories and
//! paths are rebuilt from scratch each time.

use crate::category::aggregate;
use crate::data::Dataset;
use crate::ir::{Aggregation, AxisLayout, Category, Layout, Path, Segment};
use crate::order::OrderMap;
use crate::path::index_paths;
use crate::LayoutOptions;
use std::cmp::{Ordering, Reverse};
use std::collections::HashMap;
use tracing::{debug, warn};

/// Run aggregation, path indexing and placement for `axes` under `order`.
pub fn compute_layout(
    dataset: &Dataset,
    axes: &[String],
    order: &OrderMap,
    options: &LayoutOptions,
) -> Layout {
    let axes = dedup_axes(axes);
    if axes.is_empty() {
        return Layout::empty(dataset.len(), options.available_height());
    }

    let aggregation = aggregate(dataset, &axes, options.min_category_ratio);
    let paths = index_paths(dataset, &aggregation);
    place(aggregation, paths, order, options)
}

/// Drop repeated axis names, keeping the first occurrence.
pub fn dedup_axes(axes: &[String]) -> Vec<String> {
    let mut seen: Vec<String> = Vec::with_capacity(axes.len());
    for axis in axes {
        if seen.contains(axis) {
            warn!(axis = %axis, "axis listed twice, ignoring repeat");
        } else {
            seen.push(axis.clone());
        }
    }
    seen
}

/// Sort categories for display.
///
/// With a saved order, known keys follow it and unknown keys come after them by
/// descending count. Without one, descending count. `Others` is last either way,
/// and the sort is stable so equal counts keep first-seen order.
pub fn order_categories(mut categories: Vec<Category>, saved: Option<&[String]>) -> Vec<Category> {
    match saved {
        Some(saved) => {
            let mut position: HashMap<&str, usize> = HashMap::with_capacity(saved.len());
            for (i, key) in saved.iter().enumerate() {
                position.entry(key.as_str()).or_insert(i);
            }
            categories.sort_by(|a, b| {
                a.is_others()
                    .cmp(&b.is_others())
                    .then_with(|| {
                        match (position.get(a.key.as_str()), position.get(b.key.as_str())) {
                            (Some(ia), Some(ib)) => ia.cmp(ib),
                            (Some(_), None) => Ordering::Less,
                            (None, Some(_)) => Ordering::Greater,
                            (None, None) => b.count.cmp(&a.count),
                        }
                    })
            });
        }
        None => {
            categories.sort_by_key(|c| (c.is_others(), Reverse(c.count)));
        }
    }
    categories
}

/// Assign geometry to aggregated categories and indexed paths.
pub fn place(
    aggregation: Aggregation,
    mut paths: Vec<Path>,
    order: &OrderMap,
    options: &LayoutOptions,
) -> Layout {
    let total = aggregation.total;
    let denom = total.max(1) as f64;
    let available = options.available_height();

    let axes: Vec<AxisLayout> = aggregation
        .axes
        .into_iter()
        .map(|axis| {
            let saved = order.get(&axis.axis).map(Vec::as_slice);
            let mut categories = order_categories(axis.categories, saved);

            let mut y = options.top_offset;
            for category in &mut categories {
                category.y = y;
                category.height = (category.count as f64 / denom) * available;
                y += category.height;
            }
            AxisLayout {
                name: axis.axis,
                categories,
            }
        })
        .collect();

    let factor = available / denom;
    let pairs = axes.len().saturating_sub(1);
    for path in &mut paths {
        path.height = path.count as f64 * factor;
        path.segments = vec![
            Segment {
                height: path.height,
                ..Segment::default()
            };
            pairs
        ];
    }

    for i in 0..pairs {
        stack_pair(&axes[i], &axes[i + 1], i, &mut paths);
    }

    debug!(
        axes = axes.len(),
        paths = paths.len(),
        total,
        "layout pass complete"
    );

    Layout {
        total,
        available_height: available,
        axes,
        paths,
    }
}

/// Double-sided stacking for the pair (`source`, `target`) at segment index `i`.
///
/// Source side: paths grouped by source category, ordered by target rank, stacked
/// from the source category's top. Target side mirrors it.
fn stack_pair(source: &AxisLayout, target: &AxisLayout, i: usize, paths: &mut [Path]) {
    let source_rank = source.rank_map();
    let target_rank = target.rank_map();

    let source_side = stack_side(source, paths, |p| &p.values[i], |p| {
        target_rank.get(p.values[i + 1].as_str()).copied()
    });
    let target_side = stack_side(target, paths, |p| &p.values[i + 1], |p| {
        source_rank.get(p.values[i].as_str()).copied()
    });

    for (idx, y) in source_side {
        paths[idx].segments[i].y_source = y;
    }
    for (idx, y) in target_side {
        paths[idx].segments[i].y_target = y;
    }
}

/// Stack the paths of each category on `axis`, returning (path index, offset).
fn stack_side<'p, K, R>(
    axis: &AxisLayout,
    paths: &'p [Path],
    key_of: K,
    opposite_rank: R,
) -> Vec<(usize, f64)>
where
    K: Fn(&'p Path) -> &'p String,
    R: Fn(&Path) -> Option<usize>,
{
    let mut groups: HashMap<&str, Vec<usize>> = HashMap::new();
    for (idx, path) in paths.iter().enumerate() {
        groups.entry(key_of(path).as_str()).or_default().push(idx);
    }

    let mut offsets = Vec::with_capacity(paths.len());
    for category in &axis.categories {
        let Some(members) = groups.get_mut(category.key.as_str()) else {
            continue;
        };
        members.sort_by_key(|&idx| {
            let p = &paths[idx];
            (opposite_rank(p).unwrap_or(usize::MAX), Reverse(p.count))
        });

        let mut cursor = category.y;
        for &idx in members.iter() {
            offsets.push((idx, cursor));
            cursor += paths[idx].height;
        }
    }
    offsets
}
