//! Auto-arrange: barycentric crossing reduction across adjacent axes.
//!
//! Each step re-sorts one axis by the count-weighted mean rank its ribbons reach
//! on a neighbouring axis. A full iteration sweeps left to right, then right to
//! left. After the requested number of iterations, sweeping continues until
//! the orders repeat an earlier state. The smallest state of that cycle is
//! returned, so arranging an already arranged layout leaves it unchanged.

use crate::ir::{Layout, Path, OTHERS};
use crate::order::OrderMap;
use std::collections::HashMap;
use tracing::debug;

pub const DEFAULT_ITERATIONS: usize = 3;
pub const MAX_ITERATIONS: usize = 6;
/// Upper bound on full iterations while looking for a repeated state.
pub const MAX_SWEEPS: usize = 64;

/// Bound a requested iteration count to `[1, MAX_ITERATIONS]`.
pub fn clamp_iterations(iterations: usize) -> usize {
    iterations.clamp(1, MAX_ITERATIONS)
}

/// Compute a crossing-reduced order for every axis of `layout`, seeded from the
/// order it currently displays. Fewer than two axes yields an empty map.
pub fn auto_arrange(layout: &Layout, iterations: usize) -> OrderMap {
    let n = layout.axes.len();
    if n < 2 {
        return OrderMap::new();
    }

    let iterations = clamp_iterations(iterations);
    let mut orders: Vec<Vec<String>> = layout.axes.iter().map(|a| a.keys()).collect();
    let mut history = vec![orders.clone()];
    let mut sweeps = 0;

    let settled = loop {
        sweep(&mut orders, &layout.paths);
        sweeps += 1;

        if sweeps >= iterations {
            if let Some(start) = history.iter().position(|seen| *seen == orders) {
                // a fixed point or a cycle; pick its canonical member
                let canonical = (start..history.len())
                    .min_by(|&a, &b| history[a].cmp(&history[b]))
                    .unwrap_or(start);
                break history.swap_remove(canonical);
            }
        }
        if sweeps >= MAX_SWEEPS {
            debug!(sweeps, "auto-arrange did not settle");
            break orders;
        }
        history.push(orders.clone());
    };

    debug!(axes = n, iterations, sweeps, "auto-arrange finished");

    layout
        .axes
        .iter()
        .map(|a| a.name.clone())
        .zip(settled)
        .collect()
}

/// One full iteration: left to right, then right to left.
fn sweep(orders: &mut [Vec<String>], paths: &[Path]) {
    let n = orders.len();
    for axis in 1..n {
        reorder_axis(orders, paths, axis, axis - 1);
    }
    for axis in (0..n - 1).rev() {
        reorder_axis(orders, paths, axis, axis + 1);
    }
}

/// Re-sort `orders[axis]` by barycentre against `orders[neighbour]`.
fn reorder_axis(orders: &mut [Vec<String>], paths: &[Path], axis: usize, neighbour: usize) {
    let neighbour_rank: HashMap<&str, usize> = orders[neighbour]
        .iter()
        .enumerate()
        .map(|(i, k)| (k.as_str(), i))
        .collect();
    let unknown = neighbour_rank.len();

    // category -> (weighted rank sum, weight)
    let mut flow: HashMap<&str, (f64, f64)> = HashMap::new();
    for path in paths {
        let (Some(own), Some(other)) = (path.value(axis), path.value(neighbour)) else {
            continue;
        };
        let rank = neighbour_rank.get(other).copied().unwrap_or(unknown);
        let entry = flow.entry(own).or_insert((0.0, 0.0));
        entry.0 += rank as f64 * path.count as f64;
        entry.1 += path.count as f64;
    }

    let mut scored: Vec<(f64, usize, String)> = orders[axis]
        .iter()
        .enumerate()
        .map(|(current, key)| {
            let score = match flow.get(key.as_str()) {
                Some(&(sum, weight)) if weight > 0.0 => sum / weight,
                _ => f64::MAX,
            };
            (score, current, key.clone())
        })
        .collect();
    scored.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));

    let mut reordered: Vec<String> = scored.into_iter().map(|(_, _, key)| key).collect();
    force_others_last(&mut reordered);
    orders[axis] = reordered;
}

pub(crate) fn force_others_last(keys: &mut Vec<String>) {
    if let Some(pos) = keys.iter().position(|k| k == OTHERS) {
        let others = keys.remove(pos);
        keys.push(others);
    }
}
