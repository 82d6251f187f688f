//! Manual category drag as an explicit state machine:
//! `Idle → Dragging → Settling → Idle`.
//!
//! The host feeds pointer positions; only a gesture that moved past
//! [`COMMIT_THRESHOLD`] produces a new order for its axis. Everything else is a
//! click.

use crate::ir::Layout;

/// Pointer travel (pixels) a drag needs before it commits a reorder.
pub const COMMIT_THRESHOLD: f64 = 3.0;

#[derive(Debug, Clone, PartialEq)]
struct Slot {
    key: String,
    y: f64,
    height: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DragState {
    pub axis: String,
    pub key: String,
    start_pointer: f64,
    origin_y: f64,
    height: f64,
    pub preview_y: f64,
    pub moved: bool,
    // Snapshot of the axis when the drag began
    slots: Vec<Slot>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DragOutcome {
    /// The axis should take this new order.
    Commit { axis: String, order: Vec<String> },
    /// Not dragged far enough; the category snaps back to `restore_y`.
    Cancel { axis: String, key: String, restore_y: f64 },
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum DragGesture {
    #[default]
    Idle,
    Dragging(DragState),
    Settling(DragOutcome),
}

impl DragGesture {
    pub fn is_idle(&self) -> bool {
        matches!(self, DragGesture::Idle)
    }

    /// Start dragging `key` on `axis`. Ignored unless idle and the category exists.
    pub fn begin(&mut self, layout: &Layout, axis: &str, key: &str, pointer_y: f64) -> bool {
        if !self.is_idle() {
            return false;
        }
        let Some(axis_layout) = layout.axis(axis) else {
            return false;
        };
        let Some(category) = axis_layout.category(key) else {
            return false;
        };

        *self = DragGesture::Dragging(DragState {
            axis: axis.to_string(),
            key: key.to_string(),
            start_pointer: pointer_y,
            origin_y: category.y,
            height: category.height,
            preview_y: category.y,
            moved: false,
            slots: axis_layout
                .categories
                .iter()
                .map(|c| Slot {
                    key: c.key.clone(),
                    y: c.y,
                    height: c.height,
                })
                .collect(),
        });
        true
    }

    /// Track the pointer. Returns the clamped preview position of the dragged category.
    pub fn update(&mut self, pointer_y: f64, plot_height: f64) -> Option<f64> {
        let DragGesture::Dragging(state) = self else {
            return None;
        };
        let delta = pointer_y - state.start_pointer;
        if delta.abs() > COMMIT_THRESHOLD {
            state.moved = true;
        }
        let max_y = (plot_height - state.height).max(0.0);
        state.preview_y = (state.origin_y + delta).clamp(0.0, max_y);
        Some(state.preview_y)
    }

    /// Release the pointer and move to `Settling`.
    pub fn end(&mut self) -> Option<&DragOutcome> {
        if !matches!(self, DragGesture::Dragging(_)) {
            return None;
        }
        let DragGesture::Dragging(state) = std::mem::take(self) else {
            return None;
        };

        let outcome = if state.moved {
            let mut centres: Vec<(f64, &str)> = state
                .slots
                .iter()
                .map(|slot| {
                    let y = if slot.key == state.key { state.preview_y } else { slot.y };
                    (y + slot.height / 2.0, slot.key.as_str())
                })
                .collect();
            centres.sort_by(|a, b| a.0.total_cmp(&b.0));
            DragOutcome::Commit {
                axis: state.axis.clone(),
                order: centres.into_iter().map(|(_, k)| k.to_string()).collect(),
            }
        } else {
            DragOutcome::Cancel {
                axis: state.axis,
                key: state.key,
                restore_y: state.origin_y,
            }
        };

        *self = DragGesture::Settling(outcome);
        match &*self {
            DragGesture::Settling(outcome) => Some(outcome),
            _ => None,
        }
    }

    /// Finish settling and return to `Idle`, handing back the outcome.
    pub fn settle(&mut self) -> Option<DragOutcome> {
        match std::mem::take(self) {
            DragGesture::Settling(outcome) => Some(outcome),
            other => {
                *self = other;
                None
            }
        }
    }
}
