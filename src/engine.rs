//! Engine facade: sequences reorganize → layout and routes host notifications.

use crate::arrange;
use crate::data::Dataset;
use crate::gesture::{DragGesture, DragOutcome};
use crate::ir::{Layout, Path};
use crate::layout::{compute_layout, dedup_axes};
use crate::order::{OrderMap, OrderSource, OrderingStore};
use crate::selection::{reorganize, SelectionMatcher, SelectionSet};
use crate::LayoutOptions;
use tracing::{debug, info};

/// Callbacks into the host. Both default to no-ops.
pub trait HostEvents {
    /// The engine changed the persisted order (drag or auto-arrange).
    fn on_order_changed(&mut self, _changes: &OrderMap) {}

    /// A category was clicked without a committed drag.
    fn on_category_toggled(&mut self, _axis: &str, _key: &str) {}
}

impl HostEvents for () {}

/// What the host hands the engine for one render.
#[derive(Debug, Clone, Copy)]
pub struct ViewInput<'a> {
    pub axes: &'a [String],
    pub selection: &'a SelectionSet,
    pub order_override: Option<&'a OrderMap>,
}

impl<'a> ViewInput<'a> {
    pub fn new(axes: &'a [String], selection: &'a SelectionSet) -> Self {
        Self {
            axes,
            selection,
            order_override: None,
        }
    }

    pub fn with_order_override(mut self, order: &'a OrderMap) -> Self {
        self.order_override = Some(order);
        self
    }
}

/// Output of one render: geometry plus the selection it was matched against.
#[derive(Debug, Clone)]
pub struct Frame {
    pub layout: Layout,
    /// Selection restricted to the displayed axes
    pub selection: SelectionSet,
    matcher: SelectionMatcher,
}

impl Frame {
    pub fn matches(&self, path: &Path) -> bool {
        self.matcher.matches(path)
    }

    pub fn is_selected(&self, axis: &str, key: &str) -> bool {
        self.selection.contains(axis, key)
    }
}

#[derive(Debug, Default)]
pub struct ParsetEngine {
    options: LayoutOptions,
    store: OrderingStore,
    selection_cache: Option<u64>,
    gesture: DragGesture,
    suppress_click: bool,
    last: Option<Layout>,
}

impl ParsetEngine {
    pub fn new(options: LayoutOptions) -> Self {
        Self {
            options,
            ..Self::default()
        }
    }

    pub fn options(&self) -> &LayoutOptions {
        &self.options
    }

    /// The order the next layout pass uses.
    pub fn order(&self) -> &OrderMap {
        self.store.effective()
    }

    pub fn persisted_order(&self) -> &OrderMap {
        self.store.persisted()
    }

    pub fn last_layout(&self) -> Option<&Layout> {
        self.last.as_ref()
    }

    pub fn gesture(&self) -> &DragGesture {
        &self.gesture
    }

    /// Seed or restore order from the host. Never reported back.
    pub fn apply_order_override(&mut self, order: OrderMap) {
        self.store.write(OrderSource::Host, order);
    }

    /// Run a full layout pass for `view`.
    ///
    /// A selection that differs from the last one reorganizes the categories into a
    /// transient order first. Clearing the selection drops that order.
    pub fn render(&mut self, dataset: &Dataset, view: &ViewInput) -> Frame {
        if let Some(order) = view.order_override {
            self.apply_order_override(order.clone());
        }

        let axes = dedup_axes(view.axes);
        let baseline = compute_layout(dataset, &axes, self.store.persisted(), &self.options);
        let matcher = SelectionMatcher::new(view.selection, &baseline);

        if matcher.is_active() {
            let fingerprint = view.selection.fingerprint(&axes);
            if self.selection_cache != Some(fingerprint) {
                let reorganized = reorganize(&baseline, &matcher);
                self.store.write(OrderSource::Reorganizer, reorganized);
                self.selection_cache = Some(fingerprint);
                debug!(fingerprint, "selection changed, categories reorganized");
            }
        } else if self.selection_cache.take().is_some() {
            self.store.clear_transient();
        }

        let layout = if self.store.is_transient() {
            compute_layout(dataset, &axes, self.store.effective(), &self.options)
        } else {
            baseline
        };

        self.last = Some(layout.clone());
        Frame {
            layout,
            selection: view.selection.restricted_to(&axes),
            matcher,
        }
    }

    /// Auto-arrange the last rendered layout and persist the result.
    ///
    /// `iterations` falls back to the configured default and is clamped to
    /// `[1, 6]`. Returns the new order, or `None` with fewer than two axes.
    pub fn auto_arrange<H: HostEvents + ?Sized>(
        &mut self,
        iterations: Option<usize>,
        host: &mut H,
    ) -> Option<OrderMap> {
        let layout = self.last.as_ref()?;
        let iterations = iterations.unwrap_or(self.options.arrange_iterations);
        let order = arrange::auto_arrange(layout, iterations);
        if order.is_empty() {
            return None;
        }

        if self.store.write(OrderSource::Optimizer, order.clone()) {
            host.on_order_changed(&order);
        }
        info!(axes = order.len(), "auto-arrange applied");
        Some(order)
    }

    /// Pointer down on a category of the last rendered layout.
    pub fn begin_drag(&mut self, axis: &str, key: &str, pointer_y: f64) -> bool {
        let Some(layout) = self.last.as_ref() else {
            return false;
        };
        self.suppress_click = false;
        self.gesture.begin(layout, axis, key, pointer_y)
    }

    /// Pointer motion. Returns the preview position of the dragged category.
    pub fn drag_to(&mut self, pointer_y: f64) -> Option<f64> {
        self.gesture.update(pointer_y, self.options.height)
    }

    /// Pointer up. A committed drag persists the new axis order and notifies the host.
    pub fn end_drag<H: HostEvents + ?Sized>(&mut self, host: &mut H) -> Option<DragOutcome> {
        self.gesture.end()?;
        let outcome = self.gesture.settle()?;

        match &outcome {
            DragOutcome::Commit { axis, order } => {
                let mut changes = OrderMap::new();
                changes.insert(axis.clone(), order.clone());
                if self.store.write(OrderSource::Drag, changes.clone()) {
                    host.on_order_changed(&changes);
                }
                self.suppress_click = true;
                info!(axis = %axis, "category order changed by drag");
            }
            DragOutcome::Cancel { .. } => self.suppress_click = false,
        }
        Some(outcome)
    }

    /// Category click. Swallowed right after a committed drag.
    pub fn activate_category<H: HostEvents + ?Sized>(
        &mut self,
        axis: &str,
        key: &str,
        host: &mut H,
    ) -> bool {
        if std::mem::take(&mut self.suppress_click) {
            return false;
        }
        host.on_category_toggled(axis, key);
        true
    }
}
