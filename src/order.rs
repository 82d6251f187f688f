use std::collections::BTreeMap;

/// Axis name → category keys in display order. Axes may be absent.
pub type OrderMap = BTreeMap<String, Vec<String>>;

/// Who is writing to the [`OrderingStore`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderSource {
    /// Order restored or supplied by the host
    Host,
    /// A completed manual drag on one axis
    Drag,
    /// Auto-arrange
    Optimizer,
    /// Selection-driven clustering; transient and never reported
    Reorganizer,
}

impl OrderSource {
    /// Whether writes from this source must be reported back to the host.
    pub fn notifies_host(self) -> bool {
        matches!(self, OrderSource::Drag | OrderSource::Optimizer)
    }
}

/// The single authoritative category order.
///
/// `persisted` holds what the host, drags and auto-arrange wrote; `transient` is the
/// selection reorganizer's overlay, read in preference to `persisted` while present.
/// Writers must go through `&mut self`, one at a time.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OrderingStore {
    persisted: OrderMap,
    transient: Option<OrderMap>,
}

impl OrderingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_order(order: OrderMap) -> Self {
        Self {
            persisted: order,
            transient: None,
        }
    }

    /// The order the next layout pass should use.
    pub fn effective(&self) -> &OrderMap {
        self.transient.as_ref().unwrap_or(&self.persisted)
    }

    pub fn persisted(&self) -> &OrderMap {
        &self.persisted
    }

    pub fn is_transient(&self) -> bool {
        self.transient.is_some()
    }

    pub fn saved(&self, axis: &str) -> Option<&[String]> {
        self.effective().get(axis).map(Vec::as_slice)
    }

    /// Overwrite the axes present in `changes`. Returns true when the host must be told.
    ///
    /// Reorganizer writes land in the transient overlay on top of the persisted order.
    /// Any other write that changes the persisted order drops the overlay.
    pub fn write(&mut self, source: OrderSource, changes: OrderMap) -> bool {
        match source {
            OrderSource::Reorganizer => {
                let mut overlay = self.persisted.clone();
                overlay.extend(changes);
                self.transient = Some(overlay);
            }
            OrderSource::Host => {
                let changed = changes
                    .iter()
                    .any(|(axis, keys)| self.persisted.get(axis) != Some(keys));
                if changed {
                    self.persisted.extend(changes);
                    self.transient = None;
                }
            }
            OrderSource::Drag | OrderSource::Optimizer => {
                self.persisted.extend(changes);
                self.transient = None;
            }
        }
        source.notifies_host()
    }

    pub fn clear_transient(&mut self) {
        self.transient = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn order(axis: &str, keys: &[&str]) -> OrderMap {
        let mut map = OrderMap::new();
        map.insert(axis.to_string(), keys.iter().map(|k| k.to_string()).collect());
        map
    }

    #[test]
    fn test_notification_policy() {
        let mut store = OrderingStore::new();
        assert!(!store.write(OrderSource::Host, order("a", &["x"])));
        assert!(store.write(OrderSource::Drag, order("a", &["y", "x"])));
        assert!(store.write(OrderSource::Optimizer, order("b", &["z"])));
        assert!(!store.write(OrderSource::Reorganizer, order("a", &["x", "y"])));
    }

    #[test]
    fn test_host_write_overwrites_present_axes_only() {
        let mut store = OrderingStore::with_order(order("a", &["x", "y"]));
        store.write(OrderSource::Host, order("b", &["1", "2"]));
        assert_eq!(store.persisted()["a"], vec!["x", "y"]);
        assert_eq!(store.persisted()["b"], vec!["1", "2"]);
    }

    #[test]
    fn test_transient_overlay() {
        let mut store = OrderingStore::with_order(order("a", &["x", "y"]));
        store.write(OrderSource::Reorganizer, order("a", &["y", "x"]));
        assert!(store.is_transient());
        assert_eq!(store.saved("a").unwrap(), ["y", "x"]);
        // persisted untouched
        assert_eq!(store.persisted()["a"], vec!["x", "y"]);

        store.clear_transient();
        assert_eq!(store.saved("a").unwrap(), ["x", "y"]);
    }

    #[test]
    fn test_user_write_drops_overlay() {
        let mut store = OrderingStore::new();
        store.write(OrderSource::Reorganizer, order("a", &["y", "x"]));
        store.write(OrderSource::Drag, order("a", &["x", "y"]));
        assert!(!store.is_transient());
        assert_eq!(store.saved("a").unwrap(), ["x", "y"]);
    }

    #[test]
    fn test_unchanged_host_write_keeps_overlay() {
        let mut store = OrderingStore::with_order(order("a", &["x", "y"]));
        store.write(OrderSource::Reorganizer, order("a", &["y", "x"]));
        store.write(OrderSource::Host, order("a", &["x", "y"]));
        assert!(store.is_transient());

        store.write(OrderSource::Host, order("a", &["y", "x"]));
        assert!(!store.is_transient());
    }
}
