// Abstract Syntax Tree for the view DSL

use crate::order::OrderMap;
use crate::selection::SelectionSet;

/// Complete view description
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ViewSpec {
    /// Axis list; `None` means every attribute not excluded
    pub axes: Option<Vec<String>>,
    pub selection: SelectionSet,
    /// Host order override
    pub order: OrderMap,
    pub arrange: Option<Arrange>,
}

/// Auto-arrange request
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Arrange {
    /// `None` = configured default
    pub iterations: Option<usize>,
}

/// One pipeline component
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Axes(Vec<String>),
    Select { axis: String, keys: Vec<String> },
    Order { axis: String, keys: Vec<String> },
    Arrange(Arrange),
}
