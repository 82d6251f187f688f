// Runtime executor for the view DSL

use crate::data::Dataset;
use crate::engine::{Frame, HostEvents, ParsetEngine, ViewInput};
use crate::graph;
use crate::ir::{Category, Path};
use crate::order::OrderMap;
use crate::parser::ViewSpec;
use crate::{LayoutOptions, OutputFormat};
use anyhow::{Context, Result};
use serde::Serialize;
use tracing::{info, warn};

/// Collects the order notifications a run produced
#[derive(Debug, Default)]
struct OrderLog {
    changes: Vec<OrderMap>,
}

impl HostEvents for OrderLog {
    fn on_order_changed(&mut self, changes: &OrderMap) {
        self.changes.push(changes.clone());
    }
}

/// Result of driving the engine through one view description
#[derive(Debug)]
pub struct RunOutcome {
    pub frame: Frame,
    /// Order changes the engine reported to the host
    pub notifications: Vec<OrderMap>,
}

/// Resolve the axis list, render, and auto-arrange when asked.
pub fn run_view(
    spec: &ViewSpec,
    dataset: &Dataset,
    options: &LayoutOptions,
    exclude: &[String],
) -> RunOutcome {
    let axes = match &spec.axes {
        Some(axes) => axes.clone(),
        None => dataset.attributes_excluding(exclude),
    };
    for axis in &axes {
        if !dataset.headers.contains(axis) {
            warn!(axis = %axis, "axis not found in dataset, every record maps to NA");
        }
    }

    let mut engine = ParsetEngine::new(options.clone());
    let mut host = OrderLog::default();

    let view = ViewInput::new(&axes, &spec.selection);
    let view = if spec.order.is_empty() {
        view
    } else {
        view.with_order_override(&spec.order)
    };
    let mut frame = engine.render(dataset, &view);

    if let Some(arrange) = spec.arrange {
        if engine.auto_arrange(arrange.iterations, &mut host).is_some() {
            frame = engine.render(dataset, &ViewInput::new(&axes, &spec.selection));
        }
    }

    info!(
        axes = frame.layout.axes.len(),
        paths = frame.layout.paths.len(),
        records = frame.layout.total,
        "view rendered"
    );

    RunOutcome {
        frame,
        notifications: host.changes,
    }
}

#[derive(Debug, Serialize)]
pub struct FrameDocument<'a> {
    pub total: usize,
    pub axes: Vec<AxisDocument<'a>>,
    pub paths: Vec<PathDocument<'a>>,
    pub order: OrderMap,
}

#[derive(Debug, Serialize)]
pub struct AxisDocument<'a> {
    pub name: &'a str,
    pub x: f64,
    pub categories: Vec<CategoryDocument<'a>>,
}

#[derive(Debug, Serialize)]
pub struct CategoryDocument<'a> {
    #[serde(flatten)]
    pub category: &'a Category,
    pub selected: bool,
}

#[derive(Debug, Serialize)]
pub struct PathDocument<'a> {
    #[serde(flatten)]
    pub path: &'a Path,
    pub matched: bool,
}

impl<'a> FrameDocument<'a> {
    pub fn new(frame: &'a Frame, options: &LayoutOptions) -> Self {
        let layout = &frame.layout;
        let xs = layout.axis_positions(options.width);

        let axes = layout
            .axes
            .iter()
            .zip(xs)
            .map(|(axis, x)| AxisDocument {
                name: &axis.name,
                x,
                categories: axis
                    .categories
                    .iter()
                    .map(|category| CategoryDocument {
                        category,
                        selected: frame.is_selected(&axis.name, &category.key),
                    })
                    .collect(),
            })
            .collect();

        let paths = layout
            .paths
            .iter()
            .map(|path| PathDocument {
                path,
                matched: frame.matches(path),
            })
            .collect();

        FrameDocument {
            total: layout.total,
            axes,
            paths,
            order: layout.order_map(),
        }
    }
}

/// Serialize a frame as a pretty-printed JSON document
pub fn to_json(frame: &Frame, options: &LayoutOptions) -> Result<String> {
    serde_json::to_string_pretty(&FrameDocument::new(frame, options))
        .context("Failed to serialize layout")
}

/// Produce the bytes written to stdout for `format`
pub fn render_output(frame: &Frame, options: &LayoutOptions, format: OutputFormat) -> Result<Vec<u8>> {
    match format {
        OutputFormat::Json => {
            let mut json = to_json(frame, options)?;
            json.push('\n');
            Ok(json.into_bytes())
        }
        OutputFormat::Png => graph::render_png(frame, options).context("Failed to render PNG"),
        OutputFormat::Svg => graph::render_svg(frame, options)
            .map(String::into_bytes)
            .context("Failed to render SVG"),
    }
}
