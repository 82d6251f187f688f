// Library exports for parsets

pub mod csv_reader;
pub mod data;
pub mod graph;
pub mod parser;
pub mod runtime;

// Layout engine
pub mod arrange;
pub mod category;
pub mod engine;
pub mod gesture;
pub mod ir;
pub mod layout;
pub mod order;
pub mod path;
pub mod selection;

pub use engine::{Frame, HostEvents, ParsetEngine, ViewInput};
pub use ir::{AxisLayout, Category, Layout, Path, Segment};
pub use order::{OrderMap, OrderSource, OrderingStore};
pub use selection::SelectionSet;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default, clap::ValueEnum)]
pub enum OutputFormat {
    #[serde(rename = "json")]
    #[default]
    Json,
    #[serde(rename = "png")]
    Png,
    #[serde(rename = "svg")]
    Svg,
}

/// Geometry and heuristic knobs shared by the engine and the preview canvas.
///
/// `width`/`height` describe the plot area inside the outer margins. The top
/// `top_offset` pixels are reserved for axis titles, so categories tile
/// `height - top_offset`.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct LayoutOptions {
    #[serde(default = "default_width")]
    pub width: f64,
    #[serde(default = "default_height")]
    pub height: f64,
    #[serde(default = "default_top_offset")]
    pub top_offset: f64,
    #[serde(default = "default_min_category_ratio")]
    pub min_category_ratio: f64,
    #[serde(default = "default_arrange_iterations")]
    pub arrange_iterations: usize,
}

fn default_width() -> f64 { 800.0 }
fn default_height() -> f64 { 400.0 }
fn default_top_offset() -> f64 { 35.0 }
fn default_min_category_ratio() -> f64 { 0.01 }
fn default_arrange_iterations() -> usize { arrange::DEFAULT_ITERATIONS }

impl Default for LayoutOptions {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
            top_offset: default_top_offset(),
            min_category_ratio: default_min_category_ratio(),
            arrange_iterations: default_arrange_iterations(),
        }
    }
}

impl LayoutOptions {
    /// Vertical space shared out between categories on every axis.
    pub fn available_height(&self) -> f64 {
        (self.height - self.top_offset).max(0.0)
    }
}
