use crate::engine::Frame;
use crate::ir::{Layout, Path};
use crate::LayoutOptions;
use anyhow::{bail, Context, Result};
use image::ImageEncoder;
use plotters::coord::Shift;
use plotters::prelude::*;

/// Blank border around the plot area
const MARGIN: f64 = 20.0;
/// Extra room right of the last axis for its labels
const LABEL_SPACE: f64 = 100.0;
const BAR_WIDTH: f64 = 6.0;
/// Vertical gap between stacked category bars
const BAR_GAP: f64 = 2.0;
const CURVE_STEPS: usize = 16;
/// Largest RGB buffer a PNG preview may allocate (1 GiB)
const MAX_BUFFER_BYTES: usize = 1 << 30;

const RIBBON: RGBColor = RGBColor(0x1f, 0x77, 0xb4);
const HIGHLIGHT: RGBColor = RGBColor(0xff, 0x7f, 0x0e);
const CATEGORY: RGBColor = RGBColor(0x69, 0xb3, 0xa2);

/// Preview canvas for one rendered frame
pub struct Canvas<'f> {
    frame: &'f Frame,
    plot_width: f64,
    width: u32,
    height: u32,
}

impl<'f> Canvas<'f> {
    pub fn new(frame: &'f Frame, options: &LayoutOptions) -> Self {
        let plot_width = options.width.max(0.0);
        Canvas {
            frame,
            plot_width,
            width: (plot_width + 2.0 * MARGIN + LABEL_SPACE).ceil() as u32,
            height: (options.height.max(0.0) + 2.0 * MARGIN).ceil() as u32,
        }
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Draw into an RGB buffer and encode it as PNG
    pub fn render_png(&self) -> Result<Vec<u8>> {
        let mut buffer = vec![0u8; self.buffer_len()?];
        {
            let root = BitMapBackend::with_buffer(&mut buffer, (self.width, self.height))
                .into_drawing_area();
            self.draw(&root)?;
            root.present().context("Failed to present drawing")?;
        }

        let mut png_bytes = Vec::new();
        {
            let encoder = image::codecs::png::PngEncoder::new(&mut png_bytes);
            encoder
                .write_image(&buffer, self.width, self.height, image::ColorType::Rgb8)
                .context("Failed to encode PNG")?;
        }

        Ok(png_bytes)
    }

    fn buffer_len(&self) -> Result<usize> {
        let len = (self.width as usize)
            .checked_mul(self.height as usize)
            .and_then(|pixels| pixels.checked_mul(3));
        match len {
            Some(len) if len <= MAX_BUFFER_BYTES => Ok(len),
            _ => bail!("canvas too large: {}x{} pixels", self.width, self.height),
        }
    }

    /// Draw as an SVG document
    pub fn render_svg(&self) -> Result<String> {
        let mut svg = String::new();
        {
            let root = SVGBackend::with_string(&mut svg, (self.width, self.height))
                .into_drawing_area();
            self.draw(&root)?;
            root.present().context("Failed to present drawing")?;
        }
        Ok(svg)
    }

    fn draw<DB>(&self, root: &DrawingArea<DB, Shift>) -> Result<()>
    where
        DB: DrawingBackend,
        DB::ErrorType: 'static,
    {
        root.fill(&WHITE).context("Failed to fill background")?;

        let layout = &self.frame.layout;
        let xs = layout.axis_positions(self.plot_width);
        let active = !self.frame.selection.is_empty();

        // Ribbons first so bars sit on top
        for i in 0..layout.axes.len().saturating_sub(1) {
            let x1 = xs[i] + BAR_WIDTH;
            let x2 = xs[i + 1];
            for path in draw_order(layout, i) {
                let seg = path.segments[i];
                let matched = self.frame.matches(path);
                let style = match (active, matched) {
                    (true, true) => HIGHLIGHT.mix(0.7),
                    (true, false) => RIBBON.mix(0.15),
                    _ => RIBBON.mix(0.45),
                };
                let points = ribbon(x1, seg.y_source, x2, seg.y_target, seg.height);
                root.draw(&Polygon::new(points, style.filled()))
                    .context("Failed to draw ribbon")?;
            }
        }

        let label_font = ("sans-serif", 12.0).into_font().color(&BLACK);
        let title_font = ("sans-serif", 14.0).into_font().color(&BLACK);

        for (axis, &x) in layout.axes.iter().zip(&xs) {
            for category in &axis.categories {
                let inset = if category.height > BAR_GAP { BAR_GAP / 2.0 } else { 0.0 };
                let fill = if self.frame.is_selected(&axis.name, &category.key) {
                    HIGHLIGHT
                } else {
                    CATEGORY
                };
                root.draw(&Rectangle::new(
                    [
                        to_pixel(x, category.y + inset),
                        to_pixel(x + BAR_WIDTH, category.y + category.height - inset),
                    ],
                    fill.filled(),
                ))
                .context("Failed to draw category")?;

                let label = format!("{} ({})", category.key, category.count);
                let anchor = to_pixel(x + BAR_WIDTH + 4.0, category.y + category.height / 2.0 - 6.0);
                root.draw_text(&label, &label_font, anchor)
                    .context("Failed to draw category label")?;
            }

            root.draw_text(&axis.name, &title_font, to_pixel(x, 8.0))
                .context("Failed to draw axis title")?;
        }

        Ok(())
    }
}

/// Render a frame as PNG bytes
pub fn render_png(frame: &Frame, options: &LayoutOptions) -> Result<Vec<u8>> {
    Canvas::new(frame, options).render_png()
}

/// Render a frame as an SVG document
pub fn render_svg(frame: &Frame, options: &LayoutOptions) -> Result<String> {
    Canvas::new(frame, options).render_svg()
}

/// Paths of segment `i`, most misaligned first so near-straight ribbons end on top.
fn draw_order(layout: &Layout, i: usize) -> Vec<&Path> {
    let source = layout.axes[i].rank_map();
    let target = layout.axes[i + 1].rank_map();
    let misalignment = |p: &Path| {
        let s = source.get(p.values[i].as_str()).copied().unwrap_or(0);
        let t = target.get(p.values[i + 1].as_str()).copied().unwrap_or(0);
        s.abs_diff(t)
    };

    let mut paths: Vec<&Path> = layout.paths.iter().collect();
    paths.sort_by_key(|p| std::cmp::Reverse(misalignment(p)));
    paths
}

/// Outline of a ribbon: a cubic top edge from (x1, y1) to (x2, y2), a straight
/// drop of `h`, and the mirrored bottom edge back. Control points sit at 25% and
/// 75% of the horizontal gap.
fn ribbon(x1: f64, y1: f64, x2: f64, y2: f64, h: f64) -> Vec<(i32, i32)> {
    let cp1 = x1 + (x2 - x1) * 0.25;
    let cp2 = x1 + (x2 - x1) * 0.75;

    let mut points = Vec::with_capacity(2 * (CURVE_STEPS + 1));
    for step in 0..=CURVE_STEPS {
        let t = step as f64 / CURVE_STEPS as f64;
        points.push(to_pixel(cubic(x1, cp1, cp2, x2, t), cubic(y1, y1, y2, y2, t)));
    }
    for step in (0..=CURVE_STEPS).rev() {
        let t = step as f64 / CURVE_STEPS as f64;
        points.push(to_pixel(
            cubic(x1, cp1, cp2, x2, t),
            cubic(y1 + h, y1 + h, y2 + h, y2 + h, t),
        ));
    }
    points
}

fn cubic(p0: f64, p1: f64, p2: f64, p3: f64, t: f64) -> f64 {
    let mt = 1.0 - t;
    mt * mt * mt * p0 + 3.0 * mt * mt * t * p1 + 3.0 * mt * t * t * p2 + t * t * t * p3
}

/// Plot coordinates to backend pixels
fn to_pixel(x: f64, y: f64) -> (i32, i32) {
    ((x + MARGIN).round() as i32, (y + MARGIN).round() as i32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{Dataset, Value};
    use crate::engine::{ParsetEngine, ViewInput};
    use crate::selection::SelectionSet;

    fn frame(selection: &SelectionSet) -> Frame {
        let rows = [("furnished", "2"), ("furnished", "0"), ("unfurnished", "0")];
        let ds = Dataset::new(
            vec!["furnishingstatus".to_string(), "parking".to_string()],
            rows.iter()
                .map(|(a, b)| vec![Value::Text(a.to_string()), Value::Text(b.to_string())])
                .collect(),
        );
        let axes = vec!["furnishingstatus".to_string(), "parking".to_string()];
        ParsetEngine::default().render(&ds, &ViewInput::new(&axes, selection))
    }

    #[test]
    fn test_cubic_endpoints() {
        assert_eq!(cubic(1.0, 5.0, 9.0, 3.0, 0.0), 1.0);
        assert_eq!(cubic(1.0, 5.0, 9.0, 3.0, 1.0), 3.0);
        assert_eq!(cubic(0.0, 0.0, 10.0, 10.0, 0.5), 5.0);
    }

    #[test]
    fn test_ribbon_outline() {
        let points = ribbon(0.0, 10.0, 100.0, 50.0, 20.0);
        assert_eq!(points.len(), 2 * (CURVE_STEPS + 1));
        assert_eq!(points[0], to_pixel(0.0, 10.0));
        assert_eq!(points[CURVE_STEPS], to_pixel(100.0, 50.0));
        assert_eq!(points[CURVE_STEPS + 1], to_pixel(100.0, 70.0));
        assert_eq!(points[points.len() - 1], to_pixel(0.0, 30.0));
    }

    #[test]
    fn test_draw_order_puts_straight_ribbons_last() {
        let frame = frame(&SelectionSet::new());
        let order = draw_order(&frame.layout, 0);
        assert_eq!(order.len(), frame.layout.paths.len());
        let last = order[order.len() - 1];
        let s = frame.layout.axes[0].rank(&last.values[0]).unwrap();
        let t = frame.layout.axes[1].rank(&last.values[1]).unwrap();
        assert_eq!(s, t);
    }

    #[test]
    fn test_canvas_size() {
        let frame = frame(&SelectionSet::new());
        let options = LayoutOptions::default();
        assert_eq!(Canvas::new(&frame, &options).size(), (940, 440));
    }

    #[test]
    fn test_render_svg() {
        let selection: SelectionSet = [("parking", "0")].into_iter().collect();
        let frame = frame(&selection);
        let svg = render_svg(&frame, &LayoutOptions::default()).unwrap();
        assert!(svg.contains("<svg"));
        assert!(svg.contains("furnishingstatus"));
        assert!(svg.contains("<polygon"));
    }

    #[test]
    fn test_render_png_rejects_oversized_canvas() {
        let frame = frame(&SelectionSet::new());
        let options = LayoutOptions {
            width: 40000.0,
            height: 40000.0,
            ..LayoutOptions::default()
        };
        let canvas = Canvas::new(&frame, &options);
        assert_eq!(canvas.size(), (40140, 40040));

        let err = canvas.render_png().unwrap_err();
        assert!(err.to_string().contains("canvas too large"));
    }

    #[test]
    fn test_render_png() {
        let frame = frame(&SelectionSet::new());
        let png = render_png(&frame, &LayoutOptions::default()).unwrap();
        assert_eq!(&png[..4], &[137, 80, 78, 71]);
    }
}
