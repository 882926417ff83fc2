//! Line chart renderer.
//!
//! Drawing goes through the [`Canvas`] trait. [`Surface`] is the recording
//! canvas owned by canvas nodes in the UI tree; front ends replay its ops.

use serde::Serialize;

use crate::theme::{ThemeContext, AXIS_COLOR, GRID_COLOR};

/// Default canvas size for chart tabs.
pub const CHART_WIDTH: u32 = 640;
pub const CHART_HEIGHT: u32 = 320;

/// Horizontal grid lines inside the plot area (axes excluded).
const GRID_LINES: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// Space reserved around the plot area, in canvas units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Margins {
    pub left: f64,
    pub right: f64,
    pub top: f64,
    pub bottom: f64,
}

impl Default for Margins {
    fn default() -> Self {
        Self {
            left: 48.0,
            right: 16.0,
            top: 16.0,
            bottom: 28.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Stroke {
    pub color: String,
    pub width: f64,
}

impl Stroke {
    pub fn new(color: impl Into<String>, width: f64) -> Self {
        Self {
            color: color.into(),
            width,
        }
    }
}

/// One recorded drawing instruction.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum DrawOp {
    Clear,
    Line { from: Point, to: Point, stroke: Stroke },
    Polyline { points: Vec<Point>, stroke: Stroke },
    Label { at: Point, text: String, color: String },
}

/// 2D drawing target. Coordinates grow right and down from the top-left.
pub trait Canvas {
    fn size(&self) -> (f64, f64);
    fn clear(&mut self);
    fn line(&mut self, from: Point, to: Point, stroke: &Stroke);
    fn polyline(&mut self, points: &[Point], stroke: &Stroke);
    fn label(&mut self, at: Point, text: &str, color: &str);
}

/// Recording canvas.
#[derive(Debug, Clone, PartialEq)]
pub struct Surface {
    width: u32,
    height: u32,
    ops: Vec<DrawOp>,
}

impl Surface {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            ops: Vec::new(),
        }
    }

    pub fn ops(&self) -> &[DrawOp] {
        &self.ops
    }

    /// Polylines recorded since the last clear.
    pub fn polylines(&self) -> impl Iterator<Item = (&[Point], &Stroke)> {
        self.ops.iter().filter_map(|op| match op {
            DrawOp::Polyline { points, stroke } => Some((points.as_slice(), stroke)),
            _ => None,
        })
    }
}

impl Canvas for Surface {
    fn size(&self) -> (f64, f64) {
        (f64::from(self.width), f64::from(self.height))
    }

    fn clear(&mut self) {
        self.ops.clear();
        self.ops.push(DrawOp::Clear);
    }

    fn line(&mut self, from: Point, to: Point, stroke: &Stroke) {
        self.ops.push(DrawOp::Line {
            from,
            to,
            stroke: stroke.clone(),
        });
    }

    fn polyline(&mut self, points: &[Point], stroke: &Stroke) {
        self.ops.push(DrawOp::Polyline {
            points: points.to_vec(),
            stroke: stroke.clone(),
        });
    }

    fn label(&mut self, at: Point, text: &str, color: &str) {
        self.ops.push(DrawOp::Label {
            at,
            text: text.to_string(),
            color: color.to_string(),
        });
    }
}

/// Value range of a series over its finite samples.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChartRange {
    pub min: f64,
    pub max: f64,
}

impl ChartRange {
    /// `None` for an empty series. A series with no finite sample reads as
    /// a flat zero range.
    pub fn of(series: &[f64]) -> Option<Self> {
        if series.is_empty() {
            return None;
        }
        let (min, max) = series
            .iter()
            .copied()
            .filter(|v| v.is_finite())
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
                (lo.min(v), hi.max(v))
            });
        if min.is_finite() {
            Some(Self { min, max })
        } else {
            Some(Self { min: 0.0, max: 0.0 })
        }
    }

    pub fn is_flat(&self) -> bool {
        self.max == self.min
    }

    /// Position of `v` within the range, 0 at `min` and 1 at `max`.
    /// Ranges wider than `f64::MAX` are scaled at half magnitude.
    pub fn fraction(&self, v: f64) -> f64 {
        let span = self.max - self.min;
        let t = if span.is_finite() {
            (v - self.min) / span
        } else {
            (v / 2.0 - self.min / 2.0) / (self.max / 2.0 - self.min / 2.0)
        };
        t.clamp(0.0, 1.0)
    }
}

/// Map a series to canvas coordinates.
///
/// x(i) = left + i * plot_width / max(n - 1, 1)
/// y(v) = height - bottom - (v - min) / (max - min) * plot_height
///
/// A flat series (max == min) sits at mid-height of the plot area.
/// Non-finite samples project as `min`.
pub fn project(series: &[f64], width: f64, height: f64, margins: &Margins) -> Vec<Point> {
    let Some(range) = ChartRange::of(series) else {
        return Vec::new();
    };
    let plot_w = width - margins.left - margins.right;
    let plot_h = height - margins.top - margins.bottom;
    let x_step = plot_w / (series.len().saturating_sub(1).max(1) as f64);

    series
        .iter()
        .enumerate()
        .map(|(i, &v)| {
            let x = margins.left + i as f64 * x_step;
            let y = if range.is_flat() {
                margins.top + plot_h / 2.0
            } else {
                let v = if v.is_finite() { v } else { range.min };
                height - margins.bottom - range.fraction(v) * plot_h
            };
            Point::new(x, y)
        })
        .collect()
}

/// Draw `series` as a line chart: grid and axes first, data on top.
///
/// The line color comes from the theme at draw time. An empty series clears
/// the canvas and draws a "no data" label. Returns the plotted range.
pub fn draw_line_chart(
    canvas: &mut dyn Canvas,
    series: &[f64],
    theme: &ThemeContext,
) -> Option<ChartRange> {
    draw_line_chart_with(canvas, series, theme, &Margins::default())
}

pub fn draw_line_chart_with(
    canvas: &mut dyn Canvas,
    series: &[f64],
    theme: &ThemeContext,
    margins: &Margins,
) -> Option<ChartRange> {
    let (width, height) = canvas.size();
    canvas.clear();

    let Some(range) = ChartRange::of(series) else {
        canvas.label(Point::new(width / 2.0, height / 2.0), "no data", AXIS_COLOR);
        return None;
    };

    let left = margins.left;
    let right = width - margins.right;
    let top = margins.top;
    let bottom = height - margins.bottom;

    let grid = Stroke::new(GRID_COLOR, 1.0);
    for i in 1..=GRID_LINES {
        let y = top + (bottom - top) * i as f64 / (GRID_LINES + 1) as f64;
        canvas.line(Point::new(left, y), Point::new(right, y), &grid);
    }

    let axis = Stroke::new(AXIS_COLOR, 1.0);
    canvas.line(Point::new(left, top), Point::new(left, bottom), &axis);
    canvas.line(Point::new(left, bottom), Point::new(right, bottom), &axis);
    canvas.label(Point::new(2.0, top), &axis_label(range.max), AXIS_COLOR);
    canvas.label(Point::new(2.0, bottom), &axis_label(range.min), AXIS_COLOR);

    let points = project(series, width, height, margins);
    let stroke = Stroke::new(theme.line_color(), 2.0);
    canvas.polyline(&points, &stroke);

    tracing::debug!(points = points.len(), min = range.min, max = range.max, "line chart drawn");
    Some(range)
}

fn axis_label(v: f64) -> String {
    if v.abs() >= 1000.0 {
        format!("{v:.0}")
    } else {
        format!("{v:.2}")
    }
}
