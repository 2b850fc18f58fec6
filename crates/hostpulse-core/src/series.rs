//! Display series and the plot-surface seam.
//!
//! Families turn their windows into [`DisplaySeries`] on every update; the
//! active family's series plus a [`ChartLayout`] are handed to a
//! [`PlotSurface`] as one [`Redraw`]. Series are never a source of truth and
//! are rebuilt from scratch each time.

use serde::Serialize;

use crate::families::FamilyKind;
use crate::window::Sample;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LineWeight {
    #[default]
    Thin,
    Bold,
}

/// Colour hint left to the surface to resolve against its theme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Highlight {
    /// Black on a light theme, white on a dark one.
    Contrast,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LegendOrder {
    #[default]
    Normal,
    Reversed,
}

/// One drawable line.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DisplaySeries {
    /// Current formatted reading, e.g. `Core 3: 43%`.
    pub label: String,
    /// Elapsed seconds, oldest-first.
    pub x: Vec<f64>,
    /// Scaled values; gaps stay gaps.
    pub y: Vec<Sample>,
    pub weight: LineWeight,
    pub show_legend: bool,
    pub highlight: Option<Highlight>,
}

impl DisplaySeries {
    pub fn new(label: impl Into<String>, x: Vec<f64>, y: Vec<Sample>) -> Self {
        Self {
            label: label.into(),
            x,
            y,
            weight: LineWeight::Thin,
            show_legend: true,
            highlight: None,
        }
    }

    pub fn bold(mut self) -> Self {
        self.weight = LineWeight::Bold;
        self
    }

    pub fn legend(mut self, show: bool) -> Self {
        self.show_legend = show;
        self
    }

    pub fn highlight(mut self, highlight: Highlight) -> Self {
        self.highlight = Some(highlight);
        self
    }

    pub fn latest(&self) -> Sample {
        self.y.last().copied().flatten()
    }

    /// `(x, y)` pairs with gaps dropped.
    pub fn points(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.x
            .iter()
            .zip(&self.y)
            .filter_map(|(x, y)| y.map(|y| (*x, y)))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartLayout {
    pub chart_title: String,
    pub y_title: String,
    pub y_max: f64,
    pub legend_order: LegendOrder,
    /// Seconds covered by the x axis.
    pub x_span: f64,
}

/// Everything a surface needs for one redraw of the active family.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Redraw {
    pub family: FamilyKind,
    pub layout: ChartLayout,
    pub series: Vec<DisplaySeries>,
    /// Extra text lines (totals, mount usage, outlet list).
    pub notes: Vec<String>,
}

impl Redraw {
    /// Series labels in legend order, skipping legend-hidden series.
    pub fn legend(&self) -> Vec<&str> {
        let shown = self
            .series
            .iter()
            .filter(|s| s.show_legend)
            .map(|s| s.label.as_str());
        match self.layout.legend_order {
            LegendOrder::Normal => shown.collect(),
            LegendOrder::Reversed => {
                let mut v: Vec<&str> = shown.collect();
                v.reverse();
                v
            }
        }
    }
}

/// Something that can draw a chart.
pub trait PlotSurface {
    fn redraw(&mut self, frame: &Redraw);
}

/// Keeps every frame it is given. Used headless and in tests.
#[derive(Debug, Default)]
pub struct RecordingSurface {
    frames: Vec<Redraw>,
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn frames(&self) -> &[Redraw] {
        &self.frames
    }

    pub fn last(&self) -> Option<&Redraw> {
        self.frames.last()
    }

    pub fn clear(&mut self) {
        self.frames.clear();
    }
}

impl PlotSurface for RecordingSurface {
    fn redraw(&mut self, frame: &Redraw) {
        self.frames.push(frame.clone());
    }
}

/// Surface that keeps only the newest frame.
#[derive(Debug, Default)]
pub struct LatestFrame(pub Option<Redraw>);

impl PlotSurface for LatestFrame {
    fn redraw(&mut self, frame: &Redraw) {
        self.0 = Some(frame.clone());
    }
}

/// Elapsed-seconds x axis for `len` samples `period` apart, oldest first.
///
/// The newest sample sits at `0`.
pub fn elapsed_axis(len: usize, period: f64) -> Vec<f64> {
    (0..len).rev().map(|i| i as f64 * period).collect()
}
