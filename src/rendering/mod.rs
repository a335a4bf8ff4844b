//! Chart rendering.
//!
//! Renders the time series snapshot to a static SVG: one polyline per
//! category over the relative-time axis, with a dashed alert-threshold
//! line and a legend. The SVG is assembled as a string and written
//! atomically (temp file + rename) so the status server never serves a
//! half-written artifact.

use crate::series::TimeSeriesStore;
use crate::{Error, Result};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

/// Line colors, cycled per category index.
const PALETTE: [&str; 6] = [
    "#1f77b4", "#d62728", "#2ca02c", "#ff7f0e", "#9467bd", "#8c564b",
];

/// Color of the alert-threshold line.
const THRESHOLD_COLOR: &str = "#0000ff";

/// Renders a series snapshot to a static artifact.
pub trait ChartRenderer {
    /// Renders the snapshot with one named series per category label.
    ///
    /// # Errors
    ///
    /// Returns an error if the artifact cannot be produced. Callers treat
    /// render failures as recoverable.
    fn render(&self, series: &TimeSeriesStore, labels: &[&str]) -> Result<()>;
}

/// SVG polyline chart of per-category keyword counts over relative time.
#[derive(Debug, Clone)]
pub struct SvgChart {
    path: PathBuf,
    title: String,
    threshold: u64,
    width: u32,
    height: u32,
}

/// Plot margins in pixels: top, right, bottom, left. The right margin
/// leaves room for the legend.
const MARGINS: (f64, f64, f64, f64) = (48.0, 170.0, 48.0, 60.0);

impl SvgChart {
    /// Creates a renderer writing to `path` with the given chart title.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, title: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            title: title.into(),
            threshold: 0,
            width: 1000,
            height: 500,
        }
    }

    /// Sets the alert threshold drawn as a dashed horizontal line
    /// (disabled when zero).
    #[must_use]
    pub const fn with_threshold(mut self, threshold: u64) -> Self {
        self.threshold = threshold;
        self
    }

    /// Sets the artifact dimensions in pixels.
    #[must_use]
    pub const fn with_dimensions(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// Path of the rendered artifact.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Builds the SVG document for a snapshot.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn build_svg(&self, series: &TimeSeriesStore, labels: &[&str]) -> String {
        let w = f64::from(self.width);
        let h = f64::from(self.height);
        let (top, right, bottom, left) = MARGINS;
        let plot_w = w - left - right;
        let plot_h = h - top - bottom;

        let axis = series.axis();
        let x_min = axis.first().copied().unwrap_or(-1.0).min(-1.0);
        let (_, observed_max) = series.bounds();
        let y_max = (observed_max.max(self.threshold).max(1) as f64) * 1.1;

        let map_x = |t: f64| left + (t - x_min) / (0.0 - x_min) * plot_w;
        let map_y = |v: f64| top + plot_h - (v / y_max) * plot_h;

        let mut svg = String::with_capacity(4096);
        let _ = write!(
            svg,
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{}" height="{}" viewBox="0 0 {w} {h}">"#,
            self.width, self.height
        );
        let _ = write!(
            svg,
            r##"<rect width="{w}" height="{h}" fill="#ffffff"/>"##
        );

        // Title
        let timestamp = chrono::Local::now().format("%H:%M:%S %z %b %d %Y");
        let _ = write!(
            svg,
            r#"<text x="{}" y="24" font-family="sans-serif" font-size="16" text-anchor="middle">{} ({timestamp})</text>"#,
            w / 2.0,
            escape(&self.title)
        );

        // Frame and axis labels
        let _ = write!(
            svg,
            r##"<rect x="{left}" y="{top}" width="{plot_w}" height="{plot_h}" fill="none" stroke="#888888"/>"##
        );
        let _ = write!(
            svg,
            r#"<text x="{}" y="{}" font-family="sans-serif" font-size="12" text-anchor="middle">time (min)</text>"#,
            left + plot_w / 2.0,
            h - 10.0
        );
        for step in 0..=4u32 {
            let frac = f64::from(step) / 4.0;
            let t = x_min * (1.0 - frac);
            let v = y_max * frac;
            let _ = write!(
                svg,
                r#"<text x="{:.1}" y="{:.1}" font-family="sans-serif" font-size="10" text-anchor="middle">{t:.1}</text>"#,
                map_x(t),
                top + plot_h + 14.0
            );
            let _ = write!(
                svg,
                r#"<text x="{:.1}" y="{:.1}" font-family="sans-serif" font-size="10" text-anchor="end">{v:.0}</text>"#,
                left - 6.0,
                map_y(v) + 3.0
            );
        }

        // Alert threshold
        if self.threshold > 0 {
            let y = map_y(self.threshold as f64);
            let _ = write!(
                svg,
                r#"<line x1="{left}" y1="{y:.1}" x2="{:.1}" y2="{y:.1}" stroke="{THRESHOLD_COLOR}" stroke-dasharray="6 5"/>"#,
                left + plot_w
            );
        }

        // One polyline per category
        for (index, label) in labels.iter().enumerate() {
            let Some(counts) = series.series(index) else {
                continue;
            };
            let color = PALETTE[index % PALETTE.len()];

            if counts.len() == 1 {
                let _ = write!(
                    svg,
                    r#"<circle cx="{:.1}" cy="{:.1}" r="3" fill="{color}"/>"#,
                    map_x(axis[0]),
                    map_y(counts[0] as f64)
                );
            } else if !counts.is_empty() {
                let mut points = String::new();
                for (t, count) in axis.iter().zip(&counts) {
                    let _ = write!(points, "{:.1},{:.1} ", map_x(*t), map_y(*count as f64));
                }
                let _ = write!(
                    svg,
                    r#"<polyline points="{}" fill="none" stroke="{color}" stroke-width="1.5"/>"#,
                    points.trim_end()
                );
            }

            // Legend entry
            let ly = top + 16.0 + 18.0 * index as f64;
            let lx = left + plot_w + 14.0;
            let _ = write!(
                svg,
                r#"<line x1="{lx:.1}" y1="{ly:.1}" x2="{:.1}" y2="{ly:.1}" stroke="{color}" stroke-width="2"/>"#,
                lx + 20.0
            );
            let _ = write!(
                svg,
                r#"<text x="{:.1}" y="{:.1}" font-family="sans-serif" font-size="11">{}</text>"#,
                lx + 26.0,
                ly + 4.0,
                escape(label)
            );
        }
        if self.threshold > 0 {
            let ly = top + 16.0 + 18.0 * labels.len() as f64;
            let lx = left + plot_w + 14.0;
            let _ = write!(
                svg,
                r#"<line x1="{lx:.1}" y1="{ly:.1}" x2="{:.1}" y2="{ly:.1}" stroke="{THRESHOLD_COLOR}" stroke-dasharray="6 5"/>"#,
                lx + 20.0
            );
            let _ = write!(
                svg,
                r#"<text x="{:.1}" y="{:.1}" font-family="sans-serif" font-size="11">alert level</text>"#,
                lx + 26.0,
                ly + 4.0
            );
        }

        svg.push_str("</svg>");
        svg
    }
}

impl ChartRenderer for SvgChart {
    fn render(&self, series: &TimeSeriesStore, labels: &[&str]) -> Result<()> {
        let svg = self.build_svg(series, labels);

        let tmp = self.path.with_extension("svg.tmp");
        std::fs::write(&tmp, svg.as_bytes())
            .map_err(|e| Error::operation("write_chart", e))?;
        std::fs::rename(&tmp, &self.path).map_err(|e| Error::operation("write_chart", e))
    }
}

/// Minimal XML text escaping for labels and titles.
fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_series() -> TimeSeriesStore {
        let mut store = TimeSeriesStore::new(2, 100).unwrap();
        store.append(vec![1, 4], 0.5).unwrap();
        store.append(vec![2, 2], 0.5).unwrap();
        store.append(vec![3, 8], 0.5).unwrap();
        store
    }

    #[test]
    fn test_build_svg_has_one_polyline_per_category() {
        let chart = SvgChart::new("out.svg", "demo").with_threshold(10);
        let svg = chart.build_svg(&sample_series(), &["A", "B"]);

        assert!(svg.starts_with("<svg"));
        assert!(svg.ends_with("</svg>"));
        assert_eq!(svg.matches("<polyline").count(), 2);
        assert!(svg.contains("stroke-dasharray"));
        assert!(svg.contains(">A</text>"));
        assert!(svg.contains(">B</text>"));
        assert!(svg.contains("alert level"));
    }

    #[test]
    fn test_build_svg_single_sample_uses_markers() {
        let mut store = TimeSeriesStore::new(1, 10).unwrap();
        store.append(vec![3], 0.5).unwrap();
        let chart = SvgChart::new("out.svg", "demo");
        let svg = chart.build_svg(&store, &["A"]);
        assert!(svg.contains("<circle"));
        assert!(!svg.contains("<polyline"));
    }

    #[test]
    fn test_build_svg_empty_series_still_valid() {
        let store = TimeSeriesStore::new(1, 10).unwrap();
        let chart = SvgChart::new("out.svg", "demo");
        let svg = chart.build_svg(&store, &["A"]);
        assert!(svg.starts_with("<svg"));
        assert!(svg.ends_with("</svg>"));
    }

    #[test]
    fn test_render_writes_artifact_atomically() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chart.svg");
        let chart = SvgChart::new(&path, "demo").with_threshold(5);

        chart.render(&sample_series(), &["A", "B"]).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.contains("</svg>"));
        assert!(!dir.path().join("chart.svg.tmp").exists());
    }

    #[test]
    fn test_labels_are_escaped() {
        let chart = SvgChart::new("out.svg", "a <b> & c");
        let svg = chart.build_svg(&sample_series(), &["x<y"]);
        assert!(svg.contains("a &lt;b&gt; &amp; c"));
        assert!(svg.contains("x&lt;y"));
    }
}
