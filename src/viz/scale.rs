//! Scale Builder: domains, ranges, pixel mapping and ticks.

use crate::models::PlotPoints;
use ahash::AHashMap;

/// Pixel margins around the plot area.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Margin {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

/// Logical canvas budget for one chart.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Layout {
    pub width: f64,
    pub height: f64,
    pub margin: Margin,
}

/// 400×300 with margins 20/20/30/40, leaving a 340×250 plot area.
pub const CANVAS: Layout = Layout {
    width: 400.0,
    height: 300.0,
    margin: Margin {
        top: 20.0,
        right: 20.0,
        bottom: 30.0,
        left: 40.0,
    },
};

impl Default for Layout {
    fn default() -> Self {
        CANVAS
    }
}

impl Layout {
    pub fn plot_width(&self) -> f64 {
        self.width - self.margin.left - self.margin.right
    }

    pub fn plot_height(&self) -> f64 {
        self.height - self.margin.top - self.margin.bottom
    }
}

/// Continuous linear mapping `domain → range`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearScale {
    pub domain: (f64, f64),
    pub range: (f64, f64),
}

impl LinearScale {
    pub fn new(domain: (f64, f64), range: (f64, f64)) -> Self {
        Self { domain, range }
    }

    /// Map a data value to pixels. `NaN` maps to `NaN`; a zero-width domain
    /// maps everything to the middle of the range.
    pub fn map(&self, v: f64) -> f64 {
        let (d0, d1) = self.domain;
        let (r0, r1) = self.range;
        let span = d1 - d0;
        if span == 0.0 {
            return (r0 + r1) / 2.0;
        }
        r0 + (v - d0) / span * (r1 - r0)
    }

    /// Roughly `count` round tick values inside the domain (1/2/5 × 10ⁿ steps).
    pub fn ticks(&self, count: usize) -> Vec<f64> {
        ticks(self.domain.0, self.domain.1, count)
    }

    /// Spacing between the ticks returned by [`LinearScale::ticks`].
    pub fn tick_step(&self, count: usize) -> f64 {
        let (lo, hi) = order(self.domain.0, self.domain.1);
        tick_step(lo, hi, count)
    }
}

/// Discrete bands over categories in first-seen order.
///
/// Inner and outer padding are the same fraction of the step, and bands are
/// centered in the range.
#[derive(Debug, Clone, PartialEq)]
pub struct BandScale {
    domain: Vec<String>,
    index: AHashMap<String, usize>,
    range: (f64, f64),
    padding: f64,
    start: f64,
    step: f64,
    bandwidth: f64,
}

impl BandScale {
    pub fn new<I, S>(labels: I, range: (f64, f64), padding: f64) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut index: AHashMap<String, usize> = AHashMap::new();
        let mut domain = Vec::new();
        for l in labels {
            let l = l.as_ref();
            if !index.contains_key(l) {
                index.insert(l.to_string(), domain.len());
                domain.push(l.to_string());
            }
        }

        let n = domain.len() as f64;
        let (lo, hi) = order(range.0, range.1);
        let step = (hi - lo) / (n - padding + 2.0 * padding).max(1.0);
        let start = lo + (hi - lo - step * (n - padding)) * 0.5;
        Self {
            domain,
            index,
            range,
            padding,
            start,
            step,
            bandwidth: step * (1.0 - padding),
        }
    }

    pub fn domain(&self) -> &[String] {
        &self.domain
    }

    pub fn range(&self) -> (f64, f64) {
        self.range
    }

    pub fn padding(&self) -> f64 {
        self.padding
    }

    pub fn bandwidth(&self) -> f64 {
        self.bandwidth
    }

    pub fn step(&self) -> f64 {
        self.step
    }

    /// Left edge of the band for `label`.
    pub fn position(&self, label: &str) -> Option<f64> {
        self.index
            .get(label)
            .map(|&i| self.start + self.step * i as f64)
    }
}

/// Horizontal scale: categorical for bars, linear otherwise.
#[derive(Debug, Clone, PartialEq)]
pub enum XScale {
    Band(BandScale),
    Linear(LinearScale),
}

/// Scales for one render pass, plus the layout they were derived from.
#[derive(Debug, Clone, PartialEq)]
pub struct Scales {
    pub layout: Layout,
    pub x: XScale,
    pub y: LinearScale,
}

pub const BAND_PADDING: f64 = 0.1;

/// Build the scales for `points` inside `layout`'s plot area. Vertical ranges
/// are inverted so larger values sit higher on screen.
///
/// - bar: bands over countries; y over `[min, max]` intensity
/// - line: x over `[min, max]` start year; y over `[0, max]` intensity
/// - scatter: x over `[0, max]` relevance; y over `[0, max]` likelihood
///
/// `NaN` values are ignored when computing extents. A zero-width domain is
/// widened to `[v - 1, v + 1]`; a dimension without numeric values gets `[0, 1]`.
pub fn build(points: &PlotPoints, layout: &Layout) -> Scales {
    let x_range = (0.0, layout.plot_width());
    let y_range = (layout.plot_height(), 0.0);
    let (x, y_domain) = match points {
        PlotPoints::Bar(v) => {
            let band = BandScale::new(v.iter().map(|p| p.country.as_str()), x_range, BAND_PADDING);
            let ys = || v.iter().map(|p| p.intensity);
            (XScale::Band(band), extent(min_of(ys()), max_of(ys())))
        }
        PlotPoints::Line(v) => {
            let xs = || v.iter().map(|p| p.start_year);
            let x_domain = extent(min_of(xs()), max_of(xs()));
            let y_domain = extent(Some(0.0), max_of(v.iter().map(|p| p.intensity)));
            (XScale::Linear(LinearScale::new(x_domain, x_range)), y_domain)
        }
        PlotPoints::Scatter(v) => {
            let x_domain = extent(Some(0.0), max_of(v.iter().map(|p| p.relevance)));
            let y_domain = extent(Some(0.0), max_of(v.iter().map(|p| p.likelihood)));
            (XScale::Linear(LinearScale::new(x_domain, x_range)), y_domain)
        }
    };
    Scales {
        layout: *layout,
        x,
        y: LinearScale::new(y_domain, y_range),
    }
}

fn min_of(values: impl Iterator<Item = f64>) -> Option<f64> {
    values.filter(|v| !v.is_nan()).reduce(f64::min)
}

fn max_of(values: impl Iterator<Item = f64>) -> Option<f64> {
    values.filter(|v| !v.is_nan()).reduce(f64::max)
}

fn extent(lo: Option<f64>, hi: Option<f64>) -> (f64, f64) {
    match (lo, hi) {
        (Some(lo), Some(hi)) => {
            if lo == hi {
                (lo - 1.0, hi + 1.0)
            } else {
                (lo, hi)
            }
        }
        _ => (0.0, 1.0),
    }
}

fn order(a: f64, b: f64) -> (f64, f64) {
    if b < a { (b, a) } else { (a, b) }
}

fn tick_step(lo: f64, hi: f64, count: usize) -> f64 {
    let raw = (hi - lo) / count.max(1) as f64;
    if !raw.is_finite() || raw <= 0.0 {
        return 0.0;
    }
    let power = raw.log10().floor();
    let base = 10f64.powf(power);
    let error = raw / base;
    let factor = if error >= 50f64.sqrt() {
        10.0
    } else if error >= 10f64.sqrt() {
        5.0
    } else if error >= 2f64.sqrt() {
        2.0
    } else {
        1.0
    };
    factor * base
}

fn ticks(d0: f64, d1: f64, count: usize) -> Vec<f64> {
    if !d0.is_finite() || !d1.is_finite() || count == 0 {
        return Vec::new();
    }
    if d0 == d1 {
        return vec![d0];
    }
    let (lo, hi) = order(d0, d1);
    let step = tick_step(lo, hi, count);
    if step <= 0.0 {
        return Vec::new();
    }
    let first = (lo / step).ceil() as i64;
    let last = (hi / step).floor() as i64;
    // Multiply integer indices rather than accumulate, which avoids drift.
    let mut out: Vec<f64> = (first..=last).map(|i| i as f64 * step).collect();
    if d1 < d0 {
        out.reverse();
    }
    out
}
