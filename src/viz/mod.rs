//! Visualization: scales, the drawing surface, the renderer and SVG output.
//!
//! - One chart form per [`ChartKind`]: bars over countries, a line over start
//!   years, a scatter of relevance vs likelihood
//! - Full redraw on every call: the surface is cleared before axes and marks go in
//! - Locale-aware tick labels (`2,016` vs `2.016`)
//! - SVG serialisation through Plotters

pub mod scale;
pub mod surface;
pub mod svg;
pub mod util;

pub use scale::{BandScale, CANVAS, Layout, LinearScale, Margin, Scales, XScale};
pub use surface::{Anchor, Axis, AxisOrient, AxisTitle, Element, Rgb, Surface, Tick};
pub use svg::{save_svg, to_svg};

use crate::geometry;
use crate::models::{ChartKind, PlotPoints, RawRecord};
use log::warn;
use surface::{BLUE, ORANGE, YELLOW};
use util::format_tick;

/// Approximate number of ticks on linear axes.
pub const TICK_COUNT: usize = 10;

/// Plot points together with the scales derived from them. Built fresh for
/// every render pass.
#[derive(Debug, Clone, PartialEq)]
pub struct Chart {
    points: PlotPoints,
    scales: Scales,
}

impl Chart {
    pub fn new(points: PlotPoints, layout: &Layout) -> Self {
        let scales = scale::build(&points, layout);
        Self { points, scales }
    }

    /// Transform `records` for `kind` and build scales in one go.
    pub fn from_records(kind: ChartKind, records: &[RawRecord], layout: &Layout) -> Self {
        Self::new(geometry::transform(kind, records), layout)
    }

    pub fn kind(&self) -> ChartKind {
        self.points.kind()
    }

    pub fn points(&self) -> &PlotPoints {
        &self.points
    }

    pub fn scales(&self) -> &Scales {
        &self.scales
    }
}

fn axis_titles(kind: ChartKind) -> (&'static str, &'static str) {
    match kind {
        ChartKind::Bar => ("Countries", "Intensity"),
        ChartKind::Line => ("Start Year", "Intensity"),
        ChartKind::Scatter => ("Relevance", "Likelihood"),
    }
}

/// Redraw `surface` for `chart`. `None` (no kind selected) leaves it empty.
///
/// Idempotent: rendering the same chart twice yields the same surface.
pub fn render(surface: &mut Surface, chart: Option<&Chart>, locale_tag: &str) {
    surface.clear();
    let Some(chart) = chart else {
        return;
    };
    let s = &chart.scales;
    let m = s.layout.margin;
    let plot_w = s.layout.plot_width();
    let plot_h = s.layout.plot_height();
    let (x_title, y_title) = axis_titles(chart.kind());

    let bottom_ticks = match &s.x {
        XScale::Band(band) => band
            .domain()
            .iter()
            .filter_map(|label| {
                band.position(label).map(|x| Tick {
                    offset: x + band.bandwidth() / 2.0,
                    label: label.clone(),
                })
            })
            .collect(),
        XScale::Linear(x) => linear_ticks(x, locale_tag),
    };
    surface.push(Element::Axis(Axis {
        orient: AxisOrient::Bottom,
        origin: (m.left, m.top + plot_h),
        length: plot_w,
        ticks: bottom_ticks,
        title: AxisTitle {
            text: x_title.into(),
            dx: plot_w / 2.0,
            dy: m.bottom,
            rotated: false,
            anchor: Anchor::Middle,
        },
    }));

    // The bar caption hugs the top of the axis; the others are centered on it.
    let (title_dx, title_dy) = match chart.kind() {
        ChartKind::Bar => (-m.left + 5.0, 0.0),
        ChartKind::Line | ChartKind::Scatter => (-m.left + 15.0, plot_h / 2.0),
    };
    surface.push(Element::Axis(Axis {
        orient: AxisOrient::Left,
        origin: (m.left, m.top),
        length: plot_h,
        ticks: linear_ticks(&s.y, locale_tag),
        title: AxisTitle {
            text: y_title.into(),
            dx: title_dx,
            dy: title_dy,
            rotated: true,
            anchor: Anchor::End,
        },
    }));

    match (&chart.points, &s.x) {
        (PlotPoints::Bar(points), XScale::Band(band)) => {
            for p in points {
                let y = s.y.map(p.intensity);
                surface.push(Element::Rect {
                    x: band.position(&p.country).unwrap_or(f64::NAN) + m.left,
                    y: y + m.top,
                    width: band.bandwidth(),
                    height: plot_h - y,
                    fill: YELLOW,
                });
            }
        }
        (PlotPoints::Line(points), XScale::Linear(x)) => {
            // Array order, not x order.
            let path = points
                .iter()
                .map(|p| (x.map(p.start_year) + m.left, s.y.map(p.intensity) + m.top))
                .collect();
            surface.push(Element::Path {
                points: path,
                stroke: BLUE,
                stroke_width: 2.0,
            });
        }
        (PlotPoints::Scatter(points), XScale::Linear(x)) => {
            for p in points {
                surface.push(Element::Circle {
                    cx: x.map(p.relevance) + m.left,
                    cy: s.y.map(p.likelihood) + m.top,
                    r: 5.0,
                    fill: ORANGE,
                });
            }
        }
        _ => warn!("no horizontal scale matches {} points", chart.kind()),
    }
}

fn linear_ticks(scale: &LinearScale, locale_tag: &str) -> Vec<Tick> {
    let step = scale.tick_step(TICK_COUNT);
    scale
        .ticks(TICK_COUNT)
        .into_iter()
        .map(|v| Tick {
            offset: scale.map(v),
            label: format_tick(v, step, locale_tag),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::BarPoint;

    fn bar_chart() -> Chart {
        Chart::new(
            PlotPoints::Bar(vec![
                BarPoint { country: "A".into(), intensity: 2.0 },
                BarPoint { country: "B".into(), intensity: 8.0 },
            ]),
            &CANVAS,
        )
    }

    #[test]
    fn unset_kind_renders_nothing() {
        let mut surface = Surface::new(500, 300);
        render(&mut surface, Some(&bar_chart()), "en");
        assert!(!surface.is_empty());
        render(&mut surface, None, "en");
        assert!(surface.is_empty());
    }

    #[test]
    fn bar_ticks_sit_at_band_centers() {
        let mut surface = Surface::new(500, 300);
        let chart = bar_chart();
        render(&mut surface, Some(&chart), "en");
        let Element::Axis(bottom) = &surface.elements()[0] else {
            panic!("expected axis first");
        };
        let XScale::Band(band) = &chart.scales().x else {
            panic!("expected band scale");
        };
        assert_eq!(bottom.ticks.len(), 2);
        assert_eq!(bottom.ticks[1].label, "B");
        let center = band.position("B").unwrap() + band.bandwidth() / 2.0;
        assert!((bottom.ticks[1].offset - center).abs() < 1e-9);
    }
}
