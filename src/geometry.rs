//! Geometry Transformer: raw records → plot points.
//!
//! Pure field projection plus numeric coercion. Records are never dropped,
//! sorted, or deduplicated; a value that fails coercion stays in the output as
//! `NaN` and the scale/render stages degrade around it.

use crate::models::{
    BarPoint, ChartKind, LinePoint, PlotPoints, RawRecord, ScatterPoint, coerce_label,
    coerce_number,
};

pub fn transform(kind: ChartKind, records: &[RawRecord]) -> PlotPoints {
    match kind {
        ChartKind::Bar => PlotPoints::Bar(
            records
                .iter()
                .map(|r| BarPoint {
                    country: coerce_label(r.get("country")),
                    intensity: coerce_number(r.get("intensity")),
                })
                .collect(),
        ),
        ChartKind::Line => PlotPoints::Line(
            records
                .iter()
                .map(|r| LinePoint {
                    intensity: coerce_number(r.get("intensity")),
                    start_year: coerce_number(r.get("start_year")),
                })
                .collect(),
        ),
        ChartKind::Scatter => PlotPoints::Scatter(
            records
                .iter()
                .map(|r| ScatterPoint {
                    relevance: coerce_number(r.get("relevance")),
                    likelihood: coerce_number(r.get("likelihood")),
                })
                .collect(),
        ),
    }
}
