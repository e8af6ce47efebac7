use crate::models::PlotPoints;
use serde::{Deserialize, Serialize};

/// Summary statistics for one plotted dimension.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Summary {
    pub dimension: String,
    pub count: usize,
    /// Values that failed numeric coercion.
    pub missing: usize,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub mean: Option<f64>,
    pub median: Option<f64>,
}

/// Compute statistics for every numeric dimension of `points`.
pub fn summarize(points: &PlotPoints) -> Vec<Summary> {
    match points {
        PlotPoints::Bar(v) => vec![summary("intensity", v.iter().map(|p| p.intensity))],
        PlotPoints::Line(v) => vec![
            summary("intensity", v.iter().map(|p| p.intensity)),
            summary("start_year", v.iter().map(|p| p.start_year)),
        ],
        PlotPoints::Scatter(v) => vec![
            summary("relevance", v.iter().map(|p| p.relevance)),
            summary("likelihood", v.iter().map(|p| p.likelihood)),
        ],
    }
}

fn summary(dimension: &str, values: impl Iterator<Item = f64>) -> Summary {
    let mut vals = Vec::new();
    let mut missing = 0usize;
    for v in values {
        if v.is_nan() {
            missing += 1;
        } else {
            vals.push(v);
        }
    }
    vals.sort_by(f64::total_cmp);
    let count = vals.len();
    let min = vals.first().cloned();
    let max = vals.last().cloned();
    let mean = if count > 0 {
        Some(vals.iter().copied().sum::<f64>() / count as f64)
    } else {
        None
    };
    let median = if count == 0 {
        None
    } else if count % 2 == 1 {
        Some(vals[count / 2])
    } else {
        Some((vals[count / 2 - 1] + vals[count / 2]) / 2.0)
    };
    Summary {
        dimension: dimension.to_string(),
        count,
        missing,
        min,
        max,
        mean,
        median,
    }
}
