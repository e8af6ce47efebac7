use crate::models::PlotPoints;
use anyhow::Result;
use csv::WriterBuilder;
use std::borrow::Cow;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Prefix cells that a spreadsheet would evaluate as a formula.
fn safe_cell(s: &str) -> Cow<'_, str> {
    match s.chars().next() {
        Some('=' | '+' | '-' | '@' | '\t' | '\r') => Cow::Owned(format!("'{s}")),
        _ => Cow::Borrowed(s),
    }
}

/// Save plot points as CSV with a header matching the chart kind.
pub fn save_csv<P: AsRef<Path>>(points: &PlotPoints, path: P) -> Result<()> {
    let mut wtr = WriterBuilder::new().from_path(path)?;
    match points {
        PlotPoints::Bar(v) => {
            wtr.serialize(("country", "intensity"))?;
            for p in v {
                wtr.serialize((safe_cell(&p.country), p.intensity))?;
            }
        }
        PlotPoints::Line(v) => {
            wtr.serialize(("start_year", "intensity"))?;
            for p in v {
                wtr.serialize((p.start_year, p.intensity))?;
            }
        }
        PlotPoints::Scatter(v) => {
            wtr.serialize(("relevance", "likelihood"))?;
            for p in v {
                wtr.serialize((p.relevance, p.likelihood))?;
            }
        }
    }
    wtr.flush()?;
    Ok(())
}

/// Save plot points as a pretty JSON array. Non-numeric values become `null`.
pub fn save_json<P: AsRef<Path>>(points: &PlotPoints, path: P) -> Result<()> {
    let mut f = File::create(path)?;
    let s = serde_json::to_string_pretty(points)?;
    f.write_all(s.as_bytes())?;
    Ok(())
}
