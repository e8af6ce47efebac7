use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

/// The closed set of chart forms. Each kind has its own endpoint, filters,
/// transform, scales and marks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartKind {
    /// Intensity per country (grouped bar).
    Bar,
    /// Intensity over start year (line).
    Line,
    /// Relevance vs likelihood (scatter).
    Scatter,
}

impl ChartKind {
    pub const ALL: [ChartKind; 3] = [ChartKind::Bar, ChartKind::Line, ChartKind::Scatter];

    /// Stable slot index used by per-kind tables.
    pub fn index(self) -> usize {
        match self {
            ChartKind::Bar => 0,
            ChartKind::Line => 1,
            ChartKind::Scatter => 2,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ChartKind::Bar => "bar",
            ChartKind::Line => "line",
            ChartKind::Scatter => "scatter",
        }
    }

    /// Human label used by selectors.
    pub fn title(self) -> &'static str {
        match self {
            ChartKind::Bar => "Intensity vs Country (Bar Graph)",
            ChartKind::Line => "Intensity vs Start Year (Line Chart)",
            ChartKind::Scatter => "Relevance vs Likelihood (Scatter Plot)",
        }
    }
}

impl fmt::Display for ChartKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChartKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "bar" => Ok(ChartKind::Bar),
            "line" => Ok(ChartKind::Line),
            "scatter" => Ok(ChartKind::Scatter),
            other => Err(format!("unknown chart kind: {other:?}")),
        }
    }
}

/// One record exactly as the backend returned it. No schema is enforced
/// beyond the fields a transform reads.
pub type RawRecord = Map<String, Value>;

/// Numeric coercion with the semantics of a unary plus on loosely typed data:
/// numbers pass through, numeric strings parse (after trimming), empty strings
/// and `null` become `0`, booleans become `0`/`1`, and anything else
/// (missing field, non-numeric text, arrays, objects) becomes `NaN`.
pub fn coerce_number(value: Option<&Value>) -> f64 {
    match value {
        None => f64::NAN,
        Some(Value::Null) => 0.0,
        Some(Value::Bool(b)) => {
            if *b {
                1.0
            } else {
                0.0
            }
        }
        Some(Value::Number(n)) => n.as_f64().unwrap_or(f64::NAN),
        Some(Value::String(s)) => parse_numeric_text(s),
        Some(Value::Array(_)) | Some(Value::Object(_)) => f64::NAN,
    }
}

fn parse_numeric_text(s: &str) -> f64 {
    let t = s.trim();
    if t.is_empty() {
        return 0.0;
    }
    match t {
        "Infinity" | "+Infinity" => return f64::INFINITY,
        "-Infinity" => return f64::NEG_INFINITY,
        _ => {}
    }
    if let Some(n) = parse_radix_literal(t) {
        return n;
    }
    // Rust accepts "inf"/"nan" spellings that are not numbers here.
    if t.chars().any(|c| c.is_ascii_alphabetic() && c != 'e' && c != 'E') {
        return f64::NAN;
    }
    t.parse::<f64>().unwrap_or(f64::NAN)
}

/// Unsigned `0x`/`0o`/`0b` integer text. A sign or a bad digit makes it `NaN`.
fn parse_radix_literal(t: &str) -> Option<f64> {
    let unsigned = t.trim_start_matches(['+', '-']);
    let mut chars = unsigned.chars();
    let radix = match (chars.next(), chars.next()) {
        (Some('0'), Some('x' | 'X')) => 16,
        (Some('0'), Some('o' | 'O')) => 8,
        (Some('0'), Some('b' | 'B')) => 2,
        _ => return None,
    };
    let digits = chars.as_str();
    if unsigned.len() != t.len() || digits.is_empty() {
        return Some(f64::NAN);
    }
    let value = digits.chars().try_fold(0.0f64, |acc, c| {
        c.to_digit(radix).map(|d| acc * f64::from(radix) + f64::from(d))
    });
    Some(value.unwrap_or(f64::NAN))
}

/// Opaque category label for band scales. Missing or `null` labels become
/// the empty category.
pub fn coerce_label(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BarPoint {
    pub country: String,
    pub intensity: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LinePoint {
    pub intensity: f64,
    pub start_year: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScatterPoint {
    pub relevance: f64,
    pub likelihood: f64,
}

/// Plot-ready records for one render cycle. Serialises as a bare array.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum PlotPoints {
    Bar(Vec<BarPoint>),
    Line(Vec<LinePoint>),
    Scatter(Vec<ScatterPoint>),
}

impl PlotPoints {
    pub fn kind(&self) -> ChartKind {
        match self {
            PlotPoints::Bar(_) => ChartKind::Bar,
            PlotPoints::Line(_) => ChartKind::Line,
            PlotPoints::Scatter(_) => ChartKind::Scatter,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            PlotPoints::Bar(v) => v.len(),
            PlotPoints::Line(v) => v.len(),
            PlotPoints::Scatter(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of numeric fields that failed coercion (`NaN`) across all points.
    pub fn non_numeric(&self) -> usize {
        let nan = |v: f64| usize::from(v.is_nan());
        match self {
            PlotPoints::Bar(v) => v.iter().map(|p| nan(p.intensity)).sum(),
            PlotPoints::Line(v) => v.iter().map(|p| nan(p.intensity) + nan(p.start_year)).sum(),
            PlotPoints::Scatter(v) => v
                .iter()
                .map(|p| nan(p.relevance) + nan(p.likelihood))
                .sum(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn coercion_follows_loose_numeric_rules() {
        assert_eq!(coerce_number(Some(&json!(5))), 5.0);
        assert_eq!(coerce_number(Some(&json!(" 7.5 "))), 7.5);
        assert_eq!(coerce_number(Some(&json!(""))), 0.0);
        assert_eq!(coerce_number(Some(&Value::Null)), 0.0);
        assert_eq!(coerce_number(Some(&json!(true))), 1.0);
        assert_eq!(coerce_number(Some(&json!("1e3"))), 1000.0);
        assert!(coerce_number(None).is_nan());
        assert!(coerce_number(Some(&json!("high"))).is_nan());
        assert!(coerce_number(Some(&json!("nan"))).is_nan());
        assert!(coerce_number(Some(&json!([1]))).is_nan());
    }

    #[test]
    fn prefixed_integers_are_read_in_their_radix() {
        assert_eq!(coerce_number(Some(&json!("0x1A"))), 26.0);
        assert_eq!(coerce_number(Some(&json!(" 0XfF "))), 255.0);
        assert_eq!(coerce_number(Some(&json!("0b11"))), 3.0);
        assert_eq!(coerce_number(Some(&json!("0o17"))), 15.0);
        assert!(coerce_number(Some(&json!("-0x1"))).is_nan());
        assert!(coerce_number(Some(&json!("+0b1"))).is_nan());
        assert!(coerce_number(Some(&json!("0x"))).is_nan());
        assert!(coerce_number(Some(&json!("0b12"))).is_nan());
        assert!(coerce_number(Some(&json!("0x1.5"))).is_nan());
    }

    #[test]
    fn labels_are_opaque() {
        assert_eq!(coerce_label(Some(&json!("USA"))), "USA");
        assert_eq!(coerce_label(Some(&json!(42))), "42");
        assert_eq!(coerce_label(None), "");
    }

    #[test]
    fn kind_round_trips_through_text() {
        for kind in ChartKind::ALL {
            assert_eq!(kind.to_string().parse::<ChartKind>().unwrap(), kind);
        }
        assert!("pie".parse::<ChartKind>().is_err());
    }
}
