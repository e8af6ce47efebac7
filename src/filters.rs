//! Filter State and per-kind commit validation.
//!
//! Inputs are kept as raw text exactly as entered. Only the fields belonging
//! to the committed kind are validated, and only for presence: there is no
//! numeric parsing and no `min <= max` cross-check.

use crate::api::Query;
use crate::error::DashboardError;
use crate::models::ChartKind;
use log::warn;

/// One free-form filter input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterField {
    MinIntensity,
    MaxIntensity,
    StartYear,
    MinRelevance,
    MaxRelevance,
}

impl FilterField {
    pub const ALL: [FilterField; 5] = [
        FilterField::MinIntensity,
        FilterField::MaxIntensity,
        FilterField::StartYear,
        FilterField::MinRelevance,
        FilterField::MaxRelevance,
    ];

    /// The chart kind whose commit reads this field.
    pub fn kind(self) -> ChartKind {
        match self {
            FilterField::MinIntensity | FilterField::MaxIntensity => ChartKind::Bar,
            FilterField::StartYear => ChartKind::Line,
            FilterField::MinRelevance | FilterField::MaxRelevance => ChartKind::Scatter,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            FilterField::MinIntensity => "Min Intensity",
            FilterField::MaxIntensity => "Max Intensity",
            FilterField::StartYear => "Start Year",
            FilterField::MinRelevance => "Min Relevance",
            FilterField::MaxRelevance => "Max Relevance",
        }
    }

    /// Fields shown for, and required by, a kind's commit.
    pub fn for_kind(kind: ChartKind) -> &'static [FilterField] {
        match kind {
            ChartKind::Bar => &[FilterField::MinIntensity, FilterField::MaxIntensity],
            ChartKind::Line => &[FilterField::StartYear],
            ChartKind::Scatter => &[FilterField::MinRelevance, FilterField::MaxRelevance],
        }
    }
}

/// Uncommitted filter text for every kind.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterInput {
    pub min_intensity: String,
    pub max_intensity: String,
    pub start_year: String,
    pub min_relevance: String,
    pub max_relevance: String,
}

impl FilterInput {
    pub fn get(&self, field: FilterField) -> &str {
        match field {
            FilterField::MinIntensity => &self.min_intensity,
            FilterField::MaxIntensity => &self.max_intensity,
            FilterField::StartYear => &self.start_year,
            FilterField::MinRelevance => &self.min_relevance,
            FilterField::MaxRelevance => &self.max_relevance,
        }
    }

    pub fn get_mut(&mut self, field: FilterField) -> &mut String {
        match field {
            FilterField::MinIntensity => &mut self.min_intensity,
            FilterField::MaxIntensity => &mut self.max_intensity,
            FilterField::StartYear => &mut self.start_year,
            FilterField::MinRelevance => &mut self.min_relevance,
            FilterField::MaxRelevance => &mut self.max_relevance,
        }
    }

    pub fn set(&mut self, field: FilterField, value: impl Into<String>) {
        *self.get_mut(field) = value.into();
    }

    /// Trimmed value, or `None` when the field is blank.
    pub fn value(&self, field: FilterField) -> Option<&str> {
        let v = self.get(field).trim();
        (!v.is_empty()).then_some(v)
    }

    /// Validate the fields required by `kind` and build the outbound query.
    pub fn commit(&self, kind: ChartKind) -> Result<Query, DashboardError> {
        let missing = FilterField::for_kind(kind)
            .iter()
            .any(|f| self.value(*f).is_none());
        if missing {
            let message = match kind {
                ChartKind::Bar => "please enter both min and max intensity values",
                ChartKind::Line => "please enter the start year",
                ChartKind::Scatter => "please enter both min and max relevance values",
            };
            warn!("commit rejected for {kind}: {message}");
            return Err(DashboardError::validation(kind, message));
        }
        Ok(Query::from_filters(kind, self))
    }
}

/// Interactive filter state: the selected kind plus pending inputs.
///
/// Switching the active kind never clears other kinds' text.
#[derive(Debug, Clone, Default)]
pub struct FilterState {
    active: Option<ChartKind>,
    input: FilterInput,
}

impl FilterState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active(&self) -> Option<ChartKind> {
        self.active
    }

    pub fn select(&mut self, kind: Option<ChartKind>) {
        self.active = kind;
    }

    pub fn input(&self) -> &FilterInput {
        &self.input
    }

    pub fn input_mut(&mut self) -> &mut FilterInput {
        &mut self.input
    }

    pub fn set(&mut self, field: FilterField, value: impl Into<String>) {
        self.input.set(field, value);
    }

    pub fn commit(&self, kind: ChartKind) -> Result<Query, DashboardError> {
        self.input.commit(kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bar_commit_requires_both_bounds() {
        let mut f = FilterState::new();
        f.set(FilterField::MinIntensity, "0");
        let err = f.commit(ChartKind::Bar).unwrap_err();
        assert!(err.is_validation());

        f.set(FilterField::MaxIntensity, "100");
        let q = f.commit(ChartKind::Bar).unwrap();
        assert_eq!(q.path_and_query(), "/intensity?min=0&max=100");
    }

    #[test]
    fn line_commit_requires_start_year() {
        let mut f = FilterState::new();
        assert!(f.commit(ChartKind::Line).is_err());
        f.set(FilterField::StartYear, " 2017 ");
        assert_eq!(f.commit(ChartKind::Line).unwrap().path_and_query(), "/year?start=2017");
    }

    #[test]
    fn scatter_commit_requires_both_bounds() {
        let mut f = FilterState::new();
        f.set(FilterField::MaxRelevance, "5");
        assert!(f.commit(ChartKind::Scatter).is_err());
        f.set(FilterField::MinRelevance, "1");
        assert_eq!(
            f.commit(ChartKind::Scatter).unwrap().path_and_query(),
            "/relevance?min=1&max=5"
        );
    }

    #[test]
    fn bounds_are_not_cross_checked() {
        let mut f = FilterState::new();
        f.set(FilterField::MinIntensity, "90");
        f.set(FilterField::MaxIntensity, "10");
        assert_eq!(
            f.commit(ChartKind::Bar).unwrap().path_and_query(),
            "/intensity?min=90&max=10"
        );
    }

    #[test]
    fn unrelated_fields_do_not_affect_validation() {
        let mut f = FilterState::new();
        f.set(FilterField::StartYear, "2016");
        assert!(f.commit(ChartKind::Bar).is_err());
        assert!(f.commit(ChartKind::Line).is_ok());
    }

    #[test]
    fn switching_kind_keeps_text() {
        let mut f = FilterState::new();
        f.select(Some(ChartKind::Bar));
        f.set(FilterField::MinIntensity, "3");
        f.select(Some(ChartKind::Scatter));
        f.select(None);
        assert_eq!(f.input().get(FilterField::MinIntensity), "3");
    }
}
