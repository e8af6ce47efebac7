//! Error taxonomy shared by the pipeline stages.
//!
//! None of these are fatal: the dashboard stays interactive after any of them.

use crate::models::ChartKind;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DashboardError {
    /// Required filter field(s) missing at commit time. No fetch is attempted.
    #[error("{kind} filter: {message}")]
    Validation { kind: ChartKind, message: String },

    /// Network or decoding failure. The cached dataset for `kind` is left unchanged.
    #[error("{kind} fetch failed: {cause:#}")]
    Transport { kind: ChartKind, cause: anyhow::Error },
}

impl DashboardError {
    pub fn validation(kind: ChartKind, message: impl Into<String>) -> Self {
        DashboardError::Validation {
            kind,
            message: message.into(),
        }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, DashboardError::Validation { .. })
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, DashboardError::Transport { .. })
    }
}
