use thiserror::Error;

/// Errors raised while reconciling or laying out dispatch results.
///
/// All of them are deterministic consequences of the inputs. An energy
/// balance violation is not an error: it is reported in the
/// [`BalanceReport`](crate::BalanceReport) of a successful call.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AnalysisError {
    /// An auxiliary series does not share the time index of the primary one.
    #[error("index of {series} does not match: expected {expected}, got {actual}")]
    IndexMismatch {
        series: String,
        expected: String,
        actual: String,
    },

    /// Self-loop or otherwise malformed flow edge.
    #[error("invalid topology {from} -> {to}: {reason}")]
    InvalidTopology {
        from: String,
        to: String,
        reason: String,
    },

    /// Zero-length series or frame where data is required.
    #[error("empty input: {0}")]
    EmptyInput(String),

    /// Timestamps that are not strictly increasing with a fixed step.
    #[error("irregular time index: {0}")]
    IrregularIndex(String),

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl AnalysisError {
    pub(crate) fn index_mismatch(
        series: &str,
        expected: impl ToString,
        actual: impl ToString,
    ) -> Self {
        AnalysisError::IndexMismatch {
            series: series.to_string(),
            expected: expected.to_string(),
            actual: actual.to_string(),
        }
    }

    pub(crate) fn topology(from: &str, to: &str, reason: &str) -> Self {
        AnalysisError::InvalidTopology {
            from: from.to_string(),
            to: to.to_string(),
            reason: reason.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, AnalysisError>;
