//! Error types shared by the calculators and the table/config constructors.
//!
//! Table and configuration problems are reported when the objects are built,
//! so a calculator holding a validated table never fails for that reason.

use rust_decimal::Decimal;
use thiserror::Error;

/// Structural problems in a bracket or band table.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TableError {
    #[error("{0} table has no entries")]
    Empty(&'static str),

    #[error("first bracket limit must be positive, got {0}")]
    NonPositiveFirstLimit(Decimal),

    #[error("bracket {index}: upper limit {limit} does not exceed the previous limit")]
    NonIncreasingLimit { index: usize, limit: Decimal },

    #[error("bracket {index} is unbounded but is not the last bracket")]
    UnboundedBeforeEnd { index: usize },

    #[error("last entry of the {0} table must be unbounded")]
    Unterminated(&'static str),

    #[error("entry {index}: rate must be between 0 and 1, got {rate}")]
    RateOutOfRange { index: usize, rate: Decimal },

    #[error("first band must start at 0, starts at {0}")]
    FirstBandNotAtZero(Decimal),

    #[error("band {index} starts at {found}, expected {expected} (gap or overlap)")]
    BandDiscontinuity {
        index: usize,
        expected: Decimal,
        found: Decimal,
    },

    #[error("band {index} is empty: min {min} is not below max {max}")]
    EmptyBand {
        index: usize,
        min: Decimal,
        max: Decimal,
    },

    #[error("band {index}: monthly quota must be non-negative, got {quota}")]
    NegativeQuota { index: usize, quota: Decimal },

    #[error("default region '{0}' has no bracket table")]
    UnknownDefaultRegion(String),
}

/// Out-of-range values in a [`TaxYearConfig`](crate::TaxYearConfig).
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TaxYearConfigError {
    #[error("general expense rate must be between 0 and 1, got {0}")]
    InvalidGeneralExpenseRate(Decimal),

    #[error("general expense cap must be non-negative, got {0}")]
    InvalidGeneralExpenseCap(Decimal),

    #[error("advance payment rate must be between 0 and 1, got {0}")]
    InvalidAdvancePaymentRate(Decimal),

    #[error("fallback exchange rate must be positive, got {0}")]
    InvalidFallbackRate(Decimal),
}

/// Errors returned by the calculation engine.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EngineError {
    /// A monetary input was negative (or a rate was not positive).
    #[error("invalid {field}: {value}")]
    InvalidInput { field: &'static str, value: Decimal },

    #[error("invalid table: {0}")]
    Table(#[from] TableError),

    #[error("invalid tax year configuration: {0}")]
    Config(#[from] TaxYearConfigError),

    /// Only raised when strict region resolution is enabled.
    #[error("unknown region '{0}'")]
    UnknownRegion(String),

    #[error("quarter must be between 1 and 4, got {0}")]
    InvalidQuarter(u32),
}

impl EngineError {
    pub(crate) fn invalid(
        field: &'static str,
        value: Decimal,
    ) -> Self {
        Self::InvalidInput { field, value }
    }
}

/// Rejects negative values before they reach a table walk.
pub(crate) fn ensure_non_negative(
    field: &'static str,
    value: Decimal,
) -> Result<Decimal, EngineError> {
    if value < Decimal::ZERO {
        return Err(EngineError::invalid(field, value));
    }
    Ok(value)
}
