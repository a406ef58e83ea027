use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::TableError;

/// One step of a progressive rate schedule.
///
/// `upper_limit` is inclusive; `None` is the unbounded top bracket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxBracket {
    pub upper_limit: Option<Decimal>,
    pub rate: Decimal,
}

impl TaxBracket {
    pub fn bounded(
        upper_limit: Decimal,
        rate: Decimal,
    ) -> Self {
        Self {
            upper_limit: Some(upper_limit),
            rate,
        }
    }

    pub fn unbounded(rate: Decimal) -> Self {
        Self {
            upper_limit: None,
            rate,
        }
    }
}

/// A validated rate schedule covering `[0, +inf)` without gaps.
///
/// Construct with [`BracketTable::new`]; the brackets cannot be mutated
/// afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct BracketTable {
    brackets: Vec<TaxBracket>,
}

impl BracketTable {
    /// Validates and wraps `brackets`.
    ///
    /// # Errors
    ///
    /// Returns [`TableError`] if the table is empty, a limit is not strictly
    /// above the previous one, a rate lies outside `[0, 1]`, or the table is
    /// not terminated by exactly one unbounded bracket.
    pub fn new(brackets: Vec<TaxBracket>) -> Result<Self, TableError> {
        if brackets.is_empty() {
            return Err(TableError::Empty("bracket"));
        }

        let last = brackets.len() - 1;
        let mut previous = Decimal::ZERO;

        for (index, bracket) in brackets.iter().enumerate() {
            if bracket.rate < Decimal::ZERO || bracket.rate > Decimal::ONE {
                return Err(TableError::RateOutOfRange {
                    index,
                    rate: bracket.rate,
                });
            }

            match bracket.upper_limit {
                Some(limit) if index == 0 && limit <= Decimal::ZERO => {
                    return Err(TableError::NonPositiveFirstLimit(limit));
                }
                Some(limit) if limit <= previous => {
                    return Err(TableError::NonIncreasingLimit { index, limit });
                }
                Some(limit) => previous = limit,
                None if index != last => {
                    return Err(TableError::UnboundedBeforeEnd { index });
                }
                None => {}
            }
        }

        if brackets[last].upper_limit.is_some() {
            return Err(TableError::Unterminated("bracket"));
        }

        Ok(Self { brackets })
    }

    pub fn brackets(&self) -> &[TaxBracket] {
        &self.brackets
    }

    /// Index of the bracket `income` falls in (limits are inclusive).
    pub fn bracket_index(
        &self,
        income: Decimal,
    ) -> usize {
        self.brackets
            .iter()
            .position(|b| b.upper_limit.is_none_or(|limit| income <= limit))
            .unwrap_or(self.brackets.len() - 1)
    }
}

impl<'de> Deserialize<'de> for BracketTable {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let brackets = Vec::<TaxBracket>::deserialize(deserializer)?;
        Self::new(brackets).map_err(serde::de::Error::custom)
    }
}

/// One row of a bracket walk: the slice of income taxed at `rate`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IrpfBreakdownEntry {
    pub from: Decimal,
    /// `None` for the unbounded top bracket.
    pub to: Option<Decimal>,
    pub rate: Decimal,
    pub taxable: Decimal,
    pub tax: Decimal,
}
