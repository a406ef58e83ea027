//! Progressive bracket tax.
//!
//! The same walk serves the national, regional and combined schedules; only
//! the [`BracketTable`] differs.
//!
//! # Example
//!
//! ```
//! use rust_decimal_macros::dec;
//! use irpf_core::calculations::BracketTaxCalculator;
//! use irpf_core::{BracketTable, TaxBracket};
//!
//! let table = BracketTable::new(vec![
//!     TaxBracket::bounded(dec!(12450), dec!(0.19)),
//!     TaxBracket::bounded(dec!(20200), dec!(0.24)),
//!     TaxBracket::unbounded(dec!(0.30)),
//! ])
//! .unwrap();
//!
//! let result = BracketTaxCalculator::new(&table).calculate(dec!(15000)).unwrap();
//!
//! // 12450 × 19% + 2550 × 24%
//! assert_eq!(result.total, dec!(2977.50));
//! assert_eq!(result.breakdown.len(), 2);
//! ```

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::error::{EngineError, ensure_non_negative};
use crate::models::{BracketTable, IrpfBreakdownEntry};

/// Total tax and the per-bracket rows that make it up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BracketTaxResult {
    pub total: Decimal,
    pub breakdown: Vec<IrpfBreakdownEntry>,
}

/// How far an income is from the next bracket boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BracketDistance {
    /// Income still taxed at the current rate before the next bracket starts.
    pub distance: Decimal,
    pub current_rate: Decimal,
    pub next_rate: Decimal,
}

#[derive(Debug, Clone, Copy)]
pub struct BracketTaxCalculator<'a> {
    table: &'a BracketTable,
}

impl<'a> BracketTaxCalculator<'a> {
    pub fn new(table: &'a BracketTable) -> Self {
        Self { table }
    }

    /// Walks the brackets in order and taxes each slice of `income`.
    ///
    /// The breakdown omits brackets above `income`, and its `tax` values sum
    /// exactly to `total` (no rounding happens here).
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidInput`] if `income` is negative.
    pub fn calculate(
        &self,
        income: Decimal,
    ) -> Result<BracketTaxResult, EngineError> {
        let income = ensure_non_negative("income", income)?;

        let mut total = Decimal::ZERO;
        let mut breakdown = Vec::new();
        let mut previous_limit = Decimal::ZERO;

        for bracket in self.table.brackets() {
            if income <= previous_limit {
                break;
            }

            let top = bracket.upper_limit.map_or(income, |limit| income.min(limit));
            let taxable = top - previous_limit;
            let tax = taxable * bracket.rate;

            total += tax;
            breakdown.push(IrpfBreakdownEntry {
                from: previous_limit,
                to: bracket.upper_limit,
                rate: bracket.rate,
                taxable,
                tax,
            });

            match bracket.upper_limit {
                Some(limit) => previous_limit = limit,
                None => break,
            }
        }

        trace!(%income, %total, brackets = breakdown.len(), "bracket tax computed");

        Ok(BracketTaxResult { total, breakdown })
    }

    /// Distance from `income` to the upper limit of its bracket, with the
    /// rate that applies beyond it. `None` in the unbounded top bracket.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidInput`] if `income` is negative.
    pub fn distance_to_next_bracket(
        &self,
        income: Decimal,
    ) -> Result<Option<BracketDistance>, EngineError> {
        let income = ensure_non_negative("income", income)?;
        let brackets = self.table.brackets();
        let index = self.table.bracket_index(income);

        let (Some(limit), Some(next)) = (brackets[index].upper_limit, brackets.get(index + 1))
        else {
            return Ok(None);
        };

        Ok(Some(BracketDistance {
            distance: limit - income,
            current_rate: brackets[index].rate,
            next_rate: next.rate,
        }))
    }
}
