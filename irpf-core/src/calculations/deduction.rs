//! General ("hard to justify") expense deduction.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::TaxYearConfig;
use crate::error::{EngineError, ensure_non_negative};

/// `min(revenue × rate, cap)`, in whatever currency `revenue` is expressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneralExpenseDeduction {
    pub rate: Decimal,
    pub cap: Decimal,
}

impl GeneralExpenseDeduction {
    pub fn new(
        rate: Decimal,
        cap: Decimal,
    ) -> Self {
        Self { rate, cap }
    }

    pub fn from_tax_year_config(config: &TaxYearConfig) -> Self {
        Self {
            rate: config.general_expense_rate,
            cap: config.general_expense_cap,
        }
    }

    /// # Errors
    ///
    /// Returns [`EngineError::InvalidInput`] if `revenue` is negative.
    pub fn calculate(
        &self,
        revenue: Decimal,
    ) -> Result<Decimal, EngineError> {
        let revenue = ensure_non_negative("gross revenue", revenue)?;
        Ok((revenue * self.rate).min(self.cap))
    }
}

impl Default for GeneralExpenseDeduction {
    fn default() -> Self {
        Self {
            rate: dec!(0.05),
            cap: dec!(2000),
        }
    }
}
