use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::TaxYearConfigError;

/// Flat rates and limits used alongside the bracket and band tables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxYearConfig {
    pub tax_year: i32,
    /// Share of gross revenue deductible as hard-to-justify general expenses.
    pub general_expense_rate: Decimal,
    /// Annual ceiling on the general expense deduction.
    pub general_expense_cap: Decimal,
    /// Modelo 130 advance rate on cumulative net income.
    pub advance_payment_rate: Decimal,
    /// EUR→USD rate used when a rate lookup fails.
    pub fallback_exchange_rate: Decimal,
}

impl TaxYearConfig {
    pub fn spain_2024() -> Self {
        Self {
            tax_year: 2024,
            general_expense_rate: dec!(0.05),
            general_expense_cap: dec!(2000),
            advance_payment_rate: dec!(0.20),
            fallback_exchange_rate: crate::rates::FALLBACK_EUR_USD_RATE,
        }
    }

    /// # Errors
    ///
    /// Returns [`TaxYearConfigError`] for the first value outside its range.
    pub fn validate(&self) -> Result<(), TaxYearConfigError> {
        if self.general_expense_rate < Decimal::ZERO || self.general_expense_rate > Decimal::ONE {
            return Err(TaxYearConfigError::InvalidGeneralExpenseRate(
                self.general_expense_rate,
            ));
        }
        if self.general_expense_cap < Decimal::ZERO {
            return Err(TaxYearConfigError::InvalidGeneralExpenseCap(
                self.general_expense_cap,
            ));
        }
        if self.advance_payment_rate < Decimal::ZERO || self.advance_payment_rate > Decimal::ONE {
            return Err(TaxYearConfigError::InvalidAdvancePaymentRate(
                self.advance_payment_rate,
            ));
        }
        if self.fallback_exchange_rate <= Decimal::ZERO {
            return Err(TaxYearConfigError::InvalidFallbackRate(
                self.fallback_exchange_rate,
            ));
        }
        Ok(())
    }
}

impl Default for TaxYearConfig {
    fn default() -> Self {
        Self::spain_2024()
    }
}
