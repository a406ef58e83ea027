//! Modelo 130: quarterly IRPF advance payments.
//!
//! Liability is computed on cumulative net income and the advances already
//! paid are subtracted, so the year's advances never exceed the advance rate
//! applied to the year's net income. A loss-making quarter owes nothing and
//! does not refund earlier quarters.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tracing::debug;

use super::common::floor_at_zero;
use crate::TaxYearConfig;
use crate::error::{EngineError, ensure_non_negative};
use crate::models::{Modelo130Quarter, QuarterlyData};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Modelo130Calculator {
    rate: Decimal,
}

impl Modelo130Calculator {
    pub fn new(rate: Decimal) -> Self {
        Self { rate }
    }

    pub fn from_tax_year_config(config: &TaxYearConfig) -> Self {
        Self::new(config.advance_payment_rate)
    }

    /// # Errors
    ///
    /// Returns [`EngineError::InvalidInput`] if `advances_paid` is negative.
    pub fn calculate(
        &self,
        quarters: &[QuarterlyData],
        advances_paid: Decimal,
    ) -> Result<Vec<Modelo130Quarter>, EngineError> {
        let mut paid = ensure_non_negative("advances paid", advances_paid)?;
        let mut cumulative_net = Decimal::ZERO;

        let filings = quarters
            .iter()
            .map(|q| {
                cumulative_net += q.net_income;
                let liability = cumulative_net * self.rate;
                let amount_due = floor_at_zero(liability - paid);
                paid += amount_due;

                debug!(
                    quarter = q.quarter,
                    %cumulative_net,
                    %liability,
                    %amount_due,
                    "modelo 130 quarter"
                );

                Modelo130Quarter {
                    quarter: q.quarter,
                    income: q.income,
                    general_deduction: q.general_deduction,
                    social_security: q.social_security,
                    deductions: q.deductions,
                    net_income: q.net_income,
                    estimated_irpf: q.net_income * self.rate,
                    amount_due,
                }
            })
            .collect();

        Ok(filings)
    }
}

impl Default for Modelo130Calculator {
    fn default() -> Self {
        Self::new(dec!(0.20))
    }
}

/// Last day to file the Modelo 130 for `quarter` of fiscal `year`.
///
/// Q1-Q3 are due on the 20th of the month after the quarter; Q4 on
/// 30 January of the following year.
///
/// # Errors
///
/// Returns [`EngineError::InvalidQuarter`] for a quarter outside 1..=4.
pub fn filing_deadline(
    year: i32,
    quarter: u32,
) -> Result<NaiveDate, EngineError> {
    let (y, m, d) = match quarter {
        1 => (year, 4, 20),
        2 => (year, 7, 20),
        3 => (year, 10, 20),
        4 => (year + 1, 1, 30),
        other => return Err(EngineError::InvalidQuarter(other)),
    };
    NaiveDate::from_ymd_opt(y, m, d).ok_or(EngineError::InvalidQuarter(quarter))
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    use super::*;

    fn quarter(
        quarter: u32,
        income: Decimal,
        deductions: Decimal,
    ) -> QuarterlyData {
        QuarterlyData {
            quarter,
            income,
            general_deduction: Decimal::ZERO,
            social_security: deductions,
            deductions,
            net_income: income - deductions,
        }
    }

    fn worked_example() -> Vec<QuarterlyData> {
        vec![
            quarter(1, dec!(10000), dec!(1475)),
            quarter(2, dec!(15000), dec!(1725)),
            quarter(3, dec!(0), dec!(975)),
            quarter(4, dec!(5000), dec!(1225)),
        ]
    }

    #[test]
    fn calculate_worked_example() {
        let filings = Modelo130Calculator::default()
            .calculate(&worked_example(), dec!(0))
            .unwrap();

        let due: Vec<Decimal> = filings.iter().map(|f| f.amount_due).collect();
        assert_eq!(due, vec![dec!(1705), dec!(2655), dec!(0), dec!(560)]);
        assert_eq!(filings[2].estimated_irpf, dec!(-195.00));
    }

    #[test]
    fn calculate_loss_quarter_does_not_refund() {
        let quarters = vec![
            quarter(1, dec!(10000), dec!(0)),
            quarter(2, dec!(0), dec!(20000)),
        ];

        let filings = Modelo130Calculator::default()
            .calculate(&quarters, dec!(0))
            .unwrap();

        assert_eq!(filings[0].amount_due, dec!(2000));
        assert_eq!(filings[1].amount_due, dec!(0));
    }

    #[test]
    fn calculate_credits_prior_advances() {
        let filings = Modelo130Calculator::default()
            .calculate(&worked_example(), dec!(1000))
            .unwrap();

        assert_eq!(filings[0].amount_due, dec!(705));
        assert_eq!(filings[1].amount_due, dec!(2655));
    }

    #[test]
    fn calculate_rejects_negative_advances() {
        let result = Modelo130Calculator::default().calculate(&worked_example(), dec!(-1));

        assert_eq!(
            result,
            Err(EngineError::InvalidInput {
                field: "advances paid",
                value: dec!(-1)
            })
        );
    }

    #[test]
    fn calculate_uses_configured_rate() {
        let config = TaxYearConfig {
            advance_payment_rate: dec!(0.07),
            ..TaxYearConfig::spain_2024()
        };

        let filings = Modelo130Calculator::from_tax_year_config(&config)
            .calculate(&worked_example()[..1], dec!(0))
            .unwrap();

        assert_eq!(filings[0].amount_due, dec!(596.75));
    }

    #[test]
    fn filing_deadline_per_quarter() {
        assert_eq!(
            filing_deadline(2024, 2).unwrap(),
            NaiveDate::from_ymd_opt(2024, 7, 20).unwrap()
        );
        assert_eq!(
            filing_deadline(2024, 4).unwrap(),
            NaiveDate::from_ymd_opt(2025, 1, 30).unwrap()
        );
        assert_eq!(filing_deadline(2024, 5), Err(EngineError::InvalidQuarter(5)));
    }

    proptest! {
        #[test]
        fn amount_due_is_never_negative_and_bounded(
            nets in prop::collection::vec(
                (-2_000_000i64..5_000_000i64).prop_map(|c| Decimal::new(c, 2)),
                4,
            )
        ) {
            let quarters: Vec<QuarterlyData> = nets
                .iter()
                .enumerate()
                .map(|(i, &net)| QuarterlyData {
                    quarter: i as u32 + 1,
                    income: floor_at_zero(net),
                    general_deduction: Decimal::ZERO,
                    social_security: floor_at_zero(-net),
                    deductions: floor_at_zero(-net),
                    net_income: net,
                })
                .collect();

            let filings = Modelo130Calculator::default().calculate(&quarters, dec!(0)).unwrap();

            let mut cumulative = Decimal::ZERO;
            let mut paid = Decimal::ZERO;
            for filing in &filings {
                prop_assert!(filing.amount_due >= Decimal::ZERO);
                cumulative += filing.net_income;
                paid += filing.amount_due;
                // Running total of advances tracks the highest cumulative liability so far.
                prop_assert!(paid >= cumulative * dec!(0.20));
            }
            let max_liability = filings
                .iter()
                .scan(Decimal::ZERO, |acc, f| {
                    *acc += f.net_income;
                    Some(*acc * dec!(0.20))
                })
                .fold(Decimal::ZERO, Decimal::max);
            prop_assert_eq!(paid, max_liability);
            if nets.iter().all(|n| *n >= Decimal::ZERO) {
                prop_assert!(paid <= cumulative * dec!(0.20));
            }
        }
    }
}
