//! Quarterly income buckets with the annual deductions spread across them.
//!
//! The general expense deduction is allocated by cumulative income: each
//! quarter receives what the cap allows on income so far, minus what earlier
//! quarters already took. The social-security quota is derived once from the
//! annual figures and charged evenly (three monthly quotas per quarter).

use rust_decimal::Decimal;
use tracing::{debug, warn};

use super::deduction::GeneralExpenseDeduction;
use super::social_security::SocialSecurityBandLookup;
use crate::error::EngineError;
use crate::models::{BandTable, Currency, Invoice, InvoiceStatus, QuarterlyData};

pub const QUARTERS: usize = 4;

#[derive(Debug, Clone, Copy)]
pub struct QuarterlyAggregator<'a> {
    deduction: GeneralExpenseDeduction,
    bands: &'a BandTable,
}

impl<'a> QuarterlyAggregator<'a> {
    pub fn new(
        deduction: GeneralExpenseDeduction,
        bands: &'a BandTable,
    ) -> Self {
        Self { deduction, bands }
    }

    /// Buckets paid invoices by quarter and applies deductions.
    ///
    /// Amounts are taken from each invoice's stored `currency` column. The
    /// caller is expected to have restricted `invoices` to one fiscal year;
    /// non-paid invoices are skipped here as well.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidInput`] if a paid invoice carries a
    /// negative amount.
    pub fn aggregate(
        &self,
        invoices: &[Invoice],
        currency: Currency,
    ) -> Result<Vec<QuarterlyData>, EngineError> {
        let income = self.income_per_quarter(invoices, currency)?;
        let total_income: Decimal = income.iter().sum();

        let total_general = self.deduction.calculate(total_income)?;
        let ss = SocialSecurityBandLookup::new(self.bands).lookup(total_income - total_general)?;
        let ss_per_quarter = ss.monthly * Decimal::from(3);

        debug!(
            %total_income,
            %total_general,
            %ss_per_quarter,
            currency = %currency,
            "aggregating quarters"
        );

        let general = self.spread_general_deduction(&income)?;

        let quarters = (0..QUARTERS)
            .map(|i| {
                let deductions = general[i] + ss_per_quarter;
                let net_income = income[i] - deductions;
                if net_income < Decimal::ZERO {
                    warn!(
                        quarter = i + 1,
                        income = %income[i],
                        %deductions,
                        "Quarter deductions exceed income; net income is negative"
                    );
                }
                QuarterlyData {
                    quarter: i as u32 + 1,
                    income: income[i],
                    general_deduction: general[i],
                    social_security: ss_per_quarter,
                    deductions,
                    net_income,
                }
            })
            .collect();

        Ok(quarters)
    }

    fn income_per_quarter(
        &self,
        invoices: &[Invoice],
        currency: Currency,
    ) -> Result<[Decimal; QUARTERS], EngineError> {
        let mut income = [Decimal::ZERO; QUARTERS];
        for invoice in invoices.iter().filter(|i| i.status == InvoiceStatus::Paid) {
            invoice.validate()?;
            let q = invoice.quarter() as usize - 1;
            income[q] += invoice.amount_in(currency);
        }
        Ok(income)
    }

    /// General deduction slice per quarter, allocated on cumulative income.
    pub(crate) fn spread_general_deduction(
        &self,
        income: &[Decimal; QUARTERS],
    ) -> Result<[Decimal; QUARTERS], EngineError> {
        let mut slices = [Decimal::ZERO; QUARTERS];
        let mut cumulative_income = Decimal::ZERO;
        let mut used = Decimal::ZERO;

        for (slice, quarter_income) in slices.iter_mut().zip(income) {
            cumulative_income += *quarter_income;
            let allowed = self.deduction.calculate(cumulative_income)?;
            *slice = allowed - used;
            used += *slice;
        }

        Ok(slices)
    }
}
