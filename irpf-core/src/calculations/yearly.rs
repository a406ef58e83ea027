//! Yearly report pipeline.
//!
//! [`TaxEngine::report`] composes every calculator into one [`YearlyReport`].
//! Table-driven figures (deduction, social security, IRPF) are computed on EUR
//! totals and converted into the report currency field by field at the
//! blended rate of the year's invoices. Income and the quarterly filings use
//! the invoices' stored amounts in the report currency directly.

use chrono::{Datelike, NaiveDate};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::bracket_tax::BracketTaxCalculator;
use super::common::{floor_at_zero, round_half_up};
use super::currency::CurrencyNormalizer;
use super::deduction::GeneralExpenseDeduction;
use super::modelo130::{Modelo130Calculator, filing_deadline};
use super::quarterly::QuarterlyAggregator;
use super::social_security::SocialSecurityBandLookup;
use super::take_home::{TaxShare, summarize, tax_shares};
use crate::error::{EngineError, ensure_non_negative};
use crate::models::{
    BracketTable, Currency, Invoice, IrpfBreakdownEntry, Jurisdiction, Modelo130Quarter,
    TaxYearConfig,
};

/// What to report on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportRequest {
    pub year: i32,
    pub currency: Currency,
    /// Regional schedule; `None` uses the jurisdiction's default region.
    pub region: Option<String>,
    /// Modelo 130 advances paid before the first quarter in the report.
    pub advances_paid: Decimal,
}

impl ReportRequest {
    pub fn new(
        year: i32,
        currency: Currency,
    ) -> Self {
        Self {
            year,
            currency,
            region: None,
            advances_paid: Decimal::ZERO,
        }
    }

    pub fn with_region(
        mut self,
        region: impl Into<String>,
    ) -> Self {
        self.region = Some(region.into());
        self
    }

    pub fn with_advances_paid(
        mut self,
        advances_paid: Decimal,
    ) -> Self {
        self.advances_paid = advances_paid;
        self
    }
}

/// Headline figures, all in the report currency and rounded to cents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearlySummary {
    pub total_income: Decimal,
    pub general_deduction: Decimal,
    /// Net revenue the social-security band is chosen on.
    pub ss_base: Decimal,
    pub taxable_income: Decimal,
    pub state_tax: Decimal,
    pub regional_tax: Decimal,
    /// State plus regional IRPF.
    pub total_tax: Decimal,
    pub ss_monthly: Decimal,
    pub ss_annual: Decimal,
    /// Share of income going to IRPF and social security, four places.
    pub effective_rate: Decimal,
    pub take_home_annual: Decimal,
    pub take_home_monthly: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NextBracket {
    pub distance: Decimal,
    pub rate: Decimal,
}

/// Distances to the next tax bracket and social-security band.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Advisories {
    /// `None` in the top bracket.
    pub next_bracket: Option<NextBracket>,
    /// `None` in the top band.
    pub next_ss_band: Option<Decimal>,
    pub messages: Vec<String>,
}

impl Advisories {
    fn new(
        next_bracket: Option<NextBracket>,
        next_ss_band: Option<Decimal>,
        currency: Currency,
    ) -> Self {
        let bracket_message = match &next_bracket {
            Some(next) => format!(
                "{:.2} {currency} left until {}% tax bracket.",
                next.distance,
                (next.rate * Decimal::ONE_HUNDRED).normalize()
            ),
            None => "Above highest tax bracket".to_string(),
        };
        let band_message = match next_ss_band {
            Some(distance) => format!("{distance:.2} {currency} left until next SS band."),
            None => "Above highest SS quota band".to_string(),
        };

        Self {
            next_bracket,
            next_ss_band,
            messages: vec![bracket_message, band_message],
        }
    }
}

/// Income and IRPF for one calendar month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlyPoint {
    pub month: u32,
    pub income: Decimal,
    pub tax: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearlyReport {
    pub year: i32,
    pub currency: Currency,
    pub region: String,
    /// Blended EUR→USD rate of the year's paid invoices.
    pub exchange_rate: Decimal,
    pub invoice_count: usize,
    pub fallback_rate_invoices: usize,
    pub summary: YearlySummary,
    /// Walk of the combined table, rows in bracket order.
    pub breakdown: Vec<IrpfBreakdownEntry>,
    /// IRPF on the combined table. Differs from `summary.total_tax`, which
    /// pairs the national table with the selected region's table.
    pub breakdown_total: Decimal,
    pub quarters: Vec<Modelo130Quarter>,
    pub advances_total: Decimal,
    /// IRPF still owed after the quarterly advances.
    pub final_balance: Decimal,
    pub monthly: Vec<MonthlyPoint>,
    pub shares: Vec<TaxShare>,
    pub advisories: Advisories,
}

/// One quarter seen from the taxpayer's side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuarterSnapshot {
    pub quarter: u32,
    pub income: Decimal,
    pub general_deduction: Decimal,
    pub ss_quarter: Decimal,
    pub advance: Decimal,
    pub net: Decimal,
    pub deadline: NaiveDate,
}

impl YearlyReport {
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidQuarter`] for a quarter outside 1..=4.
    pub fn quarter_snapshot(
        &self,
        quarter: u32,
    ) -> Result<QuarterSnapshot, EngineError> {
        let filing = self
            .quarters
            .iter()
            .find(|q| q.quarter == quarter)
            .ok_or(EngineError::InvalidQuarter(quarter))?;

        let ss_quarter = filing.social_security;
        let general_deduction = filing.general_deduction;
        let advance = filing.amount_due;

        Ok(QuarterSnapshot {
            quarter,
            income: filing.income,
            general_deduction,
            ss_quarter,
            advance,
            net: filing.income - general_deduction - ss_quarter - advance,
            deadline: filing_deadline(self.year, quarter)?,
        })
    }

    /// Snapshot of the quarter `date` falls in.
    pub fn snapshot_for(
        &self,
        date: NaiveDate,
    ) -> Result<QuarterSnapshot, EngineError> {
        self.quarter_snapshot(date.month0() / 3 + 1)
    }
}

/// Tables plus yearly parameters; produces reports.
#[derive(Debug, Clone)]
pub struct TaxEngine {
    jurisdiction: Jurisdiction,
    config: TaxYearConfig,
}

impl TaxEngine {
    /// # Errors
    ///
    /// Returns [`EngineError::Config`] if `config` fails validation.
    pub fn new(
        jurisdiction: Jurisdiction,
        config: TaxYearConfig,
    ) -> Result<Self, EngineError> {
        config.validate()?;
        Ok(Self {
            jurisdiction,
            config,
        })
    }

    pub fn spain_2024() -> Self {
        Self {
            jurisdiction: Jurisdiction::spain_2024(),
            config: TaxYearConfig::spain_2024(),
        }
    }

    pub fn jurisdiction(&self) -> &Jurisdiction {
        &self.jurisdiction
    }

    pub fn config(&self) -> &TaxYearConfig {
        &self.config
    }

    /// Request for the configured tax year.
    pub fn request(
        &self,
        currency: Currency,
    ) -> ReportRequest {
        ReportRequest::new(self.config.tax_year, currency)
    }

    /// Builds the report for `request.year` from `invoices`.
    ///
    /// Invoices that are not paid or fall outside the year are ignored.
    ///
    /// # Errors
    ///
    /// - [`EngineError::InvalidInput`] for a negative invoice amount or
    ///   negative advances.
    /// - [`EngineError::UnknownRegion`] when the region is unknown and the
    ///   jurisdiction is strict.
    pub fn report(
        &self,
        invoices: &[Invoice],
        request: &ReportRequest,
    ) -> Result<YearlyReport, EngineError> {
        let currency = request.currency;
        let advances_paid = ensure_non_negative("advances paid", request.advances_paid)?;
        if request.year != self.config.tax_year {
            warn!(
                report_year = request.year,
                tables_year = self.config.tax_year,
                "Report year differs from the tax year the rates were configured for"
            );
        }
        let region = request
            .region
            .as_deref()
            .unwrap_or(self.jurisdiction.default_region());
        let (region, regional_table) = self.jurisdiction.resolve_region(region)?;

        let paid: Vec<Invoice> = invoices
            .iter()
            .filter(|i| i.is_income_for(request.year))
            .cloned()
            .collect();
        for invoice in &paid {
            invoice.validate()?;
        }

        let total_usd: Decimal = paid.iter().map(|i| i.amount_usd).sum();
        let total_eur: Decimal = paid.iter().map(|i| i.amount_eur).sum();
        let normalizer = CurrencyNormalizer::blended(total_usd, total_eur)?;
        let out = |eur: Decimal| normalizer.from_eur(eur, currency).map(round_half_up);

        debug!(
            year = request.year,
            invoices = paid.len(),
            %total_usd,
            %total_eur,
            rate = %normalizer.rate(),
            %region,
            "building yearly report"
        );

        let deduction = GeneralExpenseDeduction::from_tax_year_config(&self.config);
        let general_eur = deduction.calculate(total_eur)?;
        let ss_base_eur = total_eur - general_eur;
        let ss = SocialSecurityBandLookup::new(self.jurisdiction.social_security())
            .lookup(ss_base_eur)?;
        let taxable_eur = floor_at_zero(ss_base_eur - ss.annual);

        let state = BracketTaxCalculator::new(self.jurisdiction.national()).calculate(taxable_eur)?;
        let regional = BracketTaxCalculator::new(regional_table).calculate(taxable_eur)?;
        let combined_calc = BracketTaxCalculator::new(self.jurisdiction.combined());
        let combined = combined_calc.calculate(taxable_eur)?;

        debug!(
            %general_eur,
            %ss_base_eur,
            ss_monthly = %ss.monthly,
            %taxable_eur,
            state = %state.total,
            regional = %regional.total,
            "EUR basis computed"
        );

        let total_income = round_half_up(match currency {
            Currency::Usd => total_usd,
            Currency::Eur => total_eur,
        });
        let total_tax = out(state.total + regional.total)?;
        let ss_annual = out(ss.annual)?;
        let take_home = summarize(total_income, total_tax, ss_annual);

        let summary = YearlySummary {
            total_income,
            general_deduction: out(general_eur)?,
            ss_base: out(ss_base_eur)?,
            taxable_income: out(taxable_eur)?,
            state_tax: out(state.total)?,
            regional_tax: out(regional.total)?,
            total_tax,
            ss_monthly: out(ss.monthly)?,
            ss_annual,
            effective_rate: take_home
                .effective_rate
                .round_dp_with_strategy(4, RoundingStrategy::MidpointAwayFromZero),
            take_home_annual: take_home.take_home_annual,
            take_home_monthly: take_home.take_home_monthly,
        };

        let breakdown = combined
            .breakdown
            .into_iter()
            .map(|entry| {
                Ok(IrpfBreakdownEntry {
                    from: out(entry.from)?,
                    to: entry.to.map(out).transpose()?,
                    rate: entry.rate,
                    taxable: out(entry.taxable)?,
                    tax: out(entry.tax)?,
                })
            })
            .collect::<Result<Vec<_>, EngineError>>()?;
        let breakdown_total = out(combined.total)?;

        let quarterly = QuarterlyAggregator::new(deduction, self.jurisdiction.social_security())
            .aggregate(&paid, currency)?;
        let quarters: Vec<Modelo130Quarter> = Modelo130Calculator::from_tax_year_config(&self.config)
            .calculate(&quarterly, advances_paid)?
            .into_iter()
            .map(round_filing)
            .collect();
        let advances_total: Decimal = quarters.iter().map(|q| q.amount_due).sum();

        let next_bracket = combined_calc
            .distance_to_next_bracket(taxable_eur)?
            .map(|d| {
                Ok::<_, EngineError>(NextBracket {
                    distance: out(d.distance)?,
                    rate: d.next_rate,
                })
            })
            .transpose()?;
        let advisories = Advisories::new(
            next_bracket,
            ss.to_next_band.map(out).transpose()?,
            currency,
        );

        let monthly = self.monthly_series(&paid, currency, &normalizer, regional_table)?;

        Ok(YearlyReport {
            year: request.year,
            currency,
            region: region.to_string(),
            exchange_rate: normalizer.rate(),
            invoice_count: paid.len(),
            fallback_rate_invoices: paid.iter().filter(|i| i.rate_is_fallback).count(),
            shares: tax_shares(total_income, total_tax, ss_annual),
            summary,
            breakdown,
            breakdown_total,
            quarters,
            advances_total,
            final_balance: total_tax - advances_total,
            monthly,
            advisories,
        })
    }

    /// IRPF on each month's EUR income taken on its own, converted at that
    /// month's blended rate (the annual rate for months without EUR income).
    fn monthly_series(
        &self,
        paid: &[Invoice],
        currency: Currency,
        annual: &CurrencyNormalizer,
        regional_table: &BracketTable,
    ) -> Result<Vec<MonthlyPoint>, EngineError> {
        let state_calc = BracketTaxCalculator::new(self.jurisdiction.national());
        let regional_calc = BracketTaxCalculator::new(regional_table);

        let mut usd = [Decimal::ZERO; 12];
        let mut eur = [Decimal::ZERO; 12];
        let mut income = [Decimal::ZERO; 12];
        for invoice in paid {
            let m = invoice.issue_date.month0() as usize;
            usd[m] += invoice.amount_usd;
            eur[m] += invoice.amount_eur;
            income[m] += invoice.amount_in(currency);
        }

        (0..12)
            .map(|m| {
                let tax_eur =
                    state_calc.calculate(eur[m])?.total + regional_calc.calculate(eur[m])?.total;
                let normalizer = if eur[m].is_zero() {
                    *annual
                } else {
                    CurrencyNormalizer::blended(usd[m], eur[m])?
                };

                Ok(MonthlyPoint {
                    month: m as u32 + 1,
                    income: income[m],
                    tax: round_half_up(normalizer.from_eur(tax_eur, currency)?),
                })
            })
            .collect()
    }
}

fn round_filing(filing: Modelo130Quarter) -> Modelo130Quarter {
    Modelo130Quarter {
        quarter: filing.quarter,
        income: round_half_up(filing.income),
        general_deduction: round_half_up(filing.general_deduction),
        social_security: round_half_up(filing.social_security),
        deductions: round_half_up(filing.deductions),
        net_income: round_half_up(filing.net_income),
        estimated_irpf: round_half_up(filing.estimated_irpf),
        amount_due: round_half_up(filing.amount_due),
    }
}
