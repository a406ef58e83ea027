//! Calculators for IRPF, social security and the Modelo 130 schedule.
//!
//! Each calculator is a small value borrowing the immutable tables it walks.
//! [`TaxEngine`] wires them into the yearly report.

pub mod bracket_tax;
pub mod common;
pub mod currency;
pub mod deduction;
pub mod modelo130;
pub mod quarterly;
pub mod social_security;
pub mod take_home;
pub mod yearly;

pub use bracket_tax::{BracketDistance, BracketTaxCalculator, BracketTaxResult};
pub use currency::CurrencyNormalizer;
pub use deduction::GeneralExpenseDeduction;
pub use modelo130::{Modelo130Calculator, filing_deadline};
pub use quarterly::{QUARTERS, QuarterlyAggregator};
pub use social_security::{SocialSecurityBandLookup, SocialSecurityQuota};
pub use take_home::{ShareKind, TakeHomeSummary, TaxShare, summarize, tax_shares};
pub use yearly::{
    Advisories, MonthlyPoint, NextBracket, QuarterSnapshot, ReportRequest, TaxEngine,
    YearlyReport, YearlySummary,
};
