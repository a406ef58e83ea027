use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Income and deductions attributed to one calendar quarter.
///
/// `deductions` is `general_deduction + social_security`. `net_income` may be
/// negative when the flat social-security charge exceeds the quarter's income.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuarterlyData {
    pub quarter: u32,
    pub income: Decimal,
    /// Slice of the capped general expense deduction, never negative.
    pub general_deduction: Decimal,
    /// Three monthly quotas of the annual social-security band.
    pub social_security: Decimal,
    pub deductions: Decimal,
    pub net_income: Decimal,
}

/// A quarter of the Modelo 130 advance-payment schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Modelo130Quarter {
    pub quarter: u32,
    pub income: Decimal,
    pub general_deduction: Decimal,
    pub social_security: Decimal,
    pub deductions: Decimal,
    pub net_income: Decimal,
    /// Advance rate applied to this quarter's net income alone. Informational.
    pub estimated_irpf: Decimal,
    /// Cumulative liability minus advances already paid, never negative.
    pub amount_due: Decimal,
}
