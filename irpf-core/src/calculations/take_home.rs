//! Effective rate and take-home figures.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::common::{floor_at_zero, per_month};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TakeHomeSummary {
    /// IRPF liability plus social security.
    pub total_tax: Decimal,
    pub monthly_tax: Decimal,
    /// `total_tax / gross`, unrounded; zero when there is no revenue.
    pub effective_rate: Decimal,
    pub take_home_annual: Decimal,
    pub take_home_monthly: Decimal,
}

/// Combines gross revenue with the two annual charges.
///
/// Inputs are expected in one currency. `take_home_annual` may be negative
/// when the flat social-security quota exceeds revenue.
pub fn summarize(
    gross_revenue: Decimal,
    tax_liability: Decimal,
    social_security: Decimal,
) -> TakeHomeSummary {
    let total_tax = tax_liability + social_security;
    let take_home_annual = gross_revenue - total_tax;
    let effective_rate = if gross_revenue.is_zero() {
        Decimal::ZERO
    } else {
        total_tax / gross_revenue
    };

    TakeHomeSummary {
        total_tax,
        monthly_tax: per_month(total_tax),
        effective_rate,
        take_home_annual,
        take_home_monthly: per_month(take_home_annual),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShareKind {
    TakeHome,
    Irpf,
    SocialSecurity,
}

impl ShareKind {
    pub fn label(&self) -> &'static str {
        match self {
            ShareKind::TakeHome => "Take-home",
            ShareKind::Irpf => "IRPF",
            ShareKind::SocialSecurity => "Social Security",
        }
    }
}

/// One slice of gross revenue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxShare {
    pub kind: ShareKind,
    pub amount: Decimal,
}

/// Splits gross revenue into take-home, IRPF and social security.
///
/// The take-home slice is floored at zero so the split never reports a
/// negative share.
pub fn tax_shares(
    gross_revenue: Decimal,
    tax_liability: Decimal,
    social_security: Decimal,
) -> Vec<TaxShare> {
    vec![
        TaxShare {
            kind: ShareKind::TakeHome,
            amount: floor_at_zero(gross_revenue - tax_liability - social_security),
        },
        TaxShare {
            kind: ShareKind::Irpf,
            amount: tax_liability,
        },
        TaxShare {
            kind: ShareKind::SocialSecurity,
            amount: social_security,
        },
    ]
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    // =========================================================================
    // summarize tests
    // =========================================================================

    #[test]
    fn summarize_typical_year() {
        let summary = summarize(dec!(30000), dec!(4500), dec!(3900));

        assert_eq!(summary.total_tax, dec!(8400));
        assert_eq!(summary.take_home_annual, dec!(21600));
        assert_eq!(summary.take_home_monthly, dec!(1800.00));
        assert_eq!(summary.monthly_tax, dec!(700.00));
        assert_eq!(summary.effective_rate, dec!(0.28));
    }

    #[test]
    fn summarize_zero_revenue_has_zero_rate() {
        let summary = summarize(dec!(0), dec!(0), dec!(2400));

        assert_eq!(summary.effective_rate, dec!(0));
        assert_eq!(summary.take_home_annual, dec!(-2400));
        assert_eq!(summary.take_home_monthly, dec!(-200.00));
    }

    #[test]
    fn summarize_rounds_monthly_figures() {
        let summary = summarize(dec!(10000), dec!(100), dec!(0));

        // 9900 / 12 = 825, 100 / 12 = 8.333...
        assert_eq!(summary.take_home_monthly, dec!(825.00));
        assert_eq!(summary.monthly_tax, dec!(8.33));
    }

    // =========================================================================
    // tax_shares tests
    // =========================================================================

    #[test]
    fn tax_shares_split_gross() {
        let shares = tax_shares(dec!(30000), dec!(4500), dec!(3900));

        let amounts: Vec<Decimal> = shares.iter().map(|s| s.amount).collect();
        assert_eq!(amounts, vec![dec!(21600), dec!(4500), dec!(3900)]);
        assert_eq!(shares[0].kind.label(), "Take-home");
    }

    #[test]
    fn tax_shares_floor_take_home() {
        let shares = tax_shares(dec!(1000), dec!(0), dec!(2400));

        assert_eq!(shares[0].amount, dec!(0));
    }
}
