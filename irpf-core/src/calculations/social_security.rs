//! Flat-rate social-security quota lookup (RETA bands).

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{EngineError, ensure_non_negative};
use crate::models::BandTable;

/// The quota owed for a given annual net revenue and the room to the
/// neighbouring bands.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SocialSecurityQuota {
    pub band_index: usize,
    pub monthly: Decimal,
    pub annual: Decimal,
    /// `next.min - revenue`; `None` in the last band.
    pub to_next_band: Option<Decimal>,
    /// `revenue - previous.max`; `None` in the first band.
    pub to_previous_band: Option<Decimal>,
}

#[derive(Debug, Clone, Copy)]
pub struct SocialSecurityBandLookup<'a> {
    table: &'a BandTable,
}

impl<'a> SocialSecurityBandLookup<'a> {
    pub fn new(table: &'a BandTable) -> Self {
        Self { table }
    }

    /// Finds the band containing `revenue` (annual net revenue after the
    /// general expense deduction).
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidInput`] if `revenue` is negative.
    pub fn lookup(
        &self,
        revenue: Decimal,
    ) -> Result<SocialSecurityQuota, EngineError> {
        let revenue = ensure_non_negative("net revenue", revenue)?;
        let index = self.band_index(revenue);
        let bands = self.table.bands();
        let band = &bands[index];

        let to_next_band = bands.get(index + 1).map(|next| next.min - revenue);
        let to_previous_band = index
            .checked_sub(1)
            .and_then(|prev| bands[prev].max)
            .map(|prev_max| revenue - prev_max);

        Ok(SocialSecurityQuota {
            band_index: index,
            monthly: band.monthly_quota,
            annual: band.monthly_quota * Decimal::from(12),
            to_next_band,
            to_previous_band,
        })
    }

    /// Index of the band with `min <= revenue < max`.
    ///
    /// Values no band contains resolve to the last band. With a validated table
    /// that only happens for negative revenue, which [`lookup`](Self::lookup)
    /// rejects before getting here.
    fn band_index(
        &self,
        revenue: Decimal,
    ) -> usize {
        match self.table.bands().iter().position(|b| b.contains(revenue)) {
            Some(index) => index,
            None => {
                warn!(%revenue, "No social security band matches revenue; using last band");
                self.table.last_index()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    use super::*;
    use crate::models::{Jurisdiction, SocialSecurityBand};

    fn small_table() -> BandTable {
        BandTable::new(vec![
            SocialSecurityBand {
                min: dec!(0),
                max: Some(dec!(10000)),
                monthly_quota: dec!(200),
            },
            SocialSecurityBand {
                min: dec!(10000),
                max: Some(dec!(20000)),
                monthly_quota: dec!(300),
            },
            SocialSecurityBand {
                min: dec!(20000),
                max: None,
                monthly_quota: dec!(500),
            },
        ])
        .unwrap()
    }

    #[test]
    fn lookup_first_band_has_no_previous_distance() {
        let table = small_table();

        let quota = SocialSecurityBandLookup::new(&table).lookup(dec!(2500)).unwrap();

        assert_eq!(
            quota,
            SocialSecurityQuota {
                band_index: 0,
                monthly: dec!(200),
                annual: dec!(2400),
                to_next_band: Some(dec!(7500)),
                to_previous_band: None,
            }
        );
    }

    #[test]
    fn lookup_middle_band_reports_both_distances() {
        let table = small_table();

        let quota = SocialSecurityBandLookup::new(&table).lookup(dec!(12000)).unwrap();

        assert_eq!(quota.band_index, 1);
        assert_eq!(quota.to_next_band, Some(dec!(8000)));
        assert_eq!(quota.to_previous_band, Some(dec!(2000)));
    }

    #[test]
    fn lookup_lower_bound_is_inclusive() {
        let table = small_table();

        let quota = SocialSecurityBandLookup::new(&table).lookup(dec!(10000)).unwrap();

        assert_eq!(quota.band_index, 1);
        assert_eq!(quota.to_previous_band, Some(dec!(0)));
    }

    #[test]
    fn lookup_last_band_has_no_next_distance() {
        let table = small_table();

        let quota = SocialSecurityBandLookup::new(&table)
            .lookup(dec!(1000000))
            .unwrap();

        assert_eq!(quota.band_index, 2);
        assert_eq!(quota.monthly, dec!(500));
        assert_eq!(quota.to_next_band, None);
    }

    #[test]
    fn lookup_rejects_negative_revenue() {
        let table = small_table();

        let result = SocialSecurityBandLookup::new(&table).lookup(dec!(-0.01));

        assert_eq!(
            result,
            Err(EngineError::InvalidInput {
                field: "net revenue",
                value: dec!(-0.01)
            })
        );
    }

    #[test]
    fn band_index_falls_back_to_last_band_when_nothing_matches() {
        let table = small_table();

        let index = SocialSecurityBandLookup::new(&table).band_index(dec!(-50));

        assert_eq!(index, 2);
    }

    #[test]
    fn lookup_reta_2024_band_for_28500() {
        let jurisdiction = Jurisdiction::spain_2024();

        let quota = SocialSecurityBandLookup::new(jurisdiction.social_security())
            .lookup(dec!(28500))
            .unwrap();

        assert_eq!(quota.monthly, dec!(325));
        assert_eq!(quota.annual, dec!(3900));
        // Next band starts at 2760 × 12.
        assert_eq!(quota.to_next_band, Some(dec!(4620)));
    }

    proptest! {
        #[test]
        fn lookup_returns_band_containing_revenue(
            revenue in (0i64..20_000_000i64).prop_map(|c| Decimal::new(c, 2))
        ) {
            let jurisdiction = Jurisdiction::spain_2024();
            let table = jurisdiction.social_security();

            let quota = SocialSecurityBandLookup::new(table).lookup(revenue).unwrap();
            let band = &table.bands()[quota.band_index];

            prop_assert!(band.contains(revenue));
            if let Some(to_next) = quota.to_next_band {
                prop_assert_eq!(revenue + to_next, table.bands()[quota.band_index + 1].min);
            }
        }
    }
}
