use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::TableError;

/// A flat-rate contribution band over annual net revenue.
///
/// `min` is inclusive, `max` exclusive; `None` is the unbounded top band.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SocialSecurityBand {
    pub min: Decimal,
    pub max: Option<Decimal>,
    pub monthly_quota: Decimal,
}

impl SocialSecurityBand {
    pub fn contains(
        &self,
        revenue: Decimal,
    ) -> bool {
        revenue >= self.min && self.max.is_none_or(|max| revenue < max)
    }
}

/// A validated, contiguous band table starting at zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct BandTable {
    bands: Vec<SocialSecurityBand>,
}

impl BandTable {
    /// Validates and wraps `bands`.
    ///
    /// # Errors
    ///
    /// Returns [`TableError`] when the table is empty, does not start at 0,
    /// has a gap or overlap between consecutive bands, contains an empty or
    /// negative-quota band, or does not end with an unbounded band.
    pub fn new(bands: Vec<SocialSecurityBand>) -> Result<Self, TableError> {
        let Some(first) = bands.first() else {
            return Err(TableError::Empty("social security band"));
        };
        if first.min != Decimal::ZERO {
            return Err(TableError::FirstBandNotAtZero(first.min));
        }

        let last = bands.len() - 1;
        let mut expected_min = Decimal::ZERO;

        for (index, band) in bands.iter().enumerate() {
            if band.min != expected_min {
                return Err(TableError::BandDiscontinuity {
                    index,
                    expected: expected_min,
                    found: band.min,
                });
            }
            if band.monthly_quota < Decimal::ZERO {
                return Err(TableError::NegativeQuota {
                    index,
                    quota: band.monthly_quota,
                });
            }
            match band.max {
                Some(max) if max <= band.min => {
                    return Err(TableError::EmptyBand {
                        index,
                        min: band.min,
                        max,
                    });
                }
                Some(max) => expected_min = max,
                None if index != last => {
                    return Err(TableError::UnboundedBeforeEnd { index });
                }
                None => {}
            }
        }

        if bands[last].max.is_some() {
            return Err(TableError::Unterminated("social security band"));
        }

        Ok(Self { bands })
    }

    /// Builds an annual table from bounds published per month of net yield.
    ///
    /// Each `(monthly_min, monthly_max, monthly_quota)` row is scaled by 12 on
    /// the bounds only; the quota stays monthly.
    pub fn from_monthly_bounds(
        rows: &[(Decimal, Option<Decimal>, Decimal)]
    ) -> Result<Self, TableError> {
        let months = Decimal::from(12);
        let bands = rows
            .iter()
            .map(|&(min, max, monthly_quota)| SocialSecurityBand {
                min: min * months,
                max: max.map(|m| m * months),
                monthly_quota,
            })
            .collect();
        Self::new(bands)
    }

    pub fn bands(&self) -> &[SocialSecurityBand] {
        &self.bands
    }

    pub fn last_index(&self) -> usize {
        self.bands.len() - 1
    }
}

impl<'de> Deserialize<'de> for BandTable {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let bands = Vec::<SocialSecurityBand>::deserialize(deserializer)?;
        Self::new(bands).map_err(serde::de::Error::custom)
    }
}
