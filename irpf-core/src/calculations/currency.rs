//! USD/EUR conversion.
//!
//! Every figure the engine derives from tables is computed on a EUR basis and
//! converted at the edge. A conversion rounds to cents immediately; callers
//! convert each reported figure separately rather than converting a sum.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::common::round_half_up;
use crate::error::{EngineError, ensure_non_negative};
use crate::models::Currency;

/// Converts amounts using a single EUR→USD rate (USD per EUR).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrencyNormalizer {
    rate: Decimal,
}

impl CurrencyNormalizer {
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidInput`] if `rate` is not positive.
    pub fn new(rate: Decimal) -> Result<Self, EngineError> {
        if rate <= Decimal::ZERO {
            return Err(EngineError::InvalidInput {
                field: "exchange rate",
                value: rate,
            });
        }
        Ok(Self { rate })
    }

    /// A normalizer using the rate implied by two totals of the same invoices.
    ///
    /// A zero rate is not a valid normalizer, so a zero USD total over a
    /// positive EUR total also falls back to 1. Reports in that state show a
    /// zero USD income while EUR-basis figures convert one to one.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidInput`] if either total is negative.
    pub fn blended(
        total_usd: Decimal,
        total_eur: Decimal,
    ) -> Result<Self, EngineError> {
        let rate = Self::blended_rate(total_usd, total_eur)?;
        if rate.is_zero() {
            return Ok(Self { rate: Decimal::ONE });
        }
        Ok(Self { rate })
    }

    /// `total_usd / total_eur`, or 1 when the EUR total is zero.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidInput`] if either total is negative.
    pub fn blended_rate(
        total_usd: Decimal,
        total_eur: Decimal,
    ) -> Result<Decimal, EngineError> {
        let total_usd = ensure_non_negative("USD total", total_usd)?;
        let total_eur = ensure_non_negative("EUR total", total_eur)?;
        if total_eur.is_zero() {
            return Ok(Decimal::ONE);
        }
        total_usd
            .checked_div(total_eur)
            .ok_or(EngineError::InvalidInput {
                field: "USD total",
                value: total_usd,
            })
    }

    pub fn rate(&self) -> Decimal {
        self.rate
    }

    /// Converts a EUR-basis value into `target`.
    ///
    /// EUR values are returned untouched; USD values are `round2(value × rate)`.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidInput`] if the product overflows.
    pub fn from_eur(
        &self,
        value: Decimal,
        target: Currency,
    ) -> Result<Decimal, EngineError> {
        match target {
            Currency::Eur => Ok(value),
            Currency::Usd => value
                .checked_mul(self.rate)
                .map(round_half_up)
                .ok_or(EngineError::InvalidInput {
                    field: "amount to convert",
                    value,
                }),
        }
    }

    /// Converts a value expressed in `source` into EUR.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidInput`] if the quotient overflows.
    pub fn to_eur(
        &self,
        value: Decimal,
        source: Currency,
    ) -> Result<Decimal, EngineError> {
        match source {
            Currency::Eur => Ok(value),
            Currency::Usd => value
                .checked_div(self.rate)
                .map(round_half_up)
                .ok_or(EngineError::InvalidInput {
                    field: "amount to convert",
                    value,
                }),
        }
    }

    /// Converts `value` from `source` into `target`.
    pub fn convert(
        &self,
        value: Decimal,
        source: Currency,
        target: Currency,
    ) -> Result<Decimal, EngineError> {
        if source == target {
            return Ok(value);
        }
        match target {
            Currency::Eur => self.to_eur(value, source),
            Currency::Usd => self.from_eur(value, target),
        }
    }
}
