//! EUR→USD rate lookups with a fixed fallback.
//!
//! A lookup never fails from the caller's point of view: provider errors and
//! unusable rates are replaced by the fallback rate and the quote is flagged.

use std::collections::{BTreeMap, BTreeSet};

use async_trait::async_trait;
use chrono::NaiveDate;
use futures::future::join_all;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::calculations::CurrencyNormalizer;
use crate::error::{EngineError, ensure_non_negative};
use crate::models::{Currency, Invoice, InvoiceDraft, TaxYearConfig};

/// USD per EUR used when no rate can be retrieved.
pub const FALLBACK_EUR_USD_RATE: Decimal = dec!(1.1);

#[derive(Debug, Error)]
pub enum RateError {
    #[error("Rate request failed: {0}")]
    Request(String),

    #[error("No USD rate in response for {0}")]
    MissingRate(NaiveDate),

    #[error("Rate provider is offline")]
    Offline,
}

#[async_trait]
pub trait ExchangeRateProvider: Send + Sync {
    /// USD per EUR on `date`.
    async fn eur_to_usd(&self, date: NaiveDate) -> Result<Decimal, RateError>;
}

/// Always answers with the same rate.
#[derive(Debug, Clone, Copy)]
pub struct FixedRateProvider(pub Decimal);

#[async_trait]
impl ExchangeRateProvider for FixedRateProvider {
    async fn eur_to_usd(&self, _date: NaiveDate) -> Result<Decimal, RateError> {
        Ok(self.0)
    }
}

/// Never answers; every quote falls back.
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineRateProvider;

#[async_trait]
impl ExchangeRateProvider for OfflineRateProvider {
    async fn eur_to_usd(&self, _date: NaiveDate) -> Result<Decimal, RateError> {
        Err(RateError::Offline)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateQuote {
    pub date: NaiveDate,
    pub rate: Decimal,
    /// True when `rate` is the fallback rather than a provider answer.
    pub fallback: bool,
}

pub struct RateResolver<P> {
    provider: P,
    fallback_rate: Decimal,
}

impl<P: ExchangeRateProvider> RateResolver<P> {
    pub fn new(provider: P) -> Self {
        Self {
            provider,
            fallback_rate: FALLBACK_EUR_USD_RATE,
        }
    }

    /// Resolver falling back to `config.fallback_exchange_rate`.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidInput`] if the configured rate is not positive.
    pub fn from_tax_year_config(
        provider: P,
        config: &TaxYearConfig,
    ) -> Result<Self, EngineError> {
        Self::new(provider).with_fallback_rate(config.fallback_exchange_rate)
    }

    /// # Errors
    ///
    /// Returns [`EngineError::InvalidInput`] if `rate` is not positive.
    pub fn with_fallback_rate(
        mut self,
        rate: Decimal,
    ) -> Result<Self, EngineError> {
        self.fallback_rate = CurrencyNormalizer::new(rate)?.rate();
        Ok(self)
    }

    pub fn fallback_rate(&self) -> Decimal {
        self.fallback_rate
    }

    pub async fn resolve(
        &self,
        date: NaiveDate,
    ) -> RateQuote {
        match self.provider.eur_to_usd(date).await {
            Ok(rate) if rate > Decimal::ZERO => RateQuote {
                date,
                rate,
                fallback: false,
            },
            Ok(rate) => {
                warn!(%date, %rate, fallback = %self.fallback_rate, "Provider returned unusable rate; using fallback");
                self.fallback(date)
            }
            Err(e) => {
                warn!(%date, error = %e, fallback = %self.fallback_rate, "Rate lookup failed; using fallback");
                self.fallback(date)
            }
        }
    }

    /// Resolves every distinct date concurrently. Quotes come back in date
    /// order, one per distinct date.
    pub async fn resolve_batch(
        &self,
        dates: &[NaiveDate],
    ) -> Vec<RateQuote> {
        let unique: BTreeSet<NaiveDate> = dates.iter().copied().collect();
        debug!(requested = dates.len(), distinct = unique.len(), "resolving rates");
        join_all(unique.into_iter().map(|date| self.resolve(date))).await
    }

    /// Fills in the missing currency amount of each draft.
    ///
    /// Drafts with an explicit rate or a converted amount are priced without a
    /// lookup; the rest share one concurrent batch.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidInput`] for a negative amount or a
    /// non-positive explicit rate.
    pub async fn price_invoices(
        &self,
        drafts: Vec<InvoiceDraft>,
    ) -> Result<Vec<Invoice>, EngineError> {
        let dates: Vec<NaiveDate> = drafts
            .iter()
            .filter(|d| d.needs_rate())
            .map(|d| d.issue_date)
            .collect();
        let quotes: BTreeMap<NaiveDate, RateQuote> = self
            .resolve_batch(&dates)
            .await
            .into_iter()
            .map(|q| (q.date, q))
            .collect();

        drafts
            .into_iter()
            .map(|draft| {
                let quote = quotes.get(&draft.issue_date).filter(|_| draft.needs_rate());
                price(draft, quote)
            })
            .collect()
    }
}

fn price(
    draft: InvoiceDraft,
    quote: Option<&RateQuote>,
) -> Result<Invoice, EngineError> {
    let amount = ensure_non_negative("invoice amount", draft.amount)?;
    let other = draft.currency.other();

    let (converted, rate, rate_is_fallback) = match (draft.converted_amount, draft.exchange_rate, quote) {
        (Some(converted), Some(rate), _) => {
            (ensure_non_negative("invoice converted amount", converted)?, rate, false)
        }
        (Some(converted), None, _) => {
            let converted = ensure_non_negative("invoice converted amount", converted)?;
            let (usd, eur) = match draft.currency {
                Currency::Usd => (amount, converted),
                Currency::Eur => (converted, amount),
            };
            (converted, CurrencyNormalizer::blended(usd, eur)?.rate(), false)
        }
        (None, Some(rate), _) => {
            let normalizer = CurrencyNormalizer::new(rate)?;
            (normalizer.convert(amount, draft.currency, other)?, rate, false)
        }
        (None, None, Some(quote)) => {
            let normalizer = CurrencyNormalizer::new(quote.rate)?;
            (normalizer.convert(amount, draft.currency, other)?, quote.rate, quote.fallback)
        }
        (None, None, None) => {
            return Err(EngineError::InvalidInput {
                field: "exchange rate",
                value: Decimal::ZERO,
            });
        }
    };
    CurrencyNormalizer::new(rate)?;

    let (amount_usd, amount_eur) = match draft.currency {
        Currency::Usd => (amount, converted),
        Currency::Eur => (converted, amount),
    };

    Ok(Invoice {
        id: draft.id,
        client_name: draft.client_name,
        issue_date: draft.issue_date,
        status: draft.status,
        currency: draft.currency,
        amount_usd,
        amount_eur,
        exchange_rate: rate,
        rate_is_fallback,
    })
}

impl<P> RateResolver<P> {
    fn fallback(
        &self,
        date: NaiveDate,
    ) -> RateQuote {
        RateQuote {
            date,
            rate: self.fallback_rate,
            fallback: true,
        }
    }
}
