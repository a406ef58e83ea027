use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::Currency;
use crate::error::{EngineError, ensure_non_negative};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum InvoiceStatus {
    Pending,
    Paid,
    /// Any status the engine does not treat as income.
    #[serde(other)]
    Other,
}

impl InvoiceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Paid => "PAID",
            Self::Other => "OTHER",
        }
    }

    /// Unrecognised statuses map to [`InvoiceStatus::Other`] rather than failing.
    pub fn parse(s: &str) -> Self {
        match s.trim().to_ascii_uppercase().as_str() {
            "PENDING" => Self::Pending,
            "PAID" => Self::Paid,
            _ => Self::Other,
        }
    }
}

/// An invoice as handed over by the persistence layer, priced in both currencies.
///
/// `exchange_rate` is the EUR→USD rate (USD per EUR) used when the invoice was
/// priced; `rate_is_fallback` records whether that rate came from the
/// documented fallback constant instead of a live lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invoice {
    pub id: String,
    pub client_name: String,
    pub issue_date: NaiveDate,
    pub status: InvoiceStatus,
    pub currency: Currency,
    pub amount_usd: Decimal,
    pub amount_eur: Decimal,
    pub exchange_rate: Decimal,
    #[serde(default)]
    pub rate_is_fallback: bool,
}

impl Invoice {
    pub fn amount_in(
        &self,
        currency: Currency,
    ) -> Decimal {
        match currency {
            Currency::Usd => self.amount_usd,
            Currency::Eur => self.amount_eur,
        }
    }

    /// Paid and issued within `year`.
    pub fn is_income_for(
        &self,
        year: i32,
    ) -> bool {
        self.status == InvoiceStatus::Paid && self.issue_date.year() == year
    }

    /// Calendar quarter of the issue date (1..=4).
    pub fn quarter(&self) -> u32 {
        self.issue_date.month0() / 3 + 1
    }

    pub fn validate(&self) -> Result<(), EngineError> {
        ensure_non_negative("invoice amount_usd", self.amount_usd)?;
        ensure_non_negative("invoice amount_eur", self.amount_eur)?;
        Ok(())
    }
}

/// An invoice that may only be priced in its own currency.
///
/// Drafts are turned into [`Invoice`]s by
/// [`RateResolver::price_invoices`](crate::RateResolver::price_invoices),
/// which fills in the missing amount from `exchange_rate` or from a rate lookup
/// on `issue_date`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceDraft {
    pub id: String,
    pub client_name: String,
    pub issue_date: NaiveDate,
    pub status: InvoiceStatus,
    pub currency: Currency,
    /// Amount in `currency`.
    pub amount: Decimal,
    /// Amount in the other currency, when already known.
    pub converted_amount: Option<Decimal>,
    pub exchange_rate: Option<Decimal>,
}

impl InvoiceDraft {
    /// True when the draft cannot be priced without a rate lookup.
    pub fn needs_rate(&self) -> bool {
        self.converted_amount.is_none() && self.exchange_rate.is_none()
    }
}
