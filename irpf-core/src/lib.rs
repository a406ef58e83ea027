//! IRPF, social-security and Modelo 130 calculations for a Spanish
//! self-employed worker invoicing in USD and EUR.

pub mod calculations;
pub mod error;
pub mod models;
pub mod rates;
pub mod source;

pub use calculations::{QuarterSnapshot, ReportRequest, TaxEngine, YearlyReport};
pub use error::{EngineError, TableError, TaxYearConfigError};
pub use models::*;
pub use rates::{
    ExchangeRateProvider, FALLBACK_EUR_USD_RATE, FixedRateProvider, OfflineRateProvider, RateError,
    RateQuote, RateResolver,
};
pub use source::{InMemoryInvoiceSource, InvoiceSource, SourceError};
