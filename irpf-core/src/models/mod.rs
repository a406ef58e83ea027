mod currency;
mod invoice;
mod jurisdiction;
mod quarterly;
mod social_security_band;
mod tax_bracket;
mod tax_year_config;

pub use currency::Currency;
pub use invoice::{Invoice, InvoiceDraft, InvoiceStatus};
pub use jurisdiction::Jurisdiction;
pub use quarterly::{Modelo130Quarter, QuarterlyData};
pub use social_security_band::{BandTable, SocialSecurityBand};
pub use tax_bracket::{BracketTable, IrpfBreakdownEntry, TaxBracket};
pub use tax_year_config::TaxYearConfig;
