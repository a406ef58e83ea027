//! CSV input for the IRPF engine: invoices and tax tables.

pub mod csv_source;
pub mod invoice_loader;
pub mod table_loader;

pub use csv_source::CsvInvoiceSource;
pub use invoice_loader::InvoiceLoaderError;
pub use table_loader::{BandBounds, TableLoader, TableLoaderError};
