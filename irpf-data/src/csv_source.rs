use std::path::PathBuf;

use async_trait::async_trait;
use irpf_core::{InvoiceDraft, InvoiceSource, SourceError};
use tracing::debug;

use crate::invoice_loader::{InvoiceLoaderError, load_from_str};

/// Reads invoices from a CSV file on every call.
#[derive(Debug, Clone)]
pub struct CsvInvoiceSource {
    path: PathBuf,
}

impl CsvInvoiceSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }
}

#[async_trait]
impl InvoiceSource for CsvInvoiceSource {
    async fn list_invoices(&self) -> Result<Vec<InvoiceDraft>, SourceError> {
        debug!(path = %self.path.display(), "reading invoices");
        let contents = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| SourceError::Unavailable(format!("{}: {e}", self.path.display())))?;

        load_from_str(&contents).map_err(|e| match e {
            InvoiceLoaderError::Io { .. } => SourceError::Unavailable(e.to_string()),
            other => SourceError::Malformed(other.to_string()),
        })
    }
}
