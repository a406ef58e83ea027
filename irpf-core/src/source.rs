//! Where invoices come from.

use async_trait::async_trait;
use thiserror::Error;

use crate::models::InvoiceDraft;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Invoice source unavailable: {0}")]
    Unavailable(String),

    #[error("Malformed invoice data: {0}")]
    Malformed(String),
}

#[async_trait]
pub trait InvoiceSource: Send + Sync {
    /// Every stored invoice, in whatever order the store keeps them.
    async fn list_invoices(&self) -> Result<Vec<InvoiceDraft>, SourceError>;
}

/// Holds invoices in memory.
#[derive(Debug, Clone, Default)]
pub struct InMemoryInvoiceSource {
    invoices: Vec<InvoiceDraft>,
}

impl InMemoryInvoiceSource {
    pub fn new(invoices: Vec<InvoiceDraft>) -> Self {
        Self { invoices }
    }
}

#[async_trait]
impl InvoiceSource for InMemoryInvoiceSource {
    async fn list_invoices(&self) -> Result<Vec<InvoiceDraft>, SourceError> {
        Ok(self.invoices.clone())
    }
}
