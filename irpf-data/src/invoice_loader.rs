//! CSV loader for invoices.
//!
//! ## CSV Format
//!
//! Headers are matched by name; column order does not matter.
//!
//! | Column             | Required | Type    | Notes                                   |
//! |--------------------|----------|---------|-----------------------------------------|
//! | `id`               | yes      | string  |                                         |
//! | `client_name`      | yes      | string  |                                         |
//! | `issue_date`       | yes      | date    | `YYYY-MM-DD`                            |
//! | `status`           | yes      | string  | `PAID`, `PENDING`, anything else kept   |
//! | `currency`         | yes      | string  | `USD` or `EUR`                          |
//! | `amount`           | yes      | decimal | In `currency`                           |
//! | `converted_amount` | no       | decimal | In the other currency                   |
//! | `exchange_rate`    | no       | decimal | USD per EUR                             |
//!
//! Rows with neither `converted_amount` nor `exchange_rate` are priced by a
//! rate lookup on `issue_date`.
//!
//! ```csv
//! id,client_name,issue_date,status,currency,amount,converted_amount,exchange_rate
//! INV-001,Acme Corp,2024-02-15,PAID,USD,11000.00,10000.00,
//! INV-002,Globex,2024-05-10,PAID,EUR,15000.00,,1.08
//! ```

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use irpf_core::{Currency, InvoiceDraft, InvoiceStatus};
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::debug;

#[derive(Debug, Deserialize)]
struct CsvRow {
    id: String,
    client_name: String,
    issue_date: NaiveDate,
    status: String,
    currency: String,
    amount: Decimal,
    converted_amount: Option<Decimal>,
    exchange_rate: Option<Decimal>,
}

#[derive(Debug, thiserror::Error)]
pub enum InvoiceLoaderError {
    #[error("CSV parse error: {0}")]
    Parse(#[from] csv::Error),

    /// `row` is 1-based, header excluded.
    #[error("unrecognised currency '{currency}' on row {row}")]
    InvalidCurrency { currency: String, row: usize },

    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

fn convert_row(
    row: CsvRow,
    row_number: usize,
) -> Result<InvoiceDraft, InvoiceLoaderError> {
    let currency = Currency::parse(&row.currency).ok_or_else(|| InvoiceLoaderError::InvalidCurrency {
        currency: row.currency.clone(),
        row: row_number,
    })?;

    Ok(InvoiceDraft {
        id: row.id,
        client_name: row.client_name,
        issue_date: row.issue_date,
        status: InvoiceStatus::parse(&row.status),
        currency,
        amount: row.amount,
        converted_amount: row.converted_amount,
        exchange_rate: row.exchange_rate,
    })
}

/// Parses invoice CSV text. Rows are returned in file order.
///
/// # Errors
///
/// * [`InvoiceLoaderError::Parse`] for structural problems or a field that
///   fails to deserialize.
/// * [`InvoiceLoaderError::InvalidCurrency`] for a currency other than USD or EUR.
pub fn load_from_str(input: &str) -> Result<Vec<InvoiceDraft>, InvoiceLoaderError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .flexible(false)
        .from_reader(input.as_bytes());

    let drafts = reader
        .deserialize::<CsvRow>()
        .enumerate()
        .map(|(idx, result)| convert_row(result?, idx + 1))
        .collect::<Result<Vec<_>, _>>()?;

    debug!(count = drafts.len(), "parsed invoices");
    Ok(drafts)
}

/// Reads `path` and delegates to [`load_from_str`].
pub fn load_from_file(path: &Path) -> Result<Vec<InvoiceDraft>, InvoiceLoaderError> {
    let contents = std::fs::read_to_string(path).map_err(|source| InvoiceLoaderError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    load_from_str(&contents)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    const HEADER: &str = "id,client_name,issue_date,status,currency,amount,converted_amount,exchange_rate";

    fn csv(rows: &[&str]) -> String {
        let mut text = HEADER.to_string();
        for row in rows {
            text.push('\n');
            text.push_str(row);
        }
        text
    }

    // -----------------------------------------------------------------------
    // Happy paths
    // -----------------------------------------------------------------------

    #[test]
    fn test_parses_all_columns() {
        let input = csv(&["INV-1,Acme Corp,2024-02-15,PAID,USD,11000.00,10000.00,1.1"]);

        let drafts = load_from_str(&input).expect("should parse");

        assert_eq!(
            drafts,
            vec![InvoiceDraft {
                id: "INV-1".to_string(),
                client_name: "Acme Corp".to_string(),
                issue_date: NaiveDate::from_ymd_opt(2024, 2, 15).unwrap(),
                status: InvoiceStatus::Paid,
                currency: Currency::Usd,
                amount: dec!(11000.00),
                converted_amount: Some(dec!(10000.00)),
                exchange_rate: Some(dec!(1.1)),
            }]
        );
    }

    #[test]
    fn test_empty_optional_columns_are_none() {
        let input = csv(&["INV-2, Globex ,2024-05-10,paid,eur,15000,,"]);

        let drafts = load_from_str(&input).expect("should parse");
        let d = &drafts[0];

        assert_eq!(d.client_name, "Globex");
        assert_eq!(d.status, InvoiceStatus::Paid);
        assert_eq!(d.currency, Currency::Eur);
        assert!(d.converted_amount.is_none());
        assert!(d.exchange_rate.is_none());
        assert!(d.needs_rate());
    }

    #[test]
    fn test_unknown_status_is_kept_as_other() {
        let input = csv(&["INV-3,Initech,2024-06-01,DRAFT,EUR,100,,"]);

        let drafts = load_from_str(&input).expect("should parse");

        assert_eq!(drafts[0].status, InvoiceStatus::Other);
    }

    #[test]
    fn test_header_only_yields_nothing() {
        let drafts = load_from_str(HEADER).expect("should parse");

        assert!(drafts.is_empty());
    }

    // -----------------------------------------------------------------------
    // Errors
    // -----------------------------------------------------------------------

    #[test]
    fn test_invalid_currency_reports_row() {
        let input = csv(&[
            "INV-1,Acme,2024-02-15,PAID,USD,100,,",
            "INV-2,Acme,2024-02-16,PAID,GBP,100,,",
        ]);

        let err = load_from_str(&input).expect_err("GBP is not supported");

        let InvoiceLoaderError::InvalidCurrency { currency, row } = err else {
            panic!("Expected InvalidCurrency, got: {:?}", err);
        };
        assert_eq!(currency, "GBP");
        assert_eq!(row, 2);
    }

    #[test]
    fn test_bad_date_is_parse_error() {
        let input = csv(&["INV-1,Acme,15/02/2024,PAID,USD,100,,"]);

        let err = load_from_str(&input).expect_err("date format is ISO only");

        assert!(matches!(err, InvoiceLoaderError::Parse(_)));
    }

    #[test]
    fn test_missing_column_is_parse_error() {
        let input = "id,client_name,issue_date\nINV-1,Acme,2024-02-15";

        let err = load_from_str(input).expect_err("should fail for missing columns");

        let InvoiceLoaderError::Parse(e) = err else {
            panic!("Expected Parse error, got: {:?}", err);
        };
        assert!(
            e.to_string().contains("missing field"),
            "Expected 'missing field' in error, got: {}",
            e
        );
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = load_from_file(Path::new("/nonexistent/invoices.csv")).expect_err("no such file");

        assert!(matches!(err, InvoiceLoaderError::Io { .. }));
    }
}
