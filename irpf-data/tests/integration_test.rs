//! Integration tests running the CSV fixtures through pricing and the report.

use std::path::{Path, PathBuf};

use irpf_core::{
    Currency, FixedRateProvider, InvoiceSource, Jurisdiction, RateResolver, ReportRequest,
    TaxEngine, TaxYearConfig,
};
use irpf_data::{BandBounds, CsvInvoiceSource, TableLoader, invoice_loader};
use pretty_assertions::assert_eq;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("test-data").join(name)
}

#[test]
fn test_load_invoice_fixture() {
    let drafts = invoice_loader::load_from_file(&fixture("invoices_2024.csv"))
        .expect("fixture file should load without error");

    assert_eq!(drafts.len(), 5);
    let needing_rate: Vec<&str> = drafts
        .iter()
        .filter(|d| d.needs_rate())
        .map(|d| d.id.as_str())
        .collect();
    assert_eq!(needing_rate, vec!["INV-2024-003"]);
}

#[test]
fn test_table_fixtures_match_built_in_tables() {
    let built_in = Jurisdiction::spain_2024();

    let combined = TableLoader::brackets_from_file(&fixture("combined_brackets_2024.csv"))
        .expect("bracket fixture should load");
    let bands = TableLoader::bands_from_file(
        &fixture("reta_bands_2024_monthly.csv"),
        BandBounds::Monthly,
    )
    .expect("band fixture should load");

    assert_eq!(&combined, built_in.combined());
    assert_eq!(&bands, built_in.social_security());
}

#[tokio::test]
async fn test_csv_source_lists_invoices() {
    let source = CsvInvoiceSource::new(fixture("invoices_2024.csv"));

    let drafts = source.list_invoices().await.expect("source should read fixture");

    assert_eq!(drafts.len(), 5);
    assert_eq!(drafts[0].client_name, "Acme Corp");
}

#[tokio::test]
async fn test_csv_source_missing_file() {
    let source = CsvInvoiceSource::new(fixture("does_not_exist.csv"));

    let err = source.list_invoices().await.expect_err("file is missing");

    assert!(matches!(err, irpf_core::SourceError::Unavailable(_)));
}

#[tokio::test]
async fn test_fixture_report_end_to_end() {
    let drafts = CsvInvoiceSource::new(fixture("invoices_2024.csv"))
        .list_invoices()
        .await
        .unwrap();
    let invoices = RateResolver::new(FixedRateProvider(dec!(1.1)))
        .price_invoices(drafts)
        .await
        .unwrap();

    let jurisdiction = Jurisdiction::spain_2024()
        .with_combined(TableLoader::brackets_from_file(&fixture("combined_brackets_2024.csv")).unwrap())
        .with_social_security(
            TableLoader::bands_from_file(&fixture("reta_bands_2024_monthly.csv"), BandBounds::Monthly)
                .unwrap(),
        );
    let engine = TaxEngine::new(jurisdiction, TaxYearConfig::spain_2024()).unwrap();

    let report = engine
        .report(&invoices, &ReportRequest::new(2024, Currency::Eur))
        .unwrap();

    assert_eq!(report.invoice_count, 3);
    assert_eq!(report.summary.total_income, dec!(30000));
    assert_eq!(report.summary.ss_monthly, dec!(325));
    assert_eq!(report.summary.total_tax, dec!(5228.48));
    let due: Vec<Decimal> = report.quarters.iter().map(|q| q.amount_due).collect();
    assert_eq!(due, vec![dec!(1705), dec!(2655), dec!(0), dec!(560)]);
    assert_eq!(report.fallback_rate_invoices, 0);
}
