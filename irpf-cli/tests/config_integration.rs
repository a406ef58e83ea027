//! Loads the fixture config from disk and runs a full offline report with it.

use std::path::{Path, PathBuf};

use irpf_cli::AppConfig;
use irpf_core::{InvoiceSource, OfflineRateProvider, RateResolver, ReportRequest, TaxEngine};
use irpf_data::CsvInvoiceSource;
use pretty_assertions::assert_eq;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn fixture_path() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join("irpf.toml")
}

#[test]
fn test_fixture_config_loads() {
    let config = AppConfig::load(&fixture_path()).expect("fixture config should load");

    assert_eq!(config.engine.year, Some(2024));
    assert!(config.rates.offline);
    let invoices = config.engine.invoices.expect("invoice path is set");
    assert!(invoices.is_absolute());
    assert!(invoices.exists(), "{} should exist", invoices.display());
}

#[test]
fn test_fixture_tables_load() {
    let config = AppConfig::load(&fixture_path()).unwrap();

    let jurisdiction = config.jurisdiction().expect("fixture tables should be valid");

    assert_eq!(jurisdiction.social_security().bands().len(), 15);
}

#[tokio::test]
async fn test_offline_report_from_fixture_config() {
    let config = AppConfig::load(&fixture_path()).unwrap();
    let engine = TaxEngine::new(
        config.jurisdiction().unwrap(),
        config.tax_year_config(2024).unwrap(),
    )
    .unwrap();

    let drafts = CsvInvoiceSource::new(config.engine.invoices.clone().unwrap())
        .list_invoices()
        .await
        .unwrap();
    let invoices = RateResolver::new(OfflineRateProvider)
        .with_fallback_rate(config.rates.fallback)
        .unwrap()
        .price_invoices(drafts)
        .await
        .unwrap();

    // Only the pending invoice had no amount or rate to go on.
    let fallback: Vec<&str> = invoices
        .iter()
        .filter(|i| i.rate_is_fallback)
        .map(|i| i.id.as_str())
        .collect();
    assert_eq!(fallback, vec!["INV-2024-003"]);

    let mut request = ReportRequest::new(2024, config.engine.currency);
    request.region = config.engine.region.clone();
    let report = engine.report(&invoices, &request).unwrap();

    assert_eq!(report.region, "madrid");
    assert_eq!(report.fallback_rate_invoices, 0);
    let due: Vec<Decimal> = report.quarters.iter().map(|q| q.amount_due).collect();
    assert_eq!(due, vec![dec!(1705), dec!(2655), dec!(0), dec!(560)]);
}
