use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use chrono::{Datelike, Local};
use clap::Parser;
use irpf_cli::config::AppConfig;
use irpf_cli::output::{CliOutput, render_json, render_text};
use irpf_cli::{HttpRateProvider, OutputFormat, logging};
use irpf_core::{
    Currency, ExchangeRateProvider, Invoice, InvoiceDraft, InvoiceSource, OfflineRateProvider,
    RateResolver, TaxEngine, TaxYearConfig,
};
use irpf_data::CsvInvoiceSource;
use rust_decimal::Decimal;
use tracing::{info, warn};

/// Estimate IRPF, social security and Modelo 130 advances from an invoice CSV.
///
/// The invoice CSV needs the columns id, client_name, issue_date, status,
/// currency, amount, converted_amount and exchange_rate.
#[derive(Parser, Debug)]
#[command(name = "irpf")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Invoice CSV; overrides `engine.invoices` in the config
    invoices: Option<PathBuf>,

    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Fiscal year (defaults to the current year)
    #[arg(short, long)]
    year: Option<i32>,

    /// Report currency: USD or EUR
    #[arg(long, value_parser = parse_currency)]
    currency: Option<Currency>,

    /// Regional schedule, e.g. madrid
    #[arg(short, long)]
    region: Option<String>,

    /// Fail on an unknown region instead of using the default
    #[arg(long, default_value_t = false)]
    strict_region: bool,

    /// Modelo 130 advances already paid
    #[arg(long)]
    advances_paid: Option<Decimal>,

    /// Quarter to show the payment snapshot for (defaults to the current one)
    #[arg(short, long)]
    quarter: Option<u32>,

    /// Do not fetch exchange rates; use the fallback rate
    #[arg(long, default_value_t = false)]
    offline: bool,

    #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
    format: OutputFormat,

    /// Log filter, e.g. "debug" or "warn,irpf_core=trace" (overrides RUST_LOG)
    #[arg(long)]
    log_level: Option<String>,

    /// Append log records to this file
    #[arg(long)]
    log_file: Option<PathBuf>,
}

fn parse_currency(s: &str) -> Result<Currency, String> {
    Currency::parse(s).ok_or_else(|| format!("unknown currency '{s}' (expected USD or EUR)"))
}

async fn price<P: ExchangeRateProvider>(
    provider: P,
    config: &TaxYearConfig,
    drafts: Vec<InvoiceDraft>,
) -> Result<Vec<Invoice>> {
    RateResolver::from_tax_year_config(provider, config)?
        .price_invoices(drafts)
        .await
        .context("Failed to price invoices")
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.log_level.as_deref(), cli.log_file.as_deref())?;

    let mut config = match &cli.config {
        Some(path) => AppConfig::load(path)
            .with_context(|| format!("Failed to load config: {}", path.display()))?,
        None => AppConfig::default(),
    };
    if let Some(currency) = cli.currency {
        config.engine.currency = currency;
    }
    if let Some(region) = cli.region {
        config.engine.region = Some(region);
    }
    if let Some(advances) = cli.advances_paid {
        config.engine.advances_paid = advances;
    }
    config.engine.strict_region |= cli.strict_region;
    config.rates.offline |= cli.offline;

    let today = Local::now().date_naive();
    let year = cli.year.or(config.engine.year).unwrap_or(today.year());
    let Some(invoices_path) = cli.invoices.or(config.engine.invoices.clone()) else {
        bail!("No invoice file given (pass a path or set engine.invoices in the config)");
    };

    let engine = TaxEngine::new(config.jurisdiction()?, config.tax_year_config(year)?)?;

    let drafts = CsvInvoiceSource::new(&invoices_path)
        .list_invoices()
        .await
        .with_context(|| format!("Failed to read invoices: {}", invoices_path.display()))?;
    info!(count = drafts.len(), path = %invoices_path.display(), "loaded invoices");

    let invoices = if config.rates.offline {
        price(OfflineRateProvider, engine.config(), drafts).await?
    } else {
        let provider = HttpRateProvider::new(
            &config.rates.endpoint,
            Duration::from_secs(config.rates.timeout_secs),
        )?;
        price(provider, engine.config(), drafts).await?
    };

    let mut request = engine
        .request(config.engine.currency)
        .with_advances_paid(config.engine.advances_paid);
    request.region = config.engine.region.clone();
    let report = engine
        .report(&invoices, &request)
        .context("Failed to build report")?;

    if report.fallback_rate_invoices > 0 {
        warn!(
            count = report.fallback_rate_invoices,
            "Some invoices were priced at the fallback exchange rate"
        );
    }

    let snapshot = match cli.quarter {
        Some(q) => Some(report.quarter_snapshot(q)?),
        None if year == today.year() => Some(report.snapshot_for(today)?),
        None => None,
    };

    let output = CliOutput {
        report: &report,
        snapshot: snapshot.as_ref(),
    };
    match cli.format {
        OutputFormat::Json => {
            println!("{}", render_json(&output)?);
            for message in &report.advisories.messages {
                eprintln!("{message}");
            }
        }
        OutputFormat::Text => println!("{}", render_text(&output)),
    }

    Ok(())
}
