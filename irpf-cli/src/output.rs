//! Rendering a report for the terminal.

use clap::ValueEnum;
use irpf_core::{QuarterSnapshot, YearlyReport};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Pretty-printed JSON on stdout, advisories on stderr.
    #[default]
    Json,
    /// Plain text summary.
    Text,
}

#[derive(Debug, Serialize)]
pub struct CliOutput<'a> {
    pub report: &'a YearlyReport,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snapshot: Option<&'a QuarterSnapshot>,
}

pub fn render_json(output: &CliOutput<'_>) -> serde_json::Result<String> {
    serde_json::to_string_pretty(output)
}

pub fn render_text(output: &CliOutput<'_>) -> String {
    let report = output.report;
    let s = &report.summary;
    let cur = report.currency;
    let mut lines = vec![
        format!("IRPF {} ({}, {})", report.year, report.region, cur),
        format!("  Income             {:>12.2} {cur}", s.total_income),
        format!("  General deduction  {:>12.2} {cur}", s.general_deduction),
        format!("  Social security    {:>12.2} {cur} ({:.2}/month)", s.ss_annual, s.ss_monthly),
        format!("  Taxable income     {:>12.2} {cur}", s.taxable_income),
        format!(
            "  IRPF               {:>12.2} {cur} (state {:.2}, regional {:.2})",
            s.total_tax, s.state_tax, s.regional_tax
        ),
        format!("  Effective rate     {:>11.2}%", s.effective_rate * rust_decimal::Decimal::ONE_HUNDRED),
        format!("  Take-home          {:>12.2} {cur} ({:.2}/month)", s.take_home_annual, s.take_home_monthly),
        String::new(),
        "Modelo 130".to_string(),
    ];
    for q in &report.quarters {
        lines.push(format!(
            "  Q{}  net {:>12.2}  due {:>10.2} {cur}",
            q.quarter, q.net_income, q.amount_due
        ));
    }
    lines.push(format!("  Advances           {:>12.2} {cur}", report.advances_total));
    lines.push(format!("  Final balance      {:>12.2} {cur}", report.final_balance));

    if let Some(snapshot) = output.snapshot {
        lines.push(String::new());
        lines.push(format!(
            "Your estimated Modelo 130 payment for Q{} is {:.2} {cur} due by {}.",
            snapshot.quarter,
            snapshot.advance,
            snapshot.deadline.format("%B %-d")
        ));
    }
    if report.fallback_rate_invoices > 0 {
        lines.push(format!(
            "{} invoice(s) priced at the fallback exchange rate.",
            report.fallback_rate_invoices
        ));
    }

    lines.push(String::new());
    lines.extend(report.advisories.messages.iter().cloned());
    lines.join("\n")
}
