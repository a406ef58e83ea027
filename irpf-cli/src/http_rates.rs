//! EUR→USD rates from an exchangerate.host-style HTTP API.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use irpf_core::{ExchangeRateProvider, RateError};
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::debug;

pub struct HttpRateProvider {
    client: reqwest::Client,
    base_url: String,
}

#[derive(Deserialize)]
struct RatesResponse {
    #[serde(default)]
    rates: HashMap<String, Decimal>,
}

impl HttpRateProvider {
    /// `base_url` should be like `https://api.exchangerate.host` (no trailing slash).
    pub fn new(
        base_url: &str,
        timeout: Duration,
    ) -> Result<Self, RateError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RateError::Request(e.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url_for(
        &self,
        date: NaiveDate,
    ) -> String {
        format!(
            "{}/{}?base=EUR&symbols=USD",
            self.base_url,
            date.format("%Y-%m-%d")
        )
    }
}

fn parse_rate(
    body: &str,
    date: NaiveDate,
) -> Result<Decimal, RateError> {
    let response: RatesResponse =
        serde_json::from_str(body).map_err(|e| RateError::Request(format!("bad JSON: {e}")))?;
    response
        .rates
        .get("USD")
        .copied()
        .ok_or(RateError::MissingRate(date))
}

#[async_trait]
impl ExchangeRateProvider for HttpRateProvider {
    async fn eur_to_usd(&self, date: NaiveDate) -> Result<Decimal, RateError> {
        let url = self.url_for(date);
        debug!(url = %url, "fetching exchange rate");

        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| RateError::Request(e.to_string()))?;
        let status = resp.status();
        if !status.is_success() {
            return Err(RateError::Request(format!("server returned {status}")));
        }

        let body = resp
            .text()
            .await
            .map_err(|e| RateError::Request(e.to_string()))?;
        parse_rate(&body, date)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 15).unwrap()
    }

    #[test]
    fn url_for_formats_date_and_strips_slash() {
        let provider = HttpRateProvider::new("https://rates.example/", Duration::from_secs(1)).unwrap();

        assert_eq!(
            provider.url_for(date()),
            "https://rates.example/2024-03-15?base=EUR&symbols=USD"
        );
    }

    #[test]
    fn parse_rate_reads_usd() {
        let body = r#"{"success":true,"base":"EUR","date":"2024-03-15","rates":{"USD":1.0892}}"#;

        assert_eq!(parse_rate(body, date()).unwrap(), dec!(1.0892));
    }

    #[test]
    fn parse_rate_missing_usd() {
        let body = r#"{"success":false,"error":{"code":101}}"#;

        let err = parse_rate(body, date()).unwrap_err();

        assert!(matches!(err, RateError::MissingRate(d) if d == date()));
    }

    #[test]
    fn parse_rate_rejects_garbage() {
        let err = parse_rate("<html>busy</html>", date()).unwrap_err();

        assert!(matches!(err, RateError::Request(_)));
    }
}
