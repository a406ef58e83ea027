//! TOML configuration.
//!
//! ```toml
//! [engine]
//! year = 2024
//! currency = "EUR"
//! region = "madrid"
//! strict_region = false
//! advances_paid = "0"
//! invoices = "invoices.csv"
//!
//! [tables]
//! combined = "tables/combined.csv"
//! social_security = "tables/reta.csv"
//! social_security_bounds = "monthly"
//!
//! [tables.regions]
//! madrid = "tables/madrid.csv"
//!
//! [rates]
//! endpoint = "https://api.exchangerate.host"
//! fallback = "1.1"
//! offline = false
//! timeout_secs = 10
//! ```
//!
//! Every section and key is optional. Relative paths are resolved against
//! the directory holding the file.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use irpf_core::{
    Currency, FALLBACK_EUR_USD_RATE, Jurisdiction, TaxYearConfig, TaxYearConfigError,
};
use irpf_data::{BandBounds, TableLoader, TableLoaderError};
use rust_decimal::Decimal;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

pub const DEFAULT_RATES_ENDPOINT: &str = "https://api.exchangerate.host";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to load table {}: {source}", path.display())]
    Table {
        path: PathBuf,
        source: TableLoaderError,
    },

    #[error(transparent)]
    TaxYear(#[from] TaxYearConfigError),
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    pub engine: EngineSection,
    pub tables: TablesSection,
    pub rates: RatesSection,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineSection {
    /// Fiscal year; the current year when unset.
    pub year: Option<i32>,
    pub currency: Currency,
    pub region: Option<String>,
    pub strict_region: bool,
    pub advances_paid: Decimal,
    pub invoices: Option<PathBuf>,
    pub general_expense_rate: Option<Decimal>,
    pub general_expense_cap: Option<Decimal>,
    pub advance_payment_rate: Option<Decimal>,
}

impl Default for EngineSection {
    fn default() -> Self {
        Self {
            year: None,
            currency: Currency::Eur,
            region: None,
            strict_region: false,
            advances_paid: Decimal::ZERO,
            invoices: None,
            general_expense_rate: None,
            general_expense_cap: None,
            advance_payment_rate: None,
        }
    }
}

/// CSV files replacing the built-in 2024 tables.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TablesSection {
    pub national: Option<PathBuf>,
    pub combined: Option<PathBuf>,
    pub social_security: Option<PathBuf>,
    pub social_security_bounds: BandBounds,
    pub regions: BTreeMap<String, PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RatesSection {
    pub endpoint: String,
    pub fallback: Decimal,
    /// Skip lookups; every missing rate uses `fallback`.
    pub offline: bool,
    pub timeout_secs: u64,
}

impl Default for RatesSection {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_RATES_ENDPOINT.to_string(),
            fallback: FALLBACK_EUR_USD_RATE,
            offline: false,
            timeout_secs: 10,
        }
    }
}

impl AppConfig {
    /// Reads `path` and resolves relative paths against its directory.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config: Self = toml::from_str(&contents)?;
        if let Some(base) = path.parent() {
            config.resolve_paths(base);
        }
        debug!(path = %path.display(), "loaded config");
        Ok(config)
    }

    fn resolve_paths(
        &mut self,
        base: &Path,
    ) {
        let resolve = |p: &mut PathBuf| {
            if p.is_relative() {
                *p = base.join(&*p);
            }
        };

        let optional = [
            &mut self.engine.invoices,
            &mut self.tables.national,
            &mut self.tables.combined,
            &mut self.tables.social_security,
        ];
        for path in optional.into_iter().flatten() {
            resolve(path);
        }
        self.tables.regions.values_mut().for_each(resolve);
    }

    /// Built-in 2024 tables with any configured CSV tables swapped in.
    pub fn jurisdiction(&self) -> Result<Jurisdiction, ConfigError> {
        let mut jurisdiction = Jurisdiction::spain_2024().with_strict_region(self.engine.strict_region);

        if let Some(path) = &self.tables.national {
            jurisdiction = jurisdiction.with_national(load_brackets(path)?);
        }
        if let Some(path) = &self.tables.combined {
            jurisdiction = jurisdiction.with_combined(load_brackets(path)?);
        }
        if let Some(path) = &self.tables.social_security {
            let bands = TableLoader::bands_from_file(path, self.tables.social_security_bounds)
                .map_err(|source| ConfigError::Table {
                    path: path.clone(),
                    source,
                })?;
            jurisdiction = jurisdiction.with_social_security(bands);
        }
        for (name, path) in &self.tables.regions {
            jurisdiction = jurisdiction.with_region(name, load_brackets(path)?);
        }

        Ok(jurisdiction)
    }

    /// 2024 rates for `year`, with configured overrides applied and validated.
    pub fn tax_year_config(
        &self,
        year: i32,
    ) -> Result<TaxYearConfig, ConfigError> {
        let defaults = TaxYearConfig::spain_2024();
        let config = TaxYearConfig {
            tax_year: year,
            general_expense_rate: self
                .engine
                .general_expense_rate
                .unwrap_or(defaults.general_expense_rate),
            general_expense_cap: self
                .engine
                .general_expense_cap
                .unwrap_or(defaults.general_expense_cap),
            advance_payment_rate: self
                .engine
                .advance_payment_rate
                .unwrap_or(defaults.advance_payment_rate),
            fallback_exchange_rate: self.rates.fallback,
        };
        config.validate()?;
        Ok(config)
    }
}

fn load_brackets(path: &Path) -> Result<irpf_core::BracketTable, ConfigError> {
    TableLoader::brackets_from_file(path).map_err(|source| ConfigError::Table {
        path: path.to_path_buf(),
        source,
    })
}
