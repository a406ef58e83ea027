//! CSV loaders for bracket and band tables.
//!
//! Tables are validated as they are built, so a malformed file is rejected
//! at load time rather than on the first calculation.
//!
//! Bracket files have the columns `upper_limit,rate`; the last row leaves
//! `upper_limit` empty. Band files have `min,max,monthly_quota`; the last
//! row leaves `max` empty.

use std::io::Read;
use std::path::{Path, PathBuf};

use irpf_core::{BandTable, BracketTable, SocialSecurityBand, TableError, TaxBracket};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum TableLoaderError {
    #[error("CSV parse error: {0}")]
    CsvParse(String),

    #[error("Invalid table: {0}")]
    Table(#[from] TableError),

    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl From<csv::Error> for TableLoaderError {
    fn from(err: csv::Error) -> Self {
        TableLoaderError::CsvParse(err.to_string())
    }
}

/// Units the band bounds in a file are written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BandBounds {
    #[default]
    Annual,
    /// Monthly net yield, as RETA tables are published. Scaled by 12 on load.
    Monthly,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct BracketRecord {
    #[serde(deserialize_with = "deserialize_optional_decimal")]
    pub upper_limit: Option<Decimal>,
    pub rate: Decimal,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct BandRecord {
    pub min: Decimal,
    #[serde(deserialize_with = "deserialize_optional_decimal")]
    pub max: Option<Decimal>,
    pub monthly_quota: Decimal,
}

fn deserialize_optional_decimal<'de, D>(deserializer: D) -> Result<Option<Decimal>, D::Error>
where
    D: Deserializer<'de>,
{
    let s: Option<String> = Option::deserialize(deserializer)?;
    match s {
        Some(s) if s.trim().is_empty() => Ok(None),
        Some(s) => s
            .trim()
            .parse::<Decimal>()
            .map(Some)
            .map_err(serde::de::Error::custom),
        None => Ok(None),
    }
}

pub struct TableLoader;

impl TableLoader {
    pub fn parse_brackets<R: Read>(reader: R) -> Result<Vec<BracketRecord>, TableLoaderError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);
        let mut records = Vec::new();

        for result in csv_reader.deserialize() {
            let record: BracketRecord = result?;
            records.push(record);
        }

        Ok(records)
    }

    pub fn parse_bands<R: Read>(reader: R) -> Result<Vec<BandRecord>, TableLoaderError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);
        let mut records = Vec::new();

        for result in csv_reader.deserialize() {
            let record: BandRecord = result?;
            records.push(record);
        }

        Ok(records)
    }

    /// Parses and validates a bracket table.
    pub fn brackets<R: Read>(reader: R) -> Result<BracketTable, TableLoaderError> {
        let brackets = Self::parse_brackets(reader)?
            .into_iter()
            .map(|r| TaxBracket {
                upper_limit: r.upper_limit,
                rate: r.rate,
            })
            .collect::<Vec<_>>();
        debug!(count = brackets.len(), "loaded bracket table");
        Ok(BracketTable::new(brackets)?)
    }

    /// Parses and validates a band table.
    pub fn bands<R: Read>(
        reader: R,
        bounds: BandBounds,
    ) -> Result<BandTable, TableLoaderError> {
        let records = Self::parse_bands(reader)?;
        debug!(count = records.len(), ?bounds, "loaded band table");

        let table = match bounds {
            BandBounds::Annual => BandTable::new(
                records
                    .into_iter()
                    .map(|r| SocialSecurityBand {
                        min: r.min,
                        max: r.max,
                        monthly_quota: r.monthly_quota,
                    })
                    .collect(),
            )?,
            BandBounds::Monthly => {
                let rows: Vec<_> = records
                    .into_iter()
                    .map(|r| (r.min, r.max, r.monthly_quota))
                    .collect();
                BandTable::from_monthly_bounds(&rows)?
            }
        };
        Ok(table)
    }

    pub fn brackets_from_file(path: &Path) -> Result<BracketTable, TableLoaderError> {
        Self::brackets(open(path)?)
    }

    pub fn bands_from_file(
        path: &Path,
        bounds: BandBounds,
    ) -> Result<BandTable, TableLoaderError> {
        Self::bands(open(path)?, bounds)
    }
}

fn open(path: &Path) -> Result<std::fs::File, TableLoaderError> {
    std::fs::File::open(path).map_err(|source| TableLoaderError::Io {
        path: path.to_path_buf(),
        source,
    })
}
