//! Rate schedules for one fiscal jurisdiction and year.
//!
//! A [`Jurisdiction`] bundles the national (state) schedule, the combined
//! schedule used for the bracket breakdown and advisories, and one schedule
//! per autonomous region. Regions are looked up by a case-insensitive name.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tracing::warn;

use super::{BandTable, BracketTable, TaxBracket};
use crate::error::{EngineError, TableError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Jurisdiction {
    national: BracketTable,
    combined: BracketTable,
    regions: BTreeMap<String, BracketTable>,
    default_region: String,
    strict_region: bool,
    social_security: BandTable,
}

impl Jurisdiction {
    /// # Errors
    ///
    /// Returns [`TableError::UnknownDefaultRegion`] if `default_region` is not
    /// one of the keys of `regions`.
    pub fn new(
        national: BracketTable,
        combined: BracketTable,
        regions: BTreeMap<String, BracketTable>,
        default_region: &str,
        social_security: BandTable,
    ) -> Result<Self, TableError> {
        let regions: BTreeMap<String, BracketTable> = regions
            .into_iter()
            .map(|(name, table)| (normalize_region(&name), table))
            .collect();
        let default_region = normalize_region(default_region);

        if !regions.contains_key(&default_region) {
            return Err(TableError::UnknownDefaultRegion(default_region));
        }

        Ok(Self {
            national,
            combined,
            regions,
            default_region,
            strict_region: false,
            social_security,
        })
    }

    /// Makes unknown regions an error instead of falling back to the default.
    pub fn with_strict_region(
        mut self,
        strict: bool,
    ) -> Self {
        self.strict_region = strict;
        self
    }

    pub fn with_national(
        mut self,
        national: BracketTable,
    ) -> Self {
        self.national = national;
        self
    }

    pub fn with_combined(
        mut self,
        combined: BracketTable,
    ) -> Self {
        self.combined = combined;
        self
    }

    pub fn with_region(
        mut self,
        name: &str,
        table: BracketTable,
    ) -> Self {
        self.regions.insert(normalize_region(name), table);
        self
    }

    pub fn with_social_security(
        mut self,
        bands: BandTable,
    ) -> Self {
        self.social_security = bands;
        self
    }

    pub fn national(&self) -> &BracketTable {
        &self.national
    }

    pub fn combined(&self) -> &BracketTable {
        &self.combined
    }

    pub fn social_security(&self) -> &BandTable {
        &self.social_security
    }

    pub fn default_region(&self) -> &str {
        &self.default_region
    }

    pub fn is_strict_region(&self) -> bool {
        self.strict_region
    }

    pub fn region_names(&self) -> impl Iterator<Item = &str> {
        self.regions.keys().map(String::as_str)
    }

    /// Resolves `region` to its schedule, returning the canonical name used.
    ///
    /// Unknown regions resolve to the default region unless strict mode is on.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::UnknownRegion`] for an unknown region in strict mode.
    pub fn resolve_region(
        &self,
        region: &str,
    ) -> Result<(&str, &BracketTable), EngineError> {
        let key = normalize_region(region);
        if let Some((name, table)) = self.regions.get_key_value(&key) {
            return Ok((name.as_str(), table));
        }

        if self.strict_region {
            return Err(EngineError::UnknownRegion(region.to_string()));
        }

        warn!(
            requested = %region,
            default = %self.default_region,
            "Unknown region; using default regional schedule"
        );
        let table = &self.regions[&self.default_region];
        Ok((self.default_region.as_str(), table))
    }

    /// Spanish IRPF 2024 schedules and the 2024 RETA contribution bands.
    pub fn spain_2024() -> Self {
        let mut regions = BTreeMap::new();
        regions.insert("madrid".to_string(), madrid_2024());
        regions.insert("catalonia".to_string(), catalonia_2024());
        regions.insert("andalusia".to_string(), andalusia_2024());
        regions.insert("valencia".to_string(), valencia_2024());

        Self {
            national: schedule(
                &[
                    (dec!(12450), dec!(0.095)),
                    (dec!(20200), dec!(0.12)),
                    (dec!(35200), dec!(0.15)),
                    (dec!(60000), dec!(0.185)),
                    (dec!(300000), dec!(0.225)),
                ],
                dec!(0.245),
            ),
            combined: schedule(
                &[
                    (dec!(12450), dec!(0.19)),
                    (dec!(20200), dec!(0.24)),
                    (dec!(35200), dec!(0.30)),
                    (dec!(60000), dec!(0.37)),
                    (dec!(300000), dec!(0.45)),
                ],
                dec!(0.47),
            ),
            regions,
            default_region: "madrid".to_string(),
            strict_region: false,
            social_security: reta_2024(),
        }
    }
}

fn normalize_region(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Builds a table the caller knows is well-formed.
fn schedule(
    bounded: &[(Decimal, Decimal)],
    top_rate: Decimal,
) -> BracketTable {
    let mut brackets: Vec<TaxBracket> = bounded
        .iter()
        .map(|&(limit, rate)| TaxBracket::bounded(limit, rate))
        .collect();
    brackets.push(TaxBracket::unbounded(top_rate));
    match BracketTable::new(brackets) {
        Ok(table) => table,
        Err(e) => unreachable!("built-in schedule is invalid: {e}"),
    }
}

fn madrid_2024() -> BracketTable {
    schedule(
        &[
            (dec!(13362.22), dec!(0.085)),
            (dec!(19004.63), dec!(0.107)),
            (dec!(35425.68), dec!(0.128)),
            (dec!(57320.40), dec!(0.174)),
        ],
        dec!(0.205),
    )
}

fn catalonia_2024() -> BracketTable {
    schedule(
        &[
            (dec!(12450), dec!(0.105)),
            (dec!(17707.20), dec!(0.12)),
            (dec!(21000), dec!(0.14)),
            (dec!(33007.20), dec!(0.15)),
            (dec!(53407.20), dec!(0.188)),
            (dec!(90000), dec!(0.215)),
            (dec!(120000), dec!(0.235)),
            (dec!(175000), dec!(0.245)),
        ],
        dec!(0.255),
    )
}

fn andalusia_2024() -> BracketTable {
    schedule(
        &[
            (dec!(13000), dec!(0.095)),
            (dec!(21100), dec!(0.12)),
            (dec!(35200), dec!(0.15)),
            (dec!(60000), dec!(0.185)),
        ],
        dec!(0.225),
    )
}

fn valencia_2024() -> BracketTable {
    schedule(
        &[
            (dec!(12000), dec!(0.09)),
            (dec!(22000), dec!(0.12)),
            (dec!(32000), dec!(0.15)),
            (dec!(42000), dec!(0.175)),
            (dec!(52000), dec!(0.20)),
            (dec!(62000), dec!(0.225)),
            (dec!(72000), dec!(0.25)),
            (dec!(100000), dec!(0.265)),
            (dec!(150000), dec!(0.275)),
            (dec!(200000), dec!(0.285)),
        ],
        dec!(0.295),
    )
}

/// RETA bands, published per month of net yield.
fn reta_2024() -> BandTable {
    let rows = [
        (dec!(0), Some(dec!(670)), dec!(200)),
        (dec!(670), Some(dec!(900)), dec!(235)),
        (dec!(900), Some(dec!(1166.70)), dec!(265)),
        (dec!(1166.70), Some(dec!(1300)), dec!(275)),
        (dec!(1300), Some(dec!(1500)), dec!(291)),
        (dec!(1500), Some(dec!(1700)), dec!(294)),
        (dec!(1700), Some(dec!(1850)), dec!(299)),
        (dec!(1850), Some(dec!(2030)), dec!(305)),
        (dec!(2030), Some(dec!(2330)), dec!(315)),
        (dec!(2330), Some(dec!(2760)), dec!(325)),
        (dec!(2760), Some(dec!(3190)), dec!(335)),
        (dec!(3190), Some(dec!(3650)), dec!(355)),
        (dec!(3650), Some(dec!(4250)), dec!(375)),
        (dec!(4250), Some(dec!(6000)), dec!(415)),
        (dec!(6000), None, dec!(530)),
    ];
    match BandTable::from_monthly_bounds(&rows) {
        Ok(table) => table,
        Err(e) => unreachable!("built-in band table is invalid: {e}"),
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn resolve_region_is_case_insensitive() {
        let jurisdiction = Jurisdiction::spain_2024();

        let (name, table) = jurisdiction.resolve_region("  CataLONIA ").unwrap();

        assert_eq!(name, "catalonia");
        assert_eq!(table, &catalonia_2024());
    }

    // Permissive fallback: an unknown region silently uses the default schedule.
    #[test]
    fn resolve_region_falls_back_to_default_for_unknown_region() {
        let jurisdiction = Jurisdiction::spain_2024();

        let (name, table) = jurisdiction.resolve_region("atlantis").unwrap();

        assert_eq!(name, "madrid");
        assert_eq!(table, &madrid_2024());
    }

    #[test]
    fn resolve_region_errors_for_unknown_region_when_strict() {
        let jurisdiction = Jurisdiction::spain_2024().with_strict_region(true);

        let result = jurisdiction.resolve_region("atlantis");

        assert_eq!(
            result,
            Err(EngineError::UnknownRegion("atlantis".to_string()))
        );
    }

    #[test]
    fn strict_mode_still_resolves_known_regions() {
        let jurisdiction = Jurisdiction::spain_2024().with_strict_region(true);

        let (name, _) = jurisdiction.resolve_region("Valencia").unwrap();

        assert_eq!(name, "valencia");
    }

    #[test]
    fn new_rejects_unknown_default_region() {
        let base = Jurisdiction::spain_2024();

        let result = Jurisdiction::new(
            base.national().clone(),
            base.combined().clone(),
            BTreeMap::from([("madrid".to_string(), madrid_2024())]),
            "Galicia",
            base.social_security().clone(),
        );

        assert_eq!(
            result,
            Err(TableError::UnknownDefaultRegion("galicia".to_string()))
        );
    }

    #[test]
    fn with_region_adds_normalized_key() {
        let jurisdiction = Jurisdiction::spain_2024().with_region("Galicia", andalusia_2024());

        assert!(jurisdiction.region_names().any(|name| name == "galicia"));
    }

    #[test]
    fn reta_table_is_annualized() {
        let bands = reta_2024();

        assert_eq!(bands.bands().len(), 15);
        assert_eq!(bands.bands()[9].min, dec!(27960));
        assert_eq!(bands.bands()[9].max, Some(dec!(33120)));
        assert_eq!(bands.bands()[9].monthly_quota, dec!(325));
    }
}
