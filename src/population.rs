use crate::types::{Continent, PopulationRecord};
use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::collections::{BTreeMap, HashSet};
use std::path::Path;

/// Population count per continent, in table order. Continents are unique.
#[derive(Debug, Clone, PartialEq)]
pub struct PopulationTable {
    records: Vec<PopulationRecord>,
}

#[derive(Debug, Deserialize)]
struct PopulationRow {
    continent: String,
    population: u64,
}

impl PopulationTable {
    pub fn from_records(records: Vec<PopulationRecord>) -> Result<Self> {
        if records.is_empty() {
            return Err(anyhow!("Population table must not be empty"));
        }
        let mut seen = HashSet::new();
        for record in &records {
            if !seen.insert(record.continent) {
                return Err(anyhow!("Duplicate continent in population table: {}", record.continent));
            }
        }
        Ok(Self { records })
    }

    /// The six-row sample shipped with the tool.
    pub fn sample() -> Self {
        let records = [
            (Continent::Asia, 4_641_054_775),
            (Continent::Africa, 1_340_598_147),
            (Continent::Europe, 747_636_026),
            (Continent::NorthAmerica, 592_072_212),
            (Continent::SouthAmerica, 430_759_766),
            (Continent::Oceania, 43_111_704),
        ]
        .into_iter()
        .map(|(continent, population)| PopulationRecord { continent, population })
        .collect();
        Self { records }
    }

    /// Reads a `continent,population` CSV.
    pub fn load_csv(path: &Path) -> Result<Self> {
        let mut rdr = csv::Reader::from_path(path)
            .with_context(|| format!("Failed to open population CSV: {:?}", path))?;
        let mut records = Vec::new();
        for (line, result) in rdr.deserialize::<PopulationRow>().enumerate() {
            let row = result.with_context(|| format!("Malformed population row {}", line + 1))?;
            let continent = row.continent.parse::<Continent>()?;
            records.push(PopulationRecord { continent, population: row.population });
        }
        Self::from_records(records)
            .with_context(|| format!("Invalid population CSV: {:?}", path))
    }

    pub fn records(&self) -> &[PopulationRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, continent: Continent) -> Option<u64> {
        self.records
            .iter()
            .find(|r| r.continent == continent)
            .map(|r| r.population)
    }

    pub fn populations(&self) -> Vec<f64> {
        self.records.iter().map(|r| r.population as f64).collect()
    }

    /// Population summed per continent, keyed and ordered by continent name.
    pub fn pivot(&self) -> BTreeMap<&'static str, u64> {
        let mut pivot = BTreeMap::new();
        for record in &self.records {
            *pivot.entry(record.continent.name()).or_insert(0) += record.population;
        }
        pivot
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn sample_has_one_positive_record_per_continent() {
        let table = PopulationTable::sample();
        assert_eq!(table.len(), Continent::ALL.len());
        for c in Continent::ALL {
            let matching = table.records().iter().filter(|r| r.continent == c).count();
            assert_eq!(matching, 1, "{} should appear once", c);
            assert!(table.get(c).unwrap() > 0);
        }
    }

    #[test]
    fn asia_needs_more_than_u32() {
        let asia = PopulationTable::sample().get(Continent::Asia).unwrap();
        assert!(asia > u32::MAX as u64);
    }

    #[test]
    fn duplicate_continent_rejected() {
        let records = vec![
            PopulationRecord { continent: Continent::Asia, population: 1 },
            PopulationRecord { continent: Continent::Asia, population: 2 },
        ];
        let err = PopulationTable::from_records(records).unwrap_err();
        assert!(err.to_string().contains("Duplicate continent"));
    }

    #[test]
    fn pivot_is_sorted_by_name() {
        let keys: Vec<_> = PopulationTable::sample().pivot().keys().copied().collect();
        assert_eq!(
            keys,
            vec!["Africa", "Asia", "Europe", "North America", "Oceania", "South America"]
        );
    }

    #[test]
    fn load_csv_with_partial_table() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "continent,population").unwrap();
        writeln!(file, "Europe,10").unwrap();
        writeln!(file, "North America,20").unwrap();
        let table = PopulationTable::load_csv(file.path()).unwrap();
        assert_eq!(table.get(Continent::NorthAmerica), Some(20));
        assert_eq!(table.get(Continent::Asia), None);
    }

    #[test]
    fn load_csv_rejects_unknown_and_duplicate_continents() {
        let mut unknown = tempfile::NamedTempFile::new().unwrap();
        writeln!(unknown, "continent,population\nAntarctica,5").unwrap();
        assert!(PopulationTable::load_csv(unknown.path()).is_err());

        let mut dup = tempfile::NamedTempFile::new().unwrap();
        writeln!(dup, "continent,population\nAsia,5\nAsia,6").unwrap();
        assert!(PopulationTable::load_csv(dup.path()).is_err());
    }
}
