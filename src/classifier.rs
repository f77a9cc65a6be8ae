use crate::types::Continent;
use anyhow::{anyhow, Result};
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Continent to the set of country names that belong to it.
pub type ContinentCountryMap = BTreeMap<Continent, BTreeSet<String>>;

/// Maps country names to continents by exact, case-sensitive name match.
///
/// The country lists are samples, not an exhaustive gazetteer: most countries
/// in a real world dataset classify as `None`. Names are not normalized, so
/// `"United Kingdom"` does not match the sample's `"UK"`.
#[derive(Debug, Clone)]
pub struct ContinentClassifier {
    countries: ContinentCountryMap,
    index: HashMap<String, Continent>,
}

impl ContinentClassifier {
    pub fn new(countries: ContinentCountryMap) -> Result<Self> {
        let mut seen: HashMap<&str, Continent> = HashMap::new();
        for (continent, names) in &countries {
            for name in names {
                if let Some(previous) = seen.insert(name, *continent) {
                    return Err(anyhow!(
                        "Country {:?} listed under both {} and {}",
                        name,
                        previous,
                        continent
                    ));
                }
            }
        }
        Ok(Self::indexed(countries))
    }

    fn indexed(countries: ContinentCountryMap) -> Self {
        let index = countries
            .iter()
            .flat_map(|(continent, names)| names.iter().map(move |name| (name.clone(), *continent)))
            .collect();
        Self { countries, index }
    }

    pub fn sample() -> Self {
        let lists: [(Continent, &[&str]); 6] = [
            (Continent::Asia, &["China", "India", "Russia", "Indonesia", "Japan", "Pakistan"]),
            (Continent::Africa, &["Nigeria", "South Africa", "Egypt", "Kenya", "Ethiopia"]),
            (Continent::Europe, &["Germany", "France", "UK", "Italy", "Spain"]),
            (Continent::NorthAmerica, &["United States", "Canada", "Mexico"]),
            (Continent::SouthAmerica, &["Brazil", "Argentina", "Colombia", "Peru", "Venezuela"]),
            (Continent::Oceania, &["Australia", "New Zealand", "Papua New Guinea"]),
        ];
        let countries: ContinentCountryMap = lists
            .into_iter()
            .map(|(continent, names)| (continent, names.iter().map(|n| n.to_string()).collect()))
            .collect();
        Self::indexed(countries)
    }

    /// Builds a classifier from config-style string keys.
    pub fn from_named(lists: &HashMap<String, Vec<String>>) -> Result<Self> {
        let mut countries = ContinentCountryMap::new();
        for (continent, names) in lists {
            let continent = continent.parse::<Continent>()?;
            countries
                .entry(continent)
                .or_default()
                .extend(names.iter().cloned());
        }
        Self::new(countries)
    }

    pub fn classify(&self, country_name: &str) -> Option<Continent> {
        if country_name.is_empty() {
            return None;
        }
        self.index.get(country_name).copied()
    }

    pub fn countries(&self) -> &ContinentCountryMap {
        &self.countries
    }
}
