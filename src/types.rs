use anyhow::anyhow;
use geo::MultiPolygon;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Continent {
    Asia,
    Africa,
    Europe,
    #[serde(rename = "North America")]
    NorthAmerica,
    #[serde(rename = "South America")]
    SouthAmerica,
    Oceania,
}

impl Continent {
    pub const ALL: [Continent; 6] = [
        Continent::Asia,
        Continent::Africa,
        Continent::Europe,
        Continent::NorthAmerica,
        Continent::SouthAmerica,
        Continent::Oceania,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Continent::Asia => "Asia",
            Continent::Africa => "Africa",
            Continent::Europe => "Europe",
            Continent::NorthAmerica => "North America",
            Continent::SouthAmerica => "South America",
            Continent::Oceania => "Oceania",
        }
    }
}

impl fmt::Display for Continent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Continent {
    type Err = anyhow::Error;

    // Exact, case-sensitive match on the display name.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Continent::ALL
            .iter()
            .copied()
            .find(|c| c.name() == s)
            .ok_or_else(|| anyhow!("Unknown continent: {:?}", s))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PopulationRecord {
    pub continent: Continent,
    pub population: u64,
}

/// A country boundary as read from the world geometry file.
#[derive(Debug, Clone, PartialEq)]
pub struct GeometryRecord {
    pub country_name: String,
    pub geometry: MultiPolygon<f64>,
}

/// A geometry record after classification and the population left join.
#[derive(Debug, Clone, PartialEq)]
pub struct JoinedRecord {
    pub country_name: String,
    pub geometry: MultiPolygon<f64>,
    pub continent: Option<Continent>,
    pub population: Option<u64>,
}
