use crate::classifier::ContinentClassifier;
use crate::population::PopulationTable;
use crate::types::{GeometryRecord, JoinedRecord};
use tracing::info;

/// Classifies each geometry record and left-joins it against the population
/// table. Every input yields exactly one output, in input order; a miss at
/// either step leaves the corresponding column as `None`.
pub fn join(
    geometry_records: Vec<GeometryRecord>,
    population_table: &PopulationTable,
    classifier: &ContinentClassifier,
) -> Vec<JoinedRecord> {
    let joined: Vec<JoinedRecord> = geometry_records
        .into_iter()
        .map(|record| {
            let continent = classifier.classify(&record.country_name);
            let population = continent.and_then(|c| population_table.get(c));
            JoinedRecord {
                country_name: record.country_name,
                geometry: record.geometry,
                continent,
                population,
            }
        })
        .collect();

    let matched = joined.iter().filter(|r| r.population.is_some()).count();
    info!("Joined population onto {} of {} countries", matched, joined.len());

    joined
}
