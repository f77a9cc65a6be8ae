use crate::charts;
use crate::config::AppConfig;
use crate::data;
use crate::processing;
use crate::render;
use crate::types::JoinedRecord;
use anyhow::Result;
use std::path::PathBuf;
use tracing::info;

#[derive(Debug)]
pub struct GenerateReport {
    pub artifacts: Vec<PathBuf>,
    pub countries: usize,
    pub classified: usize,
    pub with_population: usize,
}

/// Loads the world geometry and joins the configured population table onto it.
pub fn load_joined(config: &AppConfig) -> Result<Vec<JoinedRecord>> {
    let table = config.population_table()?;
    let classifier = config.classifier()?;
    let world = data::load_world(&config.input.world, &config.input.name_column)?;
    Ok(processing::join(world, &table, &classifier))
}

pub fn generate(config: &AppConfig) -> Result<GenerateReport> {
    let out = &config.output;

    // 1. Charts of the population table
    let table = config.population_table()?;
    let mut artifacts = charts::render_charts(&table, &out.dir, out.histogram_bins)?;

    // 2. Classify and join the world geometry
    let joined = load_joined(config)?;
    let classified = joined.iter().filter(|r| r.continent.is_some()).count();
    let with_population = joined.iter().filter(|r| r.population.is_some()).count();
    info!(
        "{} of {} countries classified; the country lists are samples, so most stay unshaded",
        classified,
        joined.len()
    );

    // 3. Map and joined table
    let map_path = out.dir.join("choropleth.png");
    render::write_choropleth(&joined, out.map_width, out.map_height, &map_path)?;
    artifacts.push(map_path);

    let csv_path = out.dir.join("joined.csv");
    data::write_joined_csv(&joined, &csv_path)?;
    artifacts.push(csv_path);

    Ok(GenerateReport {
        artifacts,
        countries: joined.len(),
        classified,
        with_population,
    })
}
