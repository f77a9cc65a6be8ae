use crate::classifier::ContinentClassifier;
use crate::population::PopulationTable;
use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub input: InputConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub classifier: ClassifierConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct InputConfig {
    pub world: PathBuf,
    #[serde(default = "default_name_column")]
    pub name_column: String,
    pub population_csv: Option<PathBuf>, // Falls back to the built-in sample
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct OutputConfig {
    pub dir: PathBuf,
    pub map_width: u32,
    pub map_height: u32,
    pub histogram_bins: usize,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct ClassifierConfig {
    // Continent name -> country names. Replaces the sample lists when set.
    pub countries: Option<HashMap<String, Vec<String>>>,
}

fn default_name_column() -> String {
    "name".to_string()
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("output"),
            map_width: 1500,
            map_height: 1000,
            histogram_bins: 10,
        }
    }
}

impl AppConfig {
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: AppConfig = toml::from_str(content)
            .with_context(|| "Failed to parse TOML configuration")?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.output.map_width == 0 || self.output.map_height == 0 {
            return Err(anyhow!(
                "Map size must be non-zero, got {}x{}",
                self.output.map_width,
                self.output.map_height
            ));
        }
        if self.output.histogram_bins == 0 {
            return Err(anyhow!("histogram_bins must be at least 1"));
        }
        if self.input.name_column.is_empty() {
            return Err(anyhow!("name_column must not be empty"));
        }
        Ok(())
    }

    pub fn population_table(&self) -> Result<PopulationTable> {
        match &self.input.population_csv {
            Some(path) => PopulationTable::load_csv(path),
            None => Ok(PopulationTable::sample()),
        }
    }

    pub fn classifier(&self) -> Result<ContinentClassifier> {
        match &self.classifier.countries {
            Some(lists) => ContinentClassifier::from_named(lists)
                .context("Invalid [classifier] country lists"),
            None => Ok(ContinentClassifier::sample()),
        }
    }
}
