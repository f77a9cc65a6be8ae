use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use world_population_eda::config::AppConfig;
use world_population_eda::lookup::LookupIndex;
use world_population_eda::{pipeline, stats};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render the population charts and the choropleth map
    Generate {
        #[arg(short, long, value_name = "FILE", default_value = "config.toml")]
        config: PathBuf,
    },
    /// Report the country, continent and population at a coordinate
    Lookup {
        #[arg(short, long, value_name = "FILE", default_value = "config.toml")]
        config: PathBuf,
        #[arg(long, allow_negative_numbers = true)]
        lat: f64,
        #[arg(long, allow_negative_numbers = true)]
        lon: f64,
    },
    /// Print the population table and its descriptive statistics
    Summary {
        #[arg(short, long, value_name = "FILE", default_value = "config.toml")]
        config: PathBuf,
    },
    /// Print the continent of each country name
    Classify {
        #[arg(short, long, value_name = "FILE", default_value = "config.toml")]
        config: PathBuf,
        #[arg(required = true)]
        names: Vec<String>,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match &cli.command {
        Commands::Generate { config } => {
            let app_config = AppConfig::load_from_file(config)?;
            let report = pipeline::generate(&app_config)?;
            println!(
                "Generated {} artifacts in {:?} ({} countries, {} with population)",
                report.artifacts.len(),
                app_config.output.dir,
                report.countries,
                report.with_population
            );
        }
        Commands::Lookup { config, lat, lon } => {
            let app_config = AppConfig::load_from_file(config)?;
            let index = LookupIndex::new(pipeline::load_joined(&app_config)?);
            let response = index.query(*lon, *lat);
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        Commands::Summary { config } => {
            let app_config = AppConfig::load_from_file(config)?;
            let table = app_config.population_table()?;

            println!("{:<15} {:>12}", "Continent", "Population");
            for record in table.records() {
                println!("{:<15} {:>12}", record.continent, record.population);
            }
            println!();
            println!("Pivot (sum by continent):");
            for (continent, population) in table.pivot() {
                println!("{:<15} {:>12}", continent, population);
            }
            if let Some(summary) = stats::describe(&table.populations()) {
                println!();
                println!("{}", serde_json::to_string_pretty(&summary)?);
            }
        }
        Commands::Classify { config, names } => {
            let app_config = AppConfig::load_from_file(config)?;
            let classifier = app_config.classifier()?;
            for name in names {
                match classifier.classify(name) {
                    Some(continent) => println!("{}\t{}", name, continent),
                    None => println!("{}\tabsent", name),
                }
            }
        }
    }

    Ok(())
}
