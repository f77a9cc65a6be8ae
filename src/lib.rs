pub mod types;
pub mod config;
pub mod population;
pub mod classifier;
pub mod data;
pub mod processing;
pub mod stats;
pub mod draw;
pub mod charts;
pub mod render;
pub mod lookup;
pub mod pipeline;

pub use classifier::ContinentClassifier;
pub use population::PopulationTable;
pub use processing::join;
pub use types::{Continent, GeometryRecord, JoinedRecord, PopulationRecord};
