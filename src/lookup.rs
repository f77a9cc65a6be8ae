use crate::types::{Continent, JoinedRecord};
use geo::algorithm::bounding_rect::BoundingRect;
use geo::algorithm::contains::Contains;
use geo::Point;
use rstar::{RTree, RTreeObject, AABB};
use serde::Serialize;

/// Bounding box of one joined record, pointing back at its position.
struct CountryBounds {
    slot: usize,
    bounds: AABB<[f64; 2]>,
}

impl RTreeObject for CountryBounds {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> AABB<[f64; 2]> {
        self.bounds
    }
}

/// Point-in-country lookup over joined records.
pub struct LookupIndex {
    records: Vec<JoinedRecord>,
    tree: RTree<CountryBounds>,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct LookupResponse {
    pub country: String,
    pub continent: Option<Continent>,
    pub population: Option<u64>,
}

impl LookupIndex {
    pub fn new(records: Vec<JoinedRecord>) -> Self {
        let bounds: Vec<CountryBounds> = records
            .iter()
            .enumerate()
            .filter_map(|(slot, record)| {
                let rect = record.geometry.bounding_rect()?;
                let (lo, hi) = (rect.min(), rect.max());
                Some(CountryBounds { slot, bounds: AABB::from_corners([lo.x, lo.y], [hi.x, hi.y]) })
            })
            .collect();

        Self { records, tree: RTree::bulk_load(bounds) }
    }

    /// First record, in input order, whose polygon contains the point.
    pub fn locate(&self, lon: f64, lat: f64) -> Option<&JoinedRecord> {
        let point = Point::new(lon, lat);

        self.tree
            .locate_in_envelope_intersecting(&AABB::from_point([lon, lat]))
            .map(|candidate| candidate.slot)
            .filter(|&slot| self.records[slot].geometry.contains(&point))
            .min()
            .map(|slot| &self.records[slot])
    }

    pub fn query(&self, lon: f64, lat: f64) -> Option<LookupResponse> {
        self.locate(lon, lat).map(|record| LookupResponse {
            country: record.country_name.clone(),
            continent: record.continent,
            population: record.population,
        })
    }
}
