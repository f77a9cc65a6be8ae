use crate::types::{Continent, GeometryRecord, JoinedRecord};
use anyhow::{anyhow, Context, Result};
use geo::MultiPolygon;
use geojson::GeoJson;
use serde::Serialize;
use shapefile::dbase::{self, FieldValue, ReadingOptions, TrimOption};
use shapefile::{Reader, Shape, ShapeReader};
use std::convert::TryInto;
use std::ffi::OsStr;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tracing::{info, warn};

/// Loads country boundaries from a GeoJSON FeatureCollection or a Shapefile,
/// picked by extension. Every polygonal feature becomes one record, in file
/// order; a feature without a name becomes the empty string, but a name column
/// absent from the whole file is a configuration error.
pub fn load_world(path: &Path, name_column: &str) -> Result<Vec<GeometryRecord>> {
    let format = path.extension()
        .and_then(OsStr::to_str)
        .map(str::to_ascii_lowercase);

    let records = match format.as_deref() {
        Some("shp") => load_shapefile(path, name_column)?,
        Some("json" | "geojson") => load_geojson(path, name_column)?,
        Some(other) => return Err(anyhow!("Unsupported geometry format: {}", other)),
        None => return Err(anyhow!("Cannot tell the geometry format of {:?} without an extension", path)),
    };

    info!("Loaded geometry for {} countries from {:?}", records.len(), path);

    Ok(records)
}

fn load_shapefile(path: &Path, name_column: &str) -> Result<Vec<GeometryRecord>> {
    let shapes = ShapeReader::from_path(path)
        .with_context(|| format!("Failed to open Shapefile: {:?}", path))?;

    let dbf_path = path.with_extension("dbf");
    let mut table = dbase::Reader::from_path(&dbf_path)
        .with_context(|| format!("Failed to open attribute table: {:?}", dbf_path))?;
    // dBase pads character fields on the right only; leading spaces are part of the name.
    table.set_options(ReadingOptions::default().character_trim(TrimOption::End));

    if !table.fields().iter().any(|field| field.name() == name_column) {
        return Err(anyhow!("Name column '{}' not found in {:?}", name_column, dbf_path));
    }

    let mut reader = Reader::new(shapes, table);
    let mut records = Vec::new();

    for result in reader.iter_shapes_and_records() {
        let (shape, record) = result?;

        let country_name = match record.get(name_column) {
            Some(FieldValue::Character(Some(s))) => s.clone(),
            _ => String::new(),
        };

        let geometry: MultiPolygon<f64> = match shape {
            Shape::Polygon(polygon) => polygon.into(),
            Shape::PolygonM(polygon) => polygon.into(),
            Shape::PolygonZ(polygon) => polygon.into(),
            other => {
                warn!("Skipping non-polygon shape {:?} for {:?}", other.shapetype(), country_name);
                continue;
            }
        };

        records.push(GeometryRecord { country_name, geometry });
    }

    Ok(records)
}

fn load_geojson(path: &Path, name_column: &str) -> Result<Vec<GeometryRecord>> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open GeoJSON file: {:?}", path))?;
    let geojson = GeoJson::from_reader(BufReader::new(file))
        .with_context(|| format!("Failed to parse GeoJSON: {:?}", path))?;
    geojson_records(geojson, name_column)
}

pub fn geojson_records(geojson: GeoJson, name_column: &str) -> Result<Vec<GeometryRecord>> {
    let collection = match geojson {
        GeoJson::FeatureCollection(fc) => fc,
        _ => return Err(anyhow!("GeoJSON must be a FeatureCollection")),
    };

    let has_name_column = collection.features.iter().any(|feature| {
        feature.properties.as_ref().map_or(false, |props| props.contains_key(name_column))
    });
    if !collection.features.is_empty() && !has_name_column {
        return Err(anyhow!("Name column '{}' not found on any GeoJSON feature", name_column));
    }

    let mut records = Vec::new();

    for feature in collection.features {
        let country_name = match feature.properties.as_ref().and_then(|p| p.get(name_column)) {
            Some(serde_json::Value::String(s)) => s.clone(),
            _ => String::new(),
        };

        let geometry = match feature.geometry {
            Some(geom) => {
                let geo_geom: geo::Geometry<f64> = geom.value.try_into()
                    .map_err(|e| anyhow!("Failed to convert geojson geometry: {:?}", e))?;
                match geo_geom {
                    geo::Geometry::MultiPolygon(mp) => mp,
                    geo::Geometry::Polygon(p) => MultiPolygon::new(vec![p]),
                    _ => {
                        warn!("Skipping non-polygonal feature {:?}", country_name);
                        continue;
                    }
                }
            }
            None => {
                warn!("Skipping feature {:?} without geometry", country_name);
                continue;
            }
        };

        records.push(GeometryRecord { country_name, geometry });
    }

    Ok(records)
}

#[derive(Serialize)]
struct JoinedRow<'a> {
    country: &'a str,
    continent: Option<Continent>,
    population: Option<u64>,
}

/// Writes `country,continent,population`; absent values are empty fields.
pub fn write_joined_csv(records: &[JoinedRecord], path: &Path) -> Result<()> {
    let mut wtr = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to create CSV file: {:?}", path))?;
    for record in records {
        wtr.serialize(JoinedRow {
            country: &record.country_name,
            continent: record.continent,
            population: record.population,
        })?;
    }
    wtr.flush()?;
    info!("Wrote {} joined rows to {:?}", records.len(), path);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::polygon;

    const SAMPLE: &str = r#"{
        "type": "FeatureCollection",
        "features": [
            {"type": "Feature", "properties": {"name": "China"},
             "geometry": {"type": "Polygon", "coordinates": [[[0,0],[1,0],[1,1],[0,1],[0,0]]]}},
            {"type": "Feature", "properties": {"pop_est": 5},
             "geometry": {"type": "MultiPolygon", "coordinates": [[[[2,0],[3,0],[3,1],[2,0]]]]}},
            {"type": "Feature", "properties": {"name": "Dot"},
             "geometry": {"type": "Point", "coordinates": [5,5]}},
            {"type": "Feature", "properties": {"name": "Nowhere"}, "geometry": null}
        ]
    }"#;

    #[test]
    fn keeps_polygonal_features_in_order() {
        let geojson: GeoJson = SAMPLE.parse().unwrap();
        let records = geojson_records(geojson, "name").unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].country_name, "China");
        assert_eq!(records[0].geometry.0.len(), 1);
        assert_eq!(records[1].country_name, "");
    }

    #[test]
    fn name_column_missing_from_every_feature_is_an_error() {
        let geojson: GeoJson = SAMPLE.parse().unwrap();
        let err = geojson_records(geojson, "NAME").unwrap_err();
        assert!(err.to_string().contains("Name column 'NAME' not found"));
    }

    #[test]
    fn geojson_keeps_leading_whitespace() {
        let geojson: GeoJson = r#"{"type": "FeatureCollection", "features": [
            {"type": "Feature", "properties": {"name": " Brazil"},
             "geometry": {"type": "Polygon", "coordinates": [[[0,0],[1,0],[1,1],[0,0]]]}}
        ]}"#.parse().unwrap();
        let records = geojson_records(geojson, "name").unwrap();
        assert_eq!(records[0].country_name, " Brazil");
    }

    #[test]
    fn empty_collection_needs_no_name_column() {
        let geojson: GeoJson = r#"{"type": "FeatureCollection", "features": []}"#.parse().unwrap();
        assert!(geojson_records(geojson, "name").unwrap().is_empty());
    }

    fn write_polygon_shapefile(path: &Path, names: &[Option<&str>]) {
        let table = dbase::TableWriterBuilder::new()
            .add_character_field("NAME".try_into().unwrap(), 32);
        let mut writer = shapefile::Writer::from_path(path, table).unwrap();
        for (i, name) in names.iter().enumerate() {
            let x = i as f64 * 10.0;
            let ring = shapefile::PolygonRing::Outer(vec![
                shapefile::Point::new(x, 0.0),
                shapefile::Point::new(x, 5.0),
                shapefile::Point::new(x + 5.0, 5.0),
                shapefile::Point::new(x + 5.0, 0.0),
                shapefile::Point::new(x, 0.0),
            ]);
            let mut record = dbase::Record::default();
            record.insert("NAME".to_string(), FieldValue::Character(name.map(str::to_string)));
            writer
                .write_shape_and_record(&shapefile::Polygon::new(ring), &record)
                .unwrap();
        }
    }

    #[test]
    fn shapefile_names_keep_order_and_leading_whitespace() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("world.shp");
        write_polygon_shapefile(&path, &[Some("China"), None, Some(" Brazil")]);

        let records = load_world(&path, "NAME").unwrap();
        let names: Vec<&str> = records.iter().map(|r| r.country_name.as_str()).collect();
        assert_eq!(names, vec!["China", "", " Brazil"]);
        assert_eq!(records[0].geometry.0.len(), 1);

        let classifier = crate::classifier::ContinentClassifier::sample();
        assert_eq!(classifier.classify(&records[0].country_name), Some(Continent::Asia));
        assert_eq!(classifier.classify(&records[2].country_name), None);
    }

    #[test]
    fn shapefile_without_name_column_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("world.shp");
        write_polygon_shapefile(&path, &[Some("China")]);

        let err = load_world(&path, "name").unwrap_err();
        assert!(err.to_string().contains("Name column 'name' not found"));
    }

    #[test]
    fn shapefile_polygon_z_converts() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("relief.shp");
        {
            let table = dbase::TableWriterBuilder::new()
                .add_character_field("NAME".try_into().unwrap(), 32);
            let mut writer = shapefile::Writer::from_path(&path, table).unwrap();
            let ring = shapefile::PolygonRing::Outer(vec![
                shapefile::PointZ::new(0.0, 0.0, 1.0, 0.0),
                shapefile::PointZ::new(0.0, 2.0, 1.0, 0.0),
                shapefile::PointZ::new(2.0, 2.0, 1.0, 0.0),
                shapefile::PointZ::new(2.0, 0.0, 1.0, 0.0),
                shapefile::PointZ::new(0.0, 0.0, 1.0, 0.0),
            ]);
            let mut record = dbase::Record::default();
            record.insert("NAME".to_string(), FieldValue::Character(Some("Peru".to_string())));
            writer
                .write_shape_and_record(&shapefile::PolygonZ::new(ring), &record)
                .unwrap();
        }

        let records = load_world(&path, "NAME").unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].country_name, "Peru");
        let exterior = records[0].geometry.0[0].exterior();
        assert!(exterior.0.iter().any(|c| c.x == 2.0 && c.y == 2.0));
    }

    #[test]
    fn rejects_bare_geometry() {
        let geojson: GeoJson = r#"{"type": "Point", "coordinates": [0, 0]}"#.parse().unwrap();
        assert!(geojson_records(geojson, "name").is_err());
    }

    #[test]
    fn joined_csv_leaves_absent_fields_empty() {
        let square = || MultiPolygon::new(vec![polygon![
            (x: 0.0, y: 0.0), (x: 1.0, y: 0.0), (x: 1.0, y: 1.0),
        ]]);
        let records = vec![
            JoinedRecord {
                country_name: "Mexico".to_string(),
                geometry: square(),
                continent: Some(Continent::NorthAmerica),
                population: Some(592072212),
            },
            JoinedRecord {
                country_name: "Atlantis".to_string(),
                geometry: square(),
                continent: None,
                population: None,
            },
        ];
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("joined.csv");
        write_joined_csv(&records, &path).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(
            text,
            "country,continent,population\nMexico,North America,592072212\nAtlantis,,\n"
        );
    }

    #[test]
    fn rejects_unknown_extension() {
        let err = load_world(Path::new("world.kml"), "name").unwrap_err();
        assert!(err.to_string().contains("Unsupported geometry format"));
        assert!(load_world(Path::new("world"), "name").is_err());
    }
}
