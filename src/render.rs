use crate::draw::{Canvas, AXIS, LIGHT_GREY, YL_GN_BU};
use crate::types::JoinedRecord;
use anyhow::{Context, Result};
use geo::algorithm::bounding_rect::BoundingRect;
use geo::algorithm::contains::Contains;
use geo::Point;
use image::Rgba;
use rayon::prelude::*;
use std::fs;
use std::path::Path;
use tracing::info;

// Share of the image height given to the map; the rest holds the colour bar.
const MAP_FRACTION: f64 = 0.85;

/// Plate carrée projection onto a `width` x `height` map area.
#[derive(Debug, Clone, Copy)]
pub struct Projection {
    pub width: f64,
    pub height: f64,
}

impl Projection {
    pub fn to_pixel(&self, lon: f64, lat: f64) -> (f64, f64) {
        ((lon + 180.0) / 360.0 * self.width, (90.0 - lat) / 180.0 * self.height)
    }

    pub fn to_lon_lat(&self, x: f64, y: f64) -> (f64, f64) {
        (x / self.width * 360.0 - 180.0, 90.0 - y / self.height * 180.0)
    }
}

pub fn write_choropleth(records: &[JoinedRecord], width: u32, height: u32, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("Failed to create output directory")?;
    }
    let canvas = choropleth(records, width, height);
    canvas.img.save(path).with_context(|| format!("Failed to save map {:?}", path))?;
    info!("Wrote {:?}", path);
    Ok(())
}

/// World map with each country shaded by its joined population; countries
/// without a population are light grey. Painted in record order.
pub fn choropleth(records: &[JoinedRecord], width: u32, height: u32) -> Canvas {
    let mut canvas = Canvas::new(width, height);
    let map_height = ((height as f64 * MAP_FRACTION).round() as u32).max(1);
    let projection = Projection { width: width as f64, height: map_height as f64 };

    let present: Vec<u64> = records.iter().filter_map(|r| r.population).collect();
    let lo = present.iter().copied().min().unwrap_or(0) as f64;
    let hi = present.iter().copied().max().unwrap_or(0) as f64;

    info!("Rasterising {} countries at {}x{}", records.len(), width, map_height);

    let fills: Vec<(Rgba<u8>, Vec<(u32, u32)>)> = records
        .par_iter()
        .map(|record| {
            let color = match record.population {
                Some(p) if hi > lo => YL_GN_BU.at((p as f64 - lo) / (hi - lo)),
                Some(_) => YL_GN_BU.at(0.0),
                None => LIGHT_GREY,
            };
            (color, covered_pixels(record, &projection, width, map_height))
        })
        .collect();

    for (color, pixels) in fills {
        for (x, y) in pixels {
            canvas.img.put_pixel(x, y, color);
        }
    }

    draw_color_bar(&mut canvas, map_height);
    canvas
}

fn covered_pixels(record: &JoinedRecord, projection: &Projection, width: u32, height: u32) -> Vec<(u32, u32)> {
    let Some(bbox) = record.geometry.bounding_rect() else {
        return Vec::new();
    };
    let (x0, y0) = projection.to_pixel(bbox.min().x, bbox.max().y);
    let (x1, y1) = projection.to_pixel(bbox.max().x, bbox.min().y);
    let clamp = |v: f64, max: u32| (v.max(0.0) as u32).min(max);
    let (xa, xb) = (clamp(x0.floor(), width), clamp(x1.ceil(), width));
    let (ya, yb) = (clamp(y0.floor(), height), clamp(y1.ceil(), height));

    let mut pixels = Vec::new();
    for y in ya..yb {
        for x in xa..xb {
            let (lon, lat) = projection.to_lon_lat(x as f64 + 0.5, y as f64 + 0.5);
            if record.geometry.contains(&Point::new(lon, lat)) {
                pixels.push((x, y));
            }
        }
    }
    pixels
}

fn draw_color_bar(canvas: &mut Canvas, map_height: u32) {
    let (w, h) = (canvas.width() as f64, canvas.height() as f64);
    let (x0, x1) = (w * 0.1, w * 0.9);
    let y0 = map_height as f64 + (h - map_height as f64) * 0.3;
    let y1 = map_height as f64 + (h - map_height as f64) * 0.6;
    if y1 - y0 < 1.0 {
        return;
    }
    let steps = (x1 - x0).max(1.0) as usize;
    for s in 0..steps {
        let x = x0 + s as f64;
        canvas.fill_rect(x, y0, x + 1.0, y1, YL_GN_BU.at(s as f64 / steps as f64));
    }
    canvas.stroke_rect(x0, y0, x1, y1, AXIS);
}
