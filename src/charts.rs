use crate::draw::{Canvas, Frame, AXIS, BLUE, COOLWARM, TEAL, VIRIDIS, WHITE};
use crate::population::PopulationTable;
use crate::stats;
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

const KDE_POINTS: usize = 200;

/// Renders every descriptive chart of the table into `dir`.
pub fn render_charts(table: &PopulationTable, dir: &Path, histogram_bins: usize) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(dir).with_context(|| format!("Failed to create output directory {:?}", dir))?;

    let charts = [
        ("heatmap.png", heatmap(table)),
        ("pairplot.png", pair_plot(table)),
        ("lineplot.png", line_plot(table)),
        ("histogram.png", histogram(table, histogram_bins)),
        ("barplot.png", bar_plot(table)),
    ];

    let mut written = Vec::new();
    for (name, canvas) in charts {
        let path = dir.join(name);
        canvas.img.save(&path).with_context(|| format!("Failed to save chart {:?}", path))?;
        info!("Wrote {:?}", path);
        written.push(path);
    }
    Ok(written)
}

/// Single-column heatmap of the pivot, rows sorted by continent name.
pub fn heatmap(table: &PopulationTable) -> Canvas {
    let mut canvas = Canvas::new(600, 400);
    let pivot = table.pivot();
    let values: Vec<f64> = pivot.values().map(|&v| v as f64).collect();
    let (lo, hi) = min_max(&values);
    let norm = |v: f64| if hi > lo { (v - lo) / (hi - lo) } else { 0.0 };

    let (left, right, top, bottom) = (120.0, 440.0, 50.0, 360.0);
    let row_h = (bottom - top) / values.len().max(1) as f64;
    for (i, v) in values.iter().enumerate() {
        let y0 = top + row_h * i as f64;
        canvas.fill_rect(left, y0, right, y0 + row_h, COOLWARM.at(norm(*v)));
        canvas.line(left, y0, right, y0, WHITE, 1);
    }

    // Colour bar
    let (bx0, bx1) = (470.0, 490.0);
    let steps = (bottom - top) as usize;
    for s in 0..steps {
        let t = 1.0 - s as f64 / steps as f64;
        canvas.fill_rect(bx0, top + s as f64, bx1, top + s as f64 + 1.0, COOLWARM.at(t));
    }
    canvas.stroke_rect(bx0, top, bx1, bottom, AXIS);
    canvas
}

/// 2x2 grid over (ID, Population): filled KDEs on the diagonal, scatter elsewhere.
pub fn pair_plot(table: &PopulationTable) -> Canvas {
    let size = 250.0;
    let mut canvas = Canvas::new(500, 500);
    let ids: Vec<f64> = (1..=table.len()).map(|i| i as f64).collect();
    let pops = table.populations();
    let vars = [ids, pops];

    for (row, y_var) in vars.iter().enumerate() {
        for (col, x_var) in vars.iter().enumerate() {
            let (ox, oy) = (col as f64 * size, row as f64 * size);
            let (left, top, right, bottom) = (ox + 30.0, oy + 15.0, ox + size - 10.0, oy + size - 30.0);

            if row == col {
                draw_kde_panel(&mut canvas, x_var, (left, top, right, bottom));
            } else {
                let frame = Frame::new(left, top, right, bottom, padded(x_var), padded(y_var));
                frame.draw_axes(&mut canvas, 4, 4);
                for (x, y) in x_var.iter().zip(y_var) {
                    let (px, py) = frame.px(*x, *y);
                    canvas.fill_circle(px, py, 4.0, BLUE);
                }
            }
        }
    }
    canvas
}

fn draw_kde_panel(canvas: &mut Canvas, values: &[f64], (left, top, right, bottom): (f64, f64, f64, f64)) {
    let (lo, hi) = min_max(values);
    let Some(h) = stats::scott_bandwidth(values) else {
        Frame::new(left, top, right, bottom, (lo, hi), (0.0, 1.0)).draw_axes(canvas, 4, 4);
        return;
    };
    let grid = stats::linspace(lo - 3.0 * h, hi + 3.0 * h, KDE_POINTS);
    let density = stats::gaussian_kde(values, &grid).unwrap_or_default();
    let peak = density.iter().copied().fold(0.0, f64::max);

    let frame = Frame::new(left, top, right, bottom, (grid[0], grid[grid.len() - 1]), (0.0, peak * 1.05));
    frame.draw_axes(canvas, 4, 4);
    let points: Vec<(f64, f64)> = grid.iter().zip(&density).map(|(x, d)| frame.px(*x, *d)).collect();
    canvas.fill_under(&points, bottom, BLUE, 0.25);
    canvas.polyline(&points, BLUE, 2);
}

/// Population per continent in table order, with markers.
pub fn line_plot(table: &PopulationTable) -> Canvas {
    let mut canvas = Canvas::new(1000, 600);
    let pops = table.populations();
    let n = pops.len() as f64;
    let frame = Frame::new(90.0, 50.0, 960.0, 530.0, (-0.5, n - 0.5), padded(&pops));
    frame.draw_axes(&mut canvas, pops.len(), 5);

    let points: Vec<(f64, f64)> = pops.iter().enumerate().map(|(i, p)| frame.px(i as f64, *p)).collect();
    canvas.polyline(&points, BLUE, 2);
    for (x, y) in &points {
        canvas.fill_circle(*x, *y, 6.0, BLUE);
    }
    canvas
}

/// Binned population counts with a KDE overlay scaled to counts.
pub fn histogram(table: &PopulationTable, bins: usize) -> Canvas {
    let mut canvas = Canvas::new(1000, 600);
    let pops = table.populations();
    let binned = stats::histogram(&pops, bins);
    let (Some(first), Some(last)) = (binned.first(), binned.last()) else {
        return canvas;
    };
    let (lo, hi) = (first.lo, last.hi);
    let width = (hi - lo) / binned.len() as f64;

    let grid = stats::linspace(lo, hi, KDE_POINTS);
    let curve: Vec<f64> = stats::gaussian_kde(&pops, &grid)
        .map(|d| d.into_iter().map(|v| v * pops.len() as f64 * width).collect())
        .unwrap_or_default();

    let max_count = binned.iter().map(|b| b.count).max().unwrap_or(0) as f64;
    let peak = curve.iter().copied().fold(max_count, f64::max);
    let frame = Frame::new(90.0, 50.0, 960.0, 530.0, (lo, hi), (0.0, peak * 1.05));
    frame.draw_axes(&mut canvas, binned.len(), 5);

    let bar_fill = blend_white(TEAL, 0.75);
    for bin in &binned {
        if bin.count == 0 {
            continue;
        }
        let (x0, y0) = frame.px(bin.lo, bin.count as f64);
        let (x1, y1) = frame.px(bin.hi, 0.0);
        canvas.fill_rect(x0, y0, x1, y1, bar_fill);
        canvas.stroke_rect(x0, y0, x1, y1, TEAL);
    }

    if !curve.is_empty() {
        let points: Vec<(f64, f64)> = grid.iter().zip(&curve).map(|(x, y)| frame.px(*x, *y)).collect();
        canvas.polyline(&points, TEAL, 2);
    }
    canvas
}

/// One viridis-coloured bar per continent, in table order.
pub fn bar_plot(table: &PopulationTable) -> Canvas {
    let mut canvas = Canvas::new(1000, 600);
    let pops = table.populations();
    let n = pops.len() as f64;
    let (_, hi) = min_max(&pops);
    let frame = Frame::new(90.0, 50.0, 960.0, 530.0, (-0.5, n - 0.5), (0.0, hi * 1.05));
    frame.draw_axes(&mut canvas, 0, 5);

    let colors = VIRIDIS.palette(pops.len());
    for (i, (p, color)) in pops.iter().zip(colors).enumerate() {
        let (x0, y0) = frame.px(i as f64 - 0.4, *p);
        let (x1, y1) = frame.px(i as f64 + 0.4, 0.0);
        canvas.fill_rect(x0, y0, x1, y1, color);
    }
    canvas
}

fn min_max(values: &[f64]) -> (f64, f64) {
    let lo = values.iter().copied().fold(f64::INFINITY, f64::min);
    let hi = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if lo.is_finite() && hi.is_finite() {
        (lo, hi)
    } else {
        (0.0, 1.0)
    }
}

fn padded(values: &[f64]) -> (f64, f64) {
    let (lo, hi) = min_max(values);
    let pad = (hi - lo) * 0.05;
    (lo - pad, hi + pad)
}

fn blend_white(color: image::Rgba<u8>, alpha: f64) -> image::Rgba<u8> {
    let mix = |c: u8| (255.0 * (1.0 - alpha) + c as f64 * alpha).round() as u8;
    image::Rgba([mix(color[0]), mix(color[1]), mix(color[2]), 255])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Continent, PopulationRecord};

    #[test]
    fn chart_sizes() {
        let table = PopulationTable::sample();
        assert_eq!(heatmap(&table).img.dimensions(), (600, 400));
        assert_eq!(pair_plot(&table).img.dimensions(), (500, 500));
        assert_eq!(line_plot(&table).img.dimensions(), (1000, 600));
        assert_eq!(histogram(&table, 10).img.dimensions(), (1000, 600));
        assert_eq!(bar_plot(&table).img.dimensions(), (1000, 600));
    }

    #[test]
    fn heatmap_extremes_use_ramp_ends() {
        let canvas = heatmap(&PopulationTable::sample());
        // Rows: Africa, Asia, ... ; Asia (row 1) is the maximum.
        let row_h = 310.0 / 6.0;
        let asia_y = (50.0 + row_h * 1.5) as u32;
        assert_eq!(*canvas.img.get_pixel(280, asia_y), COOLWARM.at(1.0));
        // Oceania (row 4) is the minimum.
        let oceania_y = (50.0 + row_h * 4.5) as u32;
        assert_eq!(*canvas.img.get_pixel(280, oceania_y), COOLWARM.at(0.0));
    }

    #[test]
    fn heatmap_of_equal_values_uses_bottom_of_ramp() {
        let table = PopulationTable::from_records(vec![PopulationRecord {
            continent: Continent::Europe,
            population: 42,
        }])
        .unwrap();
        let canvas = heatmap(&table);
        assert_eq!(*canvas.img.get_pixel(280, 205), COOLWARM.at(0.0));
    }

    #[test]
    fn bar_plot_first_bar_uses_first_palette_colour() {
        let canvas = bar_plot(&PopulationTable::sample());
        let frame = Frame::new(90.0, 50.0, 960.0, 530.0, (-0.5, 5.5), (0.0, 1.0));
        let (x, _) = frame.px(0.0, 0.0);
        assert_eq!(*canvas.img.get_pixel(x as u32, 520), VIRIDIS.palette(6)[0]);
    }

    #[test]
    fn single_row_table_still_renders() {
        let table = PopulationTable::from_records(vec![PopulationRecord {
            continent: Continent::Oceania,
            population: 1,
        }])
        .unwrap();
        let dir = tempfile::tempdir().unwrap();
        let written = render_charts(&table, dir.path(), 10).unwrap();
        assert_eq!(written.len(), 5);
        assert!(written.iter().all(|p| p.exists()));
    }
}
