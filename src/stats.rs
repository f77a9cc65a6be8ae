use serde::Serialize;
use std::f64::consts::PI;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub count: usize,
    pub mean: f64,
    pub std: f64,
    pub min: f64,
    pub median: f64,
    pub max: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bin {
    pub lo: f64,
    pub hi: f64,
    pub count: usize,
}

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Sample standard deviation (n - 1 denominator).
pub fn std_dev(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let m = mean(values)?;
    let var = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    Some(var.sqrt())
}

pub fn describe(values: &[f64]) -> Option<Summary> {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let (min, max) = (*sorted.first()?, *sorted.last()?);
    let mid = sorted.len() / 2;
    let median = if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    };
    Some(Summary {
        count: values.len(),
        mean: mean(values)?,
        std: std_dev(values).unwrap_or(0.0),
        min,
        median,
        max,
    })
}

/// Equal-width bins over `[min, max]`; the last bin is closed on the right.
pub fn histogram(values: &[f64], bins: usize) -> Vec<Bin> {
    if values.is_empty() || bins == 0 {
        return Vec::new();
    }
    let mut lo = values.iter().copied().fold(f64::INFINITY, f64::min);
    let mut hi = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if lo == hi {
        lo -= 0.5;
        hi += 0.5;
    }
    let width = (hi - lo) / bins as f64;

    let mut out: Vec<Bin> = (0..bins)
        .map(|i| Bin {
            lo: lo + width * i as f64,
            hi: if i + 1 == bins { hi } else { lo + width * (i + 1) as f64 },
            count: 0,
        })
        .collect();

    for v in values {
        let idx = (((v - lo) / width) as usize).min(bins - 1);
        out[idx].count += 1;
    }
    out
}

/// Scott's rule: `std * n^(-1/5)`.
pub fn scott_bandwidth(values: &[f64]) -> Option<f64> {
    let std = std_dev(values)?;
    if std <= 0.0 {
        return None;
    }
    Some(std * (values.len() as f64).powf(-0.2))
}

/// Gaussian kernel density estimate evaluated at each point of `grid`.
/// `None` when the bandwidth is degenerate (fewer than two distinct samples).
pub fn gaussian_kde(values: &[f64], grid: &[f64]) -> Option<Vec<f64>> {
    let h = scott_bandwidth(values)?;
    let norm = 1.0 / (values.len() as f64 * h * (2.0 * PI).sqrt());
    Some(
        grid.iter()
            .map(|x| {
                values
                    .iter()
                    .map(|v| (-0.5 * ((x - v) / h).powi(2)).exp())
                    .sum::<f64>()
                    * norm
            })
            .collect(),
    )
}

/// `n` evenly spaced points from `lo` to `hi` inclusive.
pub fn linspace(lo: f64, hi: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![lo],
        _ => (0..n).map(|i| lo + (hi - lo) * i as f64 / (n - 1) as f64).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9 * b.abs().max(1.0)
    }

    #[test]
    fn describe_basic() {
        let s = describe(&[1.0, 2.0, 3.0, 4.0]).unwrap();
        assert_eq!(s.count, 4);
        assert!(close(s.mean, 2.5));
        assert!(close(s.median, 2.5));
        assert!(close(s.std, (5.0f64 / 3.0).sqrt()));
        assert_eq!((s.min, s.max), (1.0, 4.0));
        assert!(describe(&[]).is_none());
    }

    #[test]
    fn histogram_counts_every_value() {
        let values = [0.0, 1.0, 2.0, 3.0, 10.0];
        let bins = histogram(&values, 10);
        assert_eq!(bins.len(), 10);
        assert_eq!(bins.iter().map(|b| b.count).sum::<usize>(), values.len());
        // max lands in the closed last bin
        assert_eq!(bins[9].count, 1);
        assert_eq!(bins[0].count, 1);
        assert_eq!(bins[9].hi, 10.0);
    }

    #[test]
    fn histogram_of_constant_values() {
        let bins = histogram(&[5.0, 5.0], 2);
        assert_eq!(bins[0].lo, 4.5);
        assert_eq!(bins[1].hi, 5.5);
        assert_eq!(bins.iter().map(|b| b.count).sum::<usize>(), 2);
    }

    #[test]
    fn kde_integrates_to_about_one() {
        let values = [1.0, 2.0, 2.5, 4.0, 7.0];
        let grid = linspace(-20.0, 30.0, 2001);
        let density = gaussian_kde(&values, &grid).unwrap();
        let step = grid[1] - grid[0];
        let area: f64 = density.iter().sum::<f64>() * step;
        assert!((area - 1.0).abs() < 1e-3, "area was {}", area);
    }

    #[test]
    fn kde_undefined_without_spread() {
        assert!(gaussian_kde(&[3.0, 3.0], &[3.0]).is_none());
        assert!(gaussian_kde(&[3.0], &[3.0]).is_none());
    }

    #[test]
    fn linspace_endpoints() {
        let v = linspace(0.0, 1.0, 5);
        assert_eq!(v, vec![0.0, 0.25, 0.5, 0.75, 1.0]);
    }
}
