use image::{ImageBuffer, Rgba, RgbaImage};

pub const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);
pub const GRID: Rgba<u8> = Rgba([234, 234, 242, 255]);
pub const AXIS: Rgba<u8> = Rgba([80, 80, 80, 255]);
pub const BLUE: Rgba<u8> = Rgba([0, 0, 255, 255]);
pub const TEAL: Rgba<u8> = Rgba([0, 128, 128, 255]);
pub const LIGHT_GREY: Rgba<u8> = Rgba([211, 211, 211, 255]);

/// Piecewise-linear colour ramp over evenly spaced stops.
pub struct ColorRamp(&'static [&'static str]);

pub const YL_GN_BU: ColorRamp = ColorRamp(&[
    "#ffffd9", "#edf8b1", "#c7e9b4", "#7fcdbb", "#41b6c4", "#1d91c0", "#225ea8", "#253494",
    "#081d58",
]);
pub const COOLWARM: ColorRamp = ColorRamp(&["#3b4cc0", "#8db0fe", "#dddddd", "#f49a7b", "#b40426"]);
pub const VIRIDIS: ColorRamp = ColorRamp(&[
    "#440154", "#482878", "#3e4a89", "#31688e", "#26828e", "#1f9e89", "#35b779", "#6ece58",
    "#b5de2b", "#fde725",
]);

impl ColorRamp {
    /// Colour at `t`, clamped to `[0, 1]`.
    pub fn at(&self, t: f64) -> Rgba<u8> {
        let stops = self.0;
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
        let scaled = t * (stops.len() - 1) as f64;
        let i = (scaled.floor() as usize).min(stops.len() - 2);
        let frac = scaled - i as f64;
        let a = hex_to_rgba(stops[i]).unwrap_or(AXIS);
        let b = hex_to_rgba(stops[i + 1]).unwrap_or(AXIS);
        let mix = |x: u8, y: u8| (x as f64 + (y as f64 - x as f64) * frac).round() as u8;
        Rgba([mix(a[0], b[0]), mix(a[1], b[1]), mix(a[2], b[2]), 255])
    }

    /// `n` colours sampled at the centres of `n` equal slices of the ramp.
    pub fn palette(&self, n: usize) -> Vec<Rgba<u8>> {
        (0..n).map(|i| self.at((i as f64 + 0.5) / n as f64)).collect()
    }
}

pub fn hex_to_rgba(hex: &str) -> Option<Rgba<u8>> {
    let hex = hex.trim_start_matches('#');
    if hex.len() != 6 || !hex.is_ascii() {
        return None;
    }
    let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
    let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
    let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
    Some(Rgba([r, g, b, 255]))
}

pub struct Canvas {
    pub img: RgbaImage,
}

impl Canvas {
    pub fn new(width: u32, height: u32) -> Self {
        Self { img: ImageBuffer::from_pixel(width, height, WHITE) }
    }

    pub fn width(&self) -> u32 {
        self.img.width()
    }

    pub fn height(&self) -> u32 {
        self.img.height()
    }

    pub fn put(&mut self, x: i64, y: i64, color: Rgba<u8>) {
        if x >= 0 && y >= 0 && (x as u32) < self.img.width() && (y as u32) < self.img.height() {
            self.img.put_pixel(x as u32, y as u32, color);
        }
    }

    pub fn fill_rect(&mut self, x0: f64, y0: f64, x1: f64, y1: f64, color: Rgba<u8>) {
        let (xa, xb) = (x0.min(x1).round() as i64, x0.max(x1).round() as i64);
        let (ya, yb) = (y0.min(y1).round() as i64, y0.max(y1).round() as i64);
        for y in ya..yb {
            for x in xa..xb {
                self.put(x, y, color);
            }
        }
    }

    pub fn stroke_rect(&mut self, x0: f64, y0: f64, x1: f64, y1: f64, color: Rgba<u8>) {
        self.line(x0, y0, x1, y0, color, 1);
        self.line(x1, y0, x1, y1, color, 1);
        self.line(x1, y1, x0, y1, color, 1);
        self.line(x0, y1, x0, y0, color, 1);
    }

    /// Bresenham line, widened to a square brush of side `thickness`.
    pub fn line(&mut self, x0: f64, y0: f64, x1: f64, y1: f64, color: Rgba<u8>, thickness: u32) {
        let (mut x, mut y) = (x0.round() as i64, y0.round() as i64);
        let (xe, ye) = (x1.round() as i64, y1.round() as i64);
        let dx = (xe - x).abs();
        let dy = -(ye - y).abs();
        let sx = if x < xe { 1 } else { -1 };
        let sy = if y < ye { 1 } else { -1 };
        let mut err = dx + dy;
        let half = thickness as i64 / 2;
        loop {
            for oy in -half..=(thickness as i64 - 1 - half) {
                for ox in -half..=(thickness as i64 - 1 - half) {
                    self.put(x + ox, y + oy, color);
                }
            }
            if x == xe && y == ye {
                break;
            }
            let e2 = 2 * err;
            if e2 >= dy {
                err += dy;
                x += sx;
            }
            if e2 <= dx {
                err += dx;
                y += sy;
            }
        }
    }

    pub fn polyline(&mut self, points: &[(f64, f64)], color: Rgba<u8>, thickness: u32) {
        for pair in points.windows(2) {
            self.line(pair[0].0, pair[0].1, pair[1].0, pair[1].1, color, thickness);
        }
    }

    pub fn fill_circle(&mut self, cx: f64, cy: f64, r: f64, color: Rgba<u8>) {
        let (xa, xb) = ((cx - r).floor() as i64, (cx + r).ceil() as i64);
        let (ya, yb) = ((cy - r).floor() as i64, (cy + r).ceil() as i64);
        for y in ya..=yb {
            for x in xa..=xb {
                let (dx, dy) = (x as f64 - cx, y as f64 - cy);
                if dx * dx + dy * dy <= r * r {
                    self.put(x, y, color);
                }
            }
        }
    }

    /// Fills the area between a curve and a baseline with a blended tint.
    pub fn fill_under(&mut self, points: &[(f64, f64)], baseline: f64, color: Rgba<u8>, alpha: f64) {
        for pair in points.windows(2) {
            let (xa, xb) = (pair[0].0.round() as i64, pair[1].0.round() as i64);
            for x in xa..xb.max(xa + 1) {
                let t = if xb == xa { 0.0 } else { (x - xa) as f64 / (xb - xa) as f64 };
                let y = pair[0].1 + (pair[1].1 - pair[0].1) * t;
                for py in (y.round() as i64)..(baseline.round() as i64) {
                    self.blend(x, py, color, alpha);
                }
            }
        }
    }

    fn blend(&mut self, x: i64, y: i64, color: Rgba<u8>, alpha: f64) {
        if x < 0 || y < 0 || x as u32 >= self.img.width() || y as u32 >= self.img.height() {
            return;
        }
        let under = *self.img.get_pixel(x as u32, y as u32);
        let mix = |a: u8, b: u8| (a as f64 * (1.0 - alpha) + b as f64 * alpha).round() as u8;
        let out = Rgba([mix(under[0], color[0]), mix(under[1], color[1]), mix(under[2], color[2]), 255]);
        self.img.put_pixel(x as u32, y as u32, out);
    }
}

/// Maps data coordinates into a pixel rectangle; y grows upwards in data space.
#[derive(Debug, Clone, Copy)]
pub struct Frame {
    pub left: f64,
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub x_range: (f64, f64),
    pub y_range: (f64, f64),
}

impl Frame {
    pub fn new(left: f64, top: f64, right: f64, bottom: f64, x_range: (f64, f64), y_range: (f64, f64)) -> Self {
        Self { left, top, right, bottom, x_range: widen(x_range), y_range: widen(y_range) }
    }

    pub fn px(&self, x: f64, y: f64) -> (f64, f64) {
        let tx = (x - self.x_range.0) / (self.x_range.1 - self.x_range.0);
        let ty = (y - self.y_range.0) / (self.y_range.1 - self.y_range.0);
        (
            self.left + tx * (self.right - self.left),
            self.bottom - ty * (self.bottom - self.top),
        )
    }

    /// Light grid lines plus the axes box.
    pub fn draw_axes(&self, canvas: &mut Canvas, x_ticks: usize, y_ticks: usize) {
        for i in 0..=x_ticks {
            let x = self.left + (self.right - self.left) * i as f64 / x_ticks.max(1) as f64;
            canvas.line(x, self.top, x, self.bottom, GRID, 1);
        }
        for i in 0..=y_ticks {
            let y = self.top + (self.bottom - self.top) * i as f64 / y_ticks.max(1) as f64;
            canvas.line(self.left, y, self.right, y, GRID, 1);
        }
        canvas.stroke_rect(self.left, self.top, self.right, self.bottom, AXIS);
    }
}

fn widen((lo, hi): (f64, f64)) -> (f64, f64) {
    if hi > lo {
        (lo, hi)
    } else {
        (lo - 0.5, hi + 0.5)
    }
}
