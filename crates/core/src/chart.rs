//! Risk-category bar chart.
//!
//! The chart is a pure function of the label → count mapping: [`layout_risk_chart`] computes the
//! geometry and [`draw_risk_chart`] replays it onto any [`ChartSurface`] after clearing it, so
//! drawing the same input twice yields identical output. [`PixelCanvas`] is the in-process
//! raster surface; text is recorded as positioned runs for the host to typeset.

use crate::constants::{CHART_BAR_FILL, CHART_FONT, CHART_PADDING};
use registro_types::RiskCounts;

/// An 8-bit RGBA colour.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const TRANSPARENT: Rgba = Rgba::new(0, 0, 0, 0);
    pub const WHITE: Rgba = Rgba::rgb(0xff, 0xff, 0xff);

    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::new(r, g, b, 0xff)
    }
}

pub const AXIS_COLOR: Rgba = Rgba::rgb(0x94, 0xa3, 0xb8);
pub const EVEN_BAR_COLOR: Rgba = Rgba::rgb(0x22, 0xc5, 0x5e);
pub const ODD_BAR_COLOR: Rgba = Rgba::rgb(0x38, 0xbd, 0xf8);
pub const TEXT_COLOR: Rgba = Rgba::rgb(0x0f, 0x17, 0x2a);

/// Baseline offset of category labels below the x axis.
const LABEL_OFFSET: f64 = 15.0;
/// Baseline offset of value labels above each bar.
const VALUE_OFFSET: f64 = 5.0;

/// Drawing operations the chart needs from a rendering surface.
pub trait ChartSurface {
    /// Surface size in pixels as `(width, height)`.
    fn size(&self) -> (u32, u32);
    /// Erases everything previously drawn.
    fn clear(&mut self);
    fn stroke_polyline(&mut self, points: &[(f64, f64)], color: Rgba);
    fn fill_rect(&mut self, x: f64, y: f64, width: f64, height: f64, color: Rgba);
    fn fill_text(&mut self, text: &str, x: f64, y: f64, color: Rgba);
}

// ============================================================================
// LAYOUT
// ============================================================================

#[derive(Clone, Debug, PartialEq)]
pub struct BarGeometry {
    pub label: String,
    pub value: u64,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub color: Rgba,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ChartLayout {
    /// Y axis top, origin, x axis end.
    pub axes: [(f64, f64); 3],
    /// Baseline for category labels.
    pub label_y: f64,
    pub bars: Vec<BarGeometry>,
}

/// Computes axes and bar geometry for a `width × height` surface.
///
/// Bars are scaled to the largest count, with a scale denominator of at least 1 so an empty or
/// all-zero mapping draws flat bars instead of dividing by zero.
pub fn layout_risk_chart(width: u32, height: u32, counts: &RiskCounts) -> ChartLayout {
    let pad = CHART_PADDING;
    let plot_w = (f64::from(width) - pad * 2.0).max(0.0);
    let plot_h = (f64::from(height) - pad * 2.0).max(0.0);
    let baseline = pad + plot_h;

    let max = counts.max_count().max(1) as f64;
    let slot = if counts.is_empty() {
        0.0
    } else {
        plot_w / counts.len() as f64
    };
    let bar_w = slot * CHART_BAR_FILL;

    let bars = counts
        .iter()
        .enumerate()
        .map(|(i, (label, value))| {
            let x = pad + i as f64 * slot + (slot - bar_w) / 2.0;
            let bar_h = (value as f64 / max) * plot_h;
            BarGeometry {
                label: label.to_string(),
                value,
                x,
                y: baseline - bar_h,
                width: bar_w,
                height: bar_h,
                color: if i % 2 == 0 {
                    EVEN_BAR_COLOR
                } else {
                    ODD_BAR_COLOR
                },
            }
        })
        .collect();

    ChartLayout {
        axes: [(pad, pad), (pad, baseline), (pad + plot_w, baseline)],
        label_y: baseline + LABEL_OFFSET,
        bars,
    }
}

/// Clears `surface` and draws the risk chart for `counts` onto it.
pub fn draw_risk_chart<S: ChartSurface>(surface: &mut S, counts: &RiskCounts) {
    let (width, height) = surface.size();
    let layout = layout_risk_chart(width, height, counts);

    surface.clear();
    surface.stroke_polyline(&layout.axes, AXIS_COLOR);
    for bar in &layout.bars {
        surface.fill_rect(bar.x, bar.y, bar.width, bar.height, bar.color);
        surface.fill_text(&bar.label, bar.x, layout.label_y, TEXT_COLOR);
        surface.fill_text(&bar.value.to_string(), bar.x, bar.y - VALUE_OFFSET, TEXT_COLOR);
    }
}

// ============================================================================
// PIXEL CANVAS
// ============================================================================

/// Text drawn onto a [`PixelCanvas`], kept as a positioned run rather than glyph pixels.
#[derive(Clone, Debug, PartialEq)]
pub struct TextRun {
    pub text: String,
    pub x: f64,
    pub y: f64,
    pub color: Rgba,
    pub font: &'static str,
}

/// In-memory RGBA raster implementing [`ChartSurface`].
#[derive(Clone, Debug, PartialEq)]
pub struct PixelCanvas {
    width: u32,
    height: u32,
    pixels: Vec<Rgba>,
    text: Vec<TextRun>,
}

impl PixelCanvas {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![Rgba::TRANSPARENT; width as usize * height as usize],
            text: Vec::new(),
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Row-major pixel buffer.
    pub fn pixels(&self) -> &[Rgba] {
        &self.pixels
    }

    pub fn text_runs(&self) -> &[TextRun] {
        &self.text
    }

    /// Number of pixels painted with `color`.
    pub fn count_color(&self, color: Rgba) -> usize {
        self.pixels.iter().filter(|p| **p == color).count()
    }

    /// Encodes the raster as binary PPM (P6), compositing transparent pixels over `background`.
    pub fn to_ppm(&self, background: Rgba) -> Vec<u8> {
        let header = format!("P6\n{} {}\n255\n", self.width, self.height);
        let mut out = Vec::with_capacity(header.len() + self.pixels.len() * 3);
        out.extend_from_slice(header.as_bytes());
        for p in &self.pixels {
            let p = if p.a == 0 { background } else { *p };
            out.extend_from_slice(&[p.r, p.g, p.b]);
        }
        out
    }

    fn index(&self, x: u32, y: u32) -> usize {
        y as usize * self.width as usize + x as usize
    }

    fn put(&mut self, x: i64, y: i64, color: Rgba) {
        if x < 0 || y < 0 || x >= i64::from(self.width) || y >= i64::from(self.height) {
            return;
        }
        let idx = self.index(x as u32, y as u32);
        self.pixels[idx] = color;
    }

    /// Bresenham line between two pixel centres.
    fn line(&mut self, from: (i64, i64), to: (i64, i64), color: Rgba) {
        let (mut x0, mut y0) = from;
        let (x1, y1) = to;
        let dx = (x1 - x0).abs();
        let dy = -(y1 - y0).abs();
        let sx = if x0 < x1 { 1 } else { -1 };
        let sy = if y0 < y1 { 1 } else { -1 };
        let mut err = dx + dy;

        loop {
            self.put(x0, y0, color);
            if x0 == x1 && y0 == y1 {
                break;
            }
            let e2 = 2 * err;
            if e2 >= dy {
                err += dy;
                x0 += sx;
            }
            if e2 <= dx {
                err += dx;
                y0 += sy;
            }
        }
    }
}

impl ChartSurface for PixelCanvas {
    fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn clear(&mut self) {
        self.pixels.fill(Rgba::TRANSPARENT);
        self.text.clear();
    }

    fn stroke_polyline(&mut self, points: &[(f64, f64)], color: Rgba) {
        let rounded: Vec<(i64, i64)> = points
            .iter()
            .map(|(x, y)| (x.round() as i64, y.round() as i64))
            .collect();
        for segment in rounded.windows(2) {
            self.line(segment[0], segment[1], color);
        }
    }

    fn fill_rect(&mut self, x: f64, y: f64, width: f64, height: f64, color: Rgba) {
        if width <= 0.0 || height <= 0.0 {
            return;
        }
        let x0 = x.round().max(0.0) as i64;
        let y0 = y.round().max(0.0) as i64;
        let x1 = ((x + width).round() as i64).min(i64::from(self.width));
        let y1 = ((y + height).round() as i64).min(i64::from(self.height));
        for py in y0..y1 {
            for px in x0..x1 {
                self.put(px, py, color);
            }
        }
    }

    fn fill_text(&mut self, text: &str, x: f64, y: f64, color: Rgba) {
        self.text.push(TextRun {
            text: text.to_string(),
            x,
            y,
            color,
            font: CHART_FONT,
        });
    }
}
