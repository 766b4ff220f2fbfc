//! PNG line charts over the collector's series

use std::sync::Arc;

use chrono::{DateTime, Utc};
use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder, Rgb, RgbImage};

use contracts::{ContractError, GraphEngine, Period};

use crate::collector::{InMemoryCollector, Sample};

const BACKGROUND: Rgb<u8> = Rgb([255, 255, 255]);
const GRID: Rgb<u8> = Rgb([225, 225, 225]);
const AXIS: Rgb<u8> = Rgb([120, 120, 120]);
const LINE: Rgb<u8> = Rgb([0, 90, 200]);

/// Plot area inset from the image border (pixels)
const MARGIN: u32 = 4;
const GRID_LINES: u32 = 4;

/// Graph engine drawing one line per series
pub struct PngGraphEngine {
    collector: Arc<InMemoryCollector>,
}

impl PngGraphEngine {
    pub fn new(collector: Arc<InMemoryCollector>) -> Self {
        Self { collector }
    }

    /// Render `name` with `now` as the end of the window
    ///
    /// # Errors
    /// Returns a render error for zero dimensions or a failing encoder
    pub fn graph_at(
        &self,
        name: &str,
        period: &Period,
        width: u32,
        height: u32,
        now: DateTime<Utc>,
    ) -> Result<Option<Vec<u8>>, ContractError> {
        let Some(samples) = self.collector.series(name) else {
            return Ok(None);
        };
        if width == 0 || height == 0 {
            return Err(ContractError::render("graph", "width and height must be > 0"));
        }

        let visible: Vec<Sample> = samples
            .into_iter()
            .filter(|s| period.contains(s.at, now))
            .collect();
        let image = draw(&visible, width, height);
        encode_png(&image).map(Some)
    }
}

impl GraphEngine for PngGraphEngine {
    fn graph(
        &self,
        name: &str,
        period: &Period,
        width: u32,
        height: u32,
    ) -> Result<Option<Vec<u8>>, ContractError> {
        self.graph_at(name, period, width, height, Utc::now())
    }
}

fn draw(samples: &[Sample], width: u32, height: u32) -> RgbImage {
    let mut image = RgbImage::from_pixel(width, height, BACKGROUND);
    if width <= 2 * MARGIN || height <= 2 * MARGIN {
        return image;
    }

    let left = MARGIN;
    let right = width - MARGIN - 1;
    let top = MARGIN;
    let bottom = height - MARGIN - 1;

    for i in 1..GRID_LINES {
        let y = top + (bottom - top) * i / GRID_LINES;
        line(&mut image, (left, y), (right, y), GRID);
    }
    line(&mut image, (left, bottom), (right, bottom), AXIS);
    line(&mut image, (left, top), (left, bottom), AXIS);

    let (Some(first), Some(last)) = (samples.first(), samples.last()) else {
        return image;
    };
    let max = samples.iter().map(|s| s.value).fold(0.0_f64, f64::max);
    let span_ms = (last.at - first.at).num_milliseconds().max(1) as f64;

    let to_point = |sample: &Sample| {
        let dx = (sample.at - first.at).num_milliseconds() as f64 / span_ms;
        let dy = if max > 0.0 { sample.value / max } else { 0.0 };
        let x = left + ((right - left) as f64 * dx).round() as u32;
        let y = bottom - ((bottom - top) as f64 * dy).round() as u32;
        (x.min(right), y.max(top))
    };

    let points: Vec<(u32, u32)> = samples.iter().map(to_point).collect();
    if let [only] = points.as_slice() {
        image.put_pixel(only.0, only.1, LINE);
    }
    for pair in points.windows(2) {
        line(&mut image, pair[0], pair[1], LINE);
    }
    image
}

/// Bresenham segment, endpoints inclusive
fn line(image: &mut RgbImage, from: (u32, u32), to: (u32, u32), color: Rgb<u8>) {
    let (mut x, mut y) = (i64::from(from.0), i64::from(from.1));
    let (x1, y1) = (i64::from(to.0), i64::from(to.1));
    let dx = (x1 - x).abs();
    let dy = -(y1 - y).abs();
    let sx = if x < x1 { 1 } else { -1 };
    let sy = if y < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    loop {
        if let (Ok(px), Ok(py)) = (u32::try_from(x), u32::try_from(y)) {
            if px < image.width() && py < image.height() {
                image.put_pixel(px, py, color);
            }
        }
        if x == x1 && y == y1 {
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

fn encode_png(image: &RgbImage) -> Result<Vec<u8>, ContractError> {
    let mut bytes = Vec::new();
    PngEncoder::new(&mut bytes)
        .write_image(
            image.as_raw(),
            image.width(),
            image.height(),
            ExtendedColorType::Rgb8,
        )
        .map_err(|e| ContractError::render("graph", e.to_string()))?;
    Ok(bytes)
}
