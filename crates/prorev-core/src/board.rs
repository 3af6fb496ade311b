//! Pixel surface the student writes on.

use kurbo::Point;
use peniko::Color;
use thiserror::Error;

const WHITE: [u8; 4] = [255, 255, 255, 255];

/// Errors from exporting the board.
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("PNG encoding failed: {0}")]
    Png(#[from] png::EncodingError),
    #[error("Board is empty (0x0)")]
    Empty,
}

/// Immutable copy of the board pixels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub width: u32,
    pub height: u32,
    /// RGBA pixel data (4 bytes per pixel).
    pub rgba: Vec<u8>,
}

impl Snapshot {
    /// Serialize to a PNG image.
    pub fn encode_png(&self) -> Result<Vec<u8>, SnapshotError> {
        if self.width == 0 || self.height == 0 {
            return Err(SnapshotError::Empty);
        }
        let mut png_data = Vec::new();
        {
            let mut encoder = png::Encoder::new(&mut png_data, self.width, self.height);
            encoder.set_color(png::ColorType::Rgba);
            encoder.set_depth(png::BitDepth::Eight);
            let mut writer = encoder.write_header()?;
            writer.write_image_data(&self.rgba)?;
        }
        Ok(png_data)
    }
}

/// RGBA8 raster with an opaque white background.
///
/// Dimensions are physical pixels. Resizing discards the drawing.
#[derive(Debug, Clone)]
pub struct Bitmap {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
    /// Bumped on every mutation so renderers can cache uploads.
    revision: u64,
}

impl Bitmap {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: WHITE.repeat(width as usize * height as usize),
            revision: 0,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = (y as usize * self.width as usize + x as usize) * 4;
        Some([self.pixels[i], self.pixels[i + 1], self.pixels[i + 2], self.pixels[i + 3]])
    }

    /// True when every pixel is the background.
    pub fn is_blank(&self) -> bool {
        self.pixels.chunks_exact(4).all(|p| p == WHITE)
    }

    /// Repaint the whole surface white.
    pub fn clear(&mut self) {
        for px in self.pixels.chunks_exact_mut(4) {
            px.copy_from_slice(&WHITE);
        }
        self.revision += 1;
    }

    /// Reallocate at a new size. Existing content is lost.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width == self.width && height == self.height {
            return;
        }
        self.width = width;
        self.height = height;
        self.pixels = WHITE.repeat(width as usize * height as usize);
        self.revision += 1;
    }

    /// Paint a round-capped segment of the given width (physical pixels).
    pub fn stroke_segment(&mut self, from: Point, to: Point, width: f64, color: Color) {
        if self.width == 0 || self.height == 0 || width <= 0.0 {
            return;
        }
        let rgba = color.to_rgba8();
        let src = [rgba.r as f64, rgba.g as f64, rgba.b as f64];
        let src_alpha = rgba.a as f64 / 255.0;
        let radius = width / 2.0;

        let min_x = (from.x.min(to.x) - radius - 1.0).floor().max(0.0) as u32;
        let min_y = (from.y.min(to.y) - radius - 1.0).floor().max(0.0) as u32;
        let max_x = ((from.x.max(to.x) + radius + 1.0).ceil() as i64).clamp(0, self.width as i64 - 1) as u32;
        let max_y = ((from.y.max(to.y) + radius + 1.0).ceil() as i64).clamp(0, self.height as i64 - 1) as u32;
        if min_x > max_x || min_y > max_y {
            return;
        }

        for y in min_y..=max_y {
            for x in min_x..=max_x {
                let center = Point::new(x as f64 + 0.5, y as f64 + 0.5);
                let distance = distance_to_segment(center, from, to);
                // One pixel of antialiasing ramp on the edge.
                let coverage = (radius + 0.5 - distance).clamp(0.0, 1.0);
                if coverage <= 0.0 {
                    continue;
                }
                let alpha = coverage * src_alpha;
                let i = (y as usize * self.width as usize + x as usize) * 4;
                for c in 0..3 {
                    let dst = self.pixels[i + c] as f64;
                    self.pixels[i + c] = (src[c] * alpha + dst * (1.0 - alpha)).round() as u8;
                }
                self.pixels[i + 3] = 255;
            }
        }
        self.revision += 1;
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            width: self.width,
            height: self.height,
            rgba: self.pixels.clone(),
        }
    }
}

fn distance_to_segment(p: Point, a: Point, b: Point) -> f64 {
    let ab = b - a;
    let len_sq = ab.hypot2();
    if len_sq < f64::EPSILON {
        return (p - a).hypot();
    }
    let t = ((p - a).dot(ab) / len_sq).clamp(0.0, 1.0);
    (p - (a + ab * t)).hypot()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_bitmap_is_white() {
        let bitmap = Bitmap::new(4, 3);
        assert_eq!(bitmap.pixels().len(), 4 * 3 * 4);
        assert!(bitmap.is_blank());
    }

    #[test]
    fn test_stroke_paints_along_segment() {
        let mut bitmap = Bitmap::new(40, 20);
        bitmap.stroke_segment(Point::new(5.0, 10.0), Point::new(35.0, 10.0), 3.0, Color::BLACK);
        assert_eq!(bitmap.pixel(20, 9), Some([0, 0, 0, 255]));
        // Far from the line stays white.
        assert_eq!(bitmap.pixel(20, 2), Some(WHITE));
        assert_eq!(bitmap.revision(), 1);
    }

    #[test]
    fn test_round_cap_extends_past_endpoint() {
        let mut bitmap = Bitmap::new(40, 20);
        bitmap.stroke_segment(Point::new(10.0, 10.0), Point::new(20.0, 10.0), 8.0, Color::BLACK);
        assert_eq!(bitmap.pixel(7, 9), Some([0, 0, 0, 255]));
        assert_eq!(bitmap.pixel(25, 9), Some(WHITE));
    }

    #[test]
    fn test_white_stroke_erases() {
        let mut bitmap = Bitmap::new(20, 20);
        bitmap.stroke_segment(Point::new(2.0, 10.0), Point::new(18.0, 10.0), 4.0, Color::BLACK);
        bitmap.stroke_segment(Point::new(0.0, 10.0), Point::new(20.0, 10.0), 20.0, Color::WHITE);
        assert!(bitmap.is_blank());
    }

    #[test]
    fn test_stroke_outside_bounds_is_clipped() {
        let mut bitmap = Bitmap::new(10, 10);
        bitmap.stroke_segment(Point::new(-50.0, -50.0), Point::new(-40.0, -40.0), 3.0, Color::BLACK);
        assert!(bitmap.is_blank());
    }

    #[test]
    fn test_clear_and_resize() {
        let mut bitmap = Bitmap::new(10, 10);
        bitmap.stroke_segment(Point::new(0.0, 5.0), Point::new(10.0, 5.0), 2.0, Color::BLACK);
        assert!(!bitmap.is_blank());
        bitmap.clear();
        assert!(bitmap.is_blank());

        bitmap.stroke_segment(Point::new(0.0, 5.0), Point::new(10.0, 5.0), 2.0, Color::BLACK);
        bitmap.resize(20, 8);
        assert_eq!((bitmap.width(), bitmap.height()), (20, 8));
        assert!(bitmap.is_blank());
    }

    #[test]
    fn test_snapshot_encodes_png() {
        let bitmap = Bitmap::new(8, 8);
        let png = bitmap.snapshot().encode_png().unwrap();
        assert_eq!(&png[1..4], b"PNG");
    }

    #[test]
    fn test_empty_snapshot_is_error() {
        let bitmap = Bitmap::new(0, 0);
        assert!(matches!(bitmap.snapshot().encode_png(), Err(SnapshotError::Empty)));
    }
}
