//! RGBA raster with straight-alpha "over" compositing.

use std::collections::HashSet;

use colortables::Rgba as Color;
use image::{Rgba, RgbaImage};

#[derive(Debug, Clone)]
pub struct Canvas {
    image: RgbaImage,
}

impl Canvas {
    /// A canvas filled with `background`.
    pub fn new(width: u32, height: u32, background: Color) -> Self {
        Self {
            image: RgbaImage::from_pixel(width, height, Rgba(background.to_rgba8())),
        }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    pub fn image_mut(&mut self) -> &mut RgbaImage {
        &mut self.image
    }

    /// Raw RGBA bytes, row-major.
    pub fn pixels(&self) -> &[u8] {
        self.image.as_raw()
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        (x < self.width() && y < self.height()).then(|| self.image.get_pixel(x, y).0)
    }

    pub fn fill(&mut self, color: Color) {
        let px = Rgba(color.to_rgba8());
        self.image.pixels_mut().for_each(|p| *p = px);
    }

    /// Composite `color` over the pixel at `(x, y)`; out-of-bounds is a no-op.
    pub fn blend(&mut self, x: i64, y: i64, color: [u8; 4]) {
        if x < 0 || y < 0 || x >= self.width() as i64 || y >= self.height() as i64 {
            return;
        }
        let dst = self.image.get_pixel_mut(x as u32, y as u32);
        dst.0 = over(color, dst.0);
    }

    /// Draw connected segments of `width` pixels. Each covered pixel is
    /// blended once, so translucent strokes do not darken at joints.
    pub fn draw_polyline(&mut self, points: &[(f64, f64)], width: f64, color: [u8; 4]) {
        let mut covered = HashSet::new();
        for pair in points.windows(2) {
            line_pixels(pair[0], pair[1], width, &mut covered);
        }
        if points.len() == 1 {
            line_pixels(points[0], points[0], width, &mut covered);
        }
        for (x, y) in covered {
            self.blend(x, y, color);
        }
    }

    pub fn draw_line(&mut self, from: (f64, f64), to: (f64, f64), width: f64, color: [u8; 4]) {
        self.draw_polyline(&[from, to], width, color);
    }

    /// Outline of a closed ring.
    pub fn draw_polygon(&mut self, ring: &[(f64, f64)], width: f64, color: [u8; 4]) {
        if ring.len() < 2 {
            return;
        }
        let mut closed = ring.to_vec();
        if ring.first() != ring.last() {
            closed.push(ring[0]);
        }
        self.draw_polyline(&closed, width, color);
    }

    /// Even-odd scanline fill of one or more rings (holes included).
    pub fn fill_polygon(&mut self, rings: &[Vec<(f64, f64)>], color: [u8; 4]) {
        let (ymin, ymax) = rings
            .iter()
            .flatten()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), p| (lo.min(p.1), hi.max(p.1)));
        if !ymin.is_finite() || !ymax.is_finite() {
            return;
        }
        let row_start = ymin.floor().max(0.0) as i64;
        let row_end = ymax.ceil().min(self.height() as f64) as i64;

        for row in row_start..row_end {
            let scan_y = row as f64 + 0.5;
            let mut crossings: Vec<f64> = Vec::new();
            for ring in rings {
                for (i, a) in ring.iter().enumerate() {
                    let b = ring[(i + 1) % ring.len()];
                    if (a.1 <= scan_y) != (b.1 <= scan_y) {
                        let t = (scan_y - a.1) / (b.1 - a.1);
                        crossings.push(a.0 + t * (b.0 - a.0));
                    }
                }
            }
            crossings.sort_by(|a, b| a.total_cmp(b));
            for span in crossings.chunks_exact(2) {
                let start = (span[0] - 0.5).ceil() as i64;
                let end = (span[1] - 0.5).floor() as i64;
                for x in start..=end {
                    self.blend(x, row, color);
                }
            }
        }
    }
}

/// Straight-alpha source-over.
pub fn over(src: [u8; 4], dst: [u8; 4]) -> [u8; 4] {
    let sa = src[3] as f64 / 255.0;
    if sa <= 0.0 {
        return dst;
    }
    if sa >= 1.0 {
        return src;
    }
    let da = dst[3] as f64 / 255.0;
    let out_a = sa + da * (1.0 - sa);
    let channel = |s: u8, d: u8| {
        let c = (s as f64 * sa + d as f64 * da * (1.0 - sa)) / out_a;
        c.round().clamp(0.0, 255.0) as u8
    };
    [
        channel(src[0], dst[0]),
        channel(src[1], dst[1]),
        channel(src[2], dst[2]),
        (out_a * 255.0).round() as u8,
    ]
}

/// `color` with its alpha multiplied by `alpha`.
pub fn with_alpha(color: Color, alpha: f64) -> [u8; 4] {
    let mut c = color;
    c.a = (c.a * alpha).clamp(0.0, 1.0);
    c.to_rgba8()
}

/// Pixels covered by a thick segment: Bresenham along the centre line,
/// stamping a square brush of side `width` at each step.
fn line_pixels(from: (f64, f64), to: (f64, f64), width: f64, out: &mut HashSet<(i64, i64)>) {
    if !(from.0.is_finite() && from.1.is_finite() && to.0.is_finite() && to.1.is_finite()) {
        return;
    }
    let (mut x0, mut y0) = (from.0.floor() as i64, from.1.floor() as i64);
    let (x1, y1) = (to.0.floor() as i64, to.1.floor() as i64);
    let dx = (x1 - x0).abs();
    let dy = -(y1 - y0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    let brush = width.max(1.0).round() as i64;
    let lo = -(brush - 1) / 2;
    let hi = brush / 2;

    loop {
        for by in lo..=hi {
            for bx in lo..=hi {
                out.insert((x0 + bx, y0 + by));
            }
        }
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

#[cfg(test)]
mod tests {
    use super::*;

    const RED: [u8; 4] = [255, 0, 0, 255];

    #[test]
    fn test_new_canvas_is_filled() {
        let canvas = Canvas::new(4, 3, Color::rgb(0, 0, 0));
        assert_eq!(canvas.pixels().len(), 4 * 3 * 4);
        assert_eq!(canvas.pixel(3, 2), Some([0, 0, 0, 255]));
        assert_eq!(canvas.pixel(4, 0), None);
    }

    #[test]
    fn test_over_half_alpha_on_opaque() {
        let out = over([255, 255, 255, 128], [0, 0, 0, 255]);
        assert_eq!(out[3], 255);
        assert!((out[0] as i32 - 128).abs() <= 1);
    }

    #[test]
    fn test_over_extremes() {
        assert_eq!(over([1, 2, 3, 0], [9, 9, 9, 255]), [9, 9, 9, 255]);
        assert_eq!(over(RED, [9, 9, 9, 255]), RED);
        assert_eq!(over([10, 20, 30, 200], [0, 0, 0, 0]), [10, 20, 30, 200]);
    }

    #[test]
    fn test_horizontal_line() {
        let mut canvas = Canvas::new(10, 5, Color::transparent());
        canvas.draw_line((1.0, 2.0), (8.0, 2.0), 1.0, RED);
        for x in 1..=8 {
            assert_eq!(canvas.pixel(x, 2), Some(RED));
        }
        assert_eq!(canvas.pixel(0, 2), Some([0, 0, 0, 0]));
        assert_eq!(canvas.pixel(4, 1), Some([0, 0, 0, 0]));
    }

    #[test]
    fn test_thick_translucent_polyline_blends_once() {
        let mut canvas = Canvas::new(10, 10, Color::rgb(0, 0, 0));
        let half = [255, 255, 255, 128];
        canvas.draw_polyline(&[(1.0, 5.0), (5.0, 5.0), (5.0, 1.0)], 3.0, half);
        let corner = canvas.pixel(5, 5).unwrap();
        let edge = canvas.pixel(2, 5).unwrap();
        assert_eq!(corner, edge);
        assert_eq!(canvas.pixel(2, 4), canvas.pixel(2, 6));
    }

    #[test]
    fn test_line_clipped_outside() {
        let mut canvas = Canvas::new(4, 4, Color::transparent());
        canvas.draw_line((-10.0, 1.0), (10.0, 1.0), 1.0, RED);
        assert_eq!(canvas.pixel(0, 1), Some(RED));
        assert_eq!(canvas.pixel(3, 1), Some(RED));
    }

    #[test]
    fn test_fill_square_with_hole() {
        let mut canvas = Canvas::new(10, 10, Color::transparent());
        let outer = vec![(0.0, 0.0), (10.0, 0.0), (10.0, 10.0), (0.0, 10.0)];
        let hole = vec![(4.0, 4.0), (6.0, 4.0), (6.0, 6.0), (4.0, 6.0)];
        canvas.fill_polygon(&[outer, hole], RED);
        assert_eq!(canvas.pixel(0, 0), Some(RED));
        assert_eq!(canvas.pixel(9, 9), Some(RED));
        assert_eq!(canvas.pixel(5, 5), Some([0, 0, 0, 0]));
        assert_eq!(canvas.pixel(3, 5), Some(RED));
    }

    #[test]
    fn test_with_alpha_scales() {
        assert_eq!(with_alpha(Color::rgb(10, 20, 30), 0.5), [10, 20, 30, 128]);
    }
}
