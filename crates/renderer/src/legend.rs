//! Map decorations: colorbar inset, text stamp and range rings.

use std::path::Path;

use colortables::{Colortable, Rgba as Color};
use image::Rgba;
use imageproc::drawing::{draw_text_mut, text_size};
use rusttype::{Font, Scale};
use tracing::{debug, warn};
use wx_common::geo::destination_point;
use wx_common::units::MILE;
use wx_common::{GeoBBox, WxError, WxResult};

use crate::canvas::{with_alpha, Canvas};
use crate::mapper::{Mapper, Viewport};

/// Default radius of a radar range ring.
pub const DEFAULT_RANGE_MI: f64 = 143.0;

/// Points used to approximate a ring.
const RING_POINTS: usize = 100;

/// Load a TrueType font. `None` or an unreadable file means text is skipped.
pub fn load_font(path: Option<&Path>) -> WxResult<Option<Font<'static>>> {
    let Some(path) = path else {
        return Ok(None);
    };
    let bytes = std::fs::read(path)?;
    let font = Font::try_from_vec(bytes)
        .ok_or_else(|| WxError::Render(format!("{} is not a TrueType font", path.display())))?;
    debug!(font = %path.display(), "Loaded font");
    Ok(Some(font))
}

fn to_pixel(color: [u8; 4]) -> Rgba<u8> {
    Rgba(color)
}

/// Horizontal colorbar in the upper-left corner: half the canvas wide and 3%
/// of it tall, with the palette boundaries labelled underneath in white.
pub fn colorbar_inset(canvas: &mut Canvas, table: &Colortable, font: Option<&Font<'_>>) {
    let (w, h) = (canvas.width() as f64, canvas.height() as f64);
    let margin = (w.min(h) * 0.02).round().max(2.0) as i64;
    let bar_w = (w * 0.5).round().max(1.0) as i64;
    let bar_h = (h * 0.03).round().max(1.0) as i64;

    let norm = table.norm();
    for dx in 0..bar_w {
        let frac = (dx as f64 + 0.5) / bar_w as f64;
        let color = table.cmap().sample(frac).to_rgba8();
        for dy in 0..bar_h {
            canvas.blend(margin + dx, margin + dy, color);
        }
    }

    let Some(font) = font else {
        warn!(colortable = table.name(), "No font configured, colorbar left unlabelled");
        return;
    };
    let scale = Scale::uniform((bar_h as f32 * 1.2).max(8.0));
    let white = to_pixel(Color::rgb(255, 255, 255).to_rgba8());
    let mut last_right = i64::MIN;
    for entry in table.entries() {
        let frac = norm.apply(entry.bound);
        let label = format_tick(entry.bound);
        let (tw, _) = text_size(scale, font, &label);
        let x = margin + (frac * bar_w as f64).round() as i64 - tw as i64 / 2;
        // drop labels that would overlap the previous one
        if x <= last_right {
            continue;
        }
        draw_text_mut(
            canvas.image_mut(),
            white,
            x as i32,
            (margin + bar_h + 2) as i32,
            scale,
            font,
            &label,
        );
        last_right = x + tw as i64 + 2;
    }
}

fn format_tick(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{}", value as i64)
    } else {
        format!("{:.1}", value)
    }
}

/// Text aligned to the bottom right corner with a one pixel drop shadow.
pub fn bottom_right_stamp(canvas: &mut Canvas, text: &str, font: Option<&Font<'_>>, size: f32) {
    let Some(font) = font else {
        warn!(text = text, "No font configured, skipping stamp");
        return;
    };
    let scale = Scale::uniform(size);
    let (tw, th) = text_size(scale, font, text);
    let x = (canvas.width() as f64 * 0.99).round() as i32 - tw;
    let y = (canvas.height() as f64 * 0.99).round() as i32 - th;

    let shadow = to_pixel([0, 0, 0, 200]);
    let fg = to_pixel([255, 255, 255, 255]);
    draw_text_mut(canvas.image_mut(), shadow, x + 1, y + 1, scale, font, text);
    draw_text_mut(canvas.image_mut(), fg, x, y, scale, font, text);
}

/// `(lon, lat)` points of a circle of `miles` around a `(lat, lon)` center.
pub fn ring_path(center: (f64, f64), miles: f64) -> WxResult<Vec<(f64, f64)>> {
    let (lat, lon) = center;
    (0..=RING_POINTS)
        .map(|i| {
            let bearing = i as f64 * 360.0 / RING_POINTS as f64;
            destination_point(lon, lat, miles, bearing, MILE)
        })
        .collect()
}

/// Geographic box enclosing a ring, used to fit a map to it.
pub fn ring_extent(center: (f64, f64), miles: f64) -> WxResult<GeoBBox> {
    GeoBBox::from_center_and_range(center, miles, MILE)
}

/// Outline a range ring on the map.
pub fn range_ring(
    canvas: &mut Canvas,
    mapper: &Mapper,
    viewport: &Viewport,
    center: (f64, f64),
    miles: Option<f64>,
    color: Color,
    width: f64,
) -> WxResult<()> {
    let miles = miles.unwrap_or(DEFAULT_RANGE_MI);
    let path = ring_path(center, miles)?;
    let stroke = with_alpha(color, 1.0);
    for part in mapper.project_path(viewport, &path) {
        canvas.draw_polyline(&part, width, stroke);
    }
    debug!(miles = miles, "Drew range ring");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use colortables::PaletteEntry;
    use projection::PlateCarree;
    use wx_common::geo::bearing_and_distance;

    fn table() -> Colortable {
        let entries = vec![
            PaletteEntry::new(0.0, vec![Color::rgb(255, 0, 0)]),
            PaletteEntry::new(10.0, vec![Color::rgb(0, 0, 255)]),
        ];
        Colortable::new("bar", entries, None).unwrap()
    }

    #[test]
    fn test_colorbar_without_font_still_draws_bar() {
        let mut canvas = Canvas::new(200, 100, Color::rgb(0, 0, 0));
        colorbar_inset(&mut canvas, &table(), None);
        // margin is 2px, bar is 100x3
        let left = canvas.pixel(2, 2).unwrap();
        let right = canvas.pixel(101, 4).unwrap();
        assert!(left[0] > 240 && left[2] < 15);
        assert!(right[2] > 240 && right[0] < 15);
        assert_eq!(canvas.pixel(150, 2), Some([0, 0, 0, 255]));
        assert_eq!(canvas.pixel(50, 10), Some([0, 0, 0, 255]));
    }

    #[test]
    fn test_stamp_without_font_is_noop() {
        let mut canvas = Canvas::new(20, 20, Color::rgb(1, 2, 3));
        bottom_right_stamp(&mut canvas, "KMUX 2333Z", None, 12.0);
        assert!(canvas.pixels().chunks(4).all(|p| p == [1, 2, 3, 255]));
    }

    #[test]
    fn test_load_font_rejects_garbage() {
        assert!(load_font(None).unwrap().is_none());
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bogus.ttf");
        std::fs::write(&path, b"not a font").unwrap();
        assert!(load_font(Some(&path)).is_err());
        assert!(load_font(Some(&dir.path().join("missing.ttf"))).is_err());
    }

    #[test]
    fn test_ring_path_is_closed_and_equidistant() {
        let center = (37.155, -121.898);
        let path = ring_path(center, DEFAULT_RANGE_MI).unwrap();
        assert_eq!(path.len(), RING_POINTS + 1);
        let first = path[0];
        let last = path[RING_POINTS];
        assert!((first.0 - last.0).abs() < 1e-9 && (first.1 - last.1).abs() < 1e-9);
        let km = DEFAULT_RANGE_MI * 1.609344;
        for p in &path {
            let (_, d) = bearing_and_distance((center.1, center.0), *p);
            assert!((d - km).abs() < 1e-6 * km);
        }
    }

    #[test]
    fn test_ring_extent_contains_ring() {
        let center = (35.0, -97.0);
        let extent = ring_extent(center, 50.0).unwrap();
        for (lon, lat) in ring_path(center, 50.0).unwrap() {
            assert!(lon >= extent.west - 1e-9 && lon <= extent.east + 1e-9);
            assert!(lat >= extent.south - 1e-9 && lat <= extent.north + 1e-9);
        }
    }

    #[test]
    fn test_range_ring_draws_on_canvas() {
        let center = (35.0, -97.0);
        let mapper = Mapper::new(PlateCarree::default(), "/nonexistent")
            .with_background(Color::rgb(0, 0, 0))
            .with_extent(ring_extent(center, 80.0).unwrap());
        let viewport = mapper.viewport(100, None).unwrap();
        let mut canvas = mapper.new_canvas(&viewport);
        range_ring(&mut canvas, &mapper, &viewport, center, Some(50.0), Color::rgb(0, 255, 0), 1.0).unwrap();
        let green = canvas.pixels().chunks(4).filter(|p| p[1] == 255).count();
        assert!(green > 100);
        // ring does not pass through the station
        assert_eq!(canvas.pixel(50, viewport.height / 2), Some([0, 0, 0, 255]));
    }
}
